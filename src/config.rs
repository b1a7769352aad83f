//! Librarian settings
//!
//! Resolution order, later wins:
//! 1. Defaults under the librarian home (`$LIBRARIAN_HOME`, else `~/.librarian`)
//! 2. `librarian.yaml` in the home directory, if present
//! 3. Command line flags and their environment variables
//!
//! Relative paths in `librarian.yaml` are resolved against the home directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{LibrarianError, Result};

/// Environment variable overriding the librarian home
pub const HOME_ENV: &str = "LIBRARIAN_HOME";

/// Settings file inside the librarian home
pub const SETTINGS_FILE: &str = "librarian.yaml";

/// Where libraries, downloads and the index live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub home: PathBuf,
    pub libraries_dir: PathBuf,
    pub downloads_dir: PathBuf,
    pub index_path: PathBuf,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub libraries_dir: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
}

/// On-disk shape of `librarian.yaml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct SettingsFile {
    #[serde(default)]
    libraries_dir: Option<PathBuf>,
    #[serde(default)]
    downloads_dir: Option<PathBuf>,
    #[serde(default)]
    index: Option<PathBuf>,
}

impl Settings {
    /// Defaults rooted at `home`
    pub fn defaults(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            libraries_dir: home.join("libraries"),
            downloads_dir: home.join("downloads"),
            index_path: home.join("index.yaml"),
            home,
        }
    }

    /// Resolve the librarian home directory
    pub fn home_dir() -> Result<PathBuf> {
        if let Ok(home) = std::env::var(HOME_ENV) {
            if !home.trim().is_empty() {
                return Ok(PathBuf::from(home));
            }
        }
        dirs::home_dir()
            .map(|home| home.join(".librarian"))
            .ok_or_else(|| LibrarianError::ConfigInvalid {
                message: format!("Cannot determine home directory; set {HOME_ENV}"),
            })
    }

    /// Load settings from the default home
    pub fn load(overrides: &Overrides) -> Result<Self> {
        Self::load_from(&Self::home_dir()?, overrides)
    }

    /// Load settings rooted at `home`
    pub fn load_from(home: &Path, overrides: &Overrides) -> Result<Self> {
        let mut settings = Self::defaults(home);

        let file = home.join(SETTINGS_FILE);
        if file.is_file() {
            settings.apply_file(&file)?;
        }

        if let Some(dir) = &overrides.libraries_dir {
            settings.libraries_dir.clone_from(dir);
        }
        if let Some(index) = &overrides.index_path {
            settings.index_path.clone_from(index);
        }

        tracing::debug!(?settings, "Resolved settings");
        Ok(settings)
    }

    fn apply_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path).map_err(|e| LibrarianError::FileReadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        // An empty file deserializes as unit, not as a mapping
        if content.trim().is_empty() {
            return Ok(());
        }
        let file: SettingsFile =
            serde_yaml::from_str(&content).map_err(|e| LibrarianError::ConfigParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let home = self.home.clone();
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { home.join(p) };
        if let Some(dir) = file.libraries_dir {
            self.libraries_dir = resolve(dir);
        }
        if let Some(dir) = file.downloads_dir {
            self.downloads_dir = resolve(dir);
        }
        if let Some(index) = file.index {
            self.index_path = resolve(index);
        }
        Ok(())
    }

    /// Create the libraries and downloads directories
    pub fn ensure_dirs(&self) -> Result<()> {
        for dir in [&self.libraries_dir, &self.downloads_dir] {
            fs::create_dir_all(dir).map_err(|e| LibrarianError::IoError {
                message: format!("Failed to create directory {}: {}", dir.display(), e),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::defaults("/srv/librarian");
        assert_eq!(settings.libraries_dir, Path::new("/srv/librarian/libraries"));
        assert_eq!(settings.downloads_dir, Path::new("/srv/librarian/downloads"));
        assert_eq!(settings.index_path, Path::new("/srv/librarian/index.yaml"));
    }

    #[test]
    fn test_settings_file_and_overrides() {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join(SETTINGS_FILE),
            "libraries_dir: libs\nindex: /etc/librarian/index.json\n",
        )
        .unwrap();

        let settings = Settings::load_from(temp.path(), &Overrides::default()).unwrap();
        assert_eq!(settings.libraries_dir, temp.path().join("libs"));
        assert_eq!(settings.downloads_dir, temp.path().join("downloads"));
        assert_eq!(settings.index_path, Path::new("/etc/librarian/index.json"));

        let overrides = Overrides {
            libraries_dir: Some(PathBuf::from("/tmp/other-libs")),
            index_path: None,
        };
        let settings = Settings::load_from(temp.path(), &overrides).unwrap();
        assert_eq!(settings.libraries_dir, Path::new("/tmp/other-libs"));
        assert_eq!(settings.index_path, Path::new("/etc/librarian/index.json"));
    }

    #[test]
    fn test_empty_settings_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "\n").unwrap();
        let settings = Settings::load_from(temp.path(), &Overrides::default()).unwrap();
        assert_eq!(settings, Settings::defaults(temp.path()));
    }

    #[test]
    fn test_invalid_settings_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(SETTINGS_FILE), "library_dir: typo\n").unwrap();
        let err = Settings::load_from(temp.path(), &Overrides::default()).unwrap_err();
        assert!(matches!(err, LibrarianError::ConfigParseFailed { .. }));
    }

    #[test]
    fn test_ensure_dirs() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::defaults(temp.path().join("home"));
        settings.ensure_dirs().unwrap();
        assert!(settings.libraries_dir.is_dir());
        assert!(settings.downloads_dir.is_dir());
    }

    #[test]
    #[serial]
    fn test_home_dir_from_env() {
        let temp = TempDir::new().unwrap();
        let original = std::env::var(HOME_ENV).ok();
        unsafe {
            std::env::set_var(HOME_ENV, temp.path());
        }

        let home = Settings::home_dir();

        unsafe {
            match original {
                Some(value) => std::env::set_var(HOME_ENV, value),
                None => std::env::remove_var(HOME_ENV),
            }
        }
        assert_eq!(home.unwrap(), temp.path());
    }
}
