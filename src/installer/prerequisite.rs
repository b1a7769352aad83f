//! Deciding what an index install has to do
//!
//! The decision is computed fresh for every request from the catalog's
//! current installed set. Nothing here touches the disk beyond checking
//! whether paths exist.

use std::path::{Path, PathBuf};

use crate::release::{InstalledPackageRef, ReleaseDescriptor, sanitize_name};

use super::materialize::Filesystem;

#[derive(Debug, Clone, PartialEq)]
pub enum PrerequisiteDecision {
    /// The requested name and version are installed at `path`
    AlreadySatisfied { path: PathBuf },
    /// Nothing with this name is installed
    CleanInstall { target: PathBuf },
    /// Another version of the library is installed
    ReplaceInstall {
        target: PathBuf,
        conflicting: InstalledPackageRef,
    },
}

/// Canonical install path of a library
pub fn target_path(libraries_dir: &Path, name: &str) -> Result<PathBuf, String> {
    let dir_name = sanitize_name(name.trim());
    if dir_name.is_empty() || dir_name == "." || dir_name == ".." {
        return Err(format!("'{name}' is not a valid library name"));
    }
    if dir_name.starts_with('.') {
        return Err(format!("library names cannot start with '.': '{name}'"));
    }
    Ok(libraries_dir.join(dir_name))
}

/// Decide between already satisfied, clean install and replace
pub fn check(
    release: &ReleaseDescriptor,
    installed: &[InstalledPackageRef],
    libraries_dir: &Path,
    fs: &dyn Filesystem,
) -> Result<PrerequisiteDecision, String> {
    let target = target_path(libraries_dir, release.name())?;

    let Some(existing) = installed.iter().find(|lib| lib.name == release.name()) else {
        if fs.exists(&target) {
            return Err(format!(
                "destination {} already exists and is not a managed library",
                target.display()
            ));
        }
        return Ok(PrerequisiteDecision::CleanInstall { target });
    };

    if existing.version == *release.version() {
        return Ok(PrerequisiteDecision::AlreadySatisfied {
            path: existing.path.clone(),
        });
    }

    if existing.path != target && fs.exists(&target) {
        return Err(format!(
            "destination {} already exists and does not hold {}",
            target.display(),
            existing
        ));
    }

    Ok(PrerequisiteDecision::ReplaceInstall {
        target,
        conflicting: existing.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::installer::materialize::LocalFs;
    use crate::release::{SourceKind, Version};
    use std::fs;
    use tempfile::TempDir;

    fn servo(version: &str) -> ReleaseDescriptor {
        ReleaseDescriptor::new(
            "Servo",
            Version::parse(version),
            SourceKind::Index,
            "file:///index/Servo.zip",
        )
    }

    fn installed(dir: &Path, name: &str, version: &str) -> InstalledPackageRef {
        InstalledPackageRef {
            name: name.to_string(),
            version: Version::parse(version),
            path: dir.join(name),
        }
    }

    #[test]
    fn test_clean_install() {
        let temp = TempDir::new().unwrap();
        let decision = check(&servo("1.1.0"), &[], temp.path(), &LocalFs).unwrap();
        assert_eq!(
            decision,
            PrerequisiteDecision::CleanInstall {
                target: temp.path().join("Servo")
            }
        );
    }

    #[test]
    fn test_already_satisfied() {
        let temp = TempDir::new().unwrap();
        let libs = [installed(temp.path(), "Servo", "1.1.0")];
        let decision = check(&servo("1.1"), &libs, temp.path(), &LocalFs).unwrap();
        assert_eq!(
            decision,
            PrerequisiteDecision::AlreadySatisfied {
                path: temp.path().join("Servo")
            }
        );
    }

    #[test]
    fn test_replace_other_version() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Servo")).unwrap();
        let libs = [
            installed(temp.path(), "Ethernet", "2.0.0"),
            installed(temp.path(), "Servo", "1.1.0"),
        ];
        match check(&servo("1.2.0"), &libs, temp.path(), &LocalFs).unwrap() {
            PrerequisiteDecision::ReplaceInstall {
                target,
                conflicting,
            } => {
                assert_eq!(target, temp.path().join("Servo"));
                assert_eq!(conflicting.version, Version::parse("1.1.0"));
            }
            other => panic!("expected replace, got {other:?}"),
        }
    }

    #[test]
    fn test_unmanaged_destination_is_refused() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Servo")).unwrap();
        let err = check(&servo("1.1.0"), &[], temp.path(), &LocalFs).unwrap_err();
        assert!(err.contains("already exists"));
    }

    #[test]
    fn test_conflicting_elsewhere_with_occupied_target() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Servo")).unwrap();
        let mut old = installed(temp.path(), "Servo", "1.1.0");
        old.path = temp.path().join("servo-legacy");
        assert!(check(&servo("1.2.0"), &[old], temp.path(), &LocalFs).is_err());
    }

    #[test]
    fn test_target_path_sanitizes() {
        let libs = Path::new("/libs");
        assert_eq!(
            target_path(libs, "Adafruit GFX Library").unwrap(),
            libs.join("Adafruit_GFX_Library")
        );
        assert_eq!(target_path(libs, "a/b").unwrap(), libs.join("a_b"));
        assert!(target_path(libs, "").is_err());
        assert!(target_path(libs, "..").is_err());
        assert!(target_path(libs, ".staging-1").is_err());
    }
}
