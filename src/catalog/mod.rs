//! Catalog of installed libraries
//!
//! The catalog is the only writer of the installed-library set. The
//! orchestrator reads it through [`Catalog::list_installed`] and asks it to
//! rebuild itself from disk through [`Catalog::rescan`] after a successful
//! install.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use crate::error::{CollaboratorError, LibrarianError, Result};
use crate::release::{InstalledPackageRef, LibraryMetadata, UNVERSIONED, Version};

/// Installed-library set owned outside the orchestrator
pub trait Catalog: Send + Sync {
    /// Current installed libraries
    fn list_installed(&self) -> std::result::Result<Vec<InstalledPackageRef>, CollaboratorError>;

    /// Rebuild the installed set from disk
    fn rescan(&self) -> std::result::Result<(), CollaboratorError>;
}

/// Catalog backed by a libraries directory
///
/// Every non-hidden subdirectory is one installed library; its
/// `library.yaml` names it, otherwise the directory name is used. Hidden
/// entries (`.staging-*`) belong to in-flight installs and are skipped.
#[derive(Debug)]
pub struct DirectoryCatalog {
    libraries_dir: PathBuf,
    installed: RwLock<Vec<InstalledPackageRef>>,
}

impl DirectoryCatalog {
    /// Open the catalog, creating the directory if needed, and scan it once
    pub fn open(libraries_dir: impl Into<PathBuf>) -> Result<Self> {
        let libraries_dir = libraries_dir.into();
        fs::create_dir_all(&libraries_dir).map_err(|e| LibrarianError::IoError {
            message: format!(
                "Failed to create libraries directory {}: {}",
                libraries_dir.display(),
                e
            ),
        })?;

        let installed = scan_libraries(&libraries_dir).map_err(|e| LibrarianError::IoError {
            message: format!(
                "Failed to scan libraries directory {}: {}",
                libraries_dir.display(),
                e
            ),
        })?;

        Ok(Self {
            libraries_dir,
            installed: RwLock::new(installed),
        })
    }

    pub fn libraries_dir(&self) -> &Path {
        &self.libraries_dir
    }

    /// Snapshot of the last scan
    pub fn installed(&self) -> Vec<InstalledPackageRef> {
        self.installed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Catalog for DirectoryCatalog {
    fn list_installed(&self) -> std::result::Result<Vec<InstalledPackageRef>, CollaboratorError> {
        if !self.libraries_dir.is_dir() {
            return Err(format!(
                "libraries directory {} is missing",
                self.libraries_dir.display()
            )
            .into());
        }
        Ok(self.installed())
    }

    fn rescan(&self) -> std::result::Result<(), CollaboratorError> {
        let installed = scan_libraries(&self.libraries_dir)?;
        tracing::debug!(
            "Rescanned {}: {} libraries",
            self.libraries_dir.display(),
            installed.len()
        );
        *self
            .installed
            .write()
            .unwrap_or_else(PoisonError::into_inner) = installed;
        Ok(())
    }
}

/// Read every library under `libraries_dir`, sorted by name
fn scan_libraries(libraries_dir: &Path) -> std::io::Result<Vec<InstalledPackageRef>> {
    let mut installed = Vec::new();

    for entry in fs::read_dir(libraries_dir)? {
        let entry = entry?;
        let path = entry.path();
        let dir_name = entry.file_name().to_string_lossy().to_string();

        if dir_name.starts_with('.') || !path.is_dir() {
            continue;
        }

        let library = match LibraryMetadata::read_from(&path) {
            Ok(Some(metadata)) => InstalledPackageRef {
                version: metadata.version(),
                name: metadata.name,
                path,
            },
            Ok(None) => InstalledPackageRef {
                name: dir_name,
                version: Version::parse(UNVERSIONED),
                path,
            },
            Err(e) => {
                tracing::warn!("Ignoring unreadable library metadata: {e}");
                InstalledPackageRef {
                    name: dir_name,
                    version: Version::parse(UNVERSIONED),
                    path,
                }
            }
        };
        installed.push(library);
    }

    installed.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(installed)
}
