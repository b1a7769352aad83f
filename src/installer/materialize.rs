//! Moving staged content into the libraries directory
//!
//! A clean install is a single rename. Replacing an installation parks the
//! old directory in staging, renames the new content into place and, if
//! that fails, renames the old directory back. The parked copy is deleted
//! with the staging area, after the swap has succeeded.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The filesystem operations the materializer performs
pub trait Filesystem: Send + Sync {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// [`Filesystem`] backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn exists(&self, path: &Path) -> bool {
        path.symlink_metadata().is_ok()
    }
}

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error("moving {from} to {to}: {source}")]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The new content could not be placed and the previous installation at
    /// `target` could not be put back either. It is left at `parked`.
    #[error(
        "placing new content failed: {cause}; restoring the previous installation at {target} also failed ({restore}), it was left at {parked}"
    )]
    Stranded {
        target: PathBuf,
        parked: PathBuf,
        cause: io::Error,
        restore: io::Error,
    },
}

impl MaterializeError {
    /// Whether the staging area holds the only copy of a previous install
    pub fn is_stranded(&self) -> bool {
        matches!(self, Self::Stranded { .. })
    }
}

/// What a successful materialization did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Created,
    Replaced,
}

/// Paths for one materialization
#[derive(Debug, Clone)]
pub struct Move<'a> {
    /// Staged library root
    pub staged: &'a Path,
    /// Canonical install path
    pub target: &'a Path,
    /// Parking spot for the directory currently at `target`
    pub previous: &'a Path,
    /// Conflicting installation at another path, with its parking spot
    pub displaced: Option<(&'a Path, &'a Path)>,
}

pub struct Materializer<'a> {
    fs: &'a dyn Filesystem,
}

impl<'a> Materializer<'a> {
    pub fn new(fs: &'a dyn Filesystem) -> Self {
        Self { fs }
    }

    /// Place `staged` at `target`, swapping out whatever is there
    pub fn place(&self, paths: &Move<'_>) -> Result<Placement, MaterializeError> {
        if let Some((displaced, parked)) = paths.displaced {
            self.rename(displaced, parked)?;
            if let Err(err) = self.place_at_target(paths) {
                if err.is_stranded() {
                    return Err(err);
                }
                return match self.restore(parked, displaced) {
                    Ok(()) => Err(err),
                    Err(restore) => Err(MaterializeError::Stranded {
                        target: displaced.to_path_buf(),
                        parked: parked.to_path_buf(),
                        cause: io::Error::other(err.to_string()),
                        restore,
                    }),
                };
            }
            return Ok(Placement::Replaced);
        }
        self.place_at_target(paths)
    }

    fn place_at_target(&self, paths: &Move<'_>) -> Result<Placement, MaterializeError> {
        if !self.fs.exists(paths.target) {
            self.rename(paths.staged, paths.target)?;
            return Ok(Placement::Created);
        }

        self.rename(paths.target, paths.previous)?;
        if let Err(cause) = self.fs.rename(paths.staged, paths.target) {
            tracing::warn!(
                "Swap into {} failed, restoring previous installation: {}",
                paths.target.display(),
                cause
            );
            return match self.fs.rename(paths.previous, paths.target) {
                Ok(()) => Err(MaterializeError::Move {
                    from: paths.staged.to_path_buf(),
                    to: paths.target.to_path_buf(),
                    source: cause,
                }),
                Err(restore) => Err(MaterializeError::Stranded {
                    target: paths.target.to_path_buf(),
                    parked: paths.previous.to_path_buf(),
                    cause,
                    restore,
                }),
            };
        }
        Ok(Placement::Replaced)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), MaterializeError> {
        self.fs
            .rename(from, to)
            .map_err(|source| MaterializeError::Move {
                from: from.to_path_buf(),
                to: to.to_path_buf(),
                source,
            })
    }

    fn restore(&self, parked: &Path, original: &Path) -> io::Result<()> {
        self.fs.rename(parked, original).inspect_err(|e| {
            tracing::error!(
                "Failed to restore {} from {}: {}",
                original.display(),
                parked.display(),
                e
            );
        })
    }
}
