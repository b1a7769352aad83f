//! Per-request staging area
//!
//! Staging lives inside the libraries directory as a hidden `.staging-*`
//! directory, so every move into the final location is a same-filesystem
//! rename. The catalog scan skips hidden entries, and the directory is
//! removed when the request finishes.
//!
//! Layout:
//!
//! ```text
//! <libraries>/.staging-XXXX/
//!   content/     extracted or cloned library
//!   previous/    installation being replaced
//!   displaced/   conflicting installation living at another path
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

const STAGING_PREFIX: &str = ".staging-";

/// Uniquely named staging directory owned by one request
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
}

impl Staging {
    pub fn create(libraries_dir: &Path) -> io::Result<Self> {
        fs::create_dir_all(libraries_dir)?;
        let dir = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .tempdir_in(libraries_dir)?;
        tracing::debug!("Created staging area {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where new content is extracted or cloned
    pub fn content_dir(&self) -> PathBuf {
        self.dir.path().join("content")
    }

    /// Where the installation being replaced is parked during a swap
    pub fn previous_dir(&self) -> PathBuf {
        self.dir.path().join("previous")
    }

    /// Where a conflicting installation at a non-canonical path is parked
    pub fn displaced_dir(&self) -> PathBuf {
        self.dir.path().join("displaced")
    }

    /// Keep the directory on disk instead of deleting it on drop
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

/// Lazily created [`Staging`], so requests that end early never touch disk
#[derive(Debug)]
pub struct StagingSlot {
    libraries_dir: PathBuf,
    staging: Option<Staging>,
}

impl StagingSlot {
    pub fn new(libraries_dir: impl Into<PathBuf>) -> Self {
        Self {
            libraries_dir: libraries_dir.into(),
            staging: None,
        }
    }

    pub fn get(&mut self) -> io::Result<&Staging> {
        if self.staging.is_none() {
            self.staging = Some(Staging::create(&self.libraries_dir)?);
        }
        match &self.staging {
            Some(staging) => Ok(staging),
            None => Err(io::Error::other("staging area unavailable")),
        }
    }

    pub fn take(&mut self) -> Option<Staging> {
        self.staging.take()
    }
}

/// Root of a staged library.
///
/// Archives normally wrap the library in a single top-level directory; that
/// directory is the root. Anything else is staged as-is and `dir` itself is
/// the root.
pub fn library_root(dir: &Path) -> io::Result<PathBuf> {
    let mut entries = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|entry| !is_archive_noise(&entry.file_name().to_string_lossy()))
        .map(|entry| entry.path());

    match (entries.next(), entries.next()) {
        (Some(only), None) if only.is_dir() => Ok(only),
        (None, _) => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("{} is empty", dir.display()),
        )),
        _ => Ok(dir.to_path_buf()),
    }
}

/// Metadata directories some archivers add next to the real content
fn is_archive_noise(name: &str) -> bool {
    name == "__MACOSX"
}
