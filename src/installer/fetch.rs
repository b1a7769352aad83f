//! Fetching index releases into the downloads cache
//!
//! Archives are cached as `<downloads>/<library>/<version>/<file name>`. A cached
//! archive that still matches the published size and checksum is reused.
//! One that no longer matches is thrown away and downloaded again.

use std::fs;
use std::path::{Path, PathBuf};

use crate::download::Downloader;
use crate::hash::Checksum;
use crate::progress::{DownloadSink, TaskReporter};
use crate::release::{ReleaseDescriptor, sanitize_name};

/// Cache location of a release archive
pub fn cache_path(downloads_dir: &Path, release: &ReleaseDescriptor) -> PathBuf {
    let locator = release.locator().trim_end_matches('/');
    let path_part = match locator.split_once("://") {
        Some((_, rest)) => rest.split_once('/').map_or("", |(_, path)| path),
        None => locator,
    };
    let file_name = path_part
        .rsplit(&['/', '\\'][..])
        .next()
        .filter(|name| !name.is_empty() && !name.contains(':'))
        .map_or_else(
            || format!("{}-{}.zip", sanitize_name(release.name()), release.version()),
            sanitize_name,
        );
    downloads_dir
        .join(sanitize_name(release.name()))
        .join(sanitize_name(&release.version().to_string()))
        .join(file_name)
}

/// Check the file at `path` against the size and checksum the index published
pub fn verify(release: &ReleaseDescriptor, path: &Path) -> Result<(), String> {
    if let Some(expected) = release.size() {
        let actual = fs::metadata(path)
            .map_err(|e| format!("reading {}: {e}", path.display()))?
            .len();
        if actual != expected {
            return Err(format!(
                "size mismatch for {}: expected {expected} bytes, got {actual}",
                path.display()
            ));
        }
    }

    if let Some(raw) = release.checksum() {
        let checksum = Checksum::parse(raw)?;
        let matches = checksum
            .matches_file(path)
            .map_err(|e| format!("hashing {}: {e}", path.display()))?;
        if !matches {
            return Err(format!(
                "checksum mismatch for {}: expected {checksum}",
                path.display()
            ));
        }
    }
    Ok(())
}

/// Fetches index releases, reusing verified cached archives
pub struct Fetcher<'a> {
    pub downloader: &'a dyn Downloader,
    pub downloads_dir: &'a Path,
}

impl Fetcher<'_> {
    /// Path of a verified archive for `release`.
    ///
    /// On failure returns the context of what was being attempted and the
    /// cause, for the caller to tag.
    pub fn fetch(
        &self,
        release: &ReleaseDescriptor,
        task: &TaskReporter<'_>,
        progress: &dyn DownloadSink,
    ) -> Result<PathBuf, (String, String)> {
        let archive = cache_path(self.downloads_dir, release);

        if archive.is_file() {
            match verify(release, &archive) {
                Ok(()) => {
                    tracing::debug!("Using cached archive {}", archive.display());
                    return Ok(archive);
                }
                Err(reason) => {
                    tracing::warn!("Discarding cached archive: {reason}");
                    fs::remove_file(&archive).map_err(|e| {
                        (format!("removing stale {}", archive.display()), e.to_string())
                    })?;
                }
            }
        }

        task.begin(format!("Downloading {release}"));
        let context = format!("downloading {}", release.locator());
        self.downloader
            .download(release.locator(), &archive, progress)
            .map_err(|e| (context.clone(), e.to_string()))?;

        if let Err(reason) = verify(release, &archive) {
            if let Err(e) = fs::remove_file(&archive) {
                tracing::warn!("Failed to remove rejected download {}: {e}", archive.display());
            }
            return Err((context, reason));
        }
        Ok(archive)
    }
}
