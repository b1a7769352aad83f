//! Downloading release archives
//!
//! The orchestrator only sees [`Downloader`]. [`FileDownloader`] handles
//! `file://` URLs and plain paths, which is what local and mirrored indexes
//! publish; remote transports are plugged in through the same trait.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::error::CollaboratorError;
use crate::progress::{DownloadProgress, DownloadSink};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported URL scheme '{scheme}' in {url}")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("Source file not found: {0}")]
    SourceNotFound(String),
}

/// Retrieves the bytes behind a locator into a local file
pub trait Downloader: Send + Sync {
    fn download(
        &self,
        locator: &str,
        dest: &Path,
        progress: &dyn DownloadSink,
    ) -> Result<(), CollaboratorError>;
}

/// Downloader for `file://` URLs and filesystem paths
#[derive(Debug, Default, Clone, Copy)]
pub struct FileDownloader;

impl FileDownloader {
    fn source_path(locator: &str) -> Result<PathBuf, DownloadError> {
        match locator.split_once("://") {
            Some(("file", rest)) => Ok(PathBuf::from(rest)),
            Some((scheme, _)) => Err(DownloadError::UnsupportedScheme {
                scheme: scheme.to_string(),
                url: locator.to_string(),
            }),
            None => Ok(PathBuf::from(locator)),
        }
    }
}

impl Downloader for FileDownloader {
    fn download(
        &self,
        locator: &str,
        dest: &Path,
        progress: &dyn DownloadSink,
    ) -> Result<(), CollaboratorError> {
        let source = Self::source_path(locator)?;
        if !source.is_file() {
            return Err(DownloadError::SourceNotFound(source.display().to_string()).into());
        }
        let total = fs::metadata(&source).map_err(DownloadError::Io)?.len();
        tracing::debug!("Copying {} ({} bytes) to {}", locator, total, dest.display());

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(DownloadError::Io)?;
        }

        // Write beside the destination and rename, so an interrupted copy
        // never sits under the final name
        let mut part = dest.as_os_str().to_owned();
        part.push(".part");
        let part = PathBuf::from(part);

        let copied = copy_with_progress(&source, &part, locator, total, progress);
        if let Err(e) = copied {
            discard_partial(&part);
            return Err(e.into());
        }
        fs::rename(&part, dest).map_err(DownloadError::Io)?;
        Ok(())
    }
}

/// Remove a partial download; a file that was never created is fine
fn discard_partial(part: &Path) {
    if let Err(e) = fs::remove_file(part) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove partial download {}: {e}", part.display());
        }
    }
}

fn copy_with_progress(
    source: &Path,
    dest: &Path,
    url: &str,
    total: u64,
    progress: &dyn DownloadSink,
) -> Result<(), DownloadError> {
    let mut reader = BufReader::new(File::open(source)?);
    let mut writer = BufWriter::new(File::create(dest)?);
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut downloaded: u64 = 0;

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        writer.write_all(&buffer[..read])?;
        downloaded += read as u64;
        progress.on_progress(DownloadProgress {
            url: url.to_string(),
            downloaded,
            total: Some(total),
            completed: false,
        });
    }
    writer.flush()?;

    progress.on_progress(DownloadProgress {
        url: url.to_string(),
        downloaded,
        total: Some(total),
        completed: true,
    });
    Ok(())
}
