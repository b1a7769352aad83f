//! Archive extraction
//!
//! Library archives are zip, tar or gzip-compressed tar files. The format is
//! taken from the file extension and, when that is inconclusive, from the
//! leading magic bytes.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use zip::ZipArchive;

use crate::error::CollaboratorError;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Unsupported archive format: {0}")]
    UnsupportedFormat(String),

    #[error("Archive error: {0}")]
    Archive(String),
}

/// Supported archive formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Tar,
    TarGz,
}

impl ArchiveFormat {
    /// Detect the format of `path` from its extension, then its contents
    pub fn detect(path: &Path) -> Result<Self, ExtractError> {
        let lower = path.to_string_lossy().to_lowercase();
        if lower.ends_with(".zip") {
            return Ok(Self::Zip);
        }
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            return Ok(Self::TarGz);
        }
        if lower.ends_with(".tar") {
            return Ok(Self::Tar);
        }

        let mut header = [0u8; 512];
        let read = read_prefix(path, &mut header)?;
        let header = &header[..read];
        if header.starts_with(b"PK\x03\x04") || header.starts_with(b"PK\x05\x06") {
            Ok(Self::Zip)
        } else if header.starts_with(&[0x1f, 0x8b]) {
            Ok(Self::TarGz)
        } else if header.len() > 262 && &header[257..262] == b"ustar" {
            Ok(Self::Tar)
        } else {
            Err(ExtractError::UnsupportedFormat(path.display().to_string()))
        }
    }
}

fn read_prefix(path: &Path, buf: &mut [u8]) -> io::Result<usize> {
    let mut file = File::open(path)?;
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}

/// Unpacks an archive into a directory
pub trait Extractor: Send + Sync {
    fn extract(&self, archive: &Path, target: &Path) -> Result<(), CollaboratorError>;
}

/// Extractor for zip, tar and tar.gz archives
#[derive(Debug, Default, Clone, Copy)]
pub struct ArchiveExtractor;

impl Extractor for ArchiveExtractor {
    fn extract(&self, archive: &Path, target: &Path) -> Result<(), CollaboratorError> {
        let format = ArchiveFormat::detect(archive)?;
        tracing::debug!(
            "Extracting {} ({:?}) into {}",
            archive.display(),
            format,
            target.display()
        );
        match format {
            ArchiveFormat::Zip => extract_zip(archive, target)?,
            ArchiveFormat::Tar => {
                let file = File::open(archive).map_err(ExtractError::Io)?;
                extract_tar(BufReader::new(file), target)?
            }
            ArchiveFormat::TarGz => {
                let file = File::open(archive).map_err(ExtractError::Io)?;
                extract_tar(flate2::read::GzDecoder::new(BufReader::new(file)), target)?
            }
        }
        Ok(())
    }
}

/// Relative entry path with no root, prefix or `..` components
fn enclosed(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

fn extract_tar<R: Read>(reader: R, dest_dir: &Path) -> Result<(), ExtractError> {
    fs::create_dir_all(dest_dir)?;
    let mut archive = tar::Archive::new(reader);

    for entry in archive.entries()? {
        let mut entry = entry?;
        let entry_path = entry.path()?.into_owned();
        let Some(relative_path) = enclosed(&entry_path) else {
            // "./" root entries are harmless, anything else escaping is not
            if entry_path.components().all(|c| c == Component::CurDir) {
                continue;
            }
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                entry_path.display()
            )));
        };

        let kind = entry.header().entry_type();
        if kind.is_symlink() || kind.is_hard_link() {
            let link = entry.link_name()?.map(|link| link.into_owned());
            let inside = link.is_some_and(|link| {
                link_stays_inside(&relative_path, &link, kind.is_symlink())
            });
            if !inside {
                return Err(ExtractError::Archive(format!(
                    "Link points outside the archive: {}",
                    entry_path.display()
                )));
            }
        }

        // Refuses to write through links created by earlier entries
        if !entry.unpack_in(dest_dir)? {
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                entry_path.display()
            )));
        }
    }
    Ok(())
}

/// Whether `link`, stored at `entry`, resolves inside the archive root.
/// Symlinks are relative to their own directory, hard links to the root.
fn link_stays_inside(entry: &Path, link: &Path, symlink: bool) -> bool {
    let base = if symlink { entry.parent() } else { None };
    let resolved = base.unwrap_or_else(|| Path::new("")).join(link);

    let mut depth = 0usize;
    for component in resolved.components() {
        match component {
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::ParentDir => match depth.checked_sub(1) {
                Some(up) => depth = up,
                None => return false,
            },
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<(), ExtractError> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(file).map_err(|e| ExtractError::Archive(e.to_string()))?;
    fs::create_dir_all(dest_dir)?;

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| ExtractError::Archive(e.to_string()))?;
        let Some(relative_path) = file.enclosed_name() else {
            return Err(ExtractError::Archive(format!(
                "Invalid path in archive: {}",
                file.name()
            )));
        };
        let absolute_path = dest_dir.join(&relative_path);

        if file.is_dir() {
            fs::create_dir_all(&absolute_path)?;
            continue;
        }
        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut outfile = File::create(&absolute_path)?;
        io::copy(&mut file, &mut outfile)?;

        #[cfg(unix)]
        if let Some(mode) = file.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))?;
        }
    }
    Ok(())
}
