//! Error types and handling for Librarian
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! Every install request fails with exactly one error tagged by the stage
//! that failed:
//! - [`index`]: no release matches the requested name/version
//! - [`install`]: prerequisite check, fetch, materialize and rescan failures
//!
//! The remaining variants belong to the ambient layers that run before a
//! request starts:
//! - [`config`]: configuration and index file errors
//! - [`fs`]: file system errors

pub mod config;
pub mod fs;
pub mod index;
pub mod install;

#[cfg(test)]
mod tests;

use miette::Diagnostic;
use thiserror::Error;

/// Error reported by an external collaborator (index, catalog, downloader,
/// extractor, VCS). The orchestrator wraps it with its stage tag.
pub type CollaboratorError = Box<dyn std::error::Error + Send + Sync>;

/// Which stage of an install request an error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Prerequisite,
    Fetch,
    Materialize,
    Rescan,
    Config,
    Io,
}

/// Main error type for Librarian operations
#[derive(Error, Diagnostic, Debug)]
pub enum LibrarianError {
    // Resolving
    #[error("No release of '{selector}' found in the index")]
    #[diagnostic(
        code(librarian::index::not_found),
        help("Check the library name and version constraint, or update the index file")
    )]
    NotFound { selector: String },

    // Checking
    #[error("Cannot install {package}: {reason}")]
    #[diagnostic(code(librarian::install::prerequisite_failed))]
    PrerequisiteFailed { package: String, reason: String },

    // Fetching
    #[error("Failed to fetch {package}: {reason}")]
    #[diagnostic(
        code(librarian::install::fetch_failed),
        help("Check that the source is reachable and the archive is not corrupted")
    )]
    FetchFailed { package: String, reason: String },

    // Materializing
    #[error("Failed to install {package}: {reason}")]
    #[diagnostic(
        code(librarian::install::materialize_failed),
        help("Any previously installed version was left in place")
    )]
    MaterializeFailed { package: String, reason: String },

    // Rescanning
    #[error("Installed {package} but failed to rescan libraries: {reason}")]
    #[diagnostic(
        code(librarian::install::rescan_failed),
        help("The files are on disk but the library catalog may be stale; run 'librarian list'")
    )]
    RescanFailed { package: String, reason: String },

    // Configuration errors
    #[error("Configuration file not found: {path}")]
    #[diagnostic(code(librarian::config::not_found))]
    ConfigNotFound { path: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(code(librarian::config::parse_failed))]
    ConfigParseFailed { path: String, reason: String },

    #[error("Invalid configuration: {message}")]
    #[diagnostic(code(librarian::config::invalid))]
    ConfigInvalid { message: String },

    // File system errors
    #[error("Failed to read file: {path}: {reason}")]
    #[diagnostic(code(librarian::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(librarian::fs::io_error))]
    IoError { message: String },
}

impl LibrarianError {
    /// Stage tag of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::PrerequisiteFailed { .. } => ErrorKind::Prerequisite,
            Self::FetchFailed { .. } => ErrorKind::Fetch,
            Self::MaterializeFailed { .. } => ErrorKind::Materialize,
            Self::RescanFailed { .. } => ErrorKind::Rescan,
            Self::ConfigNotFound { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigInvalid { .. } => ErrorKind::Config,
            Self::FileReadFailed { .. } | Self::IoError { .. } => ErrorKind::Io,
        }
    }
}

impl From<std::io::Error> for LibrarianError {
    fn from(err: std::io::Error) -> Self {
        LibrarianError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for LibrarianError {
    fn from(err: serde_yaml::Error) -> Self {
        LibrarianError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for LibrarianError {
    fn from(err: serde_json::Error) -> Self {
        LibrarianError::ConfigParseFailed {
            path: "unknown".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, LibrarianError>;
