//! Librarian - library install orchestrator
//!
//! Installs versioned libraries into a libraries directory from three kinds
//! of source: a release published in an index, a local archive, or a git
//! repository. Every install runs the same pipeline (resolve, check, fetch,
//! materialize, rescan) and narrates it through a [`progress::ProgressSink`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use librarian::catalog::DirectoryCatalog;
//! use librarian::index::LibraryIndex;
//! use librarian::progress::{NoProgress, TerminalProgress};
//! use librarian::{Installer, ReleaseSelector};
//!
//! # fn main() -> librarian::Result<()> {
//! let catalog = Arc::new(DirectoryCatalog::open("/tmp/libraries")?);
//! let index = Arc::new(LibraryIndex::load("/tmp/index.yaml".as_ref())?);
//! let installer = Installer::new("/tmp/libraries", "/tmp/downloads", index, catalog);
//!
//! let progress = TerminalProgress::new(false);
//! installer.install_from_index(&ReleaseSelector::parse("Servo@1.1.0")?, &NoProgress, &progress)?;
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod commands;
pub mod config;
pub mod download;
pub mod error;
pub mod git;
pub mod hash;
pub mod index;
pub mod installer;
pub mod progress;
pub mod release;

pub use error::{ErrorKind, LibrarianError, Result};
pub use installer::Installer;
pub use release::{InstalledPackageRef, ReleaseDescriptor, ReleaseSelector, Version};
