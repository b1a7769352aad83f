//! Install command implementation
//!
//! Wires the default collaborators into an [`Installer`] and runs one
//! request against it with terminal progress.

use std::sync::Arc;

use crate::catalog::DirectoryCatalog;
use crate::cli::InstallArgs;
use crate::config::Settings;
use crate::error::{LibrarianError, Result};
use crate::index::LibraryIndex;
use crate::installer::Installer;
use crate::progress::TerminalProgress;
use crate::release::ReleaseSelector;

/// Run install command
pub fn run(settings: &Settings, args: InstallArgs, quiet: bool) -> Result<()> {
    settings.ensure_dirs()?;
    let catalog = Arc::new(DirectoryCatalog::open(&settings.libraries_dir)?);
    let progress = TerminalProgress::new(quiet);

    if let Some(archive) = args.zip {
        let installer = build_installer(settings, LibraryIndex::default(), catalog);
        return installer.install_from_archive(&archive, &progress);
    }

    if let Some(url) = args.git {
        let installer = build_installer(settings, LibraryIndex::default(), catalog);
        return installer.install_from_git(&url, &progress);
    }

    let library = args.library.ok_or_else(|| LibrarianError::ConfigInvalid {
        message: "Nothing to install: give a library name, --zip or --git".to_string(),
    })?;
    let selector = ReleaseSelector::parse(&library)?;
    let index = LibraryIndex::load(&settings.index_path)?;
    build_installer(settings, index, catalog).install_from_index(&selector, &progress, &progress)
}

fn build_installer(settings: &Settings, index: LibraryIndex, catalog: Arc<DirectoryCatalog>) -> Installer {
    Installer::new(
        &settings.libraries_dir,
        &settings.downloads_dir,
        Arc::new(index),
        catalog,
    )
}
