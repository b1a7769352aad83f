//! List command implementation
//!
//! Lists the libraries found in the libraries directory.

use console::Style;

use crate::catalog::DirectoryCatalog;
use crate::cli::ListArgs;
use crate::config::Settings;
use crate::error::Result;
use crate::release::{InstalledPackageRef, LibraryMetadata};

/// Run list command
pub fn run(settings: &Settings, args: ListArgs) -> Result<()> {
    let catalog = DirectoryCatalog::open(&settings.libraries_dir)?;
    list_libraries(&catalog.installed(), args.detailed);
    Ok(())
}

fn list_libraries(installed: &[InstalledPackageRef], detailed: bool) {
    if installed.is_empty() {
        println!("No libraries installed.");
        return;
    }

    println!("Installed libraries ({}):", installed.len());
    println!();

    for library in installed {
        println!(
            "  {} {}",
            Style::new().bold().yellow().apply_to(&library.name),
            library.version
        );
        if detailed {
            display_details(library);
        }
    }
}

fn display_details(library: &InstalledPackageRef) {
    let label = Style::new().bold();
    println!("    {} {}", label.apply_to("Path:"), library.path.display());

    let description = LibraryMetadata::read_from(&library.path)
        .ok()
        .flatten()
        .and_then(|metadata| metadata.description);
    if let Some(description) = description {
        println!("    {} {}", label.apply_to("Description:"), description);
    }
}
