//! CLI definitions using clap derive API

use clap::builder::{Styles, styling::AnsiColor};
use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Overrides;

/// Librarian - library installer
///
/// Install libraries from an index, a local archive or a git repository.
#[derive(Parser, Debug)]
#[command(
    name = "librarian",
    author,
    version,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Install libraries from an index, archives or git repositories",
    long_about = "Librarian installs versioned libraries into a libraries directory. \
                  Replacing an installed version is atomic: the previous version stays \
                  in place until the new one is complete.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n    \
                  librarian install Servo\n    \
                  librarian install Servo@1.2.0\n    \
                  librarian install --zip ./Servo-1.2.0.zip\n    \
                  librarian install --git https://github.com/arduino-libraries/Servo.git#1.2.0\n    \
                  librarian list --detailed"
)]
pub struct Cli {
    /// Libraries directory (defaults to ~/.librarian/libraries)
    #[arg(long, global = true, env = "LIBRARIAN_LIBRARIES_DIR", value_name = "DIR")]
    pub libraries_dir: Option<PathBuf>,

    /// Library index file (defaults to ~/.librarian/index.yaml)
    #[arg(long, global = true, env = "LIBRARIAN_INDEX", value_name = "FILE")]
    pub index: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(long, short = 'q', global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Settings given on the command line or through the environment
    pub fn overrides(&self) -> Overrides {
        Overrides {
            libraries_dir: self.libraries_dir.clone(),
            index_path: self.index.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install a library
    Install(InstallArgs),

    /// List installed libraries
    List(ListArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the install command
#[derive(Parser, Debug)]
#[command(
    group(ArgGroup::new("source").required(true).args(["library", "zip", "git"])),
    after_help = "EXAMPLES:\n  \
                  Install the latest release from the index:\n    librarian install Servo\n\n\
                  Install a specific version:\n    librarian install Servo@1.1.0\n\n\
                  Install the newest release matching a requirement:\n    librarian install \"Servo@^1.1\"\n\n\
                  Install from a local archive:\n    librarian install --zip ./Servo.zip\n\n\
                  Install from a git repository at a tag:\n    librarian install --git https://github.com/arduino-libraries/Servo.git#1.2.0"
)]
pub struct InstallArgs {
    /// Library to install from the index: NAME, NAME@VERSION or NAME@REQUIREMENT
    pub library: Option<String>,

    /// Install from a zip, tar or tar.gz archive
    #[arg(long, value_name = "PATH")]
    pub zip: Option<PathBuf>,

    /// Install from a git URL, optionally suffixed with #REF
    #[arg(long, value_name = "URL")]
    pub git: Option<String>,
}

/// Arguments for the list command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  List installed libraries:\n    librarian list\n\n\
                  Show install paths and descriptions:\n    librarian list --detailed")]
pub struct ListArgs {
    /// Show detailed output
    #[arg(long)]
    pub detailed: bool,
}

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Generate bash completions:\n    librarian completions --shell bash > ~/.bash_completion.d/librarian\n\n\
                  Generate zsh completions:\n    librarian completions --shell zsh > ~/.zfunc/_librarian\n\n\
                  Generate fish completions:\n    librarian completions --shell fish > ~/.config/fish/completions/librarian.fish")]
pub struct CompletionsArgs {
    /// Shell type (bash, elvish, fish, powershell, zsh)
    #[arg(long)]
    pub shell: String,
}
