//! Librarian - library installer
//!
//! Command line front end for installing libraries from an index, local
//! archives or git repositories.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use librarian::cli::{Cli, Commands};
use librarian::commands;
use librarian::config::Settings;

/// Log to stderr; `RUST_LOG` wins unless `--verbose` is given
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,librarian=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let overrides = cli.overrides();
    let result = match cli.command {
        Commands::Install(args) => Settings::load(&overrides)
            .and_then(|settings| commands::install::run(&settings, args, cli.quiet)),
        Commands::List(args) => {
            Settings::load(&overrides).and_then(|settings| commands::list::run(&settings, args))
        }
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        eprintln!("{:?}", miette::Report::new(e));
        std::process::exit(1);
    }
}
