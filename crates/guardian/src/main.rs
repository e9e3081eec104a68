//! `guardian` - CLI for household emergency preparedness
//!
//! This binary provides the command-line interface to the guides, escape
//! plan, drills and household records kept by the guardian library.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use clap::Parser;

use guardian::cli::{self, Cli};
use guardian::{init_logging, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    let mut stdout = std::io::stdout().lock();
    cli::run(cli.command, &config, &mut stdout).await
}
