//! Command-line interface for guardian.
//!
//! This module provides the CLI structure and command handlers for the
//! `guardian` binary.

mod commands;
mod handlers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AskCommand, CategoryArg, ConfigCommand, DrillsCommand, FamilyCommand, GuideCommand,
    GuidesCommand, InventoryCommand, ItemCategoryArg, MarkerKindArg, PlanCommand, StatusCommand,
};
pub use handlers::{run, run_drill_session};

/// guardian - Offline household emergency preparedness
///
/// First-aid and disaster guides, an annotated escape plan, recurring drills
/// and a supply inventory, all stored locally.
#[derive(Debug, Parser)]
#[command(name = "guardian")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List emergency guides
    Guides(GuidesCommand),

    /// Show one emergency guide
    Guide(GuideCommand),

    /// Edit the household escape plan
    #[command(subcommand)]
    Plan(PlanCommand),

    /// List and run household drills
    #[command(subcommand)]
    Drills(DrillsCommand),

    /// Manage emergency supplies
    #[command(subcommand)]
    Inventory(InventoryCommand),

    /// Manage family members and contacts
    #[command(subcommand)]
    Family(FamilyCommand),

    /// Ask the remote assistant for advice
    Ask(AskCommand),

    /// Show readiness at a glance
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.quiet, self.verbose)
    }
}
