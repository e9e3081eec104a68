//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::catalog::Category;
use crate::household::ItemCategory;
use crate::plan::{MarkerKind, PlanPoint};

/// List guides.
#[derive(Debug, Args)]
pub struct GuidesCommand {
    /// Only guides whose title or summary contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    /// Only guides in this category
    #[arg(long, value_enum)]
    pub category: Option<CategoryArg>,

    /// List every match instead of the home-screen selection
    #[arg(short, long)]
    pub all: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Show one guide.
#[derive(Debug, Args)]
pub struct GuideCommand {
    /// Guide id (see `guardian guides`)
    pub id: String,

    /// Show only the condensed steps
    #[arg(long)]
    pub quick: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Escape plan commands.
#[derive(Debug, Subcommand)]
pub enum PlanCommand {
    /// Show markers and what the plan contains
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Replace the background with a generated example floor plan
    Example,

    /// Use an image file as the background
    Background {
        /// Image file (PNG or JPEG)
        file: PathBuf,
    },

    /// Place a marker
    Mark {
        /// What the marker denotes
        #[arg(value_enum)]
        kind: MarkerKindArg,

        /// Horizontal position in percent (clamped to 0-100)
        #[arg(allow_negative_numbers = true)]
        x: f64,

        /// Vertical position in percent (clamped to 0-100)
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },

    /// Remove a marker
    Unmark {
        /// Marker id
        id: String,
    },

    /// Remove every marker
    ClearMarkers,

    /// Erase all freehand drawing
    ClearOverlay,

    /// Draw one freehand stroke through the given points
    Draw {
        /// Points as `x,y` in percent
        #[arg(required = true, num_args = 2.., value_parser = parse_point)]
        points: Vec<PlanPoint>,
    },
}

/// Drill commands.
#[derive(Debug, Subcommand)]
pub enum DrillsCommand {
    /// List drills and whether they are due
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Run a drill interactively
    Run {
        /// Drill id
        id: String,
    },
}

/// Inventory commands.
#[derive(Debug, Subcommand)]
pub enum InventoryCommand {
    /// List stocked items
    List {
        /// Only items in this category
        #[arg(long, value_enum)]
        category: Option<ItemCategoryArg>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Stock a new item
    Add {
        /// Item name
        name: String,

        /// Item category
        #[arg(long, value_enum, default_value = "tool")]
        category: ItemCategoryArg,

        /// How many
        #[arg(long, default_value = "1")]
        quantity: u32,

        /// Expiry date (YYYY-MM-DD)
        #[arg(short, long)]
        expires: Option<NaiveDate>,

        /// Where it is kept
        #[arg(short, long)]
        location: Option<String>,
    },

    /// Remove an item
    Remove {
        /// Item id
        id: String,
    },
}

/// Family commands.
#[derive(Debug, Subcommand)]
pub enum FamilyCommand {
    /// List family members
    List {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Add a family member
    Add {
        /// Name
        #[arg(short, long)]
        name: String,

        /// Role, e.g. "Parent" or "Key holder"
        #[arg(short, long)]
        role: Option<String>,

        /// Phone number
        #[arg(short, long)]
        phone: Option<String>,

        /// Blood type
        #[arg(short, long)]
        blood_type: Option<String>,

        /// Allergies, medication and similar notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Remove a family member
    Remove {
        /// Member id
        id: String,
    },
}

/// Ask the remote assistant.
#[derive(Debug, Args)]
pub struct AskCommand {
    /// Describe the situation
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Guide category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CategoryArg {
    /// First aid
    Medical,
    /// Fires, earthquakes and other disasters
    Disaster,
    /// Outdoor survival
    Survival,
}

impl From<CategoryArg> for Category {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Medical => Self::Medical,
            CategoryArg::Disaster => Self::Disaster,
            CategoryArg::Survival => Self::Survival,
        }
    }
}

/// Marker kind argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MarkerKindArg {
    /// Emergency exit
    Exit,
    /// Fire extinguisher
    Extinguisher,
    /// Emergency kit
    Kit,
    /// Hazard
    Danger,
    /// Assembly point
    Assembly,
    /// Shut-off valve
    Valve,
}

impl From<MarkerKindArg> for MarkerKind {
    fn from(arg: MarkerKindArg) -> Self {
        match arg {
            MarkerKindArg::Exit => Self::Exit,
            MarkerKindArg::Extinguisher => Self::Extinguisher,
            MarkerKindArg::Kit => Self::Kit,
            MarkerKindArg::Danger => Self::Danger,
            MarkerKindArg::Assembly => Self::Assembly,
            MarkerKindArg::Valve => Self::Valve,
        }
    }
}

/// Inventory category argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ItemCategoryArg {
    /// Food and water
    Food,
    /// Medical supplies
    Medical,
    /// Tools and equipment
    Tool,
    /// Documents
    Doc,
}

impl From<ItemCategoryArg> for ItemCategory {
    fn from(arg: ItemCategoryArg) -> Self {
        match arg {
            ItemCategoryArg::Food => Self::Food,
            ItemCategoryArg::Medical => Self::Medical,
            ItemCategoryArg::Tool => Self::Tool,
            ItemCategoryArg::Doc => Self::Doc,
        }
    }
}

/// Parse `x,y` into a plan point. Out-of-range values are clamped.
fn parse_point(s: &str) -> Result<PlanPoint, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got `{s}`"))?;
    let x: f64 = x
        .trim()
        .parse()
        .map_err(|_| format!("invalid x coordinate in `{s}`"))?;
    let y: f64 = y
        .trim()
        .parse()
        .map_err(|_| format!("invalid y coordinate in `{s}`"))?;
    Ok(PlanPoint::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_arg_conversion() {
        assert_eq!(Category::from(CategoryArg::Medical), Category::Medical);
        assert_eq!(Category::from(CategoryArg::Disaster), Category::Disaster);
        assert_eq!(Category::from(CategoryArg::Survival), Category::Survival);
    }

    #[test]
    fn test_marker_kind_arg_covers_every_kind() {
        let converted: Vec<MarkerKind> = MarkerKindArg::value_variants()
            .iter()
            .map(|arg| MarkerKind::from(*arg))
            .collect();
        assert_eq!(converted, MarkerKind::ALL.to_vec());
    }

    #[test]
    fn test_item_category_arg_covers_every_category() {
        let converted: Vec<ItemCategory> = ItemCategoryArg::value_variants()
            .iter()
            .map(|arg| ItemCategory::from(*arg))
            .collect();
        assert_eq!(converted, ItemCategory::ALL.to_vec());
    }

    #[test]
    fn test_parse_point() {
        assert_eq!(parse_point("10,20").unwrap(), PlanPoint::new(10.0, 20.0));
        assert_eq!(parse_point(" 5.5 , 120 ").unwrap(), PlanPoint::new(5.5, 100.0));
        assert!(parse_point("10").is_err());
        assert!(parse_point("a,b").is_err());
    }
}
