//! Read-only catalog of emergency guides.
//!
//! The guide content is compiled in (see [`guides`]). The catalog only offers
//! lookup by id and filtering by text and category.

pub mod guides;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{Error, Result};

/// Broad grouping of guides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// First aid.
    Medical,
    /// Fires, earthquakes and other disasters.
    Disaster,
    /// Outdoor survival.
    Survival,
}

impl Category {
    /// Every category.
    pub const ALL: [Self; 3] = [Self::Medical, Self::Disaster, Self::Survival];

    /// Identifier used on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Medical => "medical",
            Self::Disaster => "disaster",
            Self::Survival => "survival",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::invalid_input(format!("unknown category: {s}")))
    }
}

/// One step of a guide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GuideStep {
    /// Short heading.
    pub title: &'static str,
    /// What to do.
    pub description: &'static str,
    /// Whether getting this step wrong is life-threatening.
    pub is_critical: bool,
    /// How long the step should last, for steps that are timed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
    /// Target rhythm in beats per minute, for rhythmic steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bpm: Option<u32>,
}

impl GuideStep {
    const fn new(title: &'static str, description: &'static str) -> Self {
        Self {
            title,
            description,
            is_critical: false,
            duration_seconds: None,
            bpm: None,
        }
    }

    const fn critical(mut self) -> Self {
        self.is_critical = true;
        self
    }

    const fn timed(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    const fn rhythm(mut self, bpm: u32) -> Self {
        self.bpm = Some(bpm);
        self
    }
}

/// A first-aid or disaster procedure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmergencyGuide {
    /// Stable id.
    pub id: &'static str,
    /// Grouping.
    pub category: Category,
    /// Display title.
    pub title: &'static str,
    /// One-line summary.
    pub summary: &'static str,
    /// Name of the icon renderers should show.
    pub icon: &'static str,
    /// Condensed steps for quick mode.
    pub quick_steps: &'static [&'static str],
    /// Detailed steps.
    pub steps: &'static [GuideStep],
}

impl EmergencyGuide {
    /// Whether `needle` occurs in the title or summary, ignoring case.
    #[must_use]
    pub fn matches(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        needle.is_empty()
            || self.title.to_lowercase().contains(&needle)
            || self.summary.to_lowercase().contains(&needle)
    }

    /// Whether any step is marked critical.
    #[must_use]
    pub fn has_critical_steps(&self) -> bool {
        self.steps.iter().any(|s| s.is_critical)
    }
}

/// Lookup and search over a fixed set of guides.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    guides: &'static [EmergencyGuide],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Catalog {
    /// The guides shipped with the application.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(guides::GUIDES)
    }

    /// A catalog over `guides`.
    #[must_use]
    pub fn new(guides: &'static [EmergencyGuide]) -> Self {
        Self { guides }
    }

    /// Every guide, in catalog order.
    #[must_use]
    pub fn all(&self) -> &'static [EmergencyGuide] {
        self.guides
    }

    /// Look up a guide by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&'static EmergencyGuide> {
        self.guides.iter().find(|g| g.id == id)
    }

    /// Guides whose title or summary contains `text` and, when given, belong
    /// to `category`. Empty text matches every guide.
    #[must_use]
    pub fn filter(&self, text: &str, category: Option<Category>) -> Vec<&'static EmergencyGuide> {
        self.guides
            .iter()
            .filter(|g| category.map_or(true, |c| g.category == c))
            .filter(|g| g.matches(text))
            .collect()
    }

    /// Number of guides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.guides.len()
    }

    /// Whether the catalog has no guides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_ids_are_unique() {
        let catalog = Catalog::builtin();
        let mut ids: Vec<_> = catalog.all().iter().map(|g| g.id).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
        assert_eq!(catalog.len(), 9);
    }

    #[test]
    fn test_every_guide_has_steps() {
        for guide in Catalog::builtin().all() {
            assert!(!guide.steps.is_empty(), "{} has no steps", guide.id);
            assert!(!guide.quick_steps.is_empty(), "{} has no quick steps", guide.id);
        }
    }

    #[test]
    fn test_get() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.get("burns").unwrap().category, Category::Medical);
        assert!(catalog.get("unknown").is_none());
    }

    #[test]
    fn test_cpr_timing_metadata() {
        let cpr = Catalog::builtin().get("cpr").unwrap();
        assert_eq!(cpr.steps[0].duration_seconds, Some(10));
        assert!(cpr.steps[0].is_critical);
        assert!(cpr.steps.iter().any(|s| s.bpm == Some(110)));
    }

    #[test]
    fn test_empty_filter_matches_all() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.filter("", None).len(), catalog.len());
        assert_eq!(catalog.filter("   ", None).len(), catalog.len());
    }

    #[test]
    fn test_filter_by_text_ignores_case() {
        let catalog = Catalog::builtin();
        let ids: Vec<_> = catalog.filter("BLEED", None).iter().map(|g| g.id).collect();
        assert_eq!(ids, vec!["bleeding"]);
    }

    #[test]
    fn test_filter_by_category() {
        let catalog = Catalog::builtin();
        let disaster = catalog.filter("", Some(Category::Disaster));
        assert!(disaster.iter().all(|g| g.category == Category::Disaster));
        assert_eq!(disaster.len(), 1);

        assert!(catalog.filter("burn", Some(Category::Survival)).is_empty());
    }

    #[test]
    fn test_category_parse() {
        assert_eq!("Medical".parse::<Category>().unwrap(), Category::Medical);
        assert!("food".parse::<Category>().is_err());
    }
}
