//! `guardian` - Offline household emergency preparedness
//!
//! This library provides the emergency guide catalog, the annotated escape
//! plan, recurring drills and the household records, all persisted as JSON
//! documents in a local store.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod advisory;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod drill;
pub mod error;
pub mod household;
pub mod logging;
pub mod plan;
pub mod router;
pub mod storage;
pub mod timer;

pub use advisory::{Advice, Advisor};
pub use catalog::{Catalog, Category, EmergencyGuide};
pub use config::Config;
pub use drill::{is_due, DrillBook, DrillSession, DrillTask, SessionOutcome};
pub use error::{Error, Result};
pub use household::{Family, Inventory};
pub use logging::init_logging;
pub use plan::{MarkerKind, PlanDocument, PlanEditor, PlanPoint};
pub use router::{Router, View};
pub use storage::{DocumentKey, DocumentStore, MemoryStore, SqliteStore};
