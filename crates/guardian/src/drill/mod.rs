//! Recurring household drills.
//!
//! [`DrillBook`] owns the stored drill collection. Starting a drill hands out
//! a [`DrillSession`]; the only write back to storage happens when a session
//! completes.

pub mod schedule;
pub mod session;

use std::num::NonZeroU32;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use schedule::{is_due, DrillStatus};
pub use session::{DrillSession, SessionOutcome};

use crate::storage::documents::{self, LoadSource};
use crate::storage::{DocumentKey, DocumentStore};

/// A recurring drill with its checklist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrillTask {
    /// Stable id.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Recommended interval between runs.
    pub frequency_days: NonZeroU32,
    /// Date the drill was last completed.
    #[serde(default)]
    pub last_performed: Option<NaiveDate>,
    /// Checklist, in display order.
    #[serde(default)]
    pub steps: Vec<String>,
}

/// The drills a fresh install starts with.
#[must_use]
pub fn default_drills() -> Vec<DrillTask> {
    fn drill(id: &str, title: &str, days: u32, steps: &[&str]) -> DrillTask {
        DrillTask {
            id: id.to_string(),
            title: title.to_string(),
            frequency_days: NonZeroU32::new(days).unwrap_or(NonZeroU32::MIN),
            last_performed: None,
            steps: steps.iter().map(ToString::to_string).collect(),
        }
    }

    vec![
        drill(
            "1",
            "Home fire escape drill",
            180,
            &[
                "Everyone stops what they are doing as soon as the alarm sounds",
                "Cover mouth and nose with a wet towel and stay low, crawling if needed",
                "Feel the door handle for heat and open the door only if it is safe",
                "Follow the planned route to the outdoor assembly point",
                "Take a headcount and confirm everyone is out",
            ],
        ),
        drill(
            "2",
            "First-aid kit inventory check",
            90,
            &[
                "Take out the kit and check every item's expiry date",
                "Test the batteries in the flashlight and radio",
                "Check medicines for spoilage or damp",
                "Replace anything expired or missing",
                "Put the kit back in its usual place and tell the household",
            ],
        ),
        drill(
            "3",
            "Earthquake drill",
            180,
            &[
                "Simulate shaking and immediately drop, cover and hold on",
                "Keep away from windows, glass and tall furniture",
                "When the shaking stops, grab the go-bag and leave",
                "Never use the lift; take the stairs",
                "Gather in an open area",
            ],
        ),
        drill(
            "4",
            "Power cut and gas leak drill",
            365,
            &[
                "Recognise the smell of a gas leak (rotten eggs)",
                "Do not operate switches or use open flames",
                "Open doors and windows to ventilate",
                "Find the gas main valve and shut it",
                "Find the breaker panel and practise cutting the main switch",
                "Move outdoors to safety and call for help",
            ],
        ),
    ]
}

/// The stored collection of drills.
#[derive(Debug)]
pub struct DrillBook<S: DocumentStore> {
    store: S,
    tasks: Vec<DrillTask>,
}

impl<S: DocumentStore> DrillBook<S> {
    /// Load drills from `store`.
    ///
    /// When nothing usable is stored the default drills are seeded and saved.
    pub fn open(store: S) -> Self {
        let (tasks, source) =
            documents::load_with_source(&store, DocumentKey::Drills, default_drills);
        let book = Self { store, tasks };
        if source.is_fallback() {
            info!(
                count = book.tasks.len(),
                repaired = source == LoadSource::Repaired,
                "Seeded default drills"
            );
            book.persist();
        }
        book
    }

    /// Every drill, in stored order.
    #[must_use]
    pub fn tasks(&self) -> &[DrillTask] {
        &self.tasks
    }

    /// Look up a drill by id.
    #[must_use]
    pub fn task(&self, id: &str) -> Option<&DrillTask> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Drills due on `today`, in stored order.
    #[must_use]
    pub fn due_tasks(&self, today: NaiveDate) -> Vec<&DrillTask> {
        self.tasks.iter().filter(|t| is_due(t, today)).collect()
    }

    /// Whole days since `task` was last performed.
    #[must_use]
    pub fn days_since(&self, task: &DrillTask, today: NaiveDate) -> Option<i64> {
        schedule::days_since(task, today)
    }

    /// Start a session for drill `id`.
    #[must_use]
    pub fn start(&self, id: &str) -> Option<DrillSession> {
        let task = self.task(id)?;
        debug!(id, title = %task.title, "Drill started");
        Some(DrillSession::new(task.clone()))
    }

    /// Finish `session`, recording `today` as the drill's last run.
    ///
    /// # Errors
    ///
    /// Hands the session back unchanged if not every step is checked.
    pub fn complete(
        &mut self,
        mut session: DrillSession,
        today: NaiveDate,
    ) -> Result<SessionOutcome, DrillSession> {
        if !session.can_complete() {
            return Err(session);
        }
        session.stop();

        let task_id = session.task().id.clone();
        match self.tasks.iter_mut().find(|t| t.id == task_id) {
            Some(task) => task.last_performed = Some(today),
            None => debug!(id = %task_id, "Completed drill no longer exists"),
        }
        self.persist();

        info!(
            id = %task_id,
            elapsed = session.elapsed_seconds(),
            "Drill completed"
        );
        Ok(SessionOutcome::Completed {
            task_id,
            performed_on: today,
            elapsed_seconds: session.elapsed_seconds(),
        })
    }

    /// Abandon `session`. Nothing is stored.
    pub fn cancel(&self, mut session: DrillSession) -> SessionOutcome {
        session.stop();
        debug!(id = %session.task().id, "Drill cancelled");
        SessionOutcome::Cancelled {
            task_id: session.task().id.clone(),
            elapsed_seconds: session.elapsed_seconds(),
        }
    }

    /// Give back the store.
    pub fn into_store(self) -> S {
        self.store
    }

    fn persist(&self) {
        documents::save(&self.store, DocumentKey::Drills, &self.tasks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 15).unwrap()
    }

    #[test]
    fn test_defaults() {
        let drills = default_drills();
        let shape: Vec<_> = drills
            .iter()
            .map(|d| (d.id.as_str(), d.frequency_days.get(), d.steps.len()))
            .collect();
        assert_eq!(
            shape,
            vec![("1", 180, 5), ("2", 90, 5), ("3", 180, 5), ("4", 365, 6)]
        );
        assert!(drills.iter().all(|d| d.last_performed.is_none()));
    }

    #[test]
    fn test_first_open_seeds_and_saves() {
        let book = DrillBook::open(MemoryStore::new());
        assert_eq!(book.tasks().len(), 4);
        assert_eq!(book.due_tasks(today()).len(), 4);

        let store = book.into_store();
        assert_eq!(store.save_count(), 1);
        assert!(store.raw(DocumentKey::Drills).is_some());
    }

    #[test]
    fn test_stored_drills_are_kept() {
        let raw = r#"[{"id":"x","title":"Custom","frequencyDays":7,"lastPerformed":"2025-03-10","steps":["a"]}]"#;
        let book = DrillBook::open(MemoryStore::with_document(DocumentKey::Drills, raw));

        assert_eq!(book.tasks().len(), 1);
        let task = book.task("x").unwrap();
        assert_eq!(book.days_since(task, today()), Some(5));
        assert!(book.due_tasks(today()).is_empty());
        assert_eq!(book.into_store().save_count(), 0);
    }

    #[test]
    fn test_zero_frequency_is_corrupt() {
        let raw = r#"[{"id":"x","title":"Bad","frequencyDays":0,"lastPerformed":null,"steps":[]}]"#;
        let book = DrillBook::open(MemoryStore::with_document(DocumentKey::Drills, raw));
        assert_eq!(book.tasks(), default_drills().as_slice());
    }

    #[test]
    fn test_start_unknown_drill() {
        let book = DrillBook::open(MemoryStore::new());
        assert!(book.start("nope").is_none());
    }

    #[test]
    fn test_incomplete_session_is_handed_back() {
        let mut book = DrillBook::open(MemoryStore::new());
        let mut session = book.start("2").unwrap();
        session.toggle_step(0);

        let session = book.complete(session, today()).unwrap_err();
        assert!(session.is_running());
        assert!(session.is_checked(0));
        assert!(book.task("2").unwrap().last_performed.is_none());
    }

    #[test]
    fn test_complete_records_today() {
        let mut book = DrillBook::open(MemoryStore::new());
        let mut session = book.start("1").unwrap();
        for i in 0..5 {
            session.toggle_step(i);
        }
        session.tick();

        let outcome = book.complete(session, today()).unwrap();
        assert_eq!(
            outcome,
            SessionOutcome::Completed {
                task_id: "1".to_string(),
                performed_on: today(),
                elapsed_seconds: 1,
            }
        );
        assert_eq!(book.task("1").unwrap().last_performed, Some(today()));
        assert!(!is_due(book.task("1").unwrap(), today()));

        let store = book.into_store();
        assert_eq!(store.save_count(), 2);
        assert!(store
            .raw(DocumentKey::Drills)
            .unwrap()
            .contains(r#""lastPerformed":"2025-03-15""#));
    }

    #[test]
    fn test_cancel_saves_nothing() {
        let book = DrillBook::open(MemoryStore::new());
        let mut session = book.start("3").unwrap();
        session.toggle_step(0);

        let outcome = book.cancel(session);
        assert!(!outcome.is_completed());
        assert_eq!(book.into_store().save_count(), 1);
    }
}
