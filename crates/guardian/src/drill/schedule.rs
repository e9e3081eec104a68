//! Due-date arithmetic for recurring drills.
//!
//! Everything here is a pure function of the task and the caller's notion of
//! today. Sorting and filtering due tasks is left to callers.

use chrono::{Days, NaiveDate};

use super::DrillTask;

/// Where a drill stands relative to its interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrillStatus {
    /// Never performed.
    Never,
    /// Due now. `overdue_days` is 0 on the day it falls due.
    Due {
        /// Days past the due date.
        overdue_days: i64,
    },
    /// Performed recently enough.
    Upcoming {
        /// Days until the drill falls due.
        days_left: i64,
    },
}

impl DrillStatus {
    /// Whether the drill should be performed now.
    #[must_use]
    pub fn is_due(self) -> bool {
        !matches!(self, Self::Upcoming { .. })
    }
}

/// Whole days between the last performance and `today`.
///
/// `None` if the drill was never performed.
#[must_use]
pub fn days_since(task: &DrillTask, today: NaiveDate) -> Option<i64> {
    task.last_performed
        .map(|last| today.signed_duration_since(last).num_days())
}

/// Whether `task` is due on `today`.
#[must_use]
pub fn is_due(task: &DrillTask, today: NaiveDate) -> bool {
    match days_since(task, today) {
        None => true,
        Some(days) => days >= i64::from(task.frequency_days.get()),
    }
}

/// Detailed status of `task` on `today`.
#[must_use]
pub fn status(task: &DrillTask, today: NaiveDate) -> DrillStatus {
    let Some(days) = days_since(task, today) else {
        return DrillStatus::Never;
    };
    let frequency = i64::from(task.frequency_days.get());
    if days >= frequency {
        DrillStatus::Due {
            overdue_days: days - frequency,
        }
    } else {
        DrillStatus::Upcoming {
            days_left: frequency - days,
        }
    }
}

/// The date the drill next falls due, if it was ever performed.
#[must_use]
pub fn next_due_date(task: &DrillTask) -> Option<NaiveDate> {
    task.last_performed
        .and_then(|last| last.checked_add_days(Days::new(u64::from(task.frequency_days.get()))))
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroU32;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn task(frequency: u32, last: Option<NaiveDate>) -> DrillTask {
        DrillTask {
            id: "t".to_string(),
            title: "Test".to_string(),
            frequency_days: NonZeroU32::new(frequency).unwrap(),
            last_performed: last,
            steps: vec![],
        }
    }

    #[test]
    fn test_never_performed_is_always_due() {
        let t = task(180, None);
        for today in [date(1970, 1, 1), date(2024, 2, 29), date(2100, 12, 31)] {
            assert!(is_due(&t, today));
        }
        assert_eq!(status(&t, date(2025, 1, 1)), DrillStatus::Never);
        assert_eq!(days_since(&t, date(2025, 1, 1)), None);
    }

    #[test]
    fn test_due_exactly_at_frequency() {
        let last = date(2025, 1, 10);
        let t = task(180, Some(last));

        let day_179 = last.checked_add_days(Days::new(179)).unwrap();
        let day_180 = last.checked_add_days(Days::new(180)).unwrap();

        assert!(!is_due(&t, day_179));
        assert!(is_due(&t, day_180));
        assert_eq!(status(&t, day_179), DrillStatus::Upcoming { days_left: 1 });
        assert_eq!(status(&t, day_180), DrillStatus::Due { overdue_days: 0 });
    }

    #[test]
    fn test_performed_today_is_not_due() {
        let today = date(2025, 6, 1);
        let t = task(90, Some(today));
        assert!(!is_due(&t, today));
        assert_eq!(days_since(&t, today), Some(0));
    }

    #[test]
    fn test_overdue_days() {
        let t = task(30, Some(date(2025, 1, 1)));
        assert_eq!(
            status(&t, date(2025, 3, 2)),
            DrillStatus::Due { overdue_days: 30 }
        );
        assert!(status(&t, date(2025, 3, 2)).is_due());
    }

    #[test]
    fn test_next_due_date() {
        let t = task(90, Some(date(2025, 1, 1)));
        assert_eq!(next_due_date(&t), Some(date(2025, 4, 1)));
        assert_eq!(next_due_date(&task(90, None)), None);
    }
}
