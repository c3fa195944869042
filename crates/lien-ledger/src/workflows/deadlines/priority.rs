use chrono::NaiveDate;

use super::domain::Priority;

/// Read-time urgency of a deadline. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivedPriority {
    pub days_remaining: i64,
    pub effective_priority: Priority,
}

/// Computes days remaining and the effective priority as of `today`.
///
/// A manual priority other than `normal` always wins; `normal` is the default and is
/// treated the same as no override.
pub fn derive(
    deadline_date: NaiveDate,
    manual: Option<Priority>,
    today: NaiveDate,
) -> DerivedPriority {
    let days_remaining = (deadline_date - today).num_days();

    let effective_priority = match manual {
        Some(priority) if priority != Priority::Normal => priority,
        _ => tier(days_remaining),
    };

    DerivedPriority {
        days_remaining,
        effective_priority,
    }
}

fn tier(days_remaining: i64) -> Priority {
    match days_remaining {
        days if days <= 7 => Priority::Critical,
        days if days <= 14 => Priority::High,
        days if days <= 30 => Priority::Normal,
        _ => Priority::Low,
    }
}
