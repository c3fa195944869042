use chrono::{Days, NaiveDate};
use serde::Serialize;

use super::domain::{DeadlineType, ProjectType, TriggerEvent};
use super::rules::LienRuleTable;

/// Concrete deadline produced by applying a lien rule to a trigger date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineCalculation {
    pub deadline_type: DeadlineType,
    pub project_type: ProjectType,
    pub trigger_date: NaiveDate,
    pub deadline_date: NaiveDate,
    pub deadline_days: u32,
    pub description: String,
    pub trigger_event: TriggerEvent,
    pub statutory_reference: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalculationError {
    #[error("no lien rule for {deadline_type} on {project_type} projects")]
    NoMatchingRule {
        deadline_type: DeadlineType,
        project_type: ProjectType,
    },
    #[error("{trigger_date} plus {days} days is outside the supported calendar")]
    DateOutOfRange { trigger_date: NaiveDate, days: u32 },
}

/// Applies the unique rule for `(deadline_type, project_type)` to `trigger_date`.
///
/// Dates are calendar dates: the result is exactly `deadline_days` days later with no
/// business-day or timezone adjustment.
pub fn calculate(
    table: &LienRuleTable,
    deadline_type: DeadlineType,
    trigger_date: NaiveDate,
    project_type: ProjectType,
) -> Result<DeadlineCalculation, CalculationError> {
    let rule = table.lookup(deadline_type, project_type).ok_or(
        CalculationError::NoMatchingRule {
            deadline_type,
            project_type,
        },
    )?;

    let deadline_date = trigger_date
        .checked_add_days(Days::new(u64::from(rule.deadline_days)))
        .ok_or(CalculationError::DateOutOfRange {
            trigger_date,
            days: rule.deadline_days,
        })?;

    Ok(DeadlineCalculation {
        deadline_type,
        project_type,
        trigger_date,
        deadline_date,
        deadline_days: rule.deadline_days,
        description: rule.description.clone(),
        trigger_event: rule.trigger_event,
        statutory_reference: rule.statutory_reference.clone(),
    })
}
