use chrono::NaiveDate;
use serde::Serialize;

use super::calculator::{calculate, CalculationError};
use super::domain::{DeadlineType, NewDeadline, Priority, ProjectType};
use super::rules::LienRuleTable;
use crate::workflows::projects::ProjectId;

/// Standard deadline derived from a project's work window, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlinePlan {
    pub deadline_type: DeadlineType,
    pub deadline_date: NaiveDate,
    pub trigger_date: NaiveDate,
    pub title: String,
    pub description: String,
    pub priority: Priority,
}

impl DeadlinePlan {
    pub fn into_new_deadline(self, user_id: &str, project_id: Option<ProjectId>) -> NewDeadline {
        NewDeadline {
            user_id: user_id.to_string(),
            project_id,
            deadline_type: self.deadline_type,
            deadline_date: self.deadline_date,
            trigger_date: Some(self.trigger_date),
            title: self.title,
            description: Some(self.description),
            priority: Some(self.priority),
        }
    }
}

/// Plans the statutory deadlines for a project.
///
/// Private projects with a start date get a preliminary notice. Any project with an
/// end date gets the lien (private) or bond claim (public) deadline. Offsets come from
/// the rule table, so the plan always agrees with [`calculate`].
pub fn plan_project_deadlines(
    table: &LienRuleTable,
    project_type: ProjectType,
    work_start: Option<NaiveDate>,
    work_end: Option<NaiveDate>,
) -> Result<Vec<DeadlinePlan>, CalculationError> {
    let mut plans = Vec::with_capacity(2);

    if let (ProjectType::Private, Some(start)) = (project_type, work_start) {
        plans.push(plan(
            table,
            DeadlineType::PreliminaryNotice,
            start,
            project_type,
            Priority::High,
        )?);
    }

    if let Some(end) = work_end {
        let claim_type = match project_type {
            ProjectType::Private => DeadlineType::MechanicsLien,
            ProjectType::Public => DeadlineType::PaymentBondClaim,
        };
        plans.push(plan(table, claim_type, end, project_type, Priority::Critical)?);
    }

    Ok(plans)
}

fn plan(
    table: &LienRuleTable,
    deadline_type: DeadlineType,
    trigger_date: NaiveDate,
    project_type: ProjectType,
    priority: Priority,
) -> Result<DeadlinePlan, CalculationError> {
    let calculation = calculate(table, deadline_type, trigger_date, project_type)?;
    Ok(DeadlinePlan {
        deadline_type,
        deadline_date: calculation.deadline_date,
        trigger_date,
        title: deadline_type.title().to_string(),
        description: calculation.description,
        priority,
    })
}
