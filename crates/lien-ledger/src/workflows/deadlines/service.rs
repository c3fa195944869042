use std::sync::Arc;

use chrono::{Days, NaiveDate};
use tracing::{info, warn};

use super::calculator::{calculate, CalculationError, DeadlineCalculation};
use super::domain::{
    AutoCreateRequest, CalculationRequest, Deadline, DeadlineId, DeadlinePatch, DeadlineQuery,
    DeadlineStatus, DeadlineView, NewDeadline, ProjectType,
};
use super::generator::{plan_project_deadlines, DeadlinePlan};
use super::priority::derive;
use super::repository::DeadlineRepository;
use super::rules::LienRuleTable;
use crate::clock::Clock;
use crate::workflows::projects::{Project, ProjectId, ProjectRepository};
use crate::workflows::{require_text, RepositoryError, ValidationError};

/// Service composing the lien rule table, deadline storage, and the read-time clock.
pub struct DeadlineService<R, P> {
    repository: Arc<R>,
    projects: Arc<P>,
    rules: Arc<LienRuleTable>,
    clock: Arc<dyn Clock>,
}

impl<R, P> DeadlineService<R, P>
where
    R: DeadlineRepository + 'static,
    P: ProjectRepository + 'static,
{
    /// Loads the seeded rule table from storage.
    pub fn new(
        repository: Arc<R>,
        projects: Arc<P>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, DeadlineServiceError> {
        let rules = repository.lien_rules()?;
        let rules = if rules.is_empty() {
            warn!("lien rule table is empty; falling back to the standard rule set");
            LienRuleTable::standard()
        } else {
            LienRuleTable::from_rules(rules)
        };
        Ok(Self::with_rules(repository, projects, rules, clock))
    }

    pub fn with_rules(
        repository: Arc<R>,
        projects: Arc<P>,
        rules: LienRuleTable,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            projects,
            rules: Arc::new(rules),
            clock,
        }
    }

    pub fn rules(&self) -> &LienRuleTable {
        &self.rules
    }

    pub fn calculate(
        &self,
        request: CalculationRequest,
    ) -> Result<DeadlineCalculation, DeadlineServiceError> {
        let calculation = calculate(
            &self.rules,
            request.deadline_type,
            request.trigger_date,
            request.project_type,
        )?;
        Ok(calculation)
    }

    pub fn plan(
        &self,
        project_type: ProjectType,
        work_start: Option<NaiveDate>,
        work_end: Option<NaiveDate>,
    ) -> Result<Vec<DeadlinePlan>, DeadlineServiceError> {
        Ok(plan_project_deadlines(
            &self.rules,
            project_type,
            work_start,
            work_end,
        )?)
    }

    /// Generates and persists the standard deadlines for a project's work window.
    pub fn auto_create(
        &self,
        request: AutoCreateRequest,
    ) -> Result<Vec<Deadline>, DeadlineServiceError> {
        require_text("userId", &request.user_id)?;

        let project = match request.project_id {
            Some(id) => Some(self.owned_project(id, &request.user_id)?),
            None => None,
        };

        let work_start = request
            .work_start_date
            .or_else(|| project.as_ref().and_then(|p| p.work_start_date));
        let work_end = request
            .work_end_date
            .or_else(|| project.as_ref().and_then(|p| p.work_end_date));
        let project_type = request
            .project_type
            .or_else(|| project.as_ref().map(|p| p.project_type))
            .unwrap_or_default();

        let plans = self.plan(project_type, work_start, work_end)?;
        if plans.is_empty() {
            return Ok(Vec::new());
        }

        let drafts = plans
            .into_iter()
            .map(|plan| plan.into_new_deadline(&request.user_id, request.project_id))
            .collect();
        let created = self.repository.insert_all(drafts)?;

        info!(
            user_id = %request.user_id,
            project_id = ?request.project_id.map(|id| id.0),
            count = created.len(),
            "standard deadlines generated"
        );
        Ok(created)
    }

    pub fn create(&self, deadline: NewDeadline) -> Result<DeadlineView, DeadlineServiceError> {
        require_text("userId", &deadline.user_id)?;
        require_text("title", &deadline.title)?;
        if let Some(project_id) = deadline.project_id {
            self.owned_project(project_id, &deadline.user_id)?;
        }

        let stored = self.repository.insert(deadline)?;
        info!(
            deadline_id = stored.id.0,
            deadline_type = %stored.deadline_type,
            "deadline created"
        );
        Ok(self.view(stored))
    }

    pub fn get(&self, id: DeadlineId) -> Result<DeadlineView, DeadlineServiceError> {
        let deadline = self.fetch(id)?;
        Ok(self.view(deadline))
    }

    /// Lists a user's deadlines, soonest first, with days remaining and priority
    /// derived as of today.
    pub fn list(
        &self,
        user_id: &str,
        status: Option<DeadlineStatus>,
    ) -> Result<Vec<DeadlineView>, DeadlineServiceError> {
        require_text("userId", user_id)?;
        let query = DeadlineQuery {
            status,
            ..DeadlineQuery::for_user(user_id)
        };
        let deadlines = self.repository.list(&query)?;
        Ok(deadlines.into_iter().map(|d| self.view(d)).collect())
    }

    /// Pending deadlines falling within `within_days` of today, overdue ones included.
    pub fn upcoming(
        &self,
        user_id: &str,
        within_days: u32,
    ) -> Result<Vec<DeadlineView>, DeadlineServiceError> {
        require_text("userId", user_id)?;
        let horizon = self
            .clock
            .today()
            .checked_add_days(Days::new(u64::from(within_days)))
            .ok_or_else(|| ValidationError(format!("days window {within_days} is too large")))?;
        let query = DeadlineQuery {
            status: Some(DeadlineStatus::Pending),
            due_on_or_before: Some(horizon),
            ..DeadlineQuery::for_user(user_id)
        };
        let deadlines = self.repository.list(&query)?;
        Ok(deadlines.into_iter().map(|d| self.view(d)).collect())
    }

    /// Applies a partial update. Status changes keep `completed_date` in step with
    /// the completed status; the read and write happen in one storage transaction.
    pub fn update(
        &self,
        id: DeadlineId,
        patch: DeadlinePatch,
    ) -> Result<DeadlineView, DeadlineServiceError> {
        if let Some(title) = &patch.title {
            require_text("title", title)?;
        }

        let stored = self
            .repository
            .update(id, &patch, self.clock.today())
            .map_err(|err| match err {
                RepositoryError::Rejected(message) => {
                    DeadlineServiceError::Validation(ValidationError(message))
                }
                other => DeadlineServiceError::from(other),
            })?;
        info!(deadline_id = stored.id.0, status = %stored.status, "deadline updated");
        Ok(self.view(stored))
    }

    pub fn complete(
        &self,
        id: DeadlineId,
        completed_on: Option<NaiveDate>,
    ) -> Result<DeadlineView, DeadlineServiceError> {
        self.update(
            id,
            DeadlinePatch {
                status: Some(DeadlineStatus::Completed),
                completed_date: completed_on,
                ..DeadlinePatch::default()
            },
        )
    }

    pub fn delete(&self, id: DeadlineId) -> Result<(), DeadlineServiceError> {
        if !self.repository.delete(id)? {
            return Err(RepositoryError::NotFound.into());
        }
        info!(deadline_id = id.0, "deadline deleted");
        Ok(())
    }

    fn fetch(&self, id: DeadlineId) -> Result<Deadline, DeadlineServiceError> {
        let deadline = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(deadline)
    }

    /// Resolves a project and hides projects belonging to other users.
    fn owned_project(
        &self,
        id: ProjectId,
        user_id: &str,
    ) -> Result<Project, DeadlineServiceError> {
        match self.projects.fetch(id)? {
            Some(project) if project.user_id == user_id => Ok(project),
            _ => Err(DeadlineServiceError::ProjectNotFound(id.0)),
        }
    }

    fn view(&self, deadline: Deadline) -> DeadlineView {
        let derived = derive(deadline.deadline_date, deadline.priority, self.clock.today());
        DeadlineView {
            deadline,
            days_remaining: derived.days_remaining,
            calculated_priority: derived.effective_priority,
        }
    }
}

/// Error raised by the deadline service.
#[derive(Debug, thiserror::Error)]
pub enum DeadlineServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Calculation(#[from] CalculationError),
    #[error("project {0} not found")]
    ProjectNotFound(i64),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
