use std::sync::Arc;

use tracing::info;

use super::domain::{NewProject, Project, ProjectId};
use super::repository::ProjectRepository;
use crate::workflows::{require_text, RepositoryError, ValidationError};

/// Service wrapping project persistence with input validation.
pub struct ProjectService<R> {
    repository: Arc<R>,
}

impl<R> ProjectService<R>
where
    R: ProjectRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn create(&self, project: NewProject) -> Result<Project, ProjectServiceError> {
        require_text("userId", &project.user_id)?;
        require_text("name", &project.name)?;
        if let (Some(start), Some(end)) = (project.work_start_date, project.work_end_date) {
            if end < start {
                return Err(ValidationError(format!(
                    "workEndDate {end} is before workStartDate {start}"
                ))
                .into());
            }
        }

        let stored = self.repository.insert(project)?;
        info!(project_id = stored.id.0, user_id = %stored.user_id, "project created");
        Ok(stored)
    }

    pub fn get(&self, id: ProjectId) -> Result<Project, ProjectServiceError> {
        let project = self
            .repository
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(project)
    }

    pub fn list(&self, user_id: &str) -> Result<Vec<Project>, ProjectServiceError> {
        require_text("userId", user_id)?;
        Ok(self.repository.list(user_id)?)
    }

    pub fn delete(&self, id: ProjectId) -> Result<(), ProjectServiceError> {
        if !self.repository.delete(id)? {
            return Err(RepositoryError::NotFound.into());
        }
        info!(project_id = id.0, "project deleted");
        Ok(())
    }
}

/// Error raised by the project service.
#[derive(Debug, thiserror::Error)]
pub enum ProjectServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use crate::workflows::deadlines::{DeadlineRepository, DeadlineType, NewDeadline, ProjectType};
    use chrono::NaiveDate;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    fn new_project(start: Option<NaiveDate>, end: Option<NaiveDate>) -> NewProject {
        NewProject {
            user_id: "sub-42".to_string(),
            name: "Eastside Library Renovation".to_string(),
            project_type: ProjectType::Public,
            work_start_date: start,
            work_end_date: end,
        }
    }

    #[test]
    fn end_before_start_is_rejected() {
        let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
        let service = ProjectService::new(store);

        let err = service
            .create(new_project(Some(date(2025, 6, 1)), Some(date(2025, 5, 1))))
            .expect_err("inverted window");

        assert!(matches!(err, ProjectServiceError::Validation(_)));
    }

    #[test]
    fn deleting_a_project_detaches_its_deadlines() {
        let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
        let service = ProjectService::new(store.clone());
        let project = service
            .create(new_project(Some(date(2025, 3, 1)), None))
            .expect("created");

        let deadline = DeadlineRepository::insert(
            store.as_ref(),
            NewDeadline {
                user_id: "sub-42".to_string(),
                project_id: Some(project.id),
                deadline_type: DeadlineType::Custom,
                deadline_date: date(2025, 4, 1),
                trigger_date: None,
                title: "Owner walkthrough".to_string(),
                description: None,
                priority: None,
            },
        )
        .expect("deadline stored");

        service.delete(project.id).expect("deleted");

        let detached = DeadlineRepository::fetch(store.as_ref(), deadline.id)
            .expect("fetch")
            .expect("deadline survives");
        assert_eq!(detached.project_id, None);
        assert!(matches!(
            service.get(project.id),
            Err(ProjectServiceError::Repository(RepositoryError::NotFound))
        ));
    }

    #[test]
    fn list_only_returns_the_callers_projects() {
        let store = Arc::new(SqliteStore::open_in_memory().expect("store"));
        let service = ProjectService::new(store);
        service.create(new_project(None, None)).expect("mine");
        service
            .create(NewProject {
                user_id: "other".to_string(),
                ..new_project(None, None)
            })
            .expect("theirs");

        let projects = service.list("sub-42").expect("list");
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].project_type, ProjectType::Public);
    }
}
