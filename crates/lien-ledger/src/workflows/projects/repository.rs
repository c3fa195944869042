use super::domain::{NewProject, Project, ProjectId};
use crate::workflows::RepositoryError;

/// Storage abstraction for projects.
pub trait ProjectRepository: Send + Sync {
    fn insert(&self, project: NewProject) -> Result<Project, RepositoryError>;
    fn fetch(&self, id: ProjectId) -> Result<Option<Project>, RepositoryError>;
    fn list(&self, user_id: &str) -> Result<Vec<Project>, RepositoryError>;
    /// Removes the project and detaches its deadlines and invoices. Returns `false`
    /// when nothing was deleted.
    fn delete(&self, id: ProjectId) -> Result<bool, RepositoryError>;
}
