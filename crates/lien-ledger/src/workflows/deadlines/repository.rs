use chrono::NaiveDate;

use super::domain::{Deadline, DeadlineId, DeadlinePatch, DeadlineQuery, NewDeadline};
use super::rules::LienRule;
use crate::workflows::RepositoryError;

/// Storage abstraction so the deadline service can be exercised in isolation.
pub trait DeadlineRepository: Send + Sync {
    /// Seeded lien rule rows.
    fn lien_rules(&self) -> Result<Vec<LienRule>, RepositoryError>;
    fn insert(&self, deadline: NewDeadline) -> Result<Deadline, RepositoryError>;
    /// Inserts every deadline or none of them.
    fn insert_all(&self, deadlines: Vec<NewDeadline>) -> Result<Vec<Deadline>, RepositoryError>;
    fn fetch(&self, id: DeadlineId) -> Result<Option<Deadline>, RepositoryError>;
    /// Matching deadlines ordered by deadline date, then id.
    fn list(&self, query: &DeadlineQuery) -> Result<Vec<Deadline>, RepositoryError>;
    /// Reads, patches, and writes one deadline as a single atomic step. A patch the
    /// stored deadline cannot take is `RepositoryError::Rejected`.
    fn update(
        &self,
        id: DeadlineId,
        patch: &DeadlinePatch,
        today: NaiveDate,
    ) -> Result<Deadline, RepositoryError>;
    fn delete(&self, id: DeadlineId) -> Result<bool, RepositoryError>;
}
