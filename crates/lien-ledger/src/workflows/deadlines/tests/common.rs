use std::sync::Arc;

use axum::body::to_bytes;
use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::clock::FixedClock;
use crate::store::SqliteStore;
use crate::workflows::deadlines::{
    Deadline, DeadlineId, DeadlinePatch, DeadlineQuery, DeadlineRepository, DeadlineService,
    DeadlineType, LienRule, LienRuleTable, NewDeadline, ProjectType,
};
use crate::workflows::projects::{NewProject, Project, ProjectRepository};
use crate::workflows::RepositoryError;

pub(super) type StoreService = DeadlineService<SqliteStore, SqliteStore>;

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn today() -> NaiveDate {
    date(2025, 10, 1)
}

pub(super) fn build_service() -> (StoreService, Arc<SqliteStore>) {
    let store = Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    let service = DeadlineService::new(
        store.clone(),
        store.clone(),
        Arc::new(FixedClock(today())),
    )
    .expect("rules load");
    (service, store)
}

pub(super) fn new_deadline(user_id: &str, deadline_date: NaiveDate) -> NewDeadline {
    NewDeadline {
        user_id: user_id.to_string(),
        project_id: None,
        deadline_type: DeadlineType::Custom,
        deadline_date,
        trigger_date: None,
        title: "Submit conditional waiver".to_string(),
        description: None,
        priority: None,
    }
}

pub(super) fn insert_project(
    store: &SqliteStore,
    user_id: &str,
    project_type: ProjectType,
    work_start_date: Option<NaiveDate>,
    work_end_date: Option<NaiveDate>,
) -> Project {
    ProjectRepository::insert(
        store,
        NewProject {
            user_id: user_id.to_string(),
            name: "Harbor View Medical Office".to_string(),
            project_type,
            work_start_date,
            work_end_date,
        },
    )
    .expect("project stored")
}

pub(super) async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Repository whose every call fails as if the database were gone.
pub(super) struct UnavailableRepository;

impl DeadlineRepository for UnavailableRepository {
    fn lien_rules(&self) -> Result<Vec<LienRule>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert(&self, _deadline: NewDeadline) -> Result<Deadline, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn insert_all(&self, _deadlines: Vec<NewDeadline>) -> Result<Vec<Deadline>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: DeadlineId) -> Result<Option<Deadline>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self, _query: &DeadlineQuery) -> Result<Vec<Deadline>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(
        &self,
        _id: DeadlineId,
        _patch: &DeadlinePatch,
        _today: NaiveDate,
    ) -> Result<Deadline, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: DeadlineId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) fn unavailable_service() -> DeadlineService<UnavailableRepository, SqliteStore> {
    DeadlineService::with_rules(
        Arc::new(UnavailableRepository),
        Arc::new(SqliteStore::open_in_memory().expect("in-memory store")),
        LienRuleTable::standard(),
        Arc::new(FixedClock(today())),
    )
}
