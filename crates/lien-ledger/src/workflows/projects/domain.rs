use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::deadlines::ProjectType;

/// Identifier wrapper for persisted projects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub user_id: String,
    pub name: String,
    pub project_type: ProjectType,
    pub work_start_date: Option<NaiveDate>,
    pub work_end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub project_type: ProjectType,
    #[serde(default)]
    pub work_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub work_end_date: Option<NaiveDate>,
}
