use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::projects::ProjectId;
use crate::workflows::ValidationError;

/// Identifier wrapper for persisted deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeadlineId(pub i64);

/// Statutory filing a deadline tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineType {
    PreliminaryNotice,
    MechanicsLien,
    RetainageRelease,
    PaymentBondClaim,
    Custom,
}

text_enum!(DeadlineType, "deadline type", {
    PreliminaryNotice => "preliminary_notice",
    MechanicsLien => "mechanics_lien",
    RetainageRelease => "retainage_release",
    PaymentBondClaim => "payment_bond_claim",
    Custom => "custom",
});

impl DeadlineType {
    pub const fn title(self) -> &'static str {
        match self {
            Self::PreliminaryNotice => "Preliminary Notice Deadline",
            Self::MechanicsLien => "Mechanics Lien Deadline",
            Self::RetainageRelease => "Retainage Release Deadline",
            Self::PaymentBondClaim => "Payment Bond Claim Deadline",
            Self::Custom => "Custom Deadline",
        }
    }
}

/// Ownership class of the improved property; selects which lien rules apply.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ProjectType {
    #[default]
    Private,
    Public,
}

text_enum!(ProjectType, "project type", {
    Private => "private",
    Public => "public",
});

/// Event on the job that starts a statutory countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerEvent {
    FirstFurnishing,
    Completion,
}

text_enum!(TriggerEvent, "trigger event", {
    FirstFurnishing => "first_furnishing",
    Completion => "completion",
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadlineStatus {
    #[default]
    Pending,
    Completed,
    Cancelled,
}

text_enum!(DeadlineStatus, "deadline status", {
    Pending => "pending",
    Completed => "completed",
    Cancelled => "cancelled",
});

/// Urgency tier, either set manually or derived from the days remaining.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    Critical,
}

text_enum!(Priority, "priority", {
    Low => "low",
    Normal => "normal",
    High => "high",
    Critical => "critical",
});

/// Persisted deadline row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: DeadlineId,
    pub user_id: String,
    pub project_id: Option<ProjectId>,
    pub deadline_type: DeadlineType,
    pub deadline_date: NaiveDate,
    pub trigger_date: Option<NaiveDate>,
    pub title: String,
    pub description: Option<String>,
    pub status: DeadlineStatus,
    pub priority: Option<Priority>,
    pub completed_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Deadline {
    /// Moves the deadline into `status`, keeping `completed_date` present exactly when
    /// the status is completed.
    pub fn transition(&mut self, status: DeadlineStatus, completed_on: NaiveDate) {
        match status {
            DeadlineStatus::Completed => {
                if self.status != DeadlineStatus::Completed || self.completed_date.is_none() {
                    self.completed_date = Some(completed_on);
                }
            }
            DeadlineStatus::Pending | DeadlineStatus::Cancelled => self.completed_date = None,
        }
        self.status = status;
    }

    /// Coalesces `patch` into the deadline. A status change stamps `today` unless the
    /// patch names its own completion date.
    pub fn apply_patch(
        &mut self,
        patch: &DeadlinePatch,
        today: NaiveDate,
    ) -> Result<(), ValidationError> {
        if let Some(deadline_type) = patch.deadline_type {
            self.deadline_type = deadline_type;
        }
        if let Some(date) = patch.deadline_date {
            self.deadline_date = date;
        }
        if patch.trigger_date.is_some() {
            self.trigger_date = patch.trigger_date;
        }
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if patch.description.is_some() {
            self.description = patch.description.clone();
        }
        if patch.priority.is_some() {
            self.priority = patch.priority;
        }
        if let Some(status) = patch.status {
            self.transition(status, patch.completed_date.unwrap_or(today));
        }
        if let Some(date) = patch.completed_date {
            if self.status != DeadlineStatus::Completed {
                return Err(ValidationError(
                    "completedDate can only be set on a completed deadline".to_string(),
                ));
            }
            self.completed_date = Some(date);
        }
        Ok(())
    }
}

/// Deadline awaiting insertion. New deadlines always start out pending.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDeadline {
    pub user_id: String,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    pub deadline_type: DeadlineType,
    pub deadline_date: NaiveDate,
    #[serde(default)]
    pub trigger_date: Option<NaiveDate>,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlinePatch {
    #[serde(default)]
    pub deadline_type: Option<DeadlineType>,
    #[serde(default)]
    pub deadline_date: Option<NaiveDate>,
    #[serde(default)]
    pub trigger_date: Option<NaiveDate>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: Option<DeadlineStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub completed_date: Option<NaiveDate>,
}

/// Filter for deadline listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineQuery {
    pub user_id: String,
    pub status: Option<DeadlineStatus>,
    pub due_on_or_before: Option<NaiveDate>,
}

impl DeadlineQuery {
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            status: None,
            due_on_or_before: None,
        }
    }
}

/// Deadline as returned to clients, including values derived at read time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadlineView {
    #[serde(flatten)]
    pub deadline: Deadline,
    pub days_remaining: i64,
    pub calculated_priority: Priority,
}

/// Input to the deadline calculator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRequest {
    pub deadline_type: DeadlineType,
    pub trigger_date: NaiveDate,
    #[serde(default)]
    pub project_type: ProjectType,
}

/// Input to the deadline auto-generator. Dates and type fall back to the stored
/// project when `project_id` is given and the field is absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoCreateRequest {
    pub user_id: String,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub work_start_date: Option<NaiveDate>,
    #[serde(default)]
    pub work_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub project_type: Option<ProjectType>,
}
