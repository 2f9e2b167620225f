use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub id: String,
    pub course_id: String,
    pub student_id: String,
    pub status: EnrollmentStatus,
    pub cancel_request: bool,
    pub cancel_request_at: Option<DateTime<Utc>>,
    pub enrolled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEnrollmentRequest {
    pub course_id: String,
    pub student_id: String,
}

/// Admin decision on a pending cancel request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CancelAction {
    Approve,
    Reject,
}

impl std::str::FromStr for CancelAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approve" => Ok(CancelAction::Approve),
            "reject" => Ok(CancelAction::Reject),
            other => Err(format!("Invalid action: {}", other)),
        }
    }
}
