use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::DatabaseError;
use shared_models::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub specialty: String,
    /// Recurring weekly working blocks. Replaced wholesale on update.
    #[serde(default)]
    pub schedule: Vec<WeeklyAvailabilityBlock>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One recurring working block, stored as
/// `{ "dayOfWeek": 0-6, "startTime": "HH:MM", "endTime": "HH:MM" }`.
///
/// Times stay as the stored strings; a block that does not parse simply never
/// matches during evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAvailabilityBlock {
    /// 0 = Sunday .. 6 = Saturday.
    pub day_of_week: i32,
    pub start_time: String,
    pub end_time: String,
}

impl WeeklyAvailabilityBlock {
    pub fn new(day_of_week: i32, start_time: &str, end_time: &str) -> Self {
        Self {
            day_of_week,
            start_time: start_time.to_string(),
            end_time: end_time.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateScheduleRequest {
    pub schedule: Vec<WeeklyAvailabilityBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorScheduleResponse {
    pub doctor_id: Uuid,
    pub schedule: Vec<WeeklyAvailabilityBlock>,
}

#[derive(Debug, thiserror::Error)]
pub enum DoctorError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("Unauthorized access to doctor data")]
    Unauthorized,

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound(err.to_string()),
            DoctorError::InvalidSchedule(_) => AppError::ValidationError(err.to_string()),
            DoctorError::Unauthorized => AppError::Forbidden(err.to_string()),
            DoctorError::Database(DatabaseError::NotFound) => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::Database(e) => AppError::Database(e.to_string()),
        }
    }
}
