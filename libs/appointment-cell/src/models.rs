// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, Offset, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::DatabaseError;
use shared_models::error::AppError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub doctor_id: Uuid,
    /// Staff member or admin who booked on the patient's behalf.
    pub scheduled_by: Option<Uuid>,
    pub appointment_time: DateTime<Utc>,
    /// Always `appointment_time + duration_minutes`; stored so the database can
    /// index and constrain the booked interval.
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub cancellation_reason: Option<String>,
    pub completion_notes: Option<String>,
    #[serde(default)]
    pub is_deleted: bool,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    /// Half-open `[start, end)` interval occupied by this appointment.
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.appointment_time, self.end_time)
    }
}

/// End of a booking window, `None` if the duration does not fit a timestamp.
pub fn window_end(start: DateTime<Utc>, duration_minutes: i32) -> Option<DateTime<Utc>> {
    TimeDelta::try_minutes(i64::from(duration_minutes))
        .and_then(|duration| start.checked_add_signed(duration))
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Requested,
    Confirmed,
    Cancelled,
    Completed,
    NoShow,
}

impl AppointmentStatus {
    /// Statuses that hold a slot on the doctor's calendar.
    pub fn is_blocking(&self) -> bool {
        matches!(self, AppointmentStatus::Requested | AppointmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Cancelled | AppointmentStatus::Completed)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentStatus::Requested => write!(f, "requested"),
            AppointmentStatus::Confirmed => write!(f, "confirmed"),
            AppointmentStatus::Cancelled => write!(f, "cancelled"),
            AppointmentStatus::Completed => write!(f, "completed"),
            AppointmentStatus::NoShow => write!(f, "no_show"),
        }
    }
}

/// Field changes applied by `AppointmentRepository::update`. `None` leaves a
/// column untouched.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AppointmentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appointment_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completion_notes: Option<String>,
    pub updated_by: Uuid,
}

impl AppointmentPatch {
    pub fn new(updated_by: Uuid) -> Self {
        Self {
            updated_by,
            ..Self::default()
        }
    }

    pub fn has_changes(&self) -> bool {
        self.appointment_time.is_some()
            || self.duration_minutes.is_some()
            || self.status.is_some()
            || self.reason.is_some()
            || self.cancellation_reason.is_some()
            || self.completion_notes.is_some()
    }

    /// Applies the patch to an in-memory copy.
    pub fn apply_to(&self, appointment: &mut Appointment) {
        if let Some(appointment_time) = self.appointment_time {
            appointment.appointment_time = appointment_time;
        }
        if let Some(end_time) = self.end_time {
            appointment.end_time = end_time;
        }
        if let Some(duration_minutes) = self.duration_minutes {
            appointment.duration_minutes = duration_minutes;
        }
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if let Some(reason) = &self.reason {
            appointment.reason = Some(reason.clone());
        }
        if let Some(cancellation_reason) = &self.cancellation_reason {
            appointment.cancellation_reason = Some(cancellation_reason.clone());
        }
        if let Some(completion_notes) = &self.completion_notes {
            appointment.completion_notes = Some(completion_notes.clone());
        }
        appointment.updated_by = self.updated_by;
        appointment.updated_at = Utc::now();
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    /// Required when staff, admins or doctors book for a patient; patients
    /// always book for themselves.
    pub patient_id: Option<Uuid>,
    pub doctor_id: Uuid,
    /// ISO-8601 instant, e.g. `2030-01-07T10:00:00+07:00`.
    pub appointment_time: String,
    pub duration_minutes: Option<i32>,
    pub reason: Option<String>,
}

/// Generic update. Supplying `appointment_time` or `duration_minutes`
/// reschedules; supplying `status` requests a transition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAppointmentRequest {
    pub appointment_time: Option<String>,
    pub duration_minutes: Option<i32>,
    pub status: Option<AppointmentStatus>,
    pub reason: Option<String>,
    pub cancellation_reason: Option<String>,
    pub completion_notes: Option<String>,
}

impl UpdateAppointmentRequest {
    pub fn reschedules(&self) -> bool {
        self.appointment_time.is_some() || self.duration_minutes.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppointmentSearchQuery {
    pub patient_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsQuery {
    /// `YYYY-MM-DD` in the clinic's calendar.
    pub date: String,
    pub duration: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsResponse {
    pub doctor_id: Uuid,
    pub date: NaiveDate,
    pub duration_minutes: i32,
    /// Free start times as `HH:MM`, ascending.
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityCheckQuery {
    pub doctor_id: Uuid,
    pub appointment_time: String,
    pub duration_minutes: Option<i32>,
    pub exclude_appointment_id: Option<Uuid>,
}

/// Outcome of the composite availability check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    Available,
    OutsideWorkingHours,
    SlotTaken,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityCheckResponse {
    pub doctor_id: Uuid,
    pub appointment_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub available: bool,
    pub availability: Availability,
}

// ==============================================================================
// BOOKING RULES
// ==============================================================================

#[derive(Debug, Clone)]
pub struct BookingRules {
    pub min_duration_minutes: i32,
    pub default_duration_minutes: i32,
    pub slot_increment_minutes: u32,
    /// Calendar used for weekday and wall-clock evaluation.
    pub clinic_offset: FixedOffset,
}

impl Default for BookingRules {
    fn default() -> Self {
        Self {
            min_duration_minutes: 5,
            default_duration_minutes: 30,
            slot_increment_minutes: 15,
            clinic_offset: Utc.fix(),
        }
    }
}

impl BookingRules {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            clinic_offset: config.clinic_offset(),
            ..Self::default()
        }
    }

    pub fn with_offset(clinic_offset: FixedOffset) -> Self {
        Self {
            clinic_offset,
            ..Self::default()
        }
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

/// Caller-facing category of an [`AppointmentError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    Conflict,
    Forbidden,
    Infrastructure,
}

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Appointment not found")]
    NotFound,

    #[error("Doctor not found")]
    DoctorNotFound,

    #[error("Patient not found")]
    PatientNotFound,

    #[error("Invalid appointment time: {0}")]
    InvalidTime(String),

    #[error("Invalid duration: {0}")]
    InvalidDuration(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cannot change status from {from} to {to}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Cannot cancel an appointment that is {0}")]
    CannotCancel(AppointmentStatus),

    #[error("Cannot reschedule an appointment that is {0}")]
    CannotReschedule(AppointmentStatus),

    #[error("Requested time is outside the doctor's working hours")]
    OutsideWorkingHours,

    #[error("Requested time overlaps another booking")]
    SlotUnavailable,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl AppointmentError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppointmentError::NotFound
            | AppointmentError::DoctorNotFound
            | AppointmentError::PatientNotFound
            | AppointmentError::Database(DatabaseError::NotFound) => ErrorKind::NotFound,
            AppointmentError::InvalidTime(_)
            | AppointmentError::InvalidDuration(_)
            | AppointmentError::InvalidDate(_)
            | AppointmentError::ValidationError(_)
            | AppointmentError::InvalidStatusTransition { .. }
            | AppointmentError::CannotCancel(_)
            | AppointmentError::CannotReschedule(_)
            | AppointmentError::Database(DatabaseError::InvalidInput(_)) => ErrorKind::InvalidInput,
            AppointmentError::OutsideWorkingHours
            | AppointmentError::SlotUnavailable
            | AppointmentError::Database(DatabaseError::Conflict(_)) => ErrorKind::Conflict,
            AppointmentError::Forbidden(_)
            | AppointmentError::Database(DatabaseError::Unauthorized) => ErrorKind::Forbidden,
            AppointmentError::Database(_) => ErrorKind::Infrastructure,
        }
    }
}

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::InvalidInput => AppError::BadRequest(message),
            ErrorKind::Conflict => AppError::Conflict(message),
            ErrorKind::Forbidden => AppError::Forbidden(message),
            ErrorKind::Infrastructure => AppError::Database(message),
        }
    }
}
