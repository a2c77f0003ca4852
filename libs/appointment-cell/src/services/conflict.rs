use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use doctor_cell::repository::DoctorRepository;
use doctor_cell::services::availability::is_within_schedule;

use crate::models::{window_end, AppointmentError, AppointmentStatus, Availability, BookingRules};
use crate::repository::AppointmentRepository;

/// Statuses that occupy a doctor's time. Cancelled, completed and no-show
/// appointments never block a booking.
pub const BLOCKING_STATUSES: [AppointmentStatus; 2] =
    [AppointmentStatus::Requested, AppointmentStatus::Confirmed];

/// Half-open interval overlap. Touching intervals do not overlap.
pub fn intervals_overlap(
    start1: DateTime<Utc>,
    end1: DateTime<Utc>,
    start2: DateTime<Utc>,
    end2: DateTime<Utc>,
) -> bool {
    start1 < end2 && end1 > start2
}

pub struct ConflictDetectionService {
    appointments: Arc<dyn AppointmentRepository>,
    doctors: Arc<dyn DoctorRepository>,
    rules: BookingRules,
}

impl ConflictDetectionService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        doctors: Arc<dyn DoctorRepository>,
        rules: BookingRules,
    ) -> Self {
        Self {
            appointments,
            doctors,
            rules,
        }
    }

    /// True if a blocking appointment of `doctor_id` other than `exclude_id`
    /// overlaps `[start, start + duration)`. Query failures are returned as
    /// errors, never as "no conflict".
    pub async fn has_conflict(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: i32,
        exclude_id: Option<Uuid>,
    ) -> Result<bool, AppointmentError> {
        let end = window_end(start, duration_minutes).ok_or_else(|| {
            AppointmentError::InvalidDuration(format!("{} minutes", duration_minutes))
        })?;

        let conflicting = self
            .appointments
            .find_conflicting(doctor_id, &BLOCKING_STATUSES, start, end, exclude_id)
            .await?;

        if let Some(existing) = &conflicting {
            debug!(
                "Window {} - {} for doctor {} overlaps appointment {}",
                start, end, doctor_id, existing.id
            );
        }
        Ok(conflicting.is_some())
    }

    /// Composite check used before every booking write: the window must fit
    /// one of the doctor's working blocks and must not overlap a blocking
    /// appointment.
    pub async fn check_doctor_availability(
        &self,
        doctor_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: i32,
        exclude_id: Option<Uuid>,
    ) -> Result<Availability, AppointmentError> {
        let schedule = self
            .doctors
            .get_schedule(doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        let local_start = start.with_timezone(&self.rules.clinic_offset).naive_local();
        if !is_within_schedule(&schedule, local_start, i64::from(duration_minutes)) {
            warn!(
                "Requested {} ({} min) is outside working hours of doctor {}",
                local_start, duration_minutes, doctor_id
            );
            return Ok(Availability::OutsideWorkingHours);
        }

        if self
            .has_conflict(doctor_id, start, duration_minutes, exclude_id)
            .await?
        {
            warn!("Conflict detected for doctor {} at {}", doctor_id, start);
            return Ok(Availability::SlotTaken);
        }

        Ok(Availability::Available)
    }
}
