// libs/appointment-cell/src/services/booking.rs
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use doctor_cell::repository::{DoctorRepository, SupabaseDoctorRepository};
use doctor_cell::services::availability::{format_clock_time, slot_starts_for_day};
use patient_cell::repository::{PatientRepository, SupabasePatientRepository};
use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};
use shared_models::auth::{Actor, Role};

use crate::models::{
    window_end, Appointment, AppointmentError, AppointmentPatch, AppointmentSearchQuery,
    AppointmentStatus, Availability, AvailabilityCheckQuery, AvailabilityCheckResponse,
    AvailableSlotsResponse, BookAppointmentRequest, BookingRules, UpdateAppointmentRequest,
};
use crate::repository::{AppointmentRepository, SupabaseAppointmentRepository};
use crate::services::conflict::ConflictDetectionService;
use crate::services::lifecycle::AppointmentLifecycleService;

const DEFAULT_SEARCH_LIMIT: i64 = 50;
const MAX_SEARCH_LIMIT: i64 = 200;

pub struct AppointmentBookingService {
    appointments: Arc<dyn AppointmentRepository>,
    doctors: Arc<dyn DoctorRepository>,
    patients: Arc<dyn PatientRepository>,
    conflict_service: ConflictDetectionService,
    lifecycle_service: AppointmentLifecycleService,
    rules: BookingRules,
}

impl AppointmentBookingService {
    pub fn new(
        appointments: Arc<dyn AppointmentRepository>,
        doctors: Arc<dyn DoctorRepository>,
        patients: Arc<dyn PatientRepository>,
        rules: BookingRules,
    ) -> Self {
        let conflict_service =
            ConflictDetectionService::new(appointments.clone(), doctors.clone(), rules.clone());

        Self {
            appointments,
            doctors,
            patients,
            conflict_service,
            lifecycle_service: AppointmentLifecycleService::new(),
            rules,
        }
    }

    /// Supabase-backed service acting with the caller's token.
    pub fn for_request(config: &AppConfig, auth_token: &str) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));

        Self::new(
            Arc::new(SupabaseAppointmentRepository::new(supabase.clone(), auth_token)),
            Arc::new(SupabaseDoctorRepository::new(supabase.clone(), auth_token)),
            Arc::new(SupabasePatientRepository::new(supabase, auth_token)),
            BookingRules::from_config(config),
        )
    }

    // ==========================================================================
    // INPUT VALIDATION
    // ==========================================================================

    fn parse_instant(value: &str) -> Result<DateTime<Utc>, AppointmentError> {
        DateTime::parse_from_rfc3339(value.trim())
            .map(|at| at.with_timezone(&Utc))
            .map_err(|e| AppointmentError::InvalidTime(format!("{:?} is not ISO-8601: {}", value, e)))
    }

    fn parse_future_instant(value: &str) -> Result<DateTime<Utc>, AppointmentError> {
        let at = Self::parse_instant(value)?;
        if at <= Utc::now() {
            return Err(AppointmentError::InvalidTime(format!("{} is not in the future", at)));
        }
        Ok(at)
    }

    fn resolve_duration(&self, requested: Option<i32>) -> Result<i32, AppointmentError> {
        let duration = requested.unwrap_or(self.rules.default_duration_minutes);
        if duration < self.rules.min_duration_minutes {
            return Err(AppointmentError::InvalidDuration(format!(
                "{} minutes is below the minimum of {}",
                duration, self.rules.min_duration_minutes
            )));
        }
        Ok(duration)
    }

    fn end_of(start: DateTime<Utc>, duration_minutes: i32) -> Result<DateTime<Utc>, AppointmentError> {
        window_end(start, duration_minutes).ok_or_else(|| {
            AppointmentError::InvalidDuration(format!("{} minutes", duration_minutes))
        })
    }

    fn require_available(availability: Availability) -> Result<(), AppointmentError> {
        match availability {
            Availability::Available => Ok(()),
            Availability::OutsideWorkingHours => Err(AppointmentError::OutsideWorkingHours),
            Availability::SlotTaken => Err(AppointmentError::SlotUnavailable),
        }
    }

    // ==========================================================================
    // PERSISTENCE HELPERS
    // ==========================================================================

    async fn load(&self, appointment_id: Uuid) -> Result<Appointment, AppointmentError> {
        self.appointments
            .get(appointment_id)
            .await?
            .ok_or(AppointmentError::NotFound)
    }

    /// Writes a patch; a storage-level overlap rejection means another
    /// booking won the race for the slot.
    async fn persist_update(
        &self,
        appointment_id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, AppointmentError> {
        match self.appointments.update(appointment_id, patch).await {
            Ok(appointment) => Ok(appointment),
            Err(DatabaseError::NotFound) => Err(AppointmentError::NotFound),
            Err(DatabaseError::Conflict(detail)) => {
                warn!("Write for appointment {} lost the slot: {}", appointment_id, detail);
                Err(AppointmentError::SlotUnavailable)
            }
            Err(e) => Err(e.into()),
        }
    }

    // ==========================================================================
    // LIFECYCLE OPERATIONS
    // ==========================================================================

    pub async fn book_appointment(
        &self,
        actor: &Actor,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        info!("Booking appointment with doctor {} by {} {}", request.doctor_id, actor.role, actor.id);

        let patient_id = match (actor.role, request.patient_id) {
            (Role::Patient, None) => actor.id,
            (Role::Patient, Some(id)) if id == actor.id => id,
            (Role::Patient, Some(_)) => {
                return Err(AppointmentError::Forbidden(
                    "patients may only book for themselves".to_string(),
                ))
            }
            (Role::Doctor, _) if request.doctor_id != actor.id => {
                return Err(AppointmentError::Forbidden(
                    "doctors may only book into their own calendar".to_string(),
                ))
            }
            (_, Some(id)) => id,
            (_, None) => {
                return Err(AppointmentError::ValidationError(
                    "patient_id is required when booking for a patient".to_string(),
                ))
            }
        };

        let start = Self::parse_future_instant(&request.appointment_time)?;
        let duration = self.resolve_duration(request.duration_minutes)?;
        let end = Self::end_of(start, duration)?;

        if self.patients.get_patient(patient_id).await?.is_none() {
            return Err(AppointmentError::PatientNotFound);
        }

        let availability = self
            .conflict_service
            .check_doctor_availability(request.doctor_id, start, duration, None)
            .await?;
        Self::require_available(availability)?;

        let now = Utc::now();
        let appointment = Appointment {
            id: Uuid::new_v4(),
            patient_id,
            doctor_id: request.doctor_id,
            scheduled_by: actor.role.is_clinic_staff().then_some(actor.id),
            appointment_time: start,
            end_time: end,
            duration_minutes: duration,
            reason: request.reason,
            status: self.lifecycle_service.initial_status(actor.role),
            cancellation_reason: None,
            completion_notes: None,
            is_deleted: false,
            created_by: actor.id,
            updated_by: actor.id,
            created_at: now,
            updated_at: now,
        };

        let appointment = match self.appointments.insert(appointment).await {
            Ok(appointment) => appointment,
            Err(DatabaseError::Conflict(detail)) => {
                warn!("Booking for doctor {} lost the slot: {}", request.doctor_id, detail);
                return Err(AppointmentError::SlotUnavailable);
            }
            Err(e) => return Err(e.into()),
        };

        info!(
            "Appointment {} booked for patient {} with doctor {} ({})",
            appointment.id, appointment.patient_id, appointment.doctor_id, appointment.status
        );
        Ok(appointment)
    }

    /// Generic update: reschedule, reason, and status changes in one call.
    /// A new time is re-validated with the appointment itself excluded from
    /// conflict detection.
    pub async fn update_appointment(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
        request: UpdateAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Updating appointment: {}", appointment_id);

        let current = self.load(appointment_id).await?;
        self.lifecycle_service.ensure_can_modify(actor, &current)?;

        if current.status.is_terminal() {
            return Err(AppointmentError::InvalidStatusTransition {
                from: current.status,
                to: request.status.unwrap_or(current.status),
            });
        }

        let mut patch = AppointmentPatch::new(actor.id);

        let target_status = match request.status {
            Some(AppointmentStatus::Cancelled) if current.status != AppointmentStatus::Cancelled => {
                let reason = request.cancellation_reason.as_deref();
                self.lifecycle_service.validate_cancellation(actor, &current, reason)?;
                patch.cancellation_reason = reason.map(|r| r.trim().to_string());
                patch.status = Some(AppointmentStatus::Cancelled);
                AppointmentStatus::Cancelled
            }
            Some(status) if status != current.status => {
                self.lifecycle_service
                    .validate_status_transition(actor, &current, status)?;
                if status == AppointmentStatus::Completed {
                    patch.completion_notes = request.completion_notes.clone();
                }
                patch.status = Some(status);
                status
            }
            _ => current.status,
        };

        if request.completion_notes.is_some() && target_status != AppointmentStatus::Completed {
            debug!("Ignoring completion notes for appointment {} ({})", appointment_id, target_status);
        }

        if request.reschedules() {
            if !current.status.is_blocking() {
                return Err(AppointmentError::CannotReschedule(current.status));
            }

            let start = match &request.appointment_time {
                Some(value) => Self::parse_future_instant(value)?,
                None => current.appointment_time,
            };
            let duration = match request.duration_minutes {
                Some(minutes) => self.resolve_duration(Some(minutes))?,
                None => current.duration_minutes,
            };
            let end = Self::end_of(start, duration)?;

            if target_status.is_blocking() {
                let availability = self
                    .conflict_service
                    .check_doctor_availability(current.doctor_id, start, duration, Some(current.id))
                    .await?;
                Self::require_available(availability)?;
            }

            patch.appointment_time = Some(start);
            patch.end_time = Some(end);
            patch.duration_minutes = Some(duration);
        }

        if let Some(reason) = request.reason {
            patch.reason = Some(reason);
        }

        if !patch.has_changes() {
            return Err(AppointmentError::ValidationError("no changes requested".to_string()));
        }

        let updated = self.persist_update(appointment_id, patch).await?;

        info!("Appointment {} updated by {} ({})", appointment_id, actor.id, updated.status);
        Ok(updated)
    }

    pub async fn cancel_appointment(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
        reason: &str,
    ) -> Result<Appointment, AppointmentError> {
        debug!("Cancelling appointment: {}", appointment_id);

        let current = self.load(appointment_id).await?;
        self.lifecycle_service
            .validate_cancellation(actor, &current, Some(reason))?;

        let mut patch = AppointmentPatch::new(actor.id);
        patch.status = Some(AppointmentStatus::Cancelled);
        patch.cancellation_reason = Some(reason.trim().to_string());

        let cancelled = self.persist_update(appointment_id, patch).await?;

        info!("Appointment {} cancelled by {} {}", appointment_id, actor.role, actor.id);
        Ok(cancelled)
    }

    pub async fn get_appointment(
        &self,
        actor: &Actor,
        appointment_id: Uuid,
    ) -> Result<Appointment, AppointmentError> {
        let appointment = self.load(appointment_id).await?;

        if !self.lifecycle_service.can_view(actor, &appointment) {
            warn!("{} {} may not view appointment {}", actor.role, actor.id, appointment_id);
            return Err(AppointmentError::Forbidden(
                "not allowed to view this appointment".to_string(),
            ));
        }

        Ok(appointment)
    }

    /// Patients only ever see their own appointments and doctors only their
    /// own calendar, whatever filters they pass.
    pub async fn search_appointments(
        &self,
        actor: &Actor,
        mut query: AppointmentSearchQuery,
    ) -> Result<Vec<Appointment>, AppointmentError> {
        match actor.role {
            Role::Patient => query.patient_id = Some(actor.id),
            Role::Doctor => query.doctor_id = Some(actor.id),
            Role::Staff | Role::Admin => {}
        }

        if let (Some(from), Some(to)) = (query.from_date, query.to_date) {
            if from > to {
                return Err(AppointmentError::ValidationError(
                    "from_date must not be after to_date".to_string(),
                ));
            }
        }
        query.limit = Some(
            query
                .limit
                .unwrap_or(DEFAULT_SEARCH_LIMIT)
                .clamp(1, MAX_SEARCH_LIMIT),
        );
        query.offset = query.offset.map(|offset| offset.max(0));

        Ok(self.appointments.list(&query).await?)
    }

    // ==========================================================================
    // AVAILABILITY
    // ==========================================================================

    /// Free `HH:MM` start times for one clinic-calendar day. Candidates step
    /// through each working block and are kept when no blocking appointment
    /// overlaps them.
    pub async fn list_available_slots(
        &self,
        doctor_id: Uuid,
        date: &str,
        duration_minutes: Option<i32>,
    ) -> Result<AvailableSlotsResponse, AppointmentError> {
        let day = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| AppointmentError::InvalidDate(format!("{:?} is not YYYY-MM-DD", date)))?;
        let duration = self.resolve_duration(duration_minutes)?;

        let schedule = self
            .doctors
            .get_schedule(doctor_id)
            .await?
            .ok_or(AppointmentError::DoctorNotFound)?;

        let starts = slot_starts_for_day(
            &schedule,
            day,
            duration.unsigned_abs(),
            self.rules.slot_increment_minutes,
        );
        debug!("{} candidate slots for doctor {} on {}", starts.len(), doctor_id, day);

        let mut slots = Vec::with_capacity(starts.len());
        for minute in starts {
            let Some(local) = day.and_hms_opt(minute / 60, minute % 60, 0) else {
                continue;
            };
            let Some(start) = local
                .and_local_timezone(self.rules.clinic_offset)
                .single()
                .map(|at| at.with_timezone(&Utc))
            else {
                continue;
            };

            if !self
                .conflict_service
                .has_conflict(doctor_id, start, duration, None)
                .await?
            {
                slots.push(format_clock_time(minute));
            }
        }

        Ok(AvailableSlotsResponse {
            doctor_id,
            date: day,
            duration_minutes: duration,
            slots,
        })
    }

    /// Standalone probe of the composite availability check.
    pub async fn check_availability(
        &self,
        query: AvailabilityCheckQuery,
    ) -> Result<AvailabilityCheckResponse, AppointmentError> {
        let start = Self::parse_instant(&query.appointment_time)?;
        let duration = self.resolve_duration(query.duration_minutes)?;

        let availability = self
            .conflict_service
            .check_doctor_availability(query.doctor_id, start, duration, query.exclude_appointment_id)
            .await?;

        Ok(AvailabilityCheckResponse {
            doctor_id: query.doctor_id,
            appointment_time: start,
            duration_minutes: duration,
            available: availability.is_available(),
            availability,
        })
    }
}
