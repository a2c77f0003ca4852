// libs/appointment-cell/src/services/lifecycle.rs
use tracing::{debug, warn};

use shared_models::auth::{Actor, Role};

use crate::models::{Appointment, AppointmentError, AppointmentStatus};

/// Status state machine and per-role permissions. Pure; the booking service
/// loads and persists.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Clinic staff bookings are confirmed straight away; self-service and
    /// doctor-initiated bookings wait for confirmation.
    pub fn initial_status(&self, creator: Role) -> AppointmentStatus {
        if creator.is_clinic_staff() {
            AppointmentStatus::Confirmed
        } else {
            AppointmentStatus::Requested
        }
    }

    fn is_participant(actor: &Actor, appointment: &Appointment) -> bool {
        match actor.role {
            Role::Patient => appointment.patient_id == actor.id,
            Role::Doctor => appointment.doctor_id == actor.id,
            Role::Staff | Role::Admin => false,
        }
    }

    pub fn can_view(&self, actor: &Actor, appointment: &Appointment) -> bool {
        actor.role.is_clinic_staff() || Self::is_participant(actor, appointment)
    }

    /// Generic updates (reschedule, notes, status) are limited to the
    /// appointment's own patient and doctor, plus clinic staff.
    pub fn ensure_can_modify(
        &self,
        actor: &Actor,
        appointment: &Appointment,
    ) -> Result<(), AppointmentError> {
        if self.can_view(actor, appointment) {
            Ok(())
        } else {
            warn!("{} {} may not modify appointment {}", actor.role, actor.id, appointment.id);
            Err(AppointmentError::Forbidden(
                "not allowed to modify this appointment".to_string(),
            ))
        }
    }

    /// Allowed moves, excluding cancellation which has its own rules.
    pub fn get_valid_transitions(&self, current: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current {
            AppointmentStatus::Requested => vec![AppointmentStatus::Confirmed],
            AppointmentStatus::Confirmed => {
                vec![AppointmentStatus::Completed, AppointmentStatus::NoShow]
            }
            AppointmentStatus::Cancelled
            | AppointmentStatus::Completed
            | AppointmentStatus::NoShow => vec![],
        }
    }

    pub fn validate_status_transition(
        &self,
        actor: &Actor,
        appointment: &Appointment,
        new_status: AppointmentStatus,
    ) -> Result<(), AppointmentError> {
        let current = appointment.status;
        debug!("Validating status transition from {} to {}", current, new_status);

        if !self.get_valid_transitions(current).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current, new_status);
            return Err(AppointmentError::InvalidStatusTransition {
                from: current,
                to: new_status,
            });
        }

        let permitted = match new_status {
            AppointmentStatus::NoShow => actor.role == Role::Admin,
            _ => {
                actor.role.is_clinic_staff()
                    || (actor.role == Role::Doctor && appointment.doctor_id == actor.id)
            }
        };
        if !permitted {
            warn!(
                "{} {} may not move appointment {} to {}",
                actor.role, actor.id, appointment.id, new_status
            );
            return Err(AppointmentError::Forbidden(format!(
                "{} may not mark an appointment as {}",
                actor.role, new_status
            )));
        }

        Ok(())
    }

    /// Patients may cancel only their own requested or confirmed
    /// appointments. Doctors, staff and admins may cancel anything not yet
    /// cancelled or completed. A reason is always required.
    pub fn validate_cancellation(
        &self,
        actor: &Actor,
        appointment: &Appointment,
        reason: Option<&str>,
    ) -> Result<(), AppointmentError> {
        if actor.role == Role::Patient && appointment.patient_id != actor.id {
            warn!("Patient {} tried to cancel appointment {} of another patient", actor.id, appointment.id);
            return Err(AppointmentError::Forbidden(
                "patients may only cancel their own appointments".to_string(),
            ));
        }

        let status = appointment.status;
        let cancellable = match actor.role {
            Role::Patient => status.is_blocking(),
            Role::Doctor | Role::Staff | Role::Admin => !status.is_terminal(),
        };
        if !cancellable {
            return Err(AppointmentError::CannotCancel(status));
        }

        if reason.map_or(true, |reason| reason.trim().is_empty()) {
            return Err(AppointmentError::ValidationError(
                "cancellation reason is required".to_string(),
            ));
        }

        Ok(())
    }
}
