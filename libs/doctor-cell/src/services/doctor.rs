use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;
use shared_models::auth::{Actor, Role};

use crate::models::{Doctor, DoctorError, WeeklyAvailabilityBlock};
use crate::repository::{DoctorRepository, SupabaseDoctorRepository};
use crate::services::availability::validate_schedule;

pub struct DoctorService {
    repository: Arc<dyn DoctorRepository>,
}

impl DoctorService {
    pub fn new(repository: Arc<dyn DoctorRepository>) -> Self {
        Self { repository }
    }

    /// Supabase-backed service acting with the caller's token.
    pub fn for_request(config: &AppConfig, auth_token: &str) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self::new(Arc::new(SupabaseDoctorRepository::new(supabase, auth_token)))
    }

    pub async fn get_doctor(&self, doctor_id: Uuid) -> Result<Doctor, DoctorError> {
        self.repository
            .get_doctor(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    pub async fn get_schedule(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<WeeklyAvailabilityBlock>, DoctorError> {
        self.repository
            .get_schedule(doctor_id)
            .await?
            .ok_or(DoctorError::NotFound)
    }

    /// Replaces a doctor's weekly schedule. Doctors may edit their own;
    /// staff and admins may edit anyone's.
    pub async fn update_schedule(
        &self,
        actor: &Actor,
        doctor_id: Uuid,
        schedule: Vec<WeeklyAvailabilityBlock>,
    ) -> Result<Doctor, DoctorError> {
        debug!("Updating schedule for doctor {} by {}", doctor_id, actor.id);

        let is_owner = actor.role == Role::Doctor && actor.id == doctor_id;
        if !is_owner && !actor.role.is_clinic_staff() {
            warn!("{} {} may not edit schedule of doctor {}", actor.role, actor.id, doctor_id);
            return Err(DoctorError::Unauthorized);
        }

        validate_schedule(&schedule)?;

        let doctor = match self.repository.replace_schedule(doctor_id, schedule).await {
            Err(shared_database::DatabaseError::NotFound) => return Err(DoctorError::NotFound),
            other => other?,
        };

        info!("Schedule for doctor {} replaced ({} blocks)", doctor_id, doctor.schedule.len());
        Ok(doctor)
    }
}
