use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::{DatabaseError, SupabaseClient};
use shared_models::auth::{Actor, Role};

use crate::models::{CreatePatientRequest, Patient, PatientError, UpdatePatientRequest};
use crate::repository::{PatientRepository, SupabasePatientRepository};
use crate::services::validation::{
    validate_date_of_birth, validate_email, validate_name, validate_phone,
};

pub struct PatientService {
    repository: Arc<dyn PatientRepository>,
}

impl PatientService {
    pub fn new(repository: Arc<dyn PatientRepository>) -> Self {
        Self { repository }
    }

    pub fn for_request(config: &AppConfig, auth_token: &str) -> Self {
        let supabase = Arc::new(SupabaseClient::new(config));
        Self::new(Arc::new(SupabasePatientRepository::new(supabase, auth_token)))
    }

    /// Patients may read and edit their own profile; clinic staff may manage
    /// any. Doctors get read access.
    fn ensure_can_read(actor: &Actor, patient_id: Uuid) -> Result<(), PatientError> {
        match actor.role {
            Role::Patient if actor.id != patient_id => Err(PatientError::Unauthorized),
            _ => Ok(()),
        }
    }

    fn ensure_can_write(actor: &Actor, patient_id: Uuid) -> Result<(), PatientError> {
        let is_owner = actor.role == Role::Patient && actor.id == patient_id;
        if is_owner || actor.role.is_clinic_staff() {
            Ok(())
        } else {
            Err(PatientError::Unauthorized)
        }
    }

    pub async fn create_patient(
        &self,
        actor: &Actor,
        request: CreatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Creating patient profile for: {}", request.email);

        let patient_id = match (actor.role, request.id) {
            (Role::Patient, None) => actor.id,
            (Role::Patient, Some(id)) if id == actor.id => id,
            (Role::Staff | Role::Admin, Some(id)) => id,
            (Role::Staff | Role::Admin, None) => {
                return Err(PatientError::ValidationError(
                    "id of the patient's user account is required".to_string(),
                ))
            }
            _ => {
                warn!("{} {} may not create patient profiles", actor.role, actor.id);
                return Err(PatientError::Unauthorized);
            }
        };

        validate_name("first_name", &request.first_name)?;
        validate_name("last_name", &request.last_name)?;
        validate_email(&request.email)?;
        if let Some(phone) = &request.phone_number {
            validate_phone(phone)?;
        }
        if let Some(date_of_birth) = request.date_of_birth {
            validate_date_of_birth(date_of_birth)?;
        }

        let now = Utc::now();
        let patient = Patient {
            id: patient_id,
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: request.email.trim().to_lowercase(),
            phone_number: request.phone_number,
            date_of_birth: request.date_of_birth,
            address: request.address,
            is_deleted: false,
            created_by: Some(actor.id),
            updated_by: Some(actor.id),
            created_at: now,
            updated_at: now,
        };

        let email = patient.email.clone();
        let patient = match self.repository.insert(patient).await {
            Err(DatabaseError::Conflict(_)) => {
                return Err(PatientError::EmailAlreadyExists { email })
            }
            other => other?,
        };

        info!("Patient profile {} created by {}", patient.id, actor.id);
        Ok(patient)
    }

    pub async fn get_patient(&self, actor: &Actor, patient_id: Uuid) -> Result<Patient, PatientError> {
        Self::ensure_can_read(actor, patient_id)?;

        self.repository
            .get_patient(patient_id)
            .await?
            .ok_or(PatientError::NotFound)
    }

    pub async fn update_patient(
        &self,
        actor: &Actor,
        patient_id: Uuid,
        request: UpdatePatientRequest,
    ) -> Result<Patient, PatientError> {
        debug!("Updating patient profile: {}", patient_id);
        Self::ensure_can_write(actor, patient_id)?;

        if request.is_empty() {
            return Err(PatientError::ValidationError("no fields to update".to_string()));
        }
        if let Some(first_name) = &request.first_name {
            validate_name("first_name", first_name)?;
        }
        if let Some(last_name) = &request.last_name {
            validate_name("last_name", last_name)?;
        }
        if let Some(phone) = &request.phone_number {
            validate_phone(phone)?;
        }
        if let Some(date_of_birth) = request.date_of_birth {
            validate_date_of_birth(date_of_birth)?;
        }

        let patient = match self.repository.update(patient_id, request, actor.id).await {
            Err(DatabaseError::NotFound) => return Err(PatientError::NotFound),
            other => other?,
        };

        info!("Patient profile {} updated by {}", patient_id, actor.id);
        Ok(patient)
    }

    pub async fn delete_patient(&self, actor: &Actor, patient_id: Uuid) -> Result<(), PatientError> {
        Self::ensure_can_write(actor, patient_id)?;

        match self.repository.soft_delete(patient_id, actor.id).await {
            Err(DatabaseError::NotFound) => return Err(PatientError::NotFound),
            other => other?,
        }

        info!("Patient profile {} soft deleted by {}", patient_id, actor.id);
        Ok(())
    }
}
