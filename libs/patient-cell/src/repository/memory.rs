use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::DatabaseError;

use super::PatientRepository;
use crate::models::{Patient, UpdatePatientRequest};

#[derive(Default)]
pub struct InMemoryPatientRepository {
    patients: RwLock<HashMap<Uuid, Patient>>,
}

impl InMemoryPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a live patient profile with the given id.
    pub async fn add_patient(&self, patient_id: Uuid) {
        let now = Utc::now();
        self.patients.write().await.insert(
            patient_id,
            Patient {
                id: patient_id,
                first_name: "Test".to_string(),
                last_name: "Patient".to_string(),
                email: format!("{}@patients.test", patient_id.simple()),
                phone_number: None,
                date_of_birth: None,
                address: None,
                is_deleted: false,
                created_by: None,
                updated_by: None,
                created_at: now,
                updated_at: now,
            },
        );
    }
}

#[async_trait]
impl PatientRepository for InMemoryPatientRepository {
    async fn get_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, DatabaseError> {
        Ok(self
            .patients
            .read()
            .await
            .get(&patient_id)
            .filter(|patient| !patient.is_deleted)
            .cloned())
    }

    async fn insert(&self, patient: Patient) -> Result<Patient, DatabaseError> {
        let mut patients = self.patients.write().await;
        if patients.contains_key(&patient.id) {
            return Err(DatabaseError::Conflict(format!("patient {} exists", patient.id)));
        }
        if patients
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&patient.email))
        {
            return Err(DatabaseError::Conflict(format!("email {} is taken", patient.email)));
        }

        patients.insert(patient.id, patient.clone());
        Ok(patient)
    }

    async fn update(
        &self,
        patient_id: Uuid,
        patch: UpdatePatientRequest,
        updated_by: Uuid,
    ) -> Result<Patient, DatabaseError> {
        let mut patients = self.patients.write().await;
        let patient = patients
            .get_mut(&patient_id)
            .filter(|patient| !patient.is_deleted)
            .ok_or(DatabaseError::NotFound)?;

        if let Some(first_name) = patch.first_name {
            patient.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            patient.last_name = last_name;
        }
        if let Some(phone_number) = patch.phone_number {
            patient.phone_number = Some(phone_number);
        }
        if let Some(date_of_birth) = patch.date_of_birth {
            patient.date_of_birth = Some(date_of_birth);
        }
        if let Some(address) = patch.address {
            patient.address = Some(address);
        }
        patient.updated_by = Some(updated_by);
        patient.updated_at = Utc::now();

        Ok(patient.clone())
    }

    async fn soft_delete(&self, patient_id: Uuid, deleted_by: Uuid) -> Result<(), DatabaseError> {
        let mut patients = self.patients.write().await;
        let patient = patients
            .get_mut(&patient_id)
            .filter(|patient| !patient.is_deleted)
            .ok_or(DatabaseError::NotFound)?;

        patient.is_deleted = true;
        patient.updated_by = Some(deleted_by);
        patient.updated_at = Utc::now();
        Ok(())
    }
}
