use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::DatabaseError;

use super::DoctorRepository;
use crate::models::{Doctor, WeeklyAvailabilityBlock};

/// Process-local doctor store for tests and local runs.
#[derive(Default)]
pub struct InMemoryDoctorRepository {
    doctors: RwLock<HashMap<Uuid, Doctor>>,
}

impl InMemoryDoctorRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, doctor: Doctor) {
        self.doctors.write().await.insert(doctor.id, doctor);
    }

    /// Adds a doctor with the given schedule and returns its id.
    pub async fn add_doctor(&self, schedule: Vec<WeeklyAvailabilityBlock>) -> Uuid {
        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            first_name: "Test".to_string(),
            last_name: "Doctor".to_string(),
            email: "doctor@clinic.test".to_string(),
            specialty: "General Practice".to_string(),
            schedule,
            is_deleted: false,
            created_at: now,
            updated_at: now,
        };
        let id = doctor.id;
        self.insert(doctor).await;
        id
    }
}

#[async_trait]
impl DoctorRepository for InMemoryDoctorRepository {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DatabaseError> {
        Ok(self
            .doctors
            .read()
            .await
            .get(&doctor_id)
            .filter(|doctor| !doctor.is_deleted)
            .cloned())
    }

    async fn replace_schedule(
        &self,
        doctor_id: Uuid,
        schedule: Vec<WeeklyAvailabilityBlock>,
    ) -> Result<Doctor, DatabaseError> {
        let mut doctors = self.doctors.write().await;
        let doctor = doctors
            .get_mut(&doctor_id)
            .filter(|doctor| !doctor.is_deleted)
            .ok_or(DatabaseError::NotFound)?;

        doctor.schedule = schedule;
        doctor.updated_at = Utc::now();
        Ok(doctor.clone())
    }
}
