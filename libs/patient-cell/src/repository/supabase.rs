use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use super::PatientRepository;
use crate::models::{Patient, UpdatePatientRequest};

pub struct SupabasePatientRepository {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

impl SupabasePatientRepository {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: &str) -> Self {
        Self {
            supabase,
            auth_token: auth_token.to_string(),
        }
    }

    fn live_row_path(patient_id: Uuid) -> String {
        format!("/rest/v1/patients?id=eq.{}&is_deleted=eq.false", patient_id)
    }

    async fn patch_row(&self, patient_id: Uuid, body: Value) -> Result<Patient, DatabaseError> {
        let result: Vec<Patient> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &Self::live_row_path(patient_id),
                Some(&self.auth_token),
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        result.into_iter().next().ok_or(DatabaseError::NotFound)
    }
}

#[async_trait]
impl PatientRepository for SupabasePatientRepository {
    async fn get_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, DatabaseError> {
        debug!("Fetching patient profile: {}", patient_id);

        let result: Vec<Patient> = self
            .supabase
            .request(Method::GET, &Self::live_row_path(patient_id), Some(&self.auth_token), None)
            .await?;

        Ok(result.into_iter().next())
    }

    async fn insert(&self, patient: Patient) -> Result<Patient, DatabaseError> {
        debug!("Creating patient profile: {}", patient.id);

        let body = serde_json::to_value(&patient)?;
        let result: Vec<Patient> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/patients",
                Some(&self.auth_token),
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        result
            .into_iter()
            .next()
            .ok_or_else(|| DatabaseError::Decode("insert returned no rows".to_string()))
    }

    async fn update(
        &self,
        patient_id: Uuid,
        patch: UpdatePatientRequest,
        updated_by: Uuid,
    ) -> Result<Patient, DatabaseError> {
        debug!("Updating patient profile: {}", patient_id);

        let mut body = serde_json::to_value(&patch)?;
        if let Value::Object(fields) = &mut body {
            fields.insert("updated_by".to_string(), json!(updated_by));
            fields.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        self.patch_row(patient_id, body).await
    }

    async fn soft_delete(&self, patient_id: Uuid, deleted_by: Uuid) -> Result<(), DatabaseError> {
        debug!("Soft deleting patient profile: {}", patient_id);

        let body = json!({
            "is_deleted": true,
            "updated_by": deleted_by,
            "updated_at": Utc::now().to_rfc3339(),
        });

        self.patch_row(patient_id, body).await.map(|_| ())
    }
}
