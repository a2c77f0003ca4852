use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::json;
use tracing::debug;
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use super::DoctorRepository;
use crate::models::{Doctor, WeeklyAvailabilityBlock};

pub struct SupabaseDoctorRepository {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

impl SupabaseDoctorRepository {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: &str) -> Self {
        Self {
            supabase,
            auth_token: auth_token.to_string(),
        }
    }
}

#[async_trait]
impl DoctorRepository for SupabaseDoctorRepository {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DatabaseError> {
        debug!("Fetching doctor profile: {}", doctor_id);

        let path = format!("/rest/v1/doctors?id=eq.{}&is_deleted=eq.false", doctor_id);
        let result: Vec<Doctor> = self
            .supabase
            .request(Method::GET, &path, Some(&self.auth_token), None)
            .await?;

        Ok(result.into_iter().next())
    }

    async fn replace_schedule(
        &self,
        doctor_id: Uuid,
        schedule: Vec<WeeklyAvailabilityBlock>,
    ) -> Result<Doctor, DatabaseError> {
        debug!("Replacing schedule for doctor {} ({} blocks)", doctor_id, schedule.len());

        let path = format!("/rest/v1/doctors?id=eq.{}&is_deleted=eq.false", doctor_id);
        let body = json!({
            "schedule": schedule,
            "updated_at": Utc::now().to_rfc3339(),
        });

        let result: Vec<Doctor> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(&self.auth_token),
                Some(body),
                Some(SupabaseClient::representation_headers()),
            )
            .await?;

        result.into_iter().next().ok_or(DatabaseError::NotFound)
    }
}
