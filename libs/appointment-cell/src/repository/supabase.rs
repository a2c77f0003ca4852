use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use shared_database::{DatabaseError, SupabaseClient};

use super::AppointmentRepository;
use crate::models::{Appointment, AppointmentPatch, AppointmentSearchQuery, AppointmentStatus};

/// PostgREST-backed appointments. Double booking under concurrency is
/// prevented by the `appointments_no_overlap` exclusion constraint on
/// `(doctor_id, tstzrange(appointment_time, end_time))` for blocking
/// statuses; a violation comes back as HTTP 409.
pub struct SupabaseAppointmentRepository {
    supabase: Arc<SupabaseClient>,
    auth_token: String,
}

/// RFC 3339 timestamp escaped for use in a PostgREST filter. Sub-second
/// digits are kept so the filter sees the exact stored window.
fn encode_timestamp(at: DateTime<Utc>) -> String {
    urlencoding::encode(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true)).into_owned()
}

fn status_list(statuses: &[AppointmentStatus]) -> String {
    statuses
        .iter()
        .map(|status| status.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

impl SupabaseAppointmentRepository {
    pub fn new(supabase: Arc<SupabaseClient>, auth_token: &str) -> Self {
        Self {
            supabase,
            auth_token: auth_token.to_string(),
        }
    }

    async fn fetch(&self, path: &str) -> Result<Vec<Appointment>, DatabaseError> {
        self.supabase
            .request(Method::GET, path, Some(&self.auth_token), None)
            .await
    }
}

#[async_trait]
impl AppointmentRepository for SupabaseAppointmentRepository {
    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        debug!("Fetching appointment: {}", appointment_id);

        let path = format!("/rest/v1/appointments?id=eq.{}&is_deleted=eq.false", appointment_id);
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn find_conflicting(
        &self,
        doctor_id: Uuid,
        statuses: &[AppointmentStatus],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<Appointment>, DatabaseError> {
        if statuses.is_empty() {
            return Ok(None);
        }
        debug!("Checking conflicts for doctor {} from {} to {}", doctor_id, start, end);

        // Half-open overlap: existing.start < end AND existing.end > start.
        let mut query_parts = vec![
            format!("doctor_id=eq.{}", doctor_id),
            format!("status=in.({})", status_list(statuses)),
            format!("appointment_time=lt.{}", encode_timestamp(end)),
            format!("end_time=gt.{}", encode_timestamp(start)),
            "is_deleted=eq.false".to_string(),
        ];
        if let Some(exclude_id) = exclude_id {
            query_parts.push(format!("id=neq.{}", exclude_id));
        }

        let path = format!(
            "/rest/v1/appointments?{}&order=appointment_time.asc&limit=1",
            query_parts.join("&")
        );
        Ok(self.fetch(&path).await?.into_iter().next())
    }

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, DatabaseError> {
        debug!("Creating appointment {} for doctor {}", appointment.id, appointment.doctor_id);

        let body = serde_json::to_value(&appointment)?;
        let result: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
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
        appointment_id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, DatabaseError> {
        debug!("Updating appointment: {}", appointment_id);

        let mut body = serde_json::to_value(&patch)?;
        if let Value::Object(fields) = &mut body {
            fields.insert("updated_at".to_string(), json!(Utc::now().to_rfc3339()));
        }

        let path = format!("/rest/v1/appointments?id=eq.{}&is_deleted=eq.false", appointment_id);
        let result: Vec<Appointment> = self
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

    async fn list(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, DatabaseError> {
        debug!("Searching appointments with filters: {:?}", query);

        let mut query_parts = vec!["is_deleted=eq.false".to_string()];
        if let Some(patient_id) = query.patient_id {
            query_parts.push(format!("patient_id=eq.{}", patient_id));
        }
        if let Some(doctor_id) = query.doctor_id {
            query_parts.push(format!("doctor_id=eq.{}", doctor_id));
        }
        if let Some(status) = query.status {
            query_parts.push(format!("status=eq.{}", status));
        }
        if let Some(from_date) = query.from_date {
            query_parts.push(format!("appointment_time=gte.{}", encode_timestamp(from_date)));
        }
        if let Some(to_date) = query.to_date {
            query_parts.push(format!("appointment_time=lte.{}", encode_timestamp(to_date)));
        }

        let mut path = format!(
            "/rest/v1/appointments?{}&order=appointment_time.asc",
            query_parts.join("&")
        );
        if let Some(limit) = query.limit {
            path.push_str(&format!("&limit={}", limit));
        }
        if let Some(offset) = query.offset {
            path.push_str(&format!("&offset={}", offset));
        }

        self.fetch(&path).await
    }
}
