use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use shared_database::DatabaseError;

use super::AppointmentRepository;
use crate::models::{Appointment, AppointmentPatch, AppointmentSearchQuery, AppointmentStatus};
use crate::services::conflict::intervals_overlap;

/// Process-local appointment store. Overlap checks and writes happen under
/// the same write lock, so concurrent bookings cannot both succeed.
#[derive(Default)]
pub struct InMemoryAppointmentRepository {
    appointments: RwLock<HashMap<Uuid, Appointment>>,
}

impl InMemoryAppointmentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.appointments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn clashes_with(candidate: &Appointment, existing: &Appointment) -> bool {
    let (start, end) = candidate.window();
    let (other_start, other_end) = existing.window();

    existing.id != candidate.id
        && !existing.is_deleted
        && existing.doctor_id == candidate.doctor_id
        && existing.status.is_blocking()
        && intervals_overlap(start, end, other_start, other_end)
}

fn ensure_no_clash(
    appointments: &HashMap<Uuid, Appointment>,
    candidate: &Appointment,
) -> Result<(), DatabaseError> {
    if !candidate.status.is_blocking() {
        return Ok(());
    }
    match appointments.values().find(|existing| clashes_with(candidate, existing)) {
        Some(existing) => Err(DatabaseError::Conflict(format!(
            "overlaps appointment {} of doctor {}",
            existing.id, existing.doctor_id
        ))),
        None => Ok(()),
    }
}

#[async_trait]
impl AppointmentRepository for InMemoryAppointmentRepository {
    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, DatabaseError> {
        Ok(self
            .appointments
            .read()
            .await
            .get(&appointment_id)
            .filter(|appointment| !appointment.is_deleted)
            .cloned())
    }

    async fn find_conflicting(
        &self,
        doctor_id: Uuid,
        statuses: &[AppointmentStatus],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<Appointment>, DatabaseError> {
        let appointments = self.appointments.read().await;
        let mut matches: Vec<&Appointment> = appointments
            .values()
            .filter(|a| !a.is_deleted && a.doctor_id == doctor_id)
            .filter(|a| Some(a.id) != exclude_id)
            .filter(|a| statuses.contains(&a.status))
            .filter(|a| intervals_overlap(start, end, a.appointment_time, a.end_time))
            .collect();
        matches.sort_by_key(|a| a.appointment_time);

        Ok(matches.first().map(|a| (*a).clone()))
    }

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, DatabaseError> {
        let mut appointments = self.appointments.write().await;
        if appointments.contains_key(&appointment.id) {
            return Err(DatabaseError::Conflict(format!(
                "appointment {} already exists",
                appointment.id
            )));
        }
        ensure_no_clash(&appointments, &appointment)?;

        appointments.insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn update(
        &self,
        appointment_id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, DatabaseError> {
        let mut appointments = self.appointments.write().await;
        let mut updated = appointments
            .get(&appointment_id)
            .filter(|appointment| !appointment.is_deleted)
            .cloned()
            .ok_or(DatabaseError::NotFound)?;

        patch.apply_to(&mut updated);
        ensure_no_clash(&appointments, &updated)?;

        appointments.insert(appointment_id, updated.clone());
        Ok(updated)
    }

    async fn list(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, DatabaseError> {
        let appointments = self.appointments.read().await;
        let mut found: Vec<Appointment> = appointments
            .values()
            .filter(|a| !a.is_deleted)
            .filter(|a| query.patient_id.map_or(true, |id| a.patient_id == id))
            .filter(|a| query.doctor_id.map_or(true, |id| a.doctor_id == id))
            .filter(|a| query.status.map_or(true, |status| a.status == status))
            .filter(|a| query.from_date.map_or(true, |from| a.appointment_time >= from))
            .filter(|a| query.to_date.map_or(true, |to| a.appointment_time <= to))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.appointment_time);

        let offset = query.offset.unwrap_or(0).max(0) as usize;
        let limit = query.limit.map_or(usize::MAX, |limit| limit.max(0) as usize);
        Ok(found.into_iter().skip(offset).take(limit).collect())
    }
}
