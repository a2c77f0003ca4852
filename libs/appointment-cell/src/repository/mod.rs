mod memory;
mod supabase;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::{Appointment, AppointmentPatch, AppointmentSearchQuery, AppointmentStatus};

pub use memory::InMemoryAppointmentRepository;
pub use supabase::SupabaseAppointmentRepository;

/// Storage seam for appointments. Soft-deleted rows are invisible to every
/// method.
///
/// `insert` and `update` must refuse, with `DatabaseError::Conflict`, any
/// write that leaves two blocking appointments of one doctor overlapping.
/// The read-side conflict check alone cannot stop two concurrent bookings.
#[async_trait]
pub trait AppointmentRepository: Send + Sync {
    async fn get(&self, appointment_id: Uuid) -> Result<Option<Appointment>, DatabaseError>;

    /// First appointment of `doctor_id` with one of `statuses` whose window
    /// overlaps `[start, end)`, ignoring `exclude_id`.
    async fn find_conflicting(
        &self,
        doctor_id: Uuid,
        statuses: &[AppointmentStatus],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exclude_id: Option<Uuid>,
    ) -> Result<Option<Appointment>, DatabaseError>;

    async fn insert(&self, appointment: Appointment) -> Result<Appointment, DatabaseError>;

    async fn update(
        &self,
        appointment_id: Uuid,
        patch: AppointmentPatch,
    ) -> Result<Appointment, DatabaseError>;

    /// Filtered listing ordered by `appointment_time` ascending.
    async fn list(&self, query: &AppointmentSearchQuery) -> Result<Vec<Appointment>, DatabaseError>;
}
