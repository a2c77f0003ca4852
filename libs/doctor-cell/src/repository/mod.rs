mod memory;
mod supabase;

use async_trait::async_trait;
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::{Doctor, WeeklyAvailabilityBlock};

pub use memory::InMemoryDoctorRepository;
pub use supabase::SupabaseDoctorRepository;

/// Storage seam for doctor profiles. Soft-deleted doctors are invisible.
#[async_trait]
pub trait DoctorRepository: Send + Sync {
    async fn get_doctor(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DatabaseError>;

    /// Replaces the whole weekly schedule; `DatabaseError::NotFound` if the
    /// doctor does not exist.
    async fn replace_schedule(
        &self,
        doctor_id: Uuid,
        schedule: Vec<WeeklyAvailabilityBlock>,
    ) -> Result<Doctor, DatabaseError>;

    async fn get_schedule(
        &self,
        doctor_id: Uuid,
    ) -> Result<Option<Vec<WeeklyAvailabilityBlock>>, DatabaseError> {
        Ok(self.get_doctor(doctor_id).await?.map(|doctor| doctor.schedule))
    }
}
