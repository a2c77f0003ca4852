mod memory;
mod supabase;

use async_trait::async_trait;
use uuid::Uuid;

use shared_database::DatabaseError;

use crate::models::{Patient, UpdatePatientRequest};

pub use memory::InMemoryPatientRepository;
pub use supabase::SupabasePatientRepository;

/// Storage seam for patient profiles. Soft-deleted rows are never returned.
#[async_trait]
pub trait PatientRepository: Send + Sync {
    async fn get_patient(&self, patient_id: Uuid) -> Result<Option<Patient>, DatabaseError>;

    /// Fails with `DatabaseError::Conflict` when the id or email is taken.
    async fn insert(&self, patient: Patient) -> Result<Patient, DatabaseError>;

    async fn update(
        &self,
        patient_id: Uuid,
        patch: UpdatePatientRequest,
        updated_by: Uuid,
    ) -> Result<Patient, DatabaseError>;

    async fn soft_delete(&self, patient_id: Uuid, deleted_by: Uuid) -> Result<(), DatabaseError>;
}
