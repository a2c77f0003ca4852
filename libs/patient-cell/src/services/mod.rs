pub mod patient;
pub mod validation;

pub use patient::PatientService;
