#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use uuid::Uuid;

use appointment_cell::models::{BookAppointmentRequest, BookingRules};
use appointment_cell::repository::InMemoryAppointmentRepository;
use appointment_cell::services::AppointmentBookingService;
use doctor_cell::models::WeeklyAvailabilityBlock;
use doctor_cell::repository::InMemoryDoctorRepository;
use patient_cell::repository::{InMemoryPatientRepository, PatientRepository};
use shared_models::auth::{Actor, Role};

/// 2030-01-07 is a Monday.
pub const MONDAY: &str = "2030-01-07";

pub struct Clinic {
    pub service: Arc<AppointmentBookingService>,
    pub appointments: Arc<InMemoryAppointmentRepository>,
    pub patients: Arc<InMemoryPatientRepository>,
    pub doctor: Actor,
    pub patient: Actor,
    pub other_patient: Actor,
    pub staff: Actor,
    pub admin: Actor,
}

impl Clinic {
    /// One doctor working Mondays 09:00-12:00 on a UTC clinic calendar.
    pub async fn new() -> Self {
        Self::with_schedule(
            vec![WeeklyAvailabilityBlock::new(1, "09:00", "12:00")],
            FixedOffset::east_opt(0).unwrap(),
        )
        .await
    }

    pub async fn with_schedule(schedule: Vec<WeeklyAvailabilityBlock>, offset: FixedOffset) -> Self {
        let appointments = Arc::new(InMemoryAppointmentRepository::new());
        let doctors = Arc::new(InMemoryDoctorRepository::new());
        let patients = Arc::new(InMemoryPatientRepository::new());

        let doctor_id = doctors.add_doctor(schedule).await;
        let patient = Actor::new(Uuid::new_v4(), Role::Patient);
        let other_patient = Actor::new(Uuid::new_v4(), Role::Patient);
        patients.add_patient(patient.id).await;
        patients.add_patient(other_patient.id).await;

        let service = AppointmentBookingService::new(
            appointments.clone(),
            doctors,
            patients.clone(),
            BookingRules::with_offset(offset),
        );

        Self {
            service: Arc::new(service),
            appointments,
            patients,
            doctor: Actor::new(doctor_id, Role::Doctor),
            patient,
            other_patient,
            staff: Actor::new(Uuid::new_v4(), Role::Staff),
            admin: Actor::new(Uuid::new_v4(), Role::Admin),
        }
    }

    pub async fn remove_patient(&self, patient_id: Uuid) {
        self.patients
            .soft_delete(patient_id, self.admin.id)
            .await
            .expect("patient exists");
    }

    /// Booking request for `patient_id` on Monday at `time` (clinic clock, UTC).
    pub fn request(&self, patient_id: Option<Uuid>, time: &str, duration: Option<i32>) -> BookAppointmentRequest {
        BookAppointmentRequest {
            patient_id,
            doctor_id: self.doctor.id,
            appointment_time: format!("{}T{}:00Z", MONDAY, time),
            duration_minutes: duration,
            reason: Some("Check-up".to_string()),
        }
    }
}

pub fn monday_at(time: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&format!("{}T{}:00Z", MONDAY, time))
        .expect("valid test time")
        .with_timezone(&Utc)
}
