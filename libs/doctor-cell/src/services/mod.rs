pub mod availability;
pub mod doctor;

pub use availability::{
    day_of_week, format_clock_time, is_within_schedule, parse_clock_time, slot_starts_for_day,
    validate_schedule,
};
pub use doctor::DoctorService;
