pub mod booking;
pub mod conflict;
pub mod lifecycle;

pub use booking::AppointmentBookingService;
pub use conflict::{intervals_overlap, ConflictDetectionService, BLOCKING_STATUSES};
pub use lifecycle::AppointmentLifecycleService;
