pub mod booking;
pub mod conflict;
pub mod lifecycle;
pub mod rehab;

pub use booking::{parse_appointment_id, TherapistBookingService};
pub use conflict::SlotAvailabilityChecker;
pub use rehab::RehabBookingService;
