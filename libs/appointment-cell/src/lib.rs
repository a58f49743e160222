pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    AppointmentError, AppointmentStatus, RehabilitatorAppointment, TherapistAppointment,
};
pub use router::appointment_routes;
pub use services::{RehabBookingService, SlotAvailabilityChecker, TherapistBookingService};
