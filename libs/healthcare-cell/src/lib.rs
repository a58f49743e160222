pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{ActivityItem, HealthcareCase, HealthcareError};
pub use router::healthcare_routes;
pub use services::{ActivityService, HealthcareService};
