pub mod activity;
pub mod case;

pub use activity::ActivityService;
pub use case::HealthcareService;
