pub mod availability;

pub use availability::ScheduleService;
