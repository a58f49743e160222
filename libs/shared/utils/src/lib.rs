pub mod extractor;
pub mod jwt;
pub mod locks;
pub mod state;
pub mod test_utils;

pub use locks::SlotLocks;
pub use state::AppState;
