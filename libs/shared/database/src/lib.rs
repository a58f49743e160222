pub mod memory;
pub mod store;
pub mod supabase;

pub use memory::InMemoryStore;
pub use store::{
    Collection, Condition, DeleteResult, Filter, InsertManyResult, InsertOneResult,
    RecordStore, UpdateResult,
};
pub use supabase::SupabaseClient;
