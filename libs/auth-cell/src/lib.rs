pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{CreateUserRequest, IdentityError, User, UserRole};
pub use router::auth_routes;
pub use services::{IdentityResolver, UserService};
