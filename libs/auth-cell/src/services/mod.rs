pub mod identity;
pub mod user;

pub use identity::IdentityResolver;
pub use user::UserService;
