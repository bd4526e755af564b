//! Authentication service models

pub mod role;
pub mod user;

// Re-export for convenience
pub use role::{Role, UserStatus};
pub use user::{NewUser, User, UserResponse};
