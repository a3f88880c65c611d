//! Domain models for the API server.
//!
//! These types represent validated domain objects separate from database
//! row types (which live with the repositories in [`crate::db`]).

pub mod order;
pub mod promotion;
pub mod restaurant;
pub mod user;

pub use order::{Order, OrderItem};
pub use promotion::Promotion;
pub use restaurant::{MenuItem, Restaurant};
pub use user::{CurrentUser, User};

/// Session keys used across handlers.
pub mod session_keys {
    /// Key holding the logged-in [`super::CurrentUser`].
    pub const CURRENT_USER: &str = "current_user";
}
