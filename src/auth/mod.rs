// Identity module
// Verifies bearer JWTs and exposes the caller's id and role to handlers

pub mod error;
pub mod middleware;
pub mod models;
pub mod token;

pub use error::AuthError;
pub use middleware::AuthenticatedUser;
pub use models::Role;
pub use token::{Claims, TokenService};
