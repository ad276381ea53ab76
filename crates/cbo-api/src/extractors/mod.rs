//! Axum extractors for request handling
//!
//! Custom extractors for authentication, validation, and path parameters.

mod auth;
mod path;
mod validated;

pub use auth::AuthSession;
pub use path::{IdPath, MemberPath, MemberRolePath};
pub use validated::ValidatedJson;
