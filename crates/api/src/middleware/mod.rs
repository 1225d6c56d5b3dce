//! Authentication and authorization extractors.
//!
//! - [`auth::AuthUser`] -- user from the JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- requires the `admin` role.

pub mod auth;
pub mod rbac;
