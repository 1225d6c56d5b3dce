//! Bearer token verification.
//!
//! Tokens are issued by the university credentials provider; this service
//! only validates them.

pub mod jwt;
