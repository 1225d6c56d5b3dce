//! HTTP handlers, one module per resource.
//!
//! Handlers validate input, delegate to the `unicorr_core` rules and the
//! `unicorr_db` repositories, and map failures through [`AppError`].
//!
//! [`AppError`]: crate::error::AppError

pub mod attachments;
pub mod audit;
pub mod delegations;
pub mod forms;
pub mod notifications;
pub mod organisation;
pub mod reports;
pub mod requests;
pub mod users;
pub mod workflows;
