//! Domain logic for the university correspondence and approval workflow.
//!
//! This crate has no internal dependencies so the engine rules can be used
//! (and unit tested) without a database or HTTP layer.

pub mod audit;
pub mod authority;
pub mod channels;
pub mod delegation;
pub mod error;
pub mod forms;
pub mod pagination;
pub mod reference;
pub mod request_status;
pub mod roles;
pub mod sla;
pub mod types;
pub mod workflow;
pub mod workflow_engine;
