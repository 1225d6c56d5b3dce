//! Row structs and DTOs.
//!
//! Each submodule holds a `FromRow` + `Serialize` entity matching the table,
//! and `Deserialize` DTOs for inserts and patches.

pub mod attachment;
pub mod audit;
pub mod delegation;
pub mod form_template;
pub mod notification;
pub mod organisation;
pub mod request;
pub mod request_action;
pub mod user;
pub mod whatsapp;
pub mod workflow;
