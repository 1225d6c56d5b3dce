//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async operations that
//! accept `&PgPool` as the first argument. Operations spanning several tables
//! run in one transaction.

pub mod attachment_repo;
pub mod audit_repo;
pub mod delegation_repo;
pub mod form_template_repo;
pub mod notification_repo;
pub mod organisation_repo;
pub mod request_action_repo;
pub mod request_repo;
pub mod user_repo;
pub mod whatsapp_queue_repo;
pub mod workflow_repo;

pub use attachment_repo::AttachmentRepo;
pub use audit_repo::AuditLogRepo;
pub use delegation_repo::DelegationRepo;
pub use form_template_repo::FormTemplateRepo;
pub use notification_repo::NotificationRepo;
pub use organisation_repo::{CollegeRepo, DepartmentRepo, RoleRepo};
pub use request_action_repo::RequestActionRepo;
pub use request_repo::RequestRepo;
pub use user_repo::UserRepo;
pub use whatsapp_queue_repo::WhatsAppQueueRepo;
pub use workflow_repo::WorkflowRepo;
