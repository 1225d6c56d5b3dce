//! Integration tests for request persistence against a real database:
//! - Submission assigns a reference number and starts at step 1
//! - Transitions are compare-and-set on `(status, current_step)`
//! - Steps cannot be replaced while requests are in flight
//! - Overlapping delegations are refused
//! - Every write extends a verifiable audit chain

use chrono::{Duration, Utc};
use serde_json::json;
use sqlx::PgPool;
use unicorr_core::audit::{action_types, entity_types, verify_chain};
use unicorr_core::delegation::DelegationStatus;
use unicorr_core::request_status::{ActionKind, RequestStatus};
use unicorr_core::workflow::StepDefinition;
use unicorr_core::workflow_engine::{decide, Transition};
use unicorr_db::models::audit::NewAuditLog;
use unicorr_db::models::delegation::CreateDelegation;
use unicorr_db::models::form_template::CreateFormTemplate;
use unicorr_db::models::organisation::{CreateCollege, CreateDepartment};
use unicorr_db::models::request::NewRequest;
use unicorr_db::models::request_action::NewAction;
use unicorr_db::models::user::{CreateUser, User};
use unicorr_db::models::workflow::CreateWorkflow;
use unicorr_db::repositories::delegation_repo::CreateDelegationOutcome;
use unicorr_db::repositories::workflow_repo::ReplaceStepsOutcome;
use unicorr_db::repositories::{
    AuditLogRepo, CollegeRepo, DelegationRepo, DepartmentRepo, FormTemplateRepo,
    RequestActionRepo, RequestRepo, RoleRepo, UserRepo, WorkflowRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn audit(action_type: &'static str, entity_type: &'static str) -> NewAuditLog {
    NewAuditLog {
        action_type,
        entity_type,
        entity_id: None,
        actor_id: None,
        details: json!({}),
    }
}

async fn user(pool: &PgPool, name: &str, role: &str, department_id: i64) -> User {
    let role_id = RoleRepo::find_by_name(pool, role).await.unwrap().unwrap().id;
    let input = CreateUser {
        full_name: name.to_string(),
        email: format!("{name}@uni.test"),
        phone: None,
        role: role.to_string(),
        department_id: Some(department_id),
        whatsapp_opt_in: false,
    };
    UserRepo::create(pool, &input, role_id).await.unwrap()
}

fn step(n: i32, role: &str, is_final: bool) -> StepDefinition {
    StepDefinition {
        step_number: n,
        name: format!("Step {n}"),
        approver_role: Some(role.to_string()),
        approver_user_id: None,
        sla_hours: 24,
        is_final,
        escalation_role: None,
    }
}

struct Fixture {
    student: User,
    head: User,
    workflow_id: i64,
    template_id: i64,
}

async fn fixture(pool: &PgPool) -> Fixture {
    let college = CollegeRepo::create(pool, &CreateCollege { name: "Engineering".into() })
        .await
        .unwrap();
    let dept = DepartmentRepo::create(
        pool,
        &CreateDepartment {
            college_id: college.id,
            name: "Civil".into(),
        },
    )
    .await
    .unwrap();
    let student = user(pool, "student", "student", dept.id).await;
    let head = user(pool, "head", "department_head", dept.id).await;

    let (workflow, _) = WorkflowRepo::create(
        pool,
        &CreateWorkflow {
            name: "Leave".into(),
            description: None,
            steps: vec![step(1, "department_head", false), step(2, "dean", true)],
        },
        head.id,
        audit(action_types::WORKFLOW_CHANGE, entity_types::WORKFLOW),
    )
    .await
    .unwrap();

    let template = FormTemplateRepo::create(
        pool,
        &CreateFormTemplate {
            code: "leave".into(),
            name: "Leave request".into(),
            description: None,
            fields: json!([{"name": "reason", "label": "Reason", "kind": "text", "required": true}]),
            allowed_roles: vec![],
            workflow_id: workflow.id,
        },
        audit(action_types::FORM_CHANGE, entity_types::FORM_TEMPLATE),
    )
    .await
    .unwrap();

    Fixture {
        student,
        head,
        workflow_id: workflow.id,
        template_id: template.id,
    }
}

async fn submit(pool: &PgPool, f: &Fixture) -> unicorr_db::models::request::Request {
    let data = json!({"reason": "conference"});
    RequestRepo::create(
        pool,
        &NewRequest {
            requester_id: f.student.id,
            form_template_id: f.template_id,
            template_code: "LEAVE",
            workflow_id: f.workflow_id,
            first_step: 1,
            title: "Conference leave",
            form_data: &data,
        },
        audit(action_types::REQUEST_SUBMIT, entity_types::REQUEST),
    )
    .await
    .unwrap()
    .expect("workflow is active")
}

fn first_approval() -> Transition {
    let position = unicorr_core::workflow_engine::StepPosition {
        step_number: 1,
        is_final: false,
        next_step: Some(2),
    };
    decide(RequestStatus::Pending, position, ActionKind::Approve).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn submission_assigns_reference_and_first_step(pool: PgPool) {
    let f = fixture(&pool).await;
    let request = submit(&pool, &f).await;

    assert_eq!(request.status, "pending");
    assert_eq!(request.current_step, 1);
    let year = request.submitted_at.format("%Y").to_string();
    assert_eq!(
        request.reference_number,
        format!("LEAVE-{year}-{:06}", request.id)
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn transition_is_compare_and_set(pool: PgPool) {
    let f = fixture(&pool).await;
    let request = submit(&pool, &f).await;
    let transition = first_approval();
    let decided_at = request.submitted_at + Duration::hours(3);
    let action = NewAction {
        actor_id: f.head.id,
        on_behalf_of: None,
        action: ActionKind::Approve,
        comment: None,
        acted_at: decided_at,
    };

    let (updated, recorded) = RequestRepo::apply_transition(
        &pool,
        request.id,
        &transition,
        &action,
        None,
        audit(action_types::REQUEST_ACTION, entity_types::REQUEST),
    )
    .await
    .unwrap()
    .expect("first write wins");
    assert_eq!(updated.status, "processing");
    assert_eq!(updated.current_step, 2);
    assert_eq!(recorded.step_number, 1);
    assert_eq!(recorded.action, "approve");
    // Both ends of the SLA interval come from the application clock.
    assert_eq!(recorded.acted_at, decided_at);
    assert_eq!(
        (recorded.acted_at - updated.submitted_at).num_minutes(),
        180
    );

    // Same transition again: the row no longer matches its source state.
    let stale = RequestRepo::apply_transition(
        &pool,
        request.id,
        &transition,
        &action,
        None,
        audit(action_types::REQUEST_ACTION, entity_types::REQUEST),
    )
    .await
    .unwrap();
    assert!(stale.is_none());

    let actions = RequestActionRepo::list_for_request(&pool, request.id)
        .await
        .unwrap();
    assert_eq!(actions.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn steps_are_frozen_while_requests_are_in_flight(pool: PgPool) {
    let f = fixture(&pool).await;
    submit(&pool, &f).await;

    let outcome = WorkflowRepo::replace_steps(
        &pool,
        f.workflow_id,
        &[step(1, "admin", true)],
        audit(action_types::WORKFLOW_CHANGE, entity_types::WORKFLOW),
    )
    .await
    .unwrap();
    assert!(matches!(outcome, ReplaceStepsOutcome::InFlight(1)));

    let steps = WorkflowRepo::list_steps(&pool, f.workflow_id).await.unwrap();
    assert_eq!(steps.len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn overlapping_delegations_are_refused(pool: PgPool) {
    let f = fixture(&pool).await;
    let start = Utc::now() + Duration::hours(1);
    let input = CreateDelegation {
        grantee_id: f.student.id,
        starts_at: start,
        ends_at: start + Duration::days(3),
        reason: None,
    };
    let first = DelegationRepo::create(
        &pool,
        f.head.id,
        &input,
        audit(action_types::DELEGATION_CREATE, entity_types::DELEGATION),
    )
    .await
    .unwrap();
    let CreateDelegationOutcome::Created(first) = first else {
        panic!("first delegation should be created");
    };

    let overlapping = CreateDelegation {
        starts_at: start + Duration::days(2),
        ends_at: start + Duration::days(5),
        ..input
    };
    let second = DelegationRepo::create(
        &pool,
        f.head.id,
        &overlapping,
        audit(action_types::DELEGATION_CREATE, entity_types::DELEGATION),
    )
    .await
    .unwrap();
    assert!(matches!(second, CreateDelegationOutcome::Overlaps(id) if id == first.id));

    // Once revoked, the window is free again.
    DelegationRepo::transition(
        &pool,
        first.id,
        DelegationStatus::Pending,
        DelegationStatus::Revoked,
        f.head.id,
        audit(action_types::DELEGATION_REVOKE, entity_types::DELEGATION),
    )
    .await
    .unwrap()
    .expect("pending delegation can be revoked");
    let third = DelegationRepo::create(
        &pool,
        f.head.id,
        &overlapping,
        audit(action_types::DELEGATION_CREATE, entity_types::DELEGATION),
    )
    .await
    .unwrap();
    assert!(matches!(third, CreateDelegationOutcome::Created(_)));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn audit_chain_verifies_and_detects_tampering(pool: PgPool) {
    let f = fixture(&pool).await;
    submit(&pool, &f).await;

    let entries = AuditLogRepo::fetch_chain(&pool).await.unwrap();
    assert_eq!(entries.len(), 3);
    let links: Vec<_> = entries.iter().map(|e| e.to_chain_link()).collect();
    assert!(verify_chain(&links).valid);

    sqlx::query("UPDATE audit_logs SET details = '{\"forged\": true}' WHERE id = $1")
        .bind(entries[1].id)
        .execute(&pool)
        .await
        .unwrap();
    let entries = AuditLogRepo::fetch_chain(&pool).await.unwrap();
    let links: Vec<_> = entries.iter().map(|e| e.to_chain_link()).collect();
    let result = verify_chain(&links);
    assert!(!result.valid);
    assert_eq!(result.first_broken_id, Some(entries[1].id));
}
