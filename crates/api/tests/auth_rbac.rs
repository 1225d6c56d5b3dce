//! Authentication and role gates. These requests are all rejected before a
//! handler touches the database, so the pool never connects.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_json, build_test_app, get, get_auth, lazy_pool, post_json_auth, token};
use serde_json::json;
use tower::ServiceExt;

#[tokio::test]
async fn missing_token_is_401() {
    let app = build_test_app(lazy_pool());
    let response = get(app, "/api/v1/requests/mine").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
    assert_eq!(json["error"], "Authentication required");
}

#[tokio::test]
async fn non_bearer_scheme_is_401() {
    let app = build_test_app(lazy_pool());
    let request = Request::builder()
        .uri("/api/v1/requests/inbox")
        .header("authorization", "Basic dXNlcjpwYXNz")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Authorization must use the Bearer scheme");
}

#[tokio::test]
async fn forged_token_is_401() {
    let app = build_test_app(lazy_pool());
    let response = get_auth(app, "/api/v1/notifications", "not.a.jwt").await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Token is invalid or has expired");
}

#[tokio::test]
async fn admin_routes_refuse_other_roles() {
    for role in ["employee", "dean", "department_head"] {
        let app = build_test_app(lazy_pool());
        let response = get_auth(app, "/api/v1/admin/users", &token(7, role)).await;

        assert_eq!(response.status(), StatusCode::FORBIDDEN, "role {role}");
        let json = body_json(response).await;
        assert_eq!(json["code"], "FORBIDDEN");
    }
}

#[tokio::test]
async fn admin_mutations_refuse_other_roles() {
    let app = build_test_app(lazy_pool());
    let response = post_json_auth(
        app,
        "/api/v1/admin/colleges",
        &token(7, "employee"),
        json!({ "name": "Engineering" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_decision_is_rejected_before_lookup() {
    let app = build_test_app(lazy_pool());
    let response = post_json_auth(
        app,
        "/api/v1/requests/1/actions",
        &token(7, "dean"),
        json!({ "action": "escalate" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn rejection_without_comment_is_rejected() {
    let app = build_test_app(lazy_pool());
    let response = post_json_auth(
        app,
        "/api/v1/requests/1/actions",
        &token(7, "dean"),
        json!({ "action": "reject", "comment": "   " }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn empty_title_fails_validation() {
    let app = build_test_app(lazy_pool());
    let response = post_json_auth(
        app,
        "/api/v1/requests",
        &token(7, "employee"),
        json!({ "form_template_id": 1, "title": "", "form_data": {} }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = build_test_app(lazy_pool());
    let response = get(app, "/api/v1/nonexistent").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_a_request_id() {
    let app = build_test_app(lazy_pool());
    let response = get(app, "/api/v1/requests/mine").await;

    assert!(response.headers().contains_key("x-request-id"));
}
