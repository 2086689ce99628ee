// crates/taskhive-server/src/server/tests.rs
// ============================================================================
// Module: REST Server Unit Tests
// Description: Unit tests for handlers, sessions, and error mapping.
// Purpose: Validate the HTTP boundary with in-memory fixtures.
// Dependencies: taskhive-server
// ============================================================================

//! ## Overview
//! Exercises the REST handlers directly with in-memory fixtures: session
//! lifecycle, status code mapping, and the authoritative-path rule for task
//! creation.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use axum::body::to_bytes;
use axum::http::HeaderValue;
use axum::http::header::WWW_AUTHENTICATE;
use serde_json::Value;
use serde_json::json;
use taskhive_core::EngineError;
use taskhive_core::InMemoryTrackerStore;
use taskhive_core::TenantDefaults;

use super::*;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

/// Builds a current-thread runtime for handler invocation.
fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("runtime must build")
}

/// Builds server state over a fresh in-memory store.
fn state() -> ServerState<InMemoryTrackerStore> {
    ServerState::new(
        TrackerEngine::new(InMemoryTrackerStore::new(), TenantDefaults::default()),
        SessionManager::new(3_600),
    )
}

/// Loopback connect info for audit rows.
fn peer() -> ConnectInfo<SocketAddr> {
    ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4_000)))
}

/// Reads a response body into JSON.
async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body must be readable");
    serde_json::from_slice(&bytes).expect("body must be json")
}

/// Registers a tenant and returns `(token, tenant_id)`.
async fn register(
    state: &ServerState<InMemoryTrackerStore>,
    name: &str,
    subdomain: &str,
) -> (String, String) {
    let request = RegisterRequest {
        tenant_name: name.to_string(),
        subdomain: subdomain.to_string(),
        admin_email: format!("admin@{subdomain}.example.com"),
        admin_password: "hunter2hunter2".to_string(),
        admin_full_name: "Admin".to_string(),
    };
    let response = handle_register(State(state.clone()), peer(), Json(request))
        .await
        .expect("registration must succeed");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    let token = body["data"]["token"]
        .as_str()
        .expect("token present")
        .to_string();
    let tenant_id = body["data"]["tenant"]["id"]
        .as_str()
        .expect("tenant id present")
        .to_string();
    (token, tenant_id)
}

/// Builds headers carrying a bearer token.
fn auth_headers(token: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!("Bearer {token}")).expect("header value");
    headers.insert(AUTHORIZATION, value);
    headers
}

/// Creates a project and returns its id.
async fn seed_project(
    state: &ServerState<InMemoryTrackerStore>,
    token: &str,
    name: &str,
) -> String {
    let request = CreateProjectRequest {
        name: name.to_string(),
        description: None,
        priority: None,
    };
    let response = handle_create_project(
        State(state.clone()),
        peer(),
        auth_headers(token),
        Json(request),
    )
    .await
    .expect("project creation must succeed");
    let body = body_json(response).await;
    body["data"]["id"]
        .as_str()
        .expect("project id present")
        .to_string()
}

// ============================================================================
// SECTION: Health
// ============================================================================

#[test]
fn health_returns_ok() {
    let response = runtime().block_on(handle_health());
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
fn ready_returns_ok_with_a_live_store() {
    let response = runtime().block_on(handle_ready(State(state())));
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// SECTION: Sessions
// ============================================================================

#[test]
fn registration_issues_a_token_that_authenticates_requests() {
    let state = state();
    runtime().block_on(async {
        let (token, tenant_id) = register(&state, "Acme", "acme").await;
        let response = handle_get_tenant(
            State(state.clone()),
            peer(),
            auth_headers(&token),
            Path(TenantId::new(tenant_id)),
        )
        .await
        .expect("tenant read must succeed");
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["data"]["stats"]["total_users"], json!(1));
    });
}

#[test]
fn short_passwords_are_rejected_at_registration() {
    let state = state();
    runtime().block_on(async {
        let request = RegisterRequest {
            tenant_name: "Acme".to_string(),
            subdomain: "acme".to_string(),
            admin_email: "admin@acme.example.com".to_string(),
            admin_password: "short".to_string(),
            admin_full_name: "Admin".to_string(),
        };
        let err = handle_register(State(state.clone()), peer(), Json(request))
            .await
            .expect_err("short password must be rejected");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    });
}

#[test]
fn login_uses_one_message_for_every_failure() {
    let state = state();
    runtime().block_on(async {
        register(&state, "Acme", "acme").await;

        let wrong_password = handle_login(
            State(state.clone()),
            peer(),
            Json(LoginRequest {
                subdomain: "acme".to_string(),
                email: "admin@acme.example.com".to_string(),
                password: "wrong-password".to_string(),
            }),
        )
        .await
        .expect_err("wrong password must fail");
        let unknown_account = handle_login(
            State(state.clone()),
            peer(),
            Json(LoginRequest {
                subdomain: "acme".to_string(),
                email: "nobody@acme.example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            }),
        )
        .await
        .expect_err("unknown account must fail");

        assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(unknown_account.status(), StatusCode::UNAUTHORIZED);
        let first = body_json(wrong_password.into_response()).await;
        let second = body_json(unknown_account.into_response()).await;
        assert_eq!(first["message"], second["message"]);
    });
}

#[test]
fn logout_revokes_the_session() {
    let state = state();
    runtime().block_on(async {
        register(&state, "Acme", "acme").await;
        let login = handle_login(
            State(state.clone()),
            peer(),
            Json(LoginRequest {
                subdomain: "acme".to_string(),
                email: "admin@acme.example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            }),
        )
        .await
        .expect("login must succeed");
        let token = body_json(login).await["data"]["token"]
            .as_str()
            .expect("token present")
            .to_string();

        let logout = handle_logout(State(state.clone()), auth_headers(&token))
            .await
            .expect("logout must succeed");
        assert_eq!(logout.status(), StatusCode::OK);

        let err = handle_list_projects(
            State(state.clone()),
            peer(),
            auth_headers(&token),
            Query(ProjectListQuery::default()),
        )
        .await
        .expect_err("revoked token must not authenticate");
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        let response = err.into_response();
        assert!(response.headers().get(WWW_AUTHENTICATE).is_some());
    });
}

#[test]
fn suspended_tenants_cannot_log_in() {
    let state = state();
    runtime().block_on(async {
        let (_, tenant_id) = register(&state, "Acme", "acme").await;
        let operator = CallerContext::new(
            UserId::new("platform-operator"),
            TenantId::new("platform"),
            Role::SuperAdmin,
        );
        let update = TenantUpdate {
            status: Some(TenantStatus::Suspended),
            ..TenantUpdate::default()
        };
        state
            .engine
            .update_tenant(&operator, &TenantId::new(tenant_id), &update, None)
            .expect("suspension must succeed");

        let err = handle_login(
            State(state.clone()),
            peer(),
            Json(LoginRequest {
                subdomain: "acme".to_string(),
                email: "admin@acme.example.com".to_string(),
                password: "hunter2hunter2".to_string(),
            }),
        )
        .await
        .expect_err("suspended tenant login must fail");
        assert_eq!(err.status(), StatusCode::FORBIDDEN);
    });
}

// ============================================================================
// SECTION: Error Mapping
// ============================================================================

#[test]
fn engine_refusals_map_onto_response_statuses() {
    let state = state();
    runtime().block_on(async {
        let (token_a, _) = register(&state, "Acme", "acme").await;
        let (_, tenant_b) = register(&state, "Globex", "globex").await;

        // Cross-tenant read: 403.
        let forbidden = handle_get_tenant(
            State(state.clone()),
            peer(),
            auth_headers(&token_a),
            Path(TenantId::new(tenant_b)),
        )
        .await
        .expect_err("cross-tenant read must fail");
        assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

        // Unknown resource: 404.
        let missing = handle_update_project(
            State(state.clone()),
            peer(),
            auth_headers(&token_a),
            Path(ProjectId::new("no-such-project")),
            Json(ProjectUpdate {
                name: Some("Renamed".to_string()),
                ..ProjectUpdate::default()
            }),
        )
        .await
        .expect_err("unknown project must fail");
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        // Duplicate subdomain: 409.
        let duplicate = handle_register(
            State(state.clone()),
            peer(),
            Json(RegisterRequest {
                tenant_name: "Acme Again".to_string(),
                subdomain: "ACME".to_string(),
                admin_email: "other@acme.example.com".to_string(),
                admin_password: "hunter2hunter2".to_string(),
                admin_full_name: "Other".to_string(),
            }),
        )
        .await
        .expect_err("duplicate subdomain must fail");
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);

        // Empty update payload: 400.
        let project_id = seed_project(&state, &token_a, "Rollout").await;
        let empty = handle_update_project(
            State(state.clone()),
            peer(),
            auth_headers(&token_a),
            Path(ProjectId::new(project_id)),
            Json(ProjectUpdate::default()),
        )
        .await
        .expect_err("empty update must fail");
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    });
}

#[test]
fn internal_failures_never_expose_storage_detail() {
    let err = ApiError::from(EngineError::Internal(
        "sqlite disk I/O error at /var/lib/taskhive/taskhive.db".to_string(),
    ));
    assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    runtime().block_on(async {
        let body = body_json(err.into_response()).await;
        assert_eq!(body["message"], json!("internal server error"));
    });
}

// ============================================================================
// SECTION: Task Routes
// ============================================================================

#[test]
fn task_creation_and_status_transition_round_trip() {
    let state = state();
    runtime().block_on(async {
        let (token, _) = register(&state, "Acme", "acme").await;
        let project_id = seed_project(&state, &token, "Rollout").await;

        let create = handle_create_task(
            State(state.clone()),
            peer(),
            auth_headers(&token),
            Path(ProjectId::new(project_id.clone())),
            Json(CreateTaskRequest {
                title: "Ship it".to_string(),
                description: None,
                priority: None,
                status: None,
                assigned_to: None,
                due_date: None,
            }),
        )
        .await
        .expect("task creation must succeed");
        assert_eq!(create.status(), StatusCode::CREATED);
        let created_body = body_json(create).await;
        assert_eq!(created_body["data"]["status"], json!("todo"));
        let task_id = created_body["data"]["id"]
            .as_str()
            .expect("task id present")
            .to_string();

        let patched = handle_update_task_status(
            State(state.clone()),
            peer(),
            auth_headers(&token),
            Path(TaskId::new(task_id)),
            Json(TaskStatusRequest {
                status: TaskStatus::InProgress,
            }),
        )
        .await
        .expect("status transition must succeed");
        let patched_body = body_json(patched).await;
        assert_eq!(patched_body["data"]["status"], json!("in_progress"));

        let listed = handle_list_tasks(
            State(state.clone()),
            peer(),
            auth_headers(&token),
            Path(ProjectId::new(project_id)),
            Query(TaskListQuery {
                status: Some(TaskStatus::InProgress),
                ..TaskListQuery::default()
            }),
        )
        .await
        .expect("task listing must succeed");
        let listed_body = body_json(listed).await;
        assert_eq!(
            listed_body["data"]
                .as_array()
                .expect("task array present")
                .len(),
            1
        );
    });
}
