// crates/taskhive-server/src/server.rs
// ============================================================================
// Module: REST Server
// Description: Router, shared state, and request handlers.
// Purpose: Map each REST route onto exactly one engine operation, with the
//          caller context asserted from the bearer token.
// Dependencies: axum, serde, taskhive-core, tokio
// ============================================================================

//! ## Overview
//! The router exposes the tracker as a small REST API. Authentication lives
//! entirely at this boundary: handlers resolve the bearer token into a
//! caller context and hand it to the engine, which makes every access
//! decision itself.
//!
//! ## Invariants
//! - Handlers never read a tenant id out of the request body to scope a
//!   resource; the engine resolves ownership from storage.
//! - Unauthenticated routes are tenant self-registration, login, health,
//!   and readiness only.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::Router;
use axum::extract::ConnectInfo;
use axum::extract::Path;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::AUTHORIZATION;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::routing::put;
use serde::Deserialize;
use serde::Serialize;
use taskhive_core::CallerContext;
use taskhive_core::NewProject;
use taskhive_core::NewTask;
use taskhive_core::NewUser;
use taskhive_core::Priority;
use taskhive_core::ProjectFilter;
use taskhive_core::ProjectId;
use taskhive_core::ProjectStatus;
use taskhive_core::ProjectUpdate;
use taskhive_core::Role;
use taskhive_core::TaskFilter;
use taskhive_core::TaskId;
use taskhive_core::TaskStatus;
use taskhive_core::TaskUpdate;
use taskhive_core::Tenant;
use taskhive_core::TenantId;
use taskhive_core::TenantRegistration;
use taskhive_core::TenantStats;
use taskhive_core::TenantStatus;
use taskhive_core::TenantUpdate;
use taskhive_core::TrackerEngine;
use taskhive_core::TrackerStore;
use taskhive_core::User;
use taskhive_core::UserId;
use taskhive_core::UserUpdate;
use thiserror::Error;

use crate::identity::SessionManager;
use crate::identity::hash_password;
use crate::identity::verify_password;
use crate::response::ApiError;
use crate::response::created;
use crate::response::ok;

#[cfg(test)]
mod tests;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 8;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Fatal server lifecycle errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the listener failed.
    #[error("bind failed: {0}")]
    Bind(String),
    /// The accept loop terminated with an error.
    #[error("serve failed: {0}")]
    Serve(String),
}

// ============================================================================
// SECTION: State
// ============================================================================

/// Shared state handed to every handler.
pub struct ServerState<S> {
    /// The tracker engine.
    pub engine: Arc<TrackerEngine<S>>,
    /// Live session table.
    pub sessions: Arc<SessionManager>,
}

impl<S> Clone for ServerState<S> {
    fn clone(&self) -> Self {
        Self {
            engine: Arc::clone(&self.engine),
            sessions: Arc::clone(&self.sessions),
        }
    }
}

impl<S: TrackerStore> ServerState<S> {
    /// Creates server state from an engine and a session manager.
    #[must_use]
    pub fn new(engine: TrackerEngine<S>, sessions: SessionManager) -> Self {
        Self {
            engine: Arc::new(engine),
            sessions: Arc::new(sessions),
        }
    }
}

// ============================================================================
// SECTION: Router
// ============================================================================

/// Builds the REST router over the given state.
pub fn router<S>(state: ServerState<S>) -> Router
where
    S: TrackerStore + Send + Sync + 'static,
{
    Router::new()
        .route("/health", get(handle_health))
        .route("/ready", get(handle_ready::<S>))
        .route("/api/auth/login", post(handle_login::<S>))
        .route("/api/auth/logout", post(handle_logout::<S>))
        .route(
            "/api/tenants",
            get(handle_list_tenants::<S>).post(handle_register::<S>),
        )
        .route(
            "/api/tenants/{id}",
            get(handle_get_tenant::<S>).put(handle_update_tenant::<S>),
        )
        .route(
            "/api/tenants/{id}/users",
            get(handle_list_users::<S>).post(handle_add_user::<S>),
        )
        .route(
            "/api/users/{id}",
            put(handle_update_user::<S>).delete(handle_delete_user::<S>),
        )
        .route(
            "/api/projects",
            get(handle_list_projects::<S>).post(handle_create_project::<S>),
        )
        .route(
            "/api/projects/{id}",
            put(handle_update_project::<S>).delete(handle_delete_project::<S>),
        )
        .route(
            "/api/projects/{id}/tasks",
            get(handle_list_tasks::<S>).post(handle_create_task::<S>),
        )
        .route(
            "/api/tasks/{id}",
            put(handle_update_task::<S>).delete(handle_delete_task::<S>),
        )
        .route(
            "/api/tasks/{id}/status",
            patch(handle_update_task_status::<S>),
        )
        .with_state(state)
}

/// Binds the listener and serves the router until shutdown.
///
/// # Errors
///
/// Returns [`ServerError`] when the bind or the accept loop fails.
pub async fn serve<S>(bind: SocketAddr, state: ServerState<S>) -> Result<(), ServerError>
where
    S: TrackerStore + Send + Sync + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .map_err(|err| ServerError::Bind(err.to_string()))?;
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|err| ServerError::Serve(err.to_string()))
}

/// Resolves when the process receives an interrupt.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

// ============================================================================
// SECTION: Request and Response Bodies
// ============================================================================

/// Tenant self-registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Display name for the new tenant.
    pub tenant_name: String,
    /// Subdomain for the new tenant.
    pub subdomain: String,
    /// Email address of the first administrator.
    pub admin_email: String,
    /// Password of the first administrator.
    pub admin_password: String,
    /// Full name of the first administrator.
    pub admin_full_name: String,
}

/// Login request.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Tenant subdomain the credential belongs to.
    pub subdomain: String,
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
}

/// Session payload returned by registration and login.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    /// Opaque bearer token.
    pub token: String,
    /// Authenticated user row.
    pub user: User,
    /// Tenant the session belongs to.
    pub tenant: Tenant,
}

/// Tenant detail payload with live usage counters.
#[derive(Debug, Serialize)]
pub struct TenantDetail {
    /// Tenant row.
    pub tenant: Tenant,
    /// Live usage counters.
    pub stats: TenantStats,
}

/// User creation request.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Email address of the new user.
    pub email: String,
    /// Password of the new user.
    pub password: String,
    /// Full name of the new user.
    pub full_name: String,
    /// Role of the new user.
    pub role: Role,
}

/// Project creation request.
#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    /// Project name, unique within the tenant.
    pub name: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Project priority.
    #[serde(default)]
    pub priority: Option<Priority>,
}

/// Task creation request; the parent project comes from the path.
#[derive(Debug, Deserialize)]
pub struct CreateTaskRequest {
    /// Task title.
    pub title: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// Task priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Initial workflow status.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// Optional assignee; must be an active member of the owning tenant.
    #[serde(default)]
    pub assigned_to: Option<UserId>,
    /// Optional due date (unix millis).
    #[serde(default)]
    pub due_date: Option<i64>,
}

/// Equality filters accepted by the project listing route.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectListQuery {
    /// Filter by lifecycle status.
    pub status: Option<ProjectStatus>,
    /// Filter by priority.
    pub priority: Option<Priority>,
    /// Filter by creating user.
    pub created_by: Option<UserId>,
}

/// Equality filters accepted by the task listing route.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    /// Filter by workflow status.
    pub status: Option<TaskStatus>,
    /// Filter by priority.
    pub priority: Option<Priority>,
    /// Filter by assigned user.
    pub assigned_to: Option<UserId>,
}

/// Task status transition request.
#[derive(Debug, Deserialize)]
pub struct TaskStatusRequest {
    /// Target workflow status.
    pub status: TaskStatus,
}

// ============================================================================
// SECTION: Authentication Helpers
// ============================================================================

/// Extracts the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Resolves the bearer token into a verified caller context.
fn authenticate<S>(state: &ServerState<S>, headers: &HeaderMap) -> Result<CallerContext, ApiError> {
    bearer_token(headers)
        .and_then(|token| state.sessions.resolve(token))
        .ok_or_else(ApiError::unauthorized)
}

/// Formats the peer address for audit rows.
fn peer_ip(addr: &SocketAddr) -> String {
    addr.ip().to_string()
}

// ============================================================================
// SECTION: Health Handlers
// ============================================================================

/// Liveness probe.
pub async fn handle_health() -> Response {
    StatusCode::OK.into_response()
}

/// Readiness probe backed by the store.
pub async fn handle_ready<S: TrackerStore>(State(state): State<ServerState<S>>) -> Response {
    match state.engine.readiness() {
        Ok(()) => StatusCode::OK.into_response(),
        Err(_) => StatusCode::SERVICE_UNAVAILABLE.into_response(),
    }
}

// ============================================================================
// SECTION: Auth Handlers
// ============================================================================

/// Registers a tenant with its first administrator and opens a session.
pub async fn handle_register<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    if request.admin_password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation("password must be at least 8 characters"));
    }
    let registration = TenantRegistration {
        tenant_name: request.tenant_name,
        subdomain: request.subdomain,
        admin_email: request.admin_email,
        admin_password_hash: hash_password(&request.admin_password),
        admin_full_name: request.admin_full_name,
    };
    let ip = peer_ip(&addr);
    let (tenant, user) = state.engine.register_tenant(&registration, Some(&ip))?;
    let token = state.sessions.issue(&user)?;
    Ok(created(SessionResponse {
        token,
        user,
        tenant,
    }))
}

/// Verifies credentials and opens a session.
pub async fn handle_login<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let candidate = state
        .engine
        .login_lookup(&request.subdomain, &request.email)?;
    // One failure message for unknown, inactive, and wrong-password cases.
    let Some((tenant, user)) = candidate else {
        return Err(ApiError::invalid_credentials());
    };
    if !user.is_active || !verify_password(&request.password, &user.password_hash) {
        return Err(ApiError::invalid_credentials());
    }
    if tenant.status == TenantStatus::Suspended {
        return Err(ApiError::tenant_suspended());
    }
    let token = state.sessions.issue(&user)?;
    let ip = peer_ip(&addr);
    state.engine.audit_login(&tenant.id, &user.id, Some(&ip));
    Ok(ok(SessionResponse {
        token,
        user,
        tenant,
    }))
}

/// Revokes the presented session token.
pub async fn handle_logout<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    authenticate(&state, &headers)?;
    if let Some(token) = bearer_token(&headers) {
        state.sessions.revoke(token);
    }
    Ok(ok(()))
}

// ============================================================================
// SECTION: Tenant Handlers
// ============================================================================

/// Lists every tenant (platform operators only).
pub async fn handle_list_tenants<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    let tenants = state.engine.list_tenants(&caller, Some(&ip))?;
    Ok(ok(tenants))
}

/// Reads one tenant with its usage counters.
pub async fn handle_get_tenant<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<TenantId>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    let (tenant, stats) = state.engine.get_tenant(&caller, &id, Some(&ip))?;
    Ok(ok(TenantDetail { tenant, stats }))
}

/// Applies a partial tenant update.
pub async fn handle_update_tenant<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<TenantId>,
    Json(update): Json<TenantUpdate>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    let tenant = state.engine.update_tenant(&caller, &id, &update, Some(&ip))?;
    Ok(ok(tenant))
}

// ============================================================================
// SECTION: User Handlers
// ============================================================================

/// Lists the users of a tenant.
pub async fn handle_list_users<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<TenantId>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    let users = state.engine.list_users(&caller, &id, Some(&ip))?;
    Ok(ok(users))
}

/// Creates a user inside a tenant.
pub async fn handle_add_user<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<TenantId>,
    Json(request): Json<CreateUserRequest>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::validation("password must be at least 8 characters"));
    }
    let input = NewUser {
        email: request.email,
        password_hash: hash_password(&request.password),
        full_name: request.full_name,
        role: request.role,
    };
    let ip = peer_ip(&addr);
    let user = state.engine.add_user(&caller, &id, &input, Some(&ip))?;
    Ok(created(user))
}

/// Applies a partial user update.
pub async fn handle_update_user<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<UserId>,
    Json(update): Json<UserUpdate>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    let user = state.engine.update_user(&caller, &id, &update, Some(&ip))?;
    Ok(ok(user))
}

/// Logically deletes a user.
pub async fn handle_delete_user<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<UserId>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    state.engine.delete_user(&caller, &id, Some(&ip))?;
    Ok(ok(()))
}

// ============================================================================
// SECTION: Project Handlers
// ============================================================================

/// Lists the projects of the caller's tenant.
pub async fn handle_list_projects<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Query(query): Query<ProjectListQuery>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let filter = ProjectFilter {
        status: query.status,
        priority: query.priority,
        created_by: query.created_by,
    };
    let ip = peer_ip(&addr);
    let projects = state.engine.list_projects(&caller, &filter, Some(&ip))?;
    Ok(ok(projects))
}

/// Creates a project in the caller's tenant.
pub async fn handle_create_project<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<CreateProjectRequest>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let input = NewProject {
        name: request.name,
        description: request.description,
        priority: request.priority.unwrap_or(Priority::Medium),
    };
    let ip = peer_ip(&addr);
    let project = state.engine.create_project(&caller, &input, Some(&ip))?;
    Ok(created(project))
}

/// Applies a partial project update.
pub async fn handle_update_project<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<ProjectId>,
    Json(update): Json<ProjectUpdate>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    let project = state
        .engine
        .update_project(&caller, &id, &update, Some(&ip))?;
    Ok(ok(project))
}

/// Physically deletes a project.
pub async fn handle_delete_project<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<ProjectId>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    state.engine.delete_project(&caller, &id, Some(&ip))?;
    Ok(ok(()))
}

// ============================================================================
// SECTION: Task Handlers
// ============================================================================

/// Lists the tasks of a project.
pub async fn handle_list_tasks<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<ProjectId>,
    Query(query): Query<TaskListQuery>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        assigned_to: query.assigned_to,
    };
    let ip = peer_ip(&addr);
    let tasks = state.engine.list_tasks(&caller, &id, &filter, Some(&ip))?;
    Ok(ok(tasks))
}

/// Creates a task under a project.
pub async fn handle_create_task<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<ProjectId>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    // The path segment is authoritative for the parent project.
    let input = NewTask {
        project_id: id,
        title: request.title,
        description: request.description,
        priority: request.priority.unwrap_or(Priority::Medium),
        status: request.status.unwrap_or(TaskStatus::Todo),
        assigned_to: request.assigned_to,
        due_date: request.due_date,
    };
    let ip = peer_ip(&addr);
    let task = state.engine.create_task(&caller, &input, Some(&ip))?;
    Ok(created(task))
}

/// Applies a partial task update.
pub async fn handle_update_task<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
    Json(update): Json<TaskUpdate>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    let task = state.engine.update_task(&caller, &id, &update, Some(&ip))?;
    Ok(ok(task))
}

/// Transitions a task's workflow status.
pub async fn handle_update_task_status<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
    Json(request): Json<TaskStatusRequest>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    let task = state
        .engine
        .update_task_status(&caller, &id, request.status, Some(&ip))?;
    Ok(ok(task))
}

/// Physically deletes a task.
pub async fn handle_delete_task<S: TrackerStore>(
    State(state): State<ServerState<S>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<TaskId>,
) -> Result<Response, ApiError> {
    let caller = authenticate(&state, &headers)?;
    let ip = peer_ip(&addr);
    state.engine.delete_task(&caller, &id, Some(&ip))?;
    Ok(ok(()))
}
