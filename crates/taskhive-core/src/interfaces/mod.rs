// crates/taskhive-core/src/interfaces/mod.rs
// ============================================================================
// Module: Taskhive Interfaces
// Description: Backend-agnostic storage contract for the tracker engine.
// Purpose: Define fact queries, transactional mutators, and the audit channel.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! The storage interface separates three concerns the engine composes per
//! request: fact queries (cheap ownership lookups used by the tenant resolver
//! and the policy engine), transactional mutators (which re-validate
//! uniqueness and quota against committed state and write their audit row in
//! the same transaction), and the fire-and-forget audit channel used for
//! reads. Implementations must fail closed: a resource whose ownership cannot
//! be established is treated as absent.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::entities::AuditAction;
use crate::core::entities::EntityKind;
use crate::core::entities::Priority;
use crate::core::entities::Project;
use crate::core::entities::ProjectStatus;
use crate::core::entities::Role;
use crate::core::entities::Task;
use crate::core::entities::TaskStatus;
use crate::core::entities::Tenant;
use crate::core::entities::TenantStats;
use crate::core::entities::TenantStatus;
use crate::core::entities::User;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TaskId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::update::ProjectUpdate;
use crate::core::update::TaskUpdate;
use crate::core::update::TenantUpdate;
use crate::core::update::UserUpdate;

// ============================================================================
// SECTION: Ownership Facts
// ============================================================================

/// Tenant facts used by policy evaluation.
///
/// # Invariants
/// - `id` is the authoritative tenant for every resource resolved to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantFacts {
    /// Tenant identifier.
    pub id: TenantId,
    /// Lifecycle status.
    pub status: TenantStatus,
}

/// User facts used by policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFacts {
    /// User identifier.
    pub id: UserId,
    /// Authoritative owning tenant (stored on the user row).
    pub tenant_id: TenantId,
    /// Role held by the user.
    pub role: Role,
    /// Whether the user is active.
    pub is_active: bool,
}

/// Project facts used by policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFacts {
    /// Project identifier.
    pub id: ProjectId,
    /// Authoritative owning tenant (stored on the project row).
    pub tenant_id: TenantId,
    /// Creating user.
    pub created_by: UserId,
}

/// Task facts used by policy evaluation.
///
/// # Invariants
/// - `tenant_id` is derived through the project join, never from a caller
///   credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFacts {
    /// Task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Authoritative owning tenant via the project join.
    pub tenant_id: TenantId,
    /// Creating user.
    pub created_by: UserId,
    /// Current assignee, when any.
    pub assigned_to: Option<UserId>,
}

// ============================================================================
// SECTION: List Filters
// ============================================================================

/// Equality filters for project listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    /// Filter by lifecycle status.
    pub status: Option<ProjectStatus>,
    /// Filter by priority.
    pub priority: Option<Priority>,
    /// Filter by creating user.
    pub created_by: Option<UserId>,
}

/// Equality filters for task listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Filter by workflow status.
    pub status: Option<TaskStatus>,
    /// Filter by priority.
    pub priority: Option<Priority>,
    /// Filter by assignee.
    pub assigned_to: Option<UserId>,
}

// ============================================================================
// SECTION: Audit Record
// ============================================================================

/// Audit payload handed to the store alongside a mutation or read.
///
/// # Invariants
/// - `tenant_id` is the tenant the operation was authorized against (the
///   resolved tenant), never the caller credential's tenant for
///   resource-scoped operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    /// Tenant scope of the audited operation.
    pub tenant_id: TenantId,
    /// Acting user, when authenticated.
    pub user_id: Option<UserId>,
    /// Action label.
    pub action: AuditAction,
    /// Audited entity kind.
    pub entity_type: EntityKind,
    /// Audited entity identifier, when the action targets one row.
    pub entity_id: Option<String>,
    /// Record time (unix millis).
    pub recorded_at: i64,
    /// Originating peer address, when known.
    pub ip_address: Option<String>,
}

// ============================================================================
// SECTION: Store Errors
// ============================================================================

/// Storage errors surfaced to the engine.
///
/// # Invariants
/// - Variants are stable for programmatic handling; `Io` text never reaches
///   clients.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Referenced row does not exist.
    #[error("{0} not found")]
    NotFound(EntityKind),
    /// Uniqueness violation re-detected inside the mutation transaction.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Quota violation re-detected inside the mutation transaction.
    #[error("quota exceeded: {resource} limit is {limit}, current usage is {current}")]
    QuotaExceeded {
        /// Quota label ("users" or "projects").
        resource: &'static str,
        /// Configured limit.
        limit: u32,
        /// Committed usage observed in the transaction.
        current: u32,
    },
    /// Row ownership no longer matches the tenant the operation was
    /// authorized against.
    #[error("tenant ownership mismatch")]
    TenantMismatch,
    /// Payload rejected by the store.
    #[error("store invalid data: {0}")]
    Invalid(String),
    /// Backend failure; text is internal-only.
    #[error("store io error: {0}")]
    Io(String),
}

// ============================================================================
// SECTION: Tracker Store
// ============================================================================

/// Backend-agnostic tracker store.
///
/// Mutators execute as a single atomic unit: re-validation of uniqueness and
/// quota invariants against committed state, the write itself, and exactly
/// one audit row, committed all-or-nothing. Row filters inside mutators use
/// the tenant identifier passed by the engine (the resolved authoritative
/// tenant), so a concurrent ownership change surfaces as
/// [`StoreError::TenantMismatch`] or [`StoreError::NotFound`] rather than a
/// cross-tenant write.
pub trait TrackerStore: Send + Sync {
    // ------------------------------------------------------------------
    // Fact queries
    // ------------------------------------------------------------------

    /// Loads tenant facts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn tenant_facts(&self, id: &TenantId) -> Result<Option<TenantFacts>, StoreError>;

    /// Loads user facts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn user_facts(&self, id: &UserId) -> Result<Option<UserFacts>, StoreError>;

    /// Loads project facts.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn project_facts(&self, id: &ProjectId) -> Result<Option<ProjectFacts>, StoreError>;

    /// Loads task facts, deriving the tenant through the project join.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn task_facts(&self, id: &TaskId) -> Result<Option<TaskFacts>, StoreError>;

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Loads a full tenant record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn load_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, StoreError>;

    /// Returns live usage counters for the tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when counting fails.
    fn tenant_stats(&self, id: &TenantId) -> Result<TenantStats, StoreError>;

    /// Lists all tenants, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError>;

    /// Lists users of one tenant, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_users(&self, tenant_id: &TenantId) -> Result<Vec<User>, StoreError>;

    /// Lists projects of one tenant, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_projects(
        &self,
        tenant_id: &TenantId,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, StoreError>;

    /// Lists tasks of one project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when listing fails.
    fn list_tasks(
        &self,
        project_id: &ProjectId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, StoreError>;

    /// Finds the login candidate for a subdomain/email pair.
    ///
    /// Returns the tenant and user rows without interpreting either; lifecycle
    /// and credential checks belong to the identity boundary.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the lookup fails.
    fn find_login_user(
        &self,
        subdomain: &str,
        email: &str,
    ) -> Result<Option<(Tenant, User)>, StoreError>;

    // ------------------------------------------------------------------
    // Transactional mutators
    // ------------------------------------------------------------------

    /// Registers a tenant together with its first administrator atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] on a subdomain collision.
    fn register_tenant(
        &self,
        tenant: &Tenant,
        admin: &User,
        audit: &AuditRecord,
    ) -> Result<(), StoreError>;

    /// Applies a partial tenant update.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when a limit reduction falls below
    /// committed usage, carrying current and requested counts.
    fn update_tenant(
        &self,
        id: &TenantId,
        update: &TenantUpdate,
        audit: &AuditRecord,
    ) -> Result<Tenant, StoreError>;

    /// Creates a user, re-checking the active-user quota and the
    /// tenant-scoped email uniqueness inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::QuotaExceeded`] or [`StoreError::Conflict`]
    /// accordingly.
    fn create_user(&self, user: &User, audit: &AuditRecord) -> Result<User, StoreError>;

    /// Applies a partial user update scoped to the expected tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the row is gone or owned elsewhere.
    fn update_user(
        &self,
        id: &UserId,
        tenant_id: &TenantId,
        update: &UserUpdate,
        audit: &AuditRecord,
    ) -> Result<User, StoreError>;

    /// Logically deletes a user by clearing `is_active`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the row is gone or owned elsewhere.
    fn deactivate_user(
        &self,
        id: &UserId,
        tenant_id: &TenantId,
        audit: &AuditRecord,
    ) -> Result<(), StoreError>;

    /// Creates a project, re-checking the project quota and the
    /// tenant-scoped name uniqueness inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::QuotaExceeded`] or [`StoreError::Conflict`]
    /// accordingly.
    fn create_project(&self, project: &Project, audit: &AuditRecord)
    -> Result<Project, StoreError>;

    /// Applies a partial project update scoped to the expected tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] on a name collision within the tenant.
    fn update_project(
        &self,
        id: &ProjectId,
        tenant_id: &TenantId,
        update: &ProjectUpdate,
        audit: &AuditRecord,
    ) -> Result<Project, StoreError>;

    /// Physically deletes a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] while the project still owns tasks.
    fn delete_project(
        &self,
        id: &ProjectId,
        tenant_id: &TenantId,
        audit: &AuditRecord,
    ) -> Result<(), StoreError>;

    /// Creates a task, re-verifying the project's tenant binding and the
    /// assignee's tenant and active flag inside the transaction.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TenantMismatch`] when either re-check fails.
    fn create_task(&self, task: &Task, audit: &AuditRecord) -> Result<Task, StoreError>;

    /// Applies a partial task update scoped to the expected tenant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TenantMismatch`] when an assignee re-check fails.
    fn update_task(
        &self,
        id: &TaskId,
        tenant_id: &TenantId,
        update: &TaskUpdate,
        audit: &AuditRecord,
    ) -> Result<Task, StoreError>;

    /// Transitions a task's workflow status.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the row is gone or owned elsewhere.
    fn update_task_status(
        &self,
        id: &TaskId,
        tenant_id: &TenantId,
        status: TaskStatus,
        audit: &AuditRecord,
    ) -> Result<Task, StoreError>;

    /// Physically deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the row is gone or owned elsewhere.
    fn delete_task(
        &self,
        id: &TaskId,
        tenant_id: &TenantId,
        audit: &AuditRecord,
    ) -> Result<(), StoreError>;

    // ------------------------------------------------------------------
    // Audit side channel
    // ------------------------------------------------------------------

    /// Appends an audit row outside any mutation transaction.
    ///
    /// Callers performing reads treat failures as non-fatal.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the append fails.
    fn record_audit(&self, audit: &AuditRecord) -> Result<(), StoreError>;

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
