// crates/taskhive-core/src/engine/mod.rs
// ============================================================================
// Module: Tracker Engine
// Description: Request orchestration: resolve, authorize, mutate, audit.
// Purpose: Compose the tenant resolver, the policy engine, and the store into
//          the tracker's operation surface.
// Dependencies: crate::core, crate::interfaces, crate::policy, crate::resolver
// ============================================================================

//! ## Overview
//! Every operation follows the same sequence: resolve the authoritative
//! tenant through the resource's ownership chain, evaluate the policy engine
//! against the verified caller context, then hand the mutation to the store,
//! which re-validates uniqueness and quota invariants inside its transaction
//! and writes the audit row atomically with the change. Reads audit through
//! the fire-and-forget side channel: an audit failure never fails the read.
//!
//! The engine owns input validation and the construction of new rows
//! (identifier generation, timestamps, tenant binding). Task rows bind to the
//! tenant of their parent project, never to the caller credential.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use thiserror::Error;

use crate::core::context::CallerContext;
use crate::core::entities::AuditAction;
use crate::core::entities::EntityKind;
use crate::core::entities::Priority;
use crate::core::entities::Project;
use crate::core::entities::ProjectStatus;
use crate::core::entities::Role;
use crate::core::entities::SubscriptionType;
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
use crate::interfaces::AuditRecord;
use crate::interfaces::ProjectFilter;
use crate::interfaces::StoreError;
use crate::interfaces::TaskFilter;
use crate::interfaces::TrackerStore;
use crate::interfaces::UserFacts;
use crate::policy::AccessRequest;
use crate::policy::DenyReason;
use crate::policy::decide;
use crate::resolver::resolve_project;
use crate::resolver::resolve_task;
use crate::resolver::resolve_tenant;
use crate::resolver::resolve_user;

// ============================================================================
// SECTION: Engine Errors
// ============================================================================

/// Operation failure taxonomy surfaced to transport layers.
///
/// # Invariants
/// - `NotFound` is returned for cross-tenant *reads* only via the policy
///   layer's `Forbidden`; existence of foreign resources is never confirmed
///   beyond the refusal itself.
/// - `Internal` text is operator-facing; transports must not echo it to
///   clients verbatim.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Request payload failed validation before any storage work.
    #[error("validation error: {0}")]
    Validation(String),
    /// Addressed resource does not exist (or its ownership chain is broken).
    #[error("{0} not found")]
    NotFound(EntityKind),
    /// Policy engine refused the operation.
    #[error("{}", .0.message())]
    Forbidden(DenyReason),
    /// Committed state conflicts with the request (uniqueness, quota,
    /// dependent rows).
    #[error("conflict: {0}")]
    Conflict(String),
    /// Storage or runtime failure.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(kind) => Self::NotFound(kind),
            StoreError::Conflict(message) => Self::Conflict(message),
            StoreError::QuotaExceeded {
                resource,
                limit,
                current,
            } => Self::Conflict(format!(
                "{resource} quota exceeded: limit is {limit}, current usage is {current}"
            )),
            // The row's ownership moved underneath the authorized operation;
            // surface it exactly like any other cross-tenant refusal.
            StoreError::TenantMismatch => Self::Forbidden(DenyReason::CrossTenant),
            StoreError::Invalid(message) => Self::Validation(message),
            StoreError::Io(message) => Self::Internal(message),
        }
    }
}

impl From<DenyReason> for EngineError {
    fn from(reason: DenyReason) -> Self {
        Self::Forbidden(reason)
    }
}

// ============================================================================
// SECTION: Inputs
// ============================================================================

/// Defaults applied to newly registered tenants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TenantDefaults {
    /// Active-user quota for new tenants.
    pub max_users: u32,
    /// Project quota for new tenants.
    pub max_projects: u32,
}

impl Default for TenantDefaults {
    fn default() -> Self {
        Self {
            max_users: 25,
            max_projects: 15,
        }
    }
}

/// Input for tenant registration (tenant plus its first administrator).
#[derive(Debug, Clone)]
pub struct TenantRegistration {
    /// Display name of the tenant.
    pub tenant_name: String,
    /// Subdomain used at login; normalized to lowercase.
    pub subdomain: String,
    /// Administrator email; normalized to lowercase.
    pub admin_email: String,
    /// Pre-hashed administrator password.
    pub admin_password_hash: String,
    /// Administrator display name.
    pub admin_full_name: String,
}

/// Input for user creation.
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Email; normalized to lowercase, unique within the tenant.
    pub email: String,
    /// Pre-hashed password.
    pub password_hash: String,
    /// Display name.
    pub full_name: String,
    /// Role granted to the account.
    pub role: Role,
}

/// Input for project creation.
#[derive(Debug, Clone)]
pub struct NewProject {
    /// Project name, unique within the tenant.
    pub name: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Scheduling priority.
    pub priority: Priority,
}

/// Input for task creation.
#[derive(Debug, Clone)]
pub struct NewTask {
    /// Parent project; determines the owning tenant.
    pub project_id: ProjectId,
    /// Task title.
    pub title: String,
    /// Optional free-form description.
    pub description: Option<String>,
    /// Scheduling priority.
    pub priority: Priority,
    /// Initial workflow status.
    pub status: TaskStatus,
    /// Optional assignee; must be an active member of the owning tenant.
    pub assigned_to: Option<UserId>,
    /// Optional due date (unix millis).
    pub due_date: Option<i64>,
}

// ============================================================================
// SECTION: Engine
// ============================================================================

/// The tracker's operation surface over one store backend.
#[derive(Debug)]
pub struct TrackerEngine<S> {
    /// Storage backend.
    store: S,
    /// Quotas stamped onto newly registered tenants.
    defaults: TenantDefaults,
}

impl<S: TrackerStore> TrackerEngine<S> {
    /// Creates an engine over the given store.
    pub const fn new(store: S, defaults: TenantDefaults) -> Self {
        Self { store, defaults }
    }

    /// Returns the underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Reports whether the storage backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] when the store probe fails.
    pub fn readiness(&self) -> Result<(), EngineError> {
        Ok(self.store.readiness()?)
    }

    // ------------------------------------------------------------------
    // Identity support
    // ------------------------------------------------------------------

    /// Finds the tenant and user rows for a subdomain/email login attempt.
    ///
    /// Credential verification and lifecycle checks belong to the identity
    /// boundary; this is a neutral lookup.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] when the lookup fails.
    pub fn login_lookup(
        &self,
        subdomain: &str,
        email: &str,
    ) -> Result<Option<(Tenant, User)>, EngineError> {
        let subdomain = subdomain.trim().to_ascii_lowercase();
        let email = email.trim().to_ascii_lowercase();
        Ok(self.store.find_login_user(&subdomain, &email)?)
    }

    /// Records a successful login; failures are swallowed like any read audit.
    pub fn audit_login(&self, tenant_id: &TenantId, user_id: &UserId, ip: Option<&str>) {
        self.audit_read(AuditRecord {
            tenant_id: tenant_id.clone(),
            user_id: Some(user_id.clone()),
            action: AuditAction::Login,
            entity_type: EntityKind::User,
            entity_id: Some(user_id.as_str().to_string()),
            recorded_at: now_ms(),
            ip_address: ip.map(str::to_string),
        });
    }

    // ------------------------------------------------------------------
    // Tenants
    // ------------------------------------------------------------------

    /// Registers a tenant together with its first tenant_admin atomically.
    ///
    /// Unauthenticated by design; the audit row is attributed to the new
    /// administrator.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for malformed input and
    /// [`EngineError::Conflict`] on a subdomain collision.
    pub fn register_tenant(
        &self,
        registration: &TenantRegistration,
        ip: Option<&str>,
    ) -> Result<(Tenant, User), EngineError> {
        let tenant_name = require_non_empty(&registration.tenant_name, "tenant_name")?;
        let subdomain = validate_subdomain(&registration.subdomain)?;
        let admin_email = validate_email(&registration.admin_email)?;
        let admin_full_name = require_non_empty(&registration.admin_full_name, "admin_full_name")?;
        if registration.admin_password_hash.is_empty() {
            return Err(EngineError::Validation(
                "admin_password_hash must not be empty".to_string(),
            ));
        }

        let now = now_ms();
        let tenant = Tenant {
            id: TenantId::generate(),
            name: tenant_name,
            subdomain,
            status: TenantStatus::Active,
            subscription_type: SubscriptionType::Free,
            max_users: self.defaults.max_users,
            max_projects: self.defaults.max_projects,
            created_at: now,
            updated_at: now,
        };
        let admin = User {
            id: UserId::generate(),
            tenant_id: tenant.id.clone(),
            email: admin_email,
            password_hash: registration.admin_password_hash.clone(),
            full_name: admin_full_name,
            role: Role::TenantAdmin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let audit = AuditRecord {
            tenant_id: tenant.id.clone(),
            user_id: Some(admin.id.clone()),
            action: AuditAction::Register,
            entity_type: EntityKind::Tenant,
            entity_id: Some(tenant.id.as_str().to_string()),
            recorded_at: now,
            ip_address: ip.map(str::to_string),
        };
        self.store.register_tenant(&tenant, &admin, &audit)?;
        Ok((tenant, admin))
    }

    /// Reads one tenant together with its live usage counters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] on a policy refusal and
    /// [`EngineError::NotFound`] when the tenant does not exist.
    pub fn get_tenant(
        &self,
        caller: &CallerContext,
        id: &TenantId,
        ip: Option<&str>,
    ) -> Result<(Tenant, TenantStats), EngineError> {
        let tenant = resolve_tenant(&self.store, id)?;
        decide(caller, &AccessRequest::TenantRead { tenant: &tenant }).into_result()?;
        let record = self
            .store
            .load_tenant(id)?
            .ok_or(EngineError::NotFound(EntityKind::Tenant))?;
        let stats = self.store.tenant_stats(id)?;
        self.audit_read(self.make_audit(
            caller,
            id,
            AuditAction::Read,
            EntityKind::Tenant,
            Some(id.as_str()),
            ip,
        ));
        Ok((record, stats))
    }

    /// Lists every tenant (super_admin only).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] for callers below super_admin.
    pub fn list_tenants(
        &self,
        caller: &CallerContext,
        ip: Option<&str>,
    ) -> Result<Vec<Tenant>, EngineError> {
        decide(caller, &AccessRequest::TenantListAll).into_result()?;
        let tenants = self.store.list_tenants()?;
        self.audit_read(self.make_audit(
            caller,
            &caller.tenant_id,
            AuditAction::List,
            EntityKind::Tenant,
            None,
            ip,
        ));
        Ok(tenants)
    }

    /// Applies a partial tenant update.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] for an empty payload,
    /// [`EngineError::Forbidden`] when restricted fields exceed the caller's
    /// role, and [`EngineError::Conflict`] when a quota reduction falls below
    /// committed usage.
    pub fn update_tenant(
        &self,
        caller: &CallerContext,
        id: &TenantId,
        update: &TenantUpdate,
        ip: Option<&str>,
    ) -> Result<Tenant, EngineError> {
        require_fields(update.is_empty())?;
        let tenant = resolve_tenant(&self.store, id)?;
        decide(
            caller,
            &AccessRequest::TenantUpdate {
                tenant: &tenant,
                touches_restricted: update.touches_restricted_fields(),
            },
        )
        .into_result()?;
        let audit = self.make_audit(
            caller,
            id,
            AuditAction::Update,
            EntityKind::Tenant,
            Some(id.as_str()),
            ip,
        );
        Ok(self.store.update_tenant(id, update, &audit)?)
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    /// Creates a user inside a tenant.
    ///
    /// Quota and email uniqueness are re-validated by the store inside the
    /// mutation transaction.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Conflict`] on quota exhaustion or an email
    /// collision.
    pub fn add_user(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
        input: &NewUser,
        ip: Option<&str>,
    ) -> Result<User, EngineError> {
        let email = validate_email(&input.email)?;
        let full_name = require_non_empty(&input.full_name, "full_name")?;
        if input.password_hash.is_empty() {
            return Err(EngineError::Validation(
                "password_hash must not be empty".to_string(),
            ));
        }
        let tenant = resolve_tenant(&self.store, tenant_id)?;
        decide(caller, &AccessRequest::UserCreate { tenant: &tenant }).into_result()?;

        let now = now_ms();
        let user = User {
            id: UserId::generate(),
            tenant_id: tenant_id.clone(),
            email,
            password_hash: input.password_hash.clone(),
            full_name,
            role: input.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let audit = self.make_audit(
            caller,
            tenant_id,
            AuditAction::Create,
            EntityKind::User,
            Some(user.id.as_str()),
            ip,
        );
        Ok(self.store.create_user(&user, &audit)?)
    }

    /// Lists users of a tenant.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] for non-admin callers.
    pub fn list_users(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
        ip: Option<&str>,
    ) -> Result<Vec<User>, EngineError> {
        let tenant = resolve_tenant(&self.store, tenant_id)?;
        decide(caller, &AccessRequest::UserList { tenant: &tenant }).into_result()?;
        let users = self.store.list_users(tenant_id)?;
        self.audit_read(self.make_audit(
            caller,
            tenant_id,
            AuditAction::List,
            EntityKind::User,
            None,
            ip,
        ));
        Ok(users)
    }

    /// Applies a partial user update; the owning tenant is resolved from the
    /// target user row.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] per the user-update matrix.
    pub fn update_user(
        &self,
        caller: &CallerContext,
        id: &UserId,
        update: &UserUpdate,
        ip: Option<&str>,
    ) -> Result<User, EngineError> {
        require_fields(update.is_empty())?;
        let (target, tenant) = resolve_user(&self.store, id)?;
        decide(
            caller,
            &AccessRequest::UserUpdate {
                tenant: &tenant,
                target: &target,
                touches_admin_fields: update.touches_admin_fields(),
            },
        )
        .into_result()?;
        let audit = self.make_audit(
            caller,
            &tenant.id,
            AuditAction::Update,
            EntityKind::User,
            Some(id.as_str()),
            ip,
        );
        Ok(self.store.update_user(id, &tenant.id, update, &audit)?)
    }

    /// Logically deletes a user by deactivating the account.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] per the user-delete matrix.
    pub fn delete_user(
        &self,
        caller: &CallerContext,
        id: &UserId,
        ip: Option<&str>,
    ) -> Result<(), EngineError> {
        let (target, tenant) = resolve_user(&self.store, id)?;
        decide(
            caller,
            &AccessRequest::UserDelete {
                tenant: &tenant,
                target: &target,
            },
        )
        .into_result()?;
        let audit = self.make_audit(
            caller,
            &tenant.id,
            AuditAction::Delete,
            EntityKind::User,
            Some(id.as_str()),
            ip,
        );
        Ok(self.store.deactivate_user(id, &tenant.id, &audit)?)
    }

    // ------------------------------------------------------------------
    // Projects
    // ------------------------------------------------------------------

    /// Creates a project inside the caller's tenant.
    ///
    /// Quota and name uniqueness are re-validated by the store inside the
    /// mutation transaction.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Conflict`] on quota exhaustion or a name
    /// collision.
    pub fn create_project(
        &self,
        caller: &CallerContext,
        input: &NewProject,
        ip: Option<&str>,
    ) -> Result<Project, EngineError> {
        let name = require_non_empty(&input.name, "name")?;
        let tenant = resolve_tenant(&self.store, &caller.tenant_id)?;
        decide(caller, &AccessRequest::ProjectCreate { tenant: &tenant }).into_result()?;

        let now = now_ms();
        let project = Project {
            id: ProjectId::generate(),
            tenant_id: caller.tenant_id.clone(),
            name,
            description: input.description.clone(),
            priority: input.priority,
            status: ProjectStatus::Active,
            created_by: caller.user_id.clone(),
            created_at: now,
            updated_at: now,
        };
        let audit = self.make_audit(
            caller,
            &caller.tenant_id,
            AuditAction::Create,
            EntityKind::Project,
            Some(project.id.as_str()),
            ip,
        );
        Ok(self.store.create_project(&project, &audit)?)
    }

    /// Lists projects of the caller's tenant.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] when the caller's tenant is
    /// suspended.
    pub fn list_projects(
        &self,
        caller: &CallerContext,
        filter: &ProjectFilter,
        ip: Option<&str>,
    ) -> Result<Vec<Project>, EngineError> {
        let tenant = resolve_tenant(&self.store, &caller.tenant_id)?;
        decide(caller, &AccessRequest::ProjectList { tenant: &tenant }).into_result()?;
        let projects = self.store.list_projects(&caller.tenant_id, filter)?;
        self.audit_read(self.make_audit(
            caller,
            &caller.tenant_id,
            AuditAction::List,
            EntityKind::Project,
            None,
            ip,
        ));
        Ok(projects)
    }

    /// Applies a partial project update.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] for callers who are neither admin
    /// nor the creator.
    pub fn update_project(
        &self,
        caller: &CallerContext,
        id: &ProjectId,
        update: &ProjectUpdate,
        ip: Option<&str>,
    ) -> Result<Project, EngineError> {
        require_fields(update.is_empty())?;
        let mut update = update.clone();
        if let Some(name) = update.name.as_deref() {
            update.name = Some(require_non_empty(name, "name")?);
        }
        let (project, tenant) = resolve_project(&self.store, id)?;
        decide(
            caller,
            &AccessRequest::ProjectUpdate {
                tenant: &tenant,
                project: &project,
            },
        )
        .into_result()?;
        let audit = self.make_audit(
            caller,
            &tenant.id,
            AuditAction::Update,
            EntityKind::Project,
            Some(id.as_str()),
            ip,
        );
        Ok(self.store.update_project(id, &tenant.id, &update, &audit)?)
    }

    /// Physically deletes a project.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Conflict`] while the project still owns tasks.
    pub fn delete_project(
        &self,
        caller: &CallerContext,
        id: &ProjectId,
        ip: Option<&str>,
    ) -> Result<(), EngineError> {
        let (project, tenant) = resolve_project(&self.store, id)?;
        decide(
            caller,
            &AccessRequest::ProjectDelete {
                tenant: &tenant,
                project: &project,
            },
        )
        .into_result()?;
        let audit = self.make_audit(
            caller,
            &tenant.id,
            AuditAction::Delete,
            EntityKind::Project,
            Some(id.as_str()),
            ip,
        );
        Ok(self.store.delete_project(id, &tenant.id, &audit)?)
    }

    // ------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------

    /// Creates a task under a project. The task inherits the project's
    /// tenant; the caller credential never chooses it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] when the project belongs to a
    /// different tenant or the assignee check fails.
    pub fn create_task(
        &self,
        caller: &CallerContext,
        input: &NewTask,
        ip: Option<&str>,
    ) -> Result<Task, EngineError> {
        let title = require_non_empty(&input.title, "title")?;
        let (project, tenant) = resolve_project(&self.store, &input.project_id)?;
        let assignee = self.assignee_facts(input.assigned_to.as_ref())?;
        decide(
            caller,
            &AccessRequest::TaskCreate {
                tenant: &tenant,
                assignee: assignee.as_ref(),
            },
        )
        .into_result()?;

        let now = now_ms();
        let task = Task {
            id: TaskId::generate(),
            project_id: project.id.clone(),
            tenant_id: project.tenant_id.clone(),
            title,
            description: input.description.clone(),
            priority: input.priority,
            status: input.status,
            assigned_to: input.assigned_to.clone(),
            created_by: caller.user_id.clone(),
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };
        let audit = self.make_audit(
            caller,
            &tenant.id,
            AuditAction::Create,
            EntityKind::Task,
            Some(task.id.as_str()),
            ip,
        );
        Ok(self.store.create_task(&task, &audit)?)
    }

    /// Lists tasks of a project; the project's tenant gates access.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] when the project belongs to a
    /// different tenant.
    pub fn list_tasks(
        &self,
        caller: &CallerContext,
        project_id: &ProjectId,
        filter: &TaskFilter,
        ip: Option<&str>,
    ) -> Result<Vec<Task>, EngineError> {
        let (project, tenant) = resolve_project(&self.store, project_id)?;
        decide(caller, &AccessRequest::TaskList { tenant: &tenant }).into_result()?;
        let tasks = self.store.list_tasks(&project.id, filter)?;
        self.audit_read(self.make_audit(
            caller,
            &tenant.id,
            AuditAction::List,
            EntityKind::Task,
            None,
            ip,
        ));
        Ok(tasks)
    }

    /// Applies a partial task update.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] for callers who are neither admin,
    /// creator, nor assignee, or when an assignee check fails.
    pub fn update_task(
        &self,
        caller: &CallerContext,
        id: &TaskId,
        update: &TaskUpdate,
        ip: Option<&str>,
    ) -> Result<Task, EngineError> {
        require_fields(update.is_empty())?;
        let mut update = update.clone();
        if let Some(title) = update.title.as_deref() {
            update.title = Some(require_non_empty(title, "title")?);
        }
        let (task, tenant) = resolve_task(&self.store, id)?;
        let assignee = self.assignee_facts(update.requested_assignee())?;
        decide(
            caller,
            &AccessRequest::TaskUpdate {
                tenant: &tenant,
                task: &task,
                assignee: assignee.as_ref(),
            },
        )
        .into_result()?;
        let audit = self.make_audit(
            caller,
            &tenant.id,
            AuditAction::Update,
            EntityKind::Task,
            Some(id.as_str()),
            ip,
        );
        Ok(self.store.update_task(id, &tenant.id, &update, &audit)?)
    }

    /// Transitions a task's workflow status; open to any member of the
    /// owning tenant.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] when the task belongs to a
    /// different tenant.
    pub fn update_task_status(
        &self,
        caller: &CallerContext,
        id: &TaskId,
        status: TaskStatus,
        ip: Option<&str>,
    ) -> Result<Task, EngineError> {
        let (_, tenant) = resolve_task(&self.store, id)?;
        decide(caller, &AccessRequest::TaskStatusUpdate { tenant: &tenant }).into_result()?;
        let audit = self.make_audit(
            caller,
            &tenant.id,
            AuditAction::UpdateStatus,
            EntityKind::Task,
            Some(id.as_str()),
            ip,
        );
        Ok(self
            .store
            .update_task_status(id, &tenant.id, status, &audit)?)
    }

    /// Physically deletes a task.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Forbidden`] for callers who are neither admin
    /// nor the creator.
    pub fn delete_task(
        &self,
        caller: &CallerContext,
        id: &TaskId,
        ip: Option<&str>,
    ) -> Result<(), EngineError> {
        let (task, tenant) = resolve_task(&self.store, id)?;
        decide(
            caller,
            &AccessRequest::TaskDelete {
                tenant: &tenant,
                task: &task,
            },
        )
        .into_result()?;
        let audit = self.make_audit(
            caller,
            &tenant.id,
            AuditAction::Delete,
            EntityKind::Task,
            Some(id.as_str()),
            ip,
        );
        Ok(self.store.delete_task(id, &tenant.id, &audit)?)
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    /// Loads assignee facts when the payload names one.
    ///
    /// A nonexistent assignee is reported as a foreign-tenant refusal so the
    /// response does not disclose whether the identifier exists anywhere.
    fn assignee_facts(&self, assignee: Option<&UserId>) -> Result<Option<UserFacts>, EngineError> {
        match assignee {
            None => Ok(None),
            Some(id) => match self.store.user_facts(id)? {
                Some(facts) => Ok(Some(facts)),
                None => Err(EngineError::Forbidden(DenyReason::AssigneeForeignTenant)),
            },
        }
    }

    /// Builds the audit row for an operation.
    fn make_audit(
        &self,
        caller: &CallerContext,
        tenant_id: &TenantId,
        action: AuditAction,
        entity_type: EntityKind,
        entity_id: Option<&str>,
        ip: Option<&str>,
    ) -> AuditRecord {
        AuditRecord {
            tenant_id: tenant_id.clone(),
            user_id: Some(caller.user_id.clone()),
            action,
            entity_type,
            entity_id: entity_id.map(str::to_string),
            recorded_at: now_ms(),
            ip_address: ip.map(str::to_string),
        }
    }

    /// Fire-and-forget audit append; a failure never fails the read.
    fn audit_read(&self, audit: AuditRecord) {
        let _ = self.store.record_audit(&audit);
    }
}

// ============================================================================
// SECTION: Validation Helpers
// ============================================================================

/// Returns the current wall-clock time in unix milliseconds.
#[must_use]
pub fn now_ms() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |d| {
        i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
    })
}

/// Rejects empty partial-update payloads.
fn require_fields(is_empty: bool) -> Result<(), EngineError> {
    if is_empty {
        return Err(EngineError::Validation(
            "update payload has no recognized fields".to_string(),
        ));
    }
    Ok(())
}

/// Requires a non-blank string field, returning the trimmed value.
fn require_non_empty(value: &str, field: &str) -> Result<String, EngineError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(trimmed.to_string())
}

/// Validates and normalizes a tenant subdomain.
///
/// Accepts 3-63 lowercase alphanumeric characters or hyphens, with no
/// leading or trailing hyphen. Input is lowercased before validation.
fn validate_subdomain(raw: &str) -> Result<String, EngineError> {
    let subdomain = raw.trim().to_ascii_lowercase();
    let valid_chars = subdomain
        .chars()
        .all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-');
    if subdomain.len() < 3
        || subdomain.len() > 63
        || !valid_chars
        || subdomain.starts_with('-')
        || subdomain.ends_with('-')
    {
        return Err(EngineError::Validation(format!(
            "subdomain '{raw}' is invalid: expected 3-63 lowercase alphanumeric characters or hyphens"
        )));
    }
    Ok(subdomain)
}

/// Validates and normalizes an email address.
///
/// Intentionally shallow: a single `@` with a non-empty local part and a
/// domain containing a dot. Deliverability is out of scope.
fn validate_email(raw: &str) -> Result<String, EngineError> {
    let email = raw.trim().to_ascii_lowercase();
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or_default();
    let domain = parts.next().unwrap_or_default();
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(EngineError::Validation(format!(
            "email '{raw}' is invalid"
        )));
    }
    Ok(email)
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
#[allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions are permitted."
)]
mod tests {
    use super::validate_email;
    use super::validate_subdomain;

    #[test]
    fn subdomain_rules_are_enforced() {
        assert!(validate_subdomain("Acme-Corp").is_ok_and(|s| s == "acme-corp"));
        assert!(validate_subdomain("ab").is_err());
        assert!(validate_subdomain("-acme").is_err());
        assert!(validate_subdomain("acme-").is_err());
        assert!(validate_subdomain("acme corp").is_err());
    }

    #[test]
    fn email_rules_are_enforced() {
        assert!(validate_email("Admin@Example.COM").is_ok_and(|e| e == "admin@example.com"));
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@nodot").is_err());
    }
}
