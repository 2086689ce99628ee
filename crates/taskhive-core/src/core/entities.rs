// crates/taskhive-core/src/core/entities.rs
// ============================================================================
// Module: Taskhive Entities
// Description: Tenant, user, project, task, and audit log records.
// Purpose: Capture the persistent data model with closed enumerations.
// Dependencies: crate::core::identifiers, serde
// ============================================================================

//! ## Overview
//! Persistent entity records for the tracker. Roles, statuses, and priorities
//! are closed enumerations with stable snake_case wire labels so the policy
//! matrix is exhaustively checked at compile time rather than matched against
//! free strings.
//!
//! Tenant ownership is recorded directly on every entity. A task additionally
//! carries a denormalized copy of its project's tenant identifier; the
//! project's stored value is the single source of truth and the copy is set
//! at creation and never independently mutated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TaskId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Roles
// ============================================================================

/// User role within the tracker.
///
/// # Invariants
/// - Variants are stable for serialization and policy matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Regular tenant member.
    User,
    /// Administrator of a single tenant.
    TenantAdmin,
    /// Cross-tenant administrator.
    SuperAdmin,
}

impl Role {
    /// Returns a stable label for the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::TenantAdmin => "tenant_admin",
            Self::SuperAdmin => "super_admin",
        }
    }

    /// Returns whether the role administers at least its own tenant.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::TenantAdmin | Self::SuperAdmin)
    }
}

// ============================================================================
// SECTION: Tenant
// ============================================================================

/// Tenant lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization and policy matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    /// Tenant is active and may be operated on.
    Active,
    /// Tenant is suspended; all tenant-scoped operations are denied.
    Suspended,
}

impl TenantStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Suspended => "suspended",
        }
    }
}

/// Tenant subscription tier.
///
/// # Invariants
/// - Variants are stable for serialization; tier changes are super_admin-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    /// Free tier.
    #[default]
    Free,
    /// Paid standard tier.
    Standard,
    /// Paid enterprise tier.
    Enterprise,
}

impl SubscriptionType {
    /// Returns a stable label for the subscription type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Standard => "standard",
            Self::Enterprise => "enterprise",
        }
    }
}

/// Tenant record.
///
/// # Invariants
/// - `subdomain` is globally unique and immutable after registration.
/// - Tenants are never hard-deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant identifier.
    pub id: TenantId,
    /// Display name.
    pub name: String,
    /// Globally unique subdomain used at login.
    pub subdomain: String,
    /// Lifecycle status.
    pub status: TenantStatus,
    /// Subscription tier.
    pub subscription_type: SubscriptionType,
    /// Maximum number of active users.
    pub max_users: u32,
    /// Maximum number of projects.
    pub max_projects: u32,
    /// Creation time (unix millis).
    pub created_at: i64,
    /// Last update time (unix millis).
    pub updated_at: i64,
}

/// Live usage counters for a tenant.
///
/// # Invariants
/// - Counts reflect committed rows at query time; they are advisory outside
///   a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantStats {
    /// Total users in the tenant (active and inactive).
    pub total_users: u64,
    /// Total projects in the tenant.
    pub total_projects: u64,
    /// Total tasks in the tenant.
    pub total_tasks: u64,
}

// ============================================================================
// SECTION: User
// ============================================================================

/// User record.
///
/// # Invariants
/// - `tenant_id` is immutable after creation.
/// - `email` is unique within the tenant, not globally.
/// - Deletion is logical: `is_active` becomes false, the row remains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub id: UserId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Login email, tenant-scoped.
    pub email: String,
    /// Opaque password hash; never interpreted by the core.
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Display name.
    pub full_name: String,
    /// Role within the tenant.
    pub role: Role,
    /// Whether the user may authenticate and be assigned work.
    pub is_active: bool,
    /// Creation time (unix millis).
    pub created_at: i64,
    /// Last update time (unix millis).
    pub updated_at: i64,
}

// ============================================================================
// SECTION: Project
// ============================================================================

/// Work item priority shared by projects and tasks.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    /// Low priority.
    Low,
    /// Medium priority.
    #[default]
    Medium,
    /// High priority.
    High,
}

impl Priority {
    /// Returns a stable label for the priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Project lifecycle status.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    /// Project is active.
    #[default]
    Active,
    /// Project is paused.
    OnHold,
    /// Project is finished.
    Completed,
}

impl ProjectStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::OnHold => "on_hold",
            Self::Completed => "completed",
        }
    }
}

/// Project record.
///
/// # Invariants
/// - `tenant_id` is set from the creating caller's credential and immutable.
/// - `name` is unique within the tenant (case-sensitive).
/// - The stored `tenant_id` is the authority for every task operation below
///   this project; it is never re-derived from a caller credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Project identifier.
    pub id: ProjectId,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Name, unique within the tenant.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Priority.
    pub priority: Priority,
    /// Lifecycle status.
    pub status: ProjectStatus,
    /// Creating user.
    pub created_by: UserId,
    /// Creation time (unix millis).
    pub created_at: i64,
    /// Last update time (unix millis).
    pub updated_at: i64,
}

// ============================================================================
// SECTION: Task
// ============================================================================

/// Task workflow status.
///
/// # Invariants
/// - Variants are stable for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Todo,
    /// In progress.
    InProgress,
    /// Finished.
    Completed,
}

impl TaskStatus {
    /// Returns a stable label for the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "todo",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

/// Task record.
///
/// # Invariants
/// - `project_id` is immutable after creation.
/// - `tenant_id` always equals the owning project's `tenant_id`; it is copied
///   at creation and never independently mutated.
/// - `assigned_to`, when set, references an active user of the same tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier.
    pub id: TaskId,
    /// Owning project.
    pub project_id: ProjectId,
    /// Denormalized owning tenant, inherited from the project.
    pub tenant_id: TenantId,
    /// Title.
    pub title: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Priority.
    pub priority: Priority,
    /// Workflow status.
    pub status: TaskStatus,
    /// Assigned user, when any.
    pub assigned_to: Option<UserId>,
    /// Creating user.
    pub created_by: UserId,
    /// Due date (unix millis), when any.
    pub due_date: Option<i64>,
    /// Creation time (unix millis).
    pub created_at: i64,
    /// Last update time (unix millis).
    pub updated_at: i64,
}

// ============================================================================
// SECTION: Audit Log
// ============================================================================

/// Audited action kind.
///
/// # Invariants
/// - Variants are stable labels for the append-only audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Entity created.
    Create,
    /// Entity read.
    Read,
    /// Entity collection listed.
    List,
    /// Entity updated.
    Update,
    /// Task status transition.
    UpdateStatus,
    /// Entity deleted (logically or physically).
    Delete,
    /// Tenant self-registration.
    Register,
    /// Successful login.
    Login,
}

impl AuditAction {
    /// Returns a stable label for the action.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Read => "read",
            Self::List => "list",
            Self::Update => "update",
            Self::UpdateStatus => "update_status",
            Self::Delete => "delete",
            Self::Register => "register",
            Self::Login => "login",
        }
    }
}

/// Audited entity kind.
///
/// # Invariants
/// - Variants are stable labels for audit rows and 404 messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Tenant entity.
    Tenant,
    /// User entity.
    User,
    /// Project entity.
    Project,
    /// Task entity.
    Task,
}

impl EntityKind {
    /// Returns a stable label for the entity kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tenant => "tenant",
            Self::User => "user",
            Self::Project => "project",
            Self::Task => "task",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

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
    use super::*;

    #[test]
    fn roles_serialize_as_snake_case_labels() -> Result<(), serde_json::Error> {
        let json = serde_json::to_string(&Role::TenantAdmin)?;
        assert_eq!(json, "\"tenant_admin\"");
        let parsed: Role = serde_json::from_str("\"super_admin\"")?;
        assert_eq!(parsed, Role::SuperAdmin);
        Ok(())
    }

    #[test]
    fn password_hash_never_serializes() -> Result<(), serde_json::Error> {
        let user = User {
            id: UserId::new("u-1"),
            tenant_id: TenantId::new("t-1"),
            email: "a@example.test".to_string(),
            password_hash: "secret".to_string(),
            full_name: "A".to_string(),
            role: Role::User,
            is_active: true,
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_string(&user)?;
        assert!(!json.contains("secret"));
        Ok(())
    }
}
