// crates/taskhive-core/src/policy/mod.rs
// ============================================================================
// Module: Access Policy Engine
// Description: Pure allow/deny decisions for every tracker operation.
// Purpose: Centralize tenant isolation and the role matrix in one function.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The policy engine is a pure, stateless decision function evaluated once
//! per request and never cached across requests. Input is the verified caller
//! context, the operation being attempted, and ownership facts resolved from
//! storage; output is allow or deny with a machine-distinguishable reason.
//!
//! Rules apply in a fixed order and the first match wins:
//! 1. Cross-tenant mismatch: for any caller below super_admin, the resolved
//!    resource tenant must equal the credential tenant. This runs before any
//!    role rule, including when the tenant was derived indirectly through a
//!    project join.
//! 2. Tenant lifecycle: a suspended tenant denies every tenant-scoped
//!    operation for callers below super_admin (super_admin must retain access
//!    to reactivate a suspended tenant).
//! 3. Per-entity role matrix.
//! 4. Default deny.
//!
//! Security posture: the engine fails closed; any request shape it does not
//! recognize is denied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Serialize;

use crate::core::context::CallerContext;
use crate::core::entities::Role;
use crate::core::entities::TenantStatus;
use crate::interfaces::ProjectFacts;
use crate::interfaces::TaskFacts;
use crate::interfaces::TenantFacts;
use crate::interfaces::UserFacts;

// ============================================================================
// SECTION: Decision Types
// ============================================================================

/// Machine-distinguishable denial reason.
///
/// # Invariants
/// - Variants are stable labels for 403 messages and audit sinks.
/// - Labels never disclose the existence of cross-tenant resources beyond
///   the fact that access was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// Resource belongs to a different tenant than the credential.
    CrossTenant,
    /// Resolved tenant is suspended.
    TenantSuspended,
    /// Caller's role does not admit the operation.
    InsufficientRole,
    /// Self-service updates may change the display name only.
    SelfUpdateRestricted,
    /// tenant_admin may not modify or delete peer administrator accounts.
    PeerAdminProtected,
    /// Administrators may not delete their own account.
    AdminSelfDeletion,
    /// Requested assignee belongs to a different tenant.
    AssigneeForeignTenant,
    /// Requested assignee is deactivated.
    AssigneeInactive,
}

impl DenyReason {
    /// Returns a stable label for the reason.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CrossTenant => "cross_tenant_access",
            Self::TenantSuspended => "tenant_suspended",
            Self::InsufficientRole => "insufficient_role",
            Self::SelfUpdateRestricted => "self_update_restricted",
            Self::PeerAdminProtected => "peer_admin_protected",
            Self::AdminSelfDeletion => "admin_self_deletion",
            Self::AssigneeForeignTenant => "assignee_foreign_tenant",
            Self::AssigneeInactive => "assignee_inactive",
        }
    }

    /// Returns the human-readable 403 message for the reason.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::CrossTenant => "access denied: resource does not belong to your tenant",
            Self::TenantSuspended => "access denied: tenant is suspended",
            Self::InsufficientRole => "access denied: insufficient role",
            Self::SelfUpdateRestricted => {
                "access denied: users may only update their own full name"
            }
            Self::PeerAdminProtected => {
                "access denied: administrator accounts may only be changed by a super administrator"
            }
            Self::AdminSelfDeletion => "access denied: administrators cannot delete themselves",
            Self::AssigneeForeignTenant => {
                "access denied: cannot assign task to a user from a different tenant"
            }
            Self::AssigneeInactive => "access denied: cannot assign task to a deactivated user",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy decision outcome.
///
/// # Invariants
/// - Variants are stable and exhaustive for authorization outcomes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Operation may proceed.
    Allow,
    /// Operation is refused for the given reason.
    Deny(DenyReason),
}

impl PolicyDecision {
    /// Converts the decision into a result for `?`-style gating.
    ///
    /// # Errors
    ///
    /// Returns the [`DenyReason`] when the decision is a denial.
    pub const fn into_result(self) -> Result<(), DenyReason> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(reason) => Err(reason),
        }
    }
}

// ============================================================================
// SECTION: Access Requests
// ============================================================================

/// One authorization question: an operation plus the resolved facts it needs.
///
/// # Invariants
/// - `tenant` always carries the authoritative tenant resolved through the
///   resource's ownership chain (§resolver), never the caller credential.
#[derive(Debug, Clone, Copy)]
pub enum AccessRequest<'a> {
    /// Read one tenant record.
    TenantRead {
        /// Resolved target tenant.
        tenant: &'a TenantFacts,
    },
    /// List every tenant in the system.
    TenantListAll,
    /// Update a tenant record.
    TenantUpdate {
        /// Resolved target tenant.
        tenant: &'a TenantFacts,
        /// Whether the payload touches super_admin-only fields.
        touches_restricted: bool,
    },
    /// Create a user inside a tenant.
    UserCreate {
        /// Resolved target tenant.
        tenant: &'a TenantFacts,
    },
    /// List users of a tenant.
    UserList {
        /// Resolved target tenant.
        tenant: &'a TenantFacts,
    },
    /// Update a user record.
    UserUpdate {
        /// Tenant resolved from the target user.
        tenant: &'a TenantFacts,
        /// Resolved target user.
        target: &'a UserFacts,
        /// Whether the payload touches role or active status.
        touches_admin_fields: bool,
    },
    /// Logically delete a user.
    UserDelete {
        /// Tenant resolved from the target user.
        tenant: &'a TenantFacts,
        /// Resolved target user.
        target: &'a UserFacts,
    },
    /// Create a project inside the caller's tenant.
    ProjectCreate {
        /// Resolved target tenant (the caller's own).
        tenant: &'a TenantFacts,
    },
    /// List projects of the caller's tenant.
    ProjectList {
        /// Resolved target tenant (the caller's own).
        tenant: &'a TenantFacts,
    },
    /// Update a project.
    ProjectUpdate {
        /// Tenant resolved from the project row.
        tenant: &'a TenantFacts,
        /// Resolved project.
        project: &'a ProjectFacts,
    },
    /// Physically delete a project.
    ProjectDelete {
        /// Tenant resolved from the project row.
        tenant: &'a TenantFacts,
        /// Resolved project.
        project: &'a ProjectFacts,
    },
    /// Create a task under a project.
    TaskCreate {
        /// Tenant resolved from the parent project row.
        tenant: &'a TenantFacts,
        /// Requested assignee facts, when the payload names one.
        assignee: Option<&'a UserFacts>,
    },
    /// List tasks of a project.
    TaskList {
        /// Tenant resolved from the parent project row.
        tenant: &'a TenantFacts,
    },
    /// Update a task's fields.
    TaskUpdate {
        /// Tenant resolved through the task's project join.
        tenant: &'a TenantFacts,
        /// Resolved task.
        task: &'a TaskFacts,
        /// Requested assignee facts, when the payload names one.
        assignee: Option<&'a UserFacts>,
    },
    /// Transition a task's workflow status only.
    TaskStatusUpdate {
        /// Tenant resolved through the task's project join.
        tenant: &'a TenantFacts,
    },
    /// Physically delete a task.
    TaskDelete {
        /// Tenant resolved through the task's project join.
        tenant: &'a TenantFacts,
        /// Resolved task.
        task: &'a TaskFacts,
    },
}

impl AccessRequest<'_> {
    /// Returns the resolved tenant facts, when the request is tenant-scoped.
    const fn resolved_tenant(&self) -> Option<&TenantFacts> {
        match self {
            Self::TenantListAll => None,
            Self::TenantRead { tenant }
            | Self::TenantUpdate { tenant, .. }
            | Self::UserCreate { tenant }
            | Self::UserList { tenant }
            | Self::UserUpdate { tenant, .. }
            | Self::UserDelete { tenant, .. }
            | Self::ProjectCreate { tenant }
            | Self::ProjectList { tenant }
            | Self::ProjectUpdate { tenant, .. }
            | Self::ProjectDelete { tenant, .. }
            | Self::TaskCreate { tenant, .. }
            | Self::TaskList { tenant }
            | Self::TaskUpdate { tenant, .. }
            | Self::TaskStatusUpdate { tenant }
            | Self::TaskDelete { tenant, .. } => Some(tenant),
        }
    }
}

// ============================================================================
// SECTION: Decision Function
// ============================================================================

/// Decides whether `caller` may perform `request`.
///
/// Deterministic for identical inputs; holds no state and performs no I/O.
#[must_use]
pub fn decide(caller: &CallerContext, request: &AccessRequest<'_>) -> PolicyDecision {
    // Rule 1: cross-tenant mismatch, mandatory before any role rule.
    if let Some(tenant) = request.resolved_tenant() {
        if caller.role != Role::SuperAdmin && tenant.id != caller.tenant_id {
            return PolicyDecision::Deny(DenyReason::CrossTenant);
        }
        // Rule 2: tenant lifecycle.
        if caller.role != Role::SuperAdmin && tenant.status != TenantStatus::Active {
            return PolicyDecision::Deny(DenyReason::TenantSuspended);
        }
    }

    // Rule 3: per-entity role matrix. Rule 4 (default deny) is the fallthrough
    // of each arm.
    match request {
        AccessRequest::TenantRead { .. }
        | AccessRequest::ProjectCreate { .. }
        | AccessRequest::ProjectList { .. }
        | AccessRequest::TaskList { .. }
        | AccessRequest::TaskStatusUpdate { .. } => {
            // Any member of the tenant; rule 1 already pinned the tenant.
            PolicyDecision::Allow
        }
        AccessRequest::TenantListAll => match caller.role {
            Role::SuperAdmin => PolicyDecision::Allow,
            Role::TenantAdmin | Role::User => {
                PolicyDecision::Deny(DenyReason::InsufficientRole)
            }
        },
        AccessRequest::TenantUpdate {
            touches_restricted, ..
        } => match caller.role {
            Role::SuperAdmin => PolicyDecision::Allow,
            Role::TenantAdmin if !*touches_restricted => PolicyDecision::Allow,
            Role::TenantAdmin | Role::User => {
                PolicyDecision::Deny(DenyReason::InsufficientRole)
            }
        },
        AccessRequest::UserCreate { .. } | AccessRequest::UserList { .. } => {
            if caller.role.is_admin() {
                PolicyDecision::Allow
            } else {
                PolicyDecision::Deny(DenyReason::InsufficientRole)
            }
        }
        AccessRequest::UserUpdate {
            target,
            touches_admin_fields,
            ..
        } => decide_user_update(caller, target, *touches_admin_fields),
        AccessRequest::UserDelete { target, .. } => decide_user_delete(caller, target),
        AccessRequest::ProjectUpdate { project, .. }
        | AccessRequest::ProjectDelete { project, .. } => {
            if caller.role.is_admin() || project.created_by == caller.user_id {
                PolicyDecision::Allow
            } else {
                PolicyDecision::Deny(DenyReason::InsufficientRole)
            }
        }
        AccessRequest::TaskCreate { tenant, assignee } => {
            check_assignee(tenant, *assignee)
        }
        AccessRequest::TaskUpdate {
            tenant,
            task,
            assignee,
        } => {
            let permitted = caller.role.is_admin()
                || task.created_by == caller.user_id
                || task.assigned_to.as_ref() == Some(&caller.user_id);
            if !permitted {
                return PolicyDecision::Deny(DenyReason::InsufficientRole);
            }
            check_assignee(tenant, *assignee)
        }
        AccessRequest::TaskDelete { task, .. } => {
            if caller.role.is_admin() || task.created_by == caller.user_id {
                PolicyDecision::Allow
            } else {
                PolicyDecision::Deny(DenyReason::InsufficientRole)
            }
        }
    }
}

/// Applies the user-update matrix.
fn decide_user_update(
    caller: &CallerContext,
    target: &UserFacts,
    touches_admin_fields: bool,
) -> PolicyDecision {
    if target.id == caller.user_id {
        // Self-service: name only, regardless of role held.
        if touches_admin_fields && !caller.role.is_admin() {
            return PolicyDecision::Deny(DenyReason::SelfUpdateRestricted);
        }
        return PolicyDecision::Allow;
    }
    match caller.role {
        Role::SuperAdmin => PolicyDecision::Allow,
        Role::TenantAdmin => {
            // tenant_admin may not touch peer admin or super_admin accounts.
            if target.role.is_admin() {
                PolicyDecision::Deny(DenyReason::PeerAdminProtected)
            } else {
                PolicyDecision::Allow
            }
        }
        Role::User => PolicyDecision::Deny(DenyReason::InsufficientRole),
    }
}

/// Applies the user-delete matrix.
fn decide_user_delete(caller: &CallerContext, target: &UserFacts) -> PolicyDecision {
    if !caller.role.is_admin() {
        return PolicyDecision::Deny(DenyReason::InsufficientRole);
    }
    if target.id == caller.user_id {
        return PolicyDecision::Deny(DenyReason::AdminSelfDeletion);
    }
    if caller.role == Role::TenantAdmin && target.role.is_admin() {
        return PolicyDecision::Deny(DenyReason::PeerAdminProtected);
    }
    PolicyDecision::Allow
}

/// Validates a requested assignee against the resolved resource tenant.
fn check_assignee(tenant: &TenantFacts, assignee: Option<&UserFacts>) -> PolicyDecision {
    match assignee {
        None => PolicyDecision::Allow,
        Some(user) => {
            if user.tenant_id != tenant.id {
                PolicyDecision::Deny(DenyReason::AssigneeForeignTenant)
            } else if !user.is_active {
                PolicyDecision::Deny(DenyReason::AssigneeInactive)
            } else {
                PolicyDecision::Allow
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests;
