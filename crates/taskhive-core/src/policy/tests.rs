// crates/taskhive-core/src/policy/tests.rs
// ============================================================================
// Module: Policy Engine Unit Tests
// Description: Exhaustive role-matrix and tenant-isolation decision coverage.
// Purpose: Validate rule ordering and every deny reason without storage.
// Dependencies: taskhive-core
// ============================================================================

//! ## Overview
//! Pure decision tests for the policy engine: cross-tenant mismatch ordering,
//! suspended-tenant handling, and the per-entity role matrix.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions are permitted."
)]

use super::AccessRequest;
use super::DenyReason;
use super::PolicyDecision;
use super::decide;
use crate::core::context::CallerContext;
use crate::core::entities::Role;
use crate::core::entities::TenantStatus;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TaskId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::interfaces::ProjectFacts;
use crate::interfaces::TaskFacts;
use crate::interfaces::TenantFacts;
use crate::interfaces::UserFacts;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn tenant(id: &str) -> TenantFacts {
    TenantFacts {
        id: TenantId::new(id),
        status: TenantStatus::Active,
    }
}

fn suspended_tenant(id: &str) -> TenantFacts {
    TenantFacts {
        id: TenantId::new(id),
        status: TenantStatus::Suspended,
    }
}

fn caller(user: &str, tenant: &str, role: Role) -> CallerContext {
    CallerContext::new(UserId::new(user), TenantId::new(tenant), role)
}

fn user_facts(id: &str, tenant: &str, role: Role) -> UserFacts {
    UserFacts {
        id: UserId::new(id),
        tenant_id: TenantId::new(tenant),
        role,
        is_active: true,
    }
}

fn project_facts(id: &str, tenant: &str, creator: &str) -> ProjectFacts {
    ProjectFacts {
        id: ProjectId::new(id),
        tenant_id: TenantId::new(tenant),
        created_by: UserId::new(creator),
    }
}

fn task_facts(id: &str, tenant: &str, creator: &str, assignee: Option<&str>) -> TaskFacts {
    TaskFacts {
        id: TaskId::new(id),
        project_id: ProjectId::new("p-1"),
        tenant_id: TenantId::new(tenant),
        created_by: UserId::new(creator),
        assigned_to: assignee.map(UserId::new),
    }
}

fn assert_denied(decision: PolicyDecision, reason: DenyReason) {
    assert_eq!(decision, PolicyDecision::Deny(reason));
}

// ============================================================================
// SECTION: Rule Ordering
// ============================================================================

#[test]
fn cross_tenant_mismatch_wins_over_role_matrix() {
    // A tenant_admin of t2 with every role privilege still loses on rule 1.
    let admin = caller("u-1", "t-2", Role::TenantAdmin);
    let foreign = tenant("t-1");
    let task = task_facts("task-1", "t-1", "u-9", None);
    assert_denied(
        decide(
            &admin,
            &AccessRequest::TaskDelete {
                tenant: &foreign,
                task: &task,
            },
        ),
        DenyReason::CrossTenant,
    );
}

#[test]
fn cross_tenant_check_applies_to_indirectly_resolved_tenants() {
    let member = caller("u-1", "t-2", Role::User);
    let foreign = tenant("t-1");
    assert_denied(
        decide(&member, &AccessRequest::TaskList { tenant: &foreign }),
        DenyReason::CrossTenant,
    );
}

#[test]
fn super_admin_crosses_tenants() {
    let admin = caller("u-1", "t-9", Role::SuperAdmin);
    let foreign = tenant("t-1");
    assert_eq!(
        decide(&admin, &AccessRequest::TenantRead { tenant: &foreign }),
        PolicyDecision::Allow
    );
}

#[test]
fn suspended_tenant_denies_members_but_not_super_admin() {
    let member = caller("u-1", "t-1", Role::TenantAdmin);
    let frozen = suspended_tenant("t-1");
    assert_denied(
        decide(&member, &AccessRequest::ProjectList { tenant: &frozen }),
        DenyReason::TenantSuspended,
    );

    let root = caller("u-2", "t-0", Role::SuperAdmin);
    assert_eq!(
        decide(
            &root,
            &AccessRequest::TenantUpdate {
                tenant: &frozen,
                touches_restricted: true,
            },
        ),
        PolicyDecision::Allow
    );
}

// ============================================================================
// SECTION: Tenant Matrix
// ============================================================================

#[test]
fn tenant_list_all_is_super_admin_only() {
    for role in [Role::User, Role::TenantAdmin] {
        assert_denied(
            decide(&caller("u-1", "t-1", role), &AccessRequest::TenantListAll),
            DenyReason::InsufficientRole,
        );
    }
    assert_eq!(
        decide(
            &caller("u-1", "t-1", Role::SuperAdmin),
            &AccessRequest::TenantListAll
        ),
        PolicyDecision::Allow
    );
}

#[test]
fn tenant_restricted_fields_require_super_admin() {
    let own = tenant("t-1");
    let admin = caller("u-1", "t-1", Role::TenantAdmin);
    assert_denied(
        decide(
            &admin,
            &AccessRequest::TenantUpdate {
                tenant: &own,
                touches_restricted: true,
            },
        ),
        DenyReason::InsufficientRole,
    );
    assert_eq!(
        decide(
            &admin,
            &AccessRequest::TenantUpdate {
                tenant: &own,
                touches_restricted: false,
            },
        ),
        PolicyDecision::Allow
    );
}

#[test]
fn tenant_name_update_denied_for_regular_member() {
    let own = tenant("t-1");
    assert_denied(
        decide(
            &caller("u-1", "t-1", Role::User),
            &AccessRequest::TenantUpdate {
                tenant: &own,
                touches_restricted: false,
            },
        ),
        DenyReason::InsufficientRole,
    );
}

// ============================================================================
// SECTION: User Matrix
// ============================================================================

#[test]
fn user_create_and_list_require_admin() {
    let own = tenant("t-1");
    assert_denied(
        decide(
            &caller("u-1", "t-1", Role::User),
            &AccessRequest::UserCreate { tenant: &own },
        ),
        DenyReason::InsufficientRole,
    );
    assert_eq!(
        decide(
            &caller("u-1", "t-1", Role::TenantAdmin),
            &AccessRequest::UserList { tenant: &own },
        ),
        PolicyDecision::Allow
    );
}

#[test]
fn self_update_is_name_only_for_regular_members() {
    let own = tenant("t-1");
    let target = user_facts("u-1", "t-1", Role::User);
    let member = caller("u-1", "t-1", Role::User);
    assert_eq!(
        decide(
            &member,
            &AccessRequest::UserUpdate {
                tenant: &own,
                target: &target,
                touches_admin_fields: false,
            },
        ),
        PolicyDecision::Allow
    );
    assert_denied(
        decide(
            &member,
            &AccessRequest::UserUpdate {
                tenant: &own,
                target: &target,
                touches_admin_fields: true,
            },
        ),
        DenyReason::SelfUpdateRestricted,
    );
}

#[test]
fn tenant_admin_cannot_touch_peer_admin_accounts() {
    let own = tenant("t-1");
    let peer = user_facts("u-2", "t-1", Role::TenantAdmin);
    let admin = caller("u-1", "t-1", Role::TenantAdmin);
    assert_denied(
        decide(
            &admin,
            &AccessRequest::UserUpdate {
                tenant: &own,
                target: &peer,
                touches_admin_fields: true,
            },
        ),
        DenyReason::PeerAdminProtected,
    );
    assert_denied(
        decide(
            &admin,
            &AccessRequest::UserDelete {
                tenant: &own,
                target: &peer,
            },
        ),
        DenyReason::PeerAdminProtected,
    );

    // super_admin may do both.
    let root = caller("u-9", "t-0", Role::SuperAdmin);
    assert_eq!(
        decide(
            &root,
            &AccessRequest::UserDelete {
                tenant: &own,
                target: &peer,
            },
        ),
        PolicyDecision::Allow
    );
}

#[test]
fn admins_cannot_delete_themselves() {
    let own = tenant("t-1");
    let target = user_facts("u-1", "t-1", Role::TenantAdmin);
    assert_denied(
        decide(
            &caller("u-1", "t-1", Role::TenantAdmin),
            &AccessRequest::UserDelete {
                tenant: &own,
                target: &target,
            },
        ),
        DenyReason::AdminSelfDeletion,
    );
}

#[test]
fn regular_members_cannot_delete_users() {
    let own = tenant("t-1");
    let target = user_facts("u-2", "t-1", Role::User);
    assert_denied(
        decide(
            &caller("u-1", "t-1", Role::User),
            &AccessRequest::UserDelete {
                tenant: &own,
                target: &target,
            },
        ),
        DenyReason::InsufficientRole,
    );
}

// ============================================================================
// SECTION: Project Matrix
// ============================================================================

#[test]
fn any_member_may_create_and_list_projects() {
    let own = tenant("t-1");
    let member = caller("u-1", "t-1", Role::User);
    assert_eq!(
        decide(&member, &AccessRequest::ProjectCreate { tenant: &own }),
        PolicyDecision::Allow
    );
    assert_eq!(
        decide(&member, &AccessRequest::ProjectList { tenant: &own }),
        PolicyDecision::Allow
    );
}

#[test]
fn project_update_is_creator_or_admin() {
    let own = tenant("t-1");
    let project = project_facts("p-1", "t-1", "u-9");
    assert_denied(
        decide(
            &caller("u-1", "t-1", Role::User),
            &AccessRequest::ProjectUpdate {
                tenant: &own,
                project: &project,
            },
        ),
        DenyReason::InsufficientRole,
    );
    assert_eq!(
        decide(
            &caller("u-9", "t-1", Role::User),
            &AccessRequest::ProjectUpdate {
                tenant: &own,
                project: &project,
            },
        ),
        PolicyDecision::Allow
    );
    assert_eq!(
        decide(
            &caller("u-1", "t-1", Role::TenantAdmin),
            &AccessRequest::ProjectDelete {
                tenant: &own,
                project: &project,
            },
        ),
        PolicyDecision::Allow
    );
}

// ============================================================================
// SECTION: Task Matrix
// ============================================================================

#[test]
fn task_create_rejects_foreign_or_inactive_assignee() {
    let own = tenant("t-1");
    let foreign = user_facts("u-5", "t-2", Role::User);
    let member = caller("u-1", "t-1", Role::User);
    assert_denied(
        decide(
            &member,
            &AccessRequest::TaskCreate {
                tenant: &own,
                assignee: Some(&foreign),
            },
        ),
        DenyReason::AssigneeForeignTenant,
    );

    let mut inactive = user_facts("u-6", "t-1", Role::User);
    inactive.is_active = false;
    assert_denied(
        decide(
            &member,
            &AccessRequest::TaskCreate {
                tenant: &own,
                assignee: Some(&inactive),
            },
        ),
        DenyReason::AssigneeInactive,
    );

    assert_eq!(
        decide(
            &member,
            &AccessRequest::TaskCreate {
                tenant: &own,
                assignee: None,
            },
        ),
        PolicyDecision::Allow
    );
}

#[test]
fn task_update_is_admin_creator_or_assignee() {
    let own = tenant("t-1");
    let task = task_facts("task-1", "t-1", "u-9", Some("u-5"));

    for (user, expected) in [
        ("u-9", PolicyDecision::Allow),
        ("u-5", PolicyDecision::Allow),
        ("u-1", PolicyDecision::Deny(DenyReason::InsufficientRole)),
    ] {
        assert_eq!(
            decide(
                &caller(user, "t-1", Role::User),
                &AccessRequest::TaskUpdate {
                    tenant: &own,
                    task: &task,
                    assignee: None,
                },
            ),
            expected,
            "unexpected decision for {user}"
        );
    }
}

#[test]
fn task_status_update_is_open_to_any_tenant_member() {
    let own = tenant("t-1");
    assert_eq!(
        decide(
            &caller("u-1", "t-1", Role::User),
            &AccessRequest::TaskStatusUpdate { tenant: &own },
        ),
        PolicyDecision::Allow
    );
}

#[test]
fn task_delete_is_creator_or_admin_only() {
    let own = tenant("t-1");
    let task = task_facts("task-1", "t-1", "u-9", Some("u-5"));
    // The assignee alone may not delete.
    assert_denied(
        decide(
            &caller("u-5", "t-1", Role::User),
            &AccessRequest::TaskDelete {
                tenant: &own,
                task: &task,
            },
        ),
        DenyReason::InsufficientRole,
    );
    assert_eq!(
        decide(
            &caller("u-9", "t-1", Role::User),
            &AccessRequest::TaskDelete {
                tenant: &own,
                task: &task,
            },
        ),
        PolicyDecision::Allow
    );
}
