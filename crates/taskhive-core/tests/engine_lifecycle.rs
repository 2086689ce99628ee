// crates/taskhive-core/tests/engine_lifecycle.rs
// ============================================================================
// Module: Engine Lifecycle Integration Tests
// Description: Quotas, uniqueness, logical deletion, and audit guarantees.
// Purpose: Validate transactional mutator semantics over the in-memory store.
// ============================================================================

//! Lifecycle tests for registration, quota enforcement (including under
//! concurrency), uniqueness conflicts, and audit-row accounting.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::sync::Arc;
use std::thread;

use taskhive_core::AuditAction;
use taskhive_core::CallerContext;
use taskhive_core::DenyReason;
use taskhive_core::EngineError;
use taskhive_core::InMemoryTrackerStore;
use taskhive_core::NewProject;
use taskhive_core::NewTask;
use taskhive_core::NewUser;
use taskhive_core::Priority;
use taskhive_core::ProjectUpdate;
use taskhive_core::Role;
use taskhive_core::TaskStatus;
use taskhive_core::TaskUpdate;
use taskhive_core::Tenant;
use taskhive_core::TenantDefaults;
use taskhive_core::TenantRegistration;
use taskhive_core::TrackerEngine;
use taskhive_core::User;
use taskhive_core::UserUpdate;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn engine_with(defaults: TenantDefaults) -> TrackerEngine<InMemoryTrackerStore> {
    TrackerEngine::new(InMemoryTrackerStore::new(), defaults)
}

fn register(
    engine: &TrackerEngine<InMemoryTrackerStore>,
    name: &str,
    subdomain: &str,
) -> (Tenant, User) {
    engine
        .register_tenant(
            &TenantRegistration {
                tenant_name: name.to_string(),
                subdomain: subdomain.to_string(),
                admin_email: format!("admin@{subdomain}.example.com"),
                admin_password_hash: "hash".to_string(),
                admin_full_name: format!("{name} Admin"),
            },
            None,
        )
        .expect("registration must succeed")
}

fn ctx(user: &User) -> CallerContext {
    CallerContext::new(user.id.clone(), user.tenant_id.clone(), user.role)
}

fn new_user(email: &str, role: Role) -> NewUser {
    NewUser {
        email: email.to_string(),
        password_hash: "hash".to_string(),
        full_name: "Someone".to_string(),
        role,
    }
}

fn assert_conflict(result: Result<impl std::fmt::Debug, EngineError>) {
    match result {
        Err(EngineError::Conflict(_)) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }
}

// ============================================================================
// SECTION: Registration
// ============================================================================

#[test]
fn registration_creates_tenant_and_admin_atomically() -> Result<(), EngineError> {
    let engine = engine_with(TenantDefaults::default());
    let (tenant, admin) = register(&engine, "Alpha", "alpha");

    assert_eq!(admin.tenant_id, tenant.id);
    assert_eq!(admin.role, Role::TenantAdmin);
    assert!(admin.is_active);
    assert_eq!(tenant.max_users, 25);
    assert_eq!(tenant.max_projects, 15);

    // One audit row for the registration, attributed to the new admin.
    let audit = engine.store().audit_log()?;
    assert_eq!(audit.len(), 1);
    assert_eq!(audit[0].action, AuditAction::Register);
    assert_eq!(audit[0].user_id.as_ref(), Some(&admin.id));
    Ok(())
}

#[test]
fn subdomain_collisions_are_rejected_case_insensitively() {
    let engine = engine_with(TenantDefaults::default());
    register(&engine, "Alpha", "alpha");

    // Subdomains are normalized to lowercase before the uniqueness check.
    let attempt = engine.register_tenant(
        &TenantRegistration {
            tenant_name: "Alpha Two".to_string(),
            subdomain: "ALPHA".to_string(),
            admin_email: "two@alpha.example.com".to_string(),
            admin_password_hash: "hash".to_string(),
            admin_full_name: "Second Admin".to_string(),
        },
        None,
    );
    assert_conflict(attempt);
}

#[test]
fn malformed_registration_input_is_rejected_before_storage() {
    let engine = engine_with(TenantDefaults::default());
    let attempt = engine.register_tenant(
        &TenantRegistration {
            tenant_name: "Alpha".to_string(),
            subdomain: "a".to_string(),
            admin_email: "admin@alpha.example.com".to_string(),
            admin_password_hash: "hash".to_string(),
            admin_full_name: "Admin".to_string(),
        },
        None,
    );
    assert!(matches!(attempt, Err(EngineError::Validation(_))));
    assert!(
        engine
            .store()
            .audit_log()
            .is_ok_and(|audit| audit.is_empty())
    );
}

#[test]
fn blank_names_are_rejected_by_partial_updates() {
    let engine = engine_with(TenantDefaults::default());
    let (_, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);
    let project = engine
        .create_project(
            &admin_ctx,
            &NewProject {
                name: "Rollout".to_string(),
                description: None,
                priority: Priority::Medium,
            },
            None,
        )
        .expect("project creation must succeed");
    let task = engine
        .create_task(
            &admin_ctx,
            &NewTask {
                project_id: project.id.clone(),
                title: "Ship it".to_string(),
                description: None,
                priority: Priority::Medium,
                status: TaskStatus::Todo,
                assigned_to: None,
                due_date: None,
            },
            None,
        )
        .expect("task creation must succeed");

    let renamed = engine.update_project(
        &admin_ctx,
        &project.id,
        &ProjectUpdate {
            name: Some("   ".to_string()),
            ..ProjectUpdate::default()
        },
        None,
    );
    assert!(matches!(renamed, Err(EngineError::Validation(_))));

    let retitled = engine.update_task(
        &admin_ctx,
        &task.id,
        &TaskUpdate {
            title: Some(String::new()),
            ..TaskUpdate::default()
        },
        None,
    );
    assert!(matches!(retitled, Err(EngineError::Validation(_))));
}

// ============================================================================
// SECTION: Quotas
// ============================================================================

#[test]
fn user_quota_counts_active_users_only() {
    let engine = engine_with(TenantDefaults {
        max_users: 2,
        max_projects: 15,
    });
    let (tenant, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);

    let second = engine
        .add_user(
            &admin_ctx,
            &tenant.id,
            &new_user("two@alpha.example.com", Role::User),
            None,
        )
        .expect("second user fits the quota");

    assert_conflict(engine.add_user(
        &admin_ctx,
        &tenant.id,
        &new_user("three@alpha.example.com", Role::User),
        None,
    ));

    // Logical deletion frees an active-user slot.
    engine
        .delete_user(&admin_ctx, &second.id, None)
        .expect("admin may deactivate");
    engine
        .add_user(
            &admin_ctx,
            &tenant.id,
            &new_user("three@alpha.example.com", Role::User),
            None,
        )
        .expect("slot freed by deactivation");

    // Reactivating the deactivated user would exceed the quota again.
    let reactivate = UserUpdate {
        is_active: Some(true),
        ..UserUpdate::default()
    };
    assert_conflict(engine.update_user(&admin_ctx, &second.id, &reactivate, None));
}

#[test]
fn concurrent_user_creation_never_oversubscribes_the_quota() {
    let engine = Arc::new(engine_with(TenantDefaults {
        max_users: 3,
        max_projects: 15,
    }));
    let (tenant, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);

    let handles: Vec<_> = (0..6)
        .map(|index| {
            let engine = Arc::clone(&engine);
            let admin_ctx = admin_ctx.clone();
            let tenant_id = tenant.id.clone();
            thread::spawn(move || {
                engine
                    .add_user(
                        &admin_ctx,
                        &tenant_id,
                        &new_user(&format!("user{index}@alpha.example.com"), Role::User),
                        None,
                    )
                    .is_ok()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker must not panic"))
        .filter(|ok| *ok)
        .count();

    // The admin occupies one of three slots; exactly two creations may win.
    assert_eq!(successes, 2);
}

#[test]
fn project_quota_is_enforced_and_counts_all_projects() {
    let engine = engine_with(TenantDefaults {
        max_users: 25,
        max_projects: 1,
    });
    let (_, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);

    engine
        .create_project(
            &admin_ctx,
            &NewProject {
                name: "Only".to_string(),
                description: None,
                priority: Priority::Medium,
            },
            None,
        )
        .expect("first project fits the quota");

    assert_conflict(engine.create_project(
        &admin_ctx,
        &NewProject {
            name: "Overflow".to_string(),
            description: None,
            priority: Priority::Medium,
        },
        None,
    ));
}

#[test]
fn concurrent_project_creation_never_oversubscribes_the_quota() {
    let engine = Arc::new(engine_with(TenantDefaults {
        max_users: 25,
        max_projects: 2,
    }));
    let (_, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);

    // Fill the quota to one below the limit before racing.
    engine
        .create_project(
            &admin_ctx,
            &NewProject {
                name: "Rollout".to_string(),
                description: None,
                priority: Priority::Medium,
            },
            None,
        )
        .expect("first project fits the quota");

    let handles: Vec<_> = (0..6)
        .map(|index| {
            let engine = Arc::clone(&engine);
            let admin_ctx = admin_ctx.clone();
            thread::spawn(move || {
                engine
                    .create_project(
                        &admin_ctx,
                        &NewProject {
                            name: format!("Project {index}"),
                            description: None,
                            priority: Priority::Medium,
                        },
                        None,
                    )
                    .is_ok()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|handle| handle.join().expect("worker must not panic"))
        .filter(|ok| *ok)
        .count();

    // One of two slots is already taken; exactly one creation may win.
    assert_eq!(successes, 1);
}

// ============================================================================
// SECTION: Uniqueness
// ============================================================================

#[test]
fn email_uniqueness_is_scoped_to_the_tenant() {
    let engine = engine_with(TenantDefaults::default());
    let (tenant_a, admin_a) = register(&engine, "Alpha", "alpha");
    let (tenant_b, admin_b) = register(&engine, "Beta", "beta");

    engine
        .add_user(
            &ctx(&admin_a),
            &tenant_a.id,
            &new_user("shared@example.com", Role::User),
            None,
        )
        .expect("first use of the address");

    // Same address, different case, same tenant: conflict.
    assert_conflict(engine.add_user(
        &ctx(&admin_a),
        &tenant_a.id,
        &new_user("Shared@Example.com", Role::User),
        None,
    ));

    // Same address in another tenant is fine.
    engine
        .add_user(
            &ctx(&admin_b),
            &tenant_b.id,
            &new_user("shared@example.com", Role::User),
            None,
        )
        .expect("address is free in the other tenant");
}

#[test]
fn project_names_are_unique_per_tenant() {
    let engine = engine_with(TenantDefaults::default());
    let (_, admin_a) = register(&engine, "Alpha", "alpha");
    let (_, admin_b) = register(&engine, "Beta", "beta");

    let payload = NewProject {
        name: "Rollout".to_string(),
        description: None,
        priority: Priority::Medium,
    };
    engine
        .create_project(&ctx(&admin_a), &payload, None)
        .expect("first use of the name");
    assert_conflict(engine.create_project(&ctx(&admin_a), &payload, None));
    engine
        .create_project(&ctx(&admin_b), &payload, None)
        .expect("name is free in the other tenant");
}

// ============================================================================
// SECTION: Dependent Rows
// ============================================================================

#[test]
fn project_deletion_is_blocked_while_tasks_remain() {
    let engine = engine_with(TenantDefaults::default());
    let (_, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);

    let project = engine
        .create_project(
            &admin_ctx,
            &NewProject {
                name: "Rollout".to_string(),
                description: None,
                priority: Priority::Medium,
            },
            None,
        )
        .expect("project creation must succeed");
    let task = engine
        .create_task(
            &admin_ctx,
            &NewTask {
                project_id: project.id.clone(),
                title: "Blocker".to_string(),
                description: None,
                priority: Priority::High,
                status: TaskStatus::Todo,
                assigned_to: None,
                due_date: None,
            },
            None,
        )
        .expect("task creation must succeed");

    assert_conflict(engine.delete_project(&admin_ctx, &project.id, None));

    engine
        .delete_task(&admin_ctx, &task.id, None)
        .expect("task deletion must succeed");
    engine
        .delete_project(&admin_ctx, &project.id, None)
        .expect("project deletion succeeds once empty");
}

// ============================================================================
// SECTION: User Administration
// ============================================================================

#[test]
fn user_deletion_is_logical_and_peer_admins_are_protected() -> Result<(), EngineError> {
    let engine = engine_with(TenantDefaults::default());
    let (tenant, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);

    let second_admin = engine
        .add_user(
            &admin_ctx,
            &tenant.id,
            &new_user("peer@alpha.example.com", Role::TenantAdmin),
            None,
        )
        .expect("admin may add a peer admin");
    let member = engine
        .add_user(
            &admin_ctx,
            &tenant.id,
            &new_user("member@alpha.example.com", Role::User),
            None,
        )
        .expect("admin may add a member");

    // Peer admin accounts are off limits to tenant_admin.
    assert!(matches!(
        engine.delete_user(&admin_ctx, &second_admin.id, None),
        Err(EngineError::Forbidden(DenyReason::PeerAdminProtected))
    ));
    // So is the admin's own account.
    assert!(matches!(
        engine.delete_user(&admin_ctx, &admin.id, None),
        Err(EngineError::Forbidden(DenyReason::AdminSelfDeletion))
    ));

    // Deleting a member flips is_active; the row remains listed.
    engine.delete_user(&admin_ctx, &member.id, None)?;
    let users = engine.list_users(&admin_ctx, &tenant.id, None)?;
    let deleted = users
        .iter()
        .find(|user| user.id == member.id)
        .expect("logically deleted row is still present");
    assert!(!deleted.is_active);
    Ok(())
}

// ============================================================================
// SECTION: Audit Accounting
// ============================================================================

#[test]
fn idempotent_updates_still_write_one_audit_row_each() -> Result<(), EngineError> {
    let engine = engine_with(TenantDefaults::default());
    let (tenant, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);
    let member = engine
        .add_user(
            &admin_ctx,
            &tenant.id,
            &new_user("member@alpha.example.com", Role::User),
            None,
        )
        .expect("admin may add a member");

    // The same no-op-after-first-application payload, applied twice.
    let update = UserUpdate {
        full_name: Some("Renamed".to_string()),
        ..UserUpdate::default()
    };
    engine.update_user(&admin_ctx, &member.id, &update, None)?;
    engine.update_user(&admin_ctx, &member.id, &update, None)?;

    let audit = engine.store().audit_log()?;
    let update_rows = audit
        .iter()
        .filter(|row| {
            row.action == AuditAction::Update
                && row.entity_id.as_deref() == Some(member.id.as_str())
        })
        .count();
    assert_eq!(update_rows, 2);
    Ok(())
}

#[test]
fn failed_mutations_leave_no_audit_row() -> Result<(), EngineError> {
    let engine = engine_with(TenantDefaults::default());
    let (tenant, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);
    let before = engine.store().audit_log()?.len();

    assert_conflict(engine.add_user(
        &admin_ctx,
        &tenant.id,
        &new_user(&admin.email, Role::User),
        None,
    ));

    assert_eq!(engine.store().audit_log()?.len(), before);
    Ok(())
}

#[test]
fn reads_audit_through_the_side_channel() -> Result<(), EngineError> {
    let engine = engine_with(TenantDefaults::default());
    let (tenant, admin) = register(&engine, "Alpha", "alpha");
    let admin_ctx = ctx(&admin);

    let before = engine.store().audit_log()?.len();
    let (_, stats) = engine.get_tenant(&admin_ctx, &tenant.id, Some("203.0.113.7"))?;
    assert_eq!(stats.total_users, 1);

    let audit = engine.store().audit_log()?;
    assert_eq!(audit.len(), before + 1);
    let row = audit.last().expect("read audit row present");
    assert_eq!(row.action, AuditAction::Read);
    assert_eq!(row.ip_address.as_deref(), Some("203.0.113.7"));
    Ok(())
}
