// crates/taskhive-core/src/resolver.rs
// ============================================================================
// Module: Tenant Resolver
// Description: Authoritative tenant resolution through stored ownership chains.
// Purpose: Derive the owning tenant of any resource from storage, never from
//          caller credentials.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! Every resource-scoped operation resolves its authoritative tenant here
//! before policy evaluation: users and projects carry their owning tenant on
//! the row, tasks derive theirs through the project join. Caller credentials
//! are never consulted. Resolution fails closed: a resource whose ownership
//! chain cannot be walked to an existing tenant is reported as absent, so a
//! dangling reference can never widen access.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::core::entities::EntityKind;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TaskId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::interfaces::ProjectFacts;
use crate::interfaces::StoreError;
use crate::interfaces::TaskFacts;
use crate::interfaces::TenantFacts;
use crate::interfaces::TrackerStore;
use crate::interfaces::UserFacts;

// ============================================================================
// SECTION: Resolution
// ============================================================================

/// Resolves a tenant addressed directly by identifier.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] when the tenant does not exist.
pub fn resolve_tenant<S>(store: &S, id: &TenantId) -> Result<TenantFacts, StoreError>
where
    S: TrackerStore + ?Sized,
{
    store
        .tenant_facts(id)?
        .ok_or(StoreError::NotFound(EntityKind::Tenant))
}

/// Resolves a user and the tenant that owns it.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for the user when either the user row or
/// its owning tenant is missing.
pub fn resolve_user<S>(store: &S, id: &UserId) -> Result<(UserFacts, TenantFacts), StoreError>
where
    S: TrackerStore + ?Sized,
{
    let user = store
        .user_facts(id)?
        .ok_or(StoreError::NotFound(EntityKind::User))?;
    let tenant = store
        .tenant_facts(&user.tenant_id)?
        .ok_or(StoreError::NotFound(EntityKind::User))?;
    Ok((user, tenant))
}

/// Resolves a project and the tenant that owns it.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for the project when either the project
/// row or its owning tenant is missing.
pub fn resolve_project<S>(
    store: &S,
    id: &ProjectId,
) -> Result<(ProjectFacts, TenantFacts), StoreError>
where
    S: TrackerStore + ?Sized,
{
    let project = store
        .project_facts(id)?
        .ok_or(StoreError::NotFound(EntityKind::Project))?;
    let tenant = store
        .tenant_facts(&project.tenant_id)?
        .ok_or(StoreError::NotFound(EntityKind::Project))?;
    Ok((project, tenant))
}

/// Resolves a task and the tenant that owns it through the project join.
///
/// # Errors
///
/// Returns [`StoreError::NotFound`] for the task when any link of the
/// task/project/tenant chain is missing.
pub fn resolve_task<S>(store: &S, id: &TaskId) -> Result<(TaskFacts, TenantFacts), StoreError>
where
    S: TrackerStore + ?Sized,
{
    let task = store
        .task_facts(id)?
        .ok_or(StoreError::NotFound(EntityKind::Task))?;
    let tenant = store
        .tenant_facts(&task.tenant_id)?
        .ok_or(StoreError::NotFound(EntityKind::Task))?;
    Ok((task, tenant))
}
