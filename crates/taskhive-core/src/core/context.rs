// crates/taskhive-core/src/core/context.rs
// ============================================================================
// Module: Caller Context
// Description: Verified caller identity threaded through every core call.
// Purpose: Replace ambient request state with an explicit immutable value.
// Dependencies: crate::core::{entities, identifiers}, serde
// ============================================================================

//! ## Overview
//! The caller context is the output of the external identity assertion: a
//! verified `{user_id, tenant_id, role}` triple. The core trusts it as ground
//! truth for who is calling and from which tenant, but never as ground truth
//! for which tenant owns a referenced resource; resource ownership is always
//! resolved from storage and the context value is used only for comparison.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::entities::Role;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Caller Context
// ============================================================================

/// Verified caller identity for one request.
///
/// # Invariants
/// - Values come from the identity assertion boundary and are immutable for
///   the lifetime of the request.
/// - `tenant_id` is a comparison value only, never a row filter for
///   resource-scoped operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    /// Acting user.
    pub user_id: UserId,
    /// Tenant the credential was issued for.
    pub tenant_id: TenantId,
    /// Role carried by the credential.
    pub role: Role,
}

impl CallerContext {
    /// Creates a caller context from a verified identity triple.
    #[must_use]
    pub const fn new(user_id: UserId, tenant_id: TenantId, role: Role) -> Self {
        Self {
            user_id,
            tenant_id,
            role,
        }
    }

    /// Returns whether the caller holds cross-tenant authority.
    #[must_use]
    pub const fn is_super_admin(&self) -> bool {
        matches!(self.role, Role::SuperAdmin)
    }
}
