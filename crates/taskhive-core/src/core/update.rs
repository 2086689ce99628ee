// crates/taskhive-core/src/core/update.rs
// ============================================================================
// Module: Partial Update Payloads
// Description: Optional-field update structs for entity mutation.
// Purpose: Distinguish "field absent" from "field set to empty" explicitly.
// Dependencies: crate::core::{entities, identifiers}, serde
// ============================================================================

//! ## Overview
//! Every update operation is partial: only fields present in the payload
//! change, absence means "leave unchanged". Nullable columns additionally
//! distinguish "set to null" from "absent" with a double-`Option`, using a
//! deserializer that wraps any present value (including JSON `null`) in
//! `Some`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Deserializer;

use crate::core::entities::Priority;
use crate::core::entities::ProjectStatus;
use crate::core::entities::Role;
use crate::core::entities::SubscriptionType;
use crate::core::entities::TaskStatus;
use crate::core::entities::TenantStatus;
use crate::core::identifiers::UserId;

// ============================================================================
// SECTION: Deserialization Helpers
// ============================================================================

/// Deserializes a present-but-possibly-null field into `Some(inner)`.
///
/// # Errors
///
/// Propagates deserialization errors from the inner value.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// ============================================================================
// SECTION: Tenant Update
// ============================================================================

/// Partial tenant update.
///
/// # Invariants
/// - `status`, `subscription_type`, `max_users`, and `max_projects` are the
///   restricted fields; policy admits them for super_admin only.
/// - `subdomain` is immutable and deliberately absent here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TenantUpdate {
    /// New display name.
    #[serde(default)]
    pub name: Option<String>,
    /// New lifecycle status (restricted).
    #[serde(default)]
    pub status: Option<TenantStatus>,
    /// New subscription tier (restricted).
    #[serde(default)]
    pub subscription_type: Option<SubscriptionType>,
    /// New active-user quota (restricted).
    #[serde(default)]
    pub max_users: Option<u32>,
    /// New project quota (restricted).
    #[serde(default)]
    pub max_projects: Option<u32>,
}

impl TenantUpdate {
    /// Returns whether no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.status.is_none()
            && self.subscription_type.is_none()
            && self.max_users.is_none()
            && self.max_projects.is_none()
    }

    /// Returns whether any super_admin-only field is present.
    #[must_use]
    pub const fn touches_restricted_fields(&self) -> bool {
        self.status.is_some()
            || self.subscription_type.is_some()
            || self.max_users.is_some()
            || self.max_projects.is_some()
    }
}

// ============================================================================
// SECTION: User Update
// ============================================================================

/// Partial user update.
///
/// # Invariants
/// - `role` and `is_active` are administrative fields; policy admits them for
///   tenant_admin/super_admin only, and never for self-service updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserUpdate {
    /// New display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// New role (administrative).
    #[serde(default)]
    pub role: Option<Role>,
    /// New active flag (administrative).
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl UserUpdate {
    /// Returns whether no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.role.is_none() && self.is_active.is_none()
    }

    /// Returns whether any administrative field is present.
    #[must_use]
    pub const fn touches_admin_fields(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

// ============================================================================
// SECTION: Project Update
// ============================================================================

/// Partial project update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectUpdate {
    /// New name; must be non-empty after trimming when present.
    #[serde(default)]
    pub name: Option<String>,
    /// New description; `Some(None)` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// New lifecycle status.
    #[serde(default)]
    pub status: Option<ProjectStatus>,
}

impl ProjectUpdate {
    /// Returns whether no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
    }
}

// ============================================================================
// SECTION: Task Update
// ============================================================================

/// Partial task update.
///
/// # Invariants
/// - `assigned_to`, when set to a user, must reference an active user of the
///   task's tenant; `Some(None)` clears the assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskUpdate {
    /// New title; must be non-empty after trimming when present.
    #[serde(default)]
    pub title: Option<String>,
    /// New description; `Some(None)` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// New workflow status.
    #[serde(default)]
    pub status: Option<TaskStatus>,
    /// New assignee; `Some(None)` clears the assignment.
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<UserId>>,
    /// New due date (unix millis); `Some(None)` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<i64>>,
}

impl TaskUpdate {
    /// Returns whether no field is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.status.is_none()
            && self.assigned_to.is_none()
            && self.due_date.is_none()
    }

    /// Returns the requested assignee when the update sets one.
    #[must_use]
    pub const fn requested_assignee(&self) -> Option<&UserId> {
        match &self.assigned_to {
            Some(Some(user_id)) => Some(user_id),
            Some(None) | None => None,
        }
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
    fn absent_and_null_assignee_are_distinguishable() -> Result<(), serde_json::Error> {
        let absent: TaskUpdate = serde_json::from_str("{}")?;
        assert_eq!(absent.assigned_to, None);

        let cleared: TaskUpdate = serde_json::from_str(r#"{"assigned_to": null}"#)?;
        assert_eq!(cleared.assigned_to, Some(None));

        let set: TaskUpdate = serde_json::from_str(r#"{"assigned_to": "u-1"}"#)?;
        assert_eq!(set.assigned_to, Some(Some(UserId::new("u-1"))));
        Ok(())
    }

    #[test]
    fn empty_payload_is_detected() -> Result<(), serde_json::Error> {
        let update: ProjectUpdate = serde_json::from_str("{}")?;
        assert!(update.is_empty());
        let update: ProjectUpdate = serde_json::from_str(r#"{"description": null}"#)?;
        assert!(!update.is_empty());
        Ok(())
    }

    #[test]
    fn restricted_tenant_fields_are_flagged() -> Result<(), serde_json::Error> {
        let name_only: TenantUpdate = serde_json::from_str(r#"{"name": "Acme"}"#)?;
        assert!(!name_only.touches_restricted_fields());
        let limits: TenantUpdate = serde_json::from_str(r#"{"max_users": 5}"#)?;
        assert!(limits.touches_restricted_fields());
        Ok(())
    }
}
