// crates/taskhive-core/src/lib.rs
// ============================================================================
// Module: Taskhive Core
// Description: Tenant isolation and authorization engine for the task tracker.
// Purpose: Provide the domain model, tenant resolver, policy engine, tracker
//          engine, and the storage contract with an in-memory backend.
// Dependencies: serde, thiserror, base64, rand
// ============================================================================

//! ## Overview
//! Core of the multi-tenant project/task tracker. The crate is organized
//! around one request pipeline:
//! 1. A transport verifies the caller and produces a [`CallerContext`].
//! 2. The resolver derives the authoritative tenant of the addressed resource
//!    from stored ownership chains (`task -> project -> tenant`,
//!    `user -> tenant`), never from the credential.
//! 3. The policy engine returns a pure allow/deny decision with a stable
//!    reason, evaluated fresh on every request.
//! 4. The engine performs the mutation through [`TrackerStore`], whose
//!    implementations re-validate uniqueness and quota invariants inside the
//!    transaction and commit the audit row atomically with the change.
//!
//! Security posture: isolation fails closed. A resource whose ownership chain
//! cannot be established is treated as absent, and any request shape the
//! policy engine does not recognize is denied.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Domain model: identifiers, entities, context, update payloads.
pub mod core;
/// Tracker engine orchestrating resolve, authorize, mutate, audit.
pub mod engine;
/// Storage contract and shared facts.
pub mod interfaces;
/// Pure access-policy decisions.
pub mod policy;
/// Authoritative tenant resolution.
pub mod resolver;
/// Bundled store backends.
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::context::CallerContext;
pub use crate::core::entities::AuditAction;
pub use crate::core::entities::EntityKind;
pub use crate::core::entities::Priority;
pub use crate::core::entities::Project;
pub use crate::core::entities::ProjectStatus;
pub use crate::core::entities::Role;
pub use crate::core::entities::SubscriptionType;
pub use crate::core::entities::Task;
pub use crate::core::entities::TaskStatus;
pub use crate::core::entities::Tenant;
pub use crate::core::entities::TenantStats;
pub use crate::core::entities::TenantStatus;
pub use crate::core::entities::User;
pub use crate::core::identifiers::AuditEntryId;
pub use crate::core::identifiers::ProjectId;
pub use crate::core::identifiers::TaskId;
pub use crate::core::identifiers::TenantId;
pub use crate::core::identifiers::UserId;
pub use crate::core::update::ProjectUpdate;
pub use crate::core::update::TaskUpdate;
pub use crate::core::update::TenantUpdate;
pub use crate::core::update::UserUpdate;
pub use engine::EngineError;
pub use engine::NewProject;
pub use engine::NewTask;
pub use engine::NewUser;
pub use engine::TenantDefaults;
pub use engine::TenantRegistration;
pub use engine::TrackerEngine;
pub use engine::now_ms;
pub use interfaces::AuditRecord;
pub use interfaces::ProjectFacts;
pub use interfaces::ProjectFilter;
pub use interfaces::StoreError;
pub use interfaces::TaskFacts;
pub use interfaces::TaskFilter;
pub use interfaces::TenantFacts;
pub use interfaces::TrackerStore;
pub use interfaces::UserFacts;
pub use policy::AccessRequest;
pub use policy::DenyReason;
pub use policy::PolicyDecision;
pub use policy::decide;
pub use store::memory::InMemoryTrackerStore;
