// crates/taskhive-store-sqlite/src/lib.rs
// ============================================================================
// Module: Taskhive SQLite Store
// Description: Durable TrackerStore backed by SQLite WAL.
// Purpose: Persist tenants, users, projects, tasks, and audit rows with
//          transactional invariant re-checks.
// Dependencies: taskhive-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! Durable implementation of [`taskhive_core::TrackerStore`] over `SQLite`.
//! Every mutator runs inside one immediate transaction that re-validates
//! uniqueness and quota invariants against committed state and appends its
//! audit row before committing, so a write and its audit evidence are atomic.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// SQLite-backed tracker store.
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::SqliteJournalMode;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteSyncMode;
pub use store::SqliteTrackerStore;
