// crates/taskhive-core/src/store/mod.rs
// ============================================================================
// Module: Core Store Backends
// Description: Storage backends bundled with the core crate.
// Purpose: House the in-memory reference implementation of the store contract.
// Dependencies: crate::interfaces
// ============================================================================

//! ## Overview
//! The core crate ships one store backend: an in-memory implementation of
//! [`crate::interfaces::TrackerStore`] used by the engine test-suite and by
//! deployments that do not need persistence. Durable backends live in their
//! own crates.

/// In-memory tracker store.
pub mod memory;
