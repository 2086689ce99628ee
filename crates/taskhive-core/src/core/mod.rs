// crates/taskhive-core/src/core/mod.rs
// ============================================================================
// Module: Core Domain Model
// Description: Identifiers, entities, caller context, and update payloads.
// Purpose: Define the storage-independent domain vocabulary of the tracker.
// Dependencies: serde, base64, rand
// ============================================================================

//! ## Overview
//! Pure domain types shared by every layer: opaque identifiers, entity
//! records, the verified caller context, and partial-update payloads. Nothing
//! here performs I/O or holds policy.

/// Verified caller context.
pub mod context;
/// Entity records and enumerations.
pub mod entities;
/// Opaque identifier newtypes.
pub mod identifiers;
/// Partial-update payloads.
pub mod update;
