// crates/taskhive-server/src/lib.rs
// ============================================================================
// Module: Taskhive Server
// Description: HTTP surface for the tracker engine.
// Purpose: Provide identity assertion, session management, and REST handlers
//          over the core engine.
// Dependencies: axum, base64, rand, serde, sha2, taskhive-core, tokio
// ============================================================================

//! ## Overview
//! The server crate is the identity assertion boundary for the tracker. It
//! verifies credentials, mints opaque session tokens, and turns each bearer
//! token back into a verified caller context before any engine call. The
//! engine itself never sees credentials.
//!
//! ## Layer Responsibilities
//! - Hash and verify passwords, issue and revoke session tokens.
//! - Translate engine results into a uniform JSON response envelope.
//! - Map each REST route onto exactly one engine operation.
//!
//! Security posture: every request body, header, and path segment is
//! untrusted input; authentication fails closed.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod identity;
pub mod response;
pub mod server;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use identity::SessionManager;
pub use identity::hash_password;
pub use identity::verify_password;
pub use response::ApiError;
pub use response::ApiResponse;
pub use server::ServerError;
pub use server::ServerState;
pub use server::router;
pub use server::serve;
