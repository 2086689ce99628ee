// system-tests/src/lib.rs
// ============================================================================
// Module: Taskhive System Tests
// Description: Black-box tests over a bound HTTP server.
// Purpose: Exercise config, store, engine, and handlers together.
// Dependencies: taskhive-config, taskhive-core, taskhive-server
// ============================================================================

//! ## Overview
//! This crate carries no library code; its `tests/` directory boots a real
//! server over a tempfile-backed `SQLite` store and exercises the HTTP
//! surface end to end.
