// crates/taskhive-server/src/main.rs
// ============================================================================
// Module: Taskhive Server Entry Point
// Description: Process entry for the tracker HTTP server.
// Purpose: Load configuration, open the store, and serve until shutdown.
// Dependencies: clap, taskhive-config, taskhive-core, taskhive-server,
//               taskhive-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! The binary wires configuration, the `SQLite` store, the engine, and the
//! REST router together. All failures before the accept loop print one line
//! to stderr and exit nonzero.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use taskhive_config::TrackerConfig;
use taskhive_core::TrackerEngine;
use taskhive_server::ServerState;
use taskhive_server::SessionManager;
use taskhive_server::serve;
use taskhive_store_sqlite::SqliteTrackerStore;

// ============================================================================
// SECTION: CLI
// ============================================================================

/// Taskhive tracker server.
#[derive(Debug, Parser)]
#[command(name = "taskhive-server", version, about = "Multi-tenant task tracker server")]
struct Cli {
    /// Path to the TOML configuration file (defaults to taskhive.toml).
    #[arg(long)]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// Process entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            let _ = write_stderr_line(&format!("taskhive-server: {message}"));
            ExitCode::FAILURE
        }
    }
}

/// Loads configuration and runs the server to completion.
fn run(cli: &Cli) -> Result<(), String> {
    let config = TrackerConfig::load(cli.config.as_deref()).map_err(|err| err.to_string())?;
    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|_| format!("invalid bind address: {}", config.server.bind))?;
    let store = SqliteTrackerStore::new(&config.store).map_err(|err| err.to_string())?;
    let engine = TrackerEngine::new(store, config.tenants.to_defaults());
    let state = ServerState::new(engine, SessionManager::new(config.server.session_ttl_secs));

    write_stderr_line(&format!("listening on http://{bind}")).map_err(|err| err.to_string())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| err.to_string())?;
    runtime
        .block_on(serve(bind, state))
        .map_err(|err| err.to_string())
}

/// Writes one line to stderr.
fn write_stderr_line(line: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr().lock();
    writeln!(stderr, "{line}")
}
