// crates/taskhive-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Tracker Store
// Description: Durable TrackerStore backed by SQLite WAL.
// Purpose: Persist tracker state with atomic mutation plus audit commits.
// Dependencies: taskhive-core, rusqlite, serde, thiserror
// ============================================================================

//! ## Overview
//! This module implements a durable [`TrackerStore`] using `SQLite`. All
//! access is serialized through one mutex-guarded connection; mutators open
//! an immediate transaction, re-validate uniqueness and quota invariants
//! against committed rows, perform the write, append the audit row, and
//! commit as a single unit. Row filters always include the expected tenant,
//! so an ownership change that races an authorized operation surfaces as
//! [`StoreError::TenantMismatch`] instead of a cross-tenant write.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::Row;
use rusqlite::TransactionBehavior;
use rusqlite::params;
use serde::Deserialize;
use taskhive_core::AuditEntryId;
use taskhive_core::AuditRecord;
use taskhive_core::EntityKind;
use taskhive_core::Priority;
use taskhive_core::Project;
use taskhive_core::ProjectFacts;
use taskhive_core::ProjectFilter;
use taskhive_core::ProjectId;
use taskhive_core::ProjectStatus;
use taskhive_core::ProjectUpdate;
use taskhive_core::Role;
use taskhive_core::StoreError;
use taskhive_core::SubscriptionType;
use taskhive_core::Task;
use taskhive_core::TaskFacts;
use taskhive_core::TaskFilter;
use taskhive_core::TaskId;
use taskhive_core::TaskStatus;
use taskhive_core::TaskUpdate;
use taskhive_core::Tenant;
use taskhive_core::TenantFacts;
use taskhive_core::TenantId;
use taskhive_core::TenantStats;
use taskhive_core::TenantStatus;
use taskhive_core::TenantUpdate;
use taskhive_core::TrackerStore;
use taskhive_core::User;
use taskhive_core::UserFacts;
use taskhive_core::UserId;
use taskhive_core::UserUpdate;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteJournalMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteJournalMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` tracker store.
///
/// # Invariants
/// - `path` must resolve to a file path (not a directory).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteJournalMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store construction and integrity errors.
///
/// # Invariants
/// - Error messages avoid embedding row payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Invalid store configuration or data.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
}

impl From<SqliteStoreError> for StoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message)
            | SqliteStoreError::Db(message)
            | SqliteStoreError::VersionMismatch(message) => Self::Io(message),
            SqliteStoreError::Invalid(message) => Self::Invalid(message),
        }
    }
}

/// Maps a `rusqlite` error into the backend-agnostic store error.
fn db_err(err: &rusqlite::Error) -> StoreError {
    StoreError::Io(err.to_string())
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed tracker store with WAL support.
///
/// # Invariants
/// - Connection access is serialized through a mutex.
/// - Mutators commit their audit row in the same transaction as the write.
#[derive(Clone)]
pub struct SqliteTrackerStore {
    /// Shared connection guarded by a mutex.
    connection: Arc<Mutex<Connection>>,
}

impl SqliteTrackerStore {
    /// Opens (or creates) the store at the configured path.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the path is invalid, the database
    /// cannot be opened, or the schema version is unsupported.
    pub fn new(config: &SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        if config.path.as_os_str().is_empty() {
            return Err(SqliteStoreError::Invalid(
                "store path must not be empty".to_string(),
            ));
        }
        if config.path.exists() && config.path.is_dir() {
            return Err(SqliteStoreError::Invalid(
                "store path must be a file, not a directory".to_string(),
            ));
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let mut connection = Connection::open_with_flags(&config.path, flags)
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        apply_pragmas(&connection, config)?;
        initialize_schema(&mut connection)?;
        Ok(Self {
            connection: Arc::new(Mutex::new(connection)),
        })
    }

    /// Acquires the connection lock.
    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.connection
            .lock()
            .map_err(|_| StoreError::Io("store lock poisoned".to_string()))
    }
}

/// Applies `SQLite` pragmas required for durability.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch("PRAGMA foreign_keys = ON;")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!(
            "PRAGMA journal_mode = {};",
            config.journal_mode.pragma_value()
        ))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!(
            "PRAGMA synchronous = {};",
            config.sync_mode.pragma_value()
        ))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(std::time::Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the `SQLite` schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection
        .transaction()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| {
            row.get(0)
        })
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute(
                "INSERT INTO store_meta (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS tenants (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    subdomain TEXT NOT NULL UNIQUE,
                    status TEXT NOT NULL,
                    subscription_type TEXT NOT NULL,
                    max_users INTEGER NOT NULL,
                    max_projects INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE TABLE IF NOT EXISTS users (
                    id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL REFERENCES tenants(id),
                    email TEXT NOT NULL,
                    password_hash TEXT NOT NULL,
                    full_name TEXT NOT NULL,
                    role TEXT NOT NULL,
                    is_active INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE UNIQUE INDEX IF NOT EXISTS idx_users_tenant_email
                    ON users (tenant_id, email COLLATE NOCASE);
                CREATE INDEX IF NOT EXISTS idx_users_tenant
                    ON users (tenant_id, created_at);
                CREATE TABLE IF NOT EXISTS projects (
                    id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL REFERENCES tenants(id),
                    name TEXT NOT NULL,
                    description TEXT,
                    priority TEXT NOT NULL,
                    status TEXT NOT NULL,
                    created_by TEXT NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    UNIQUE (tenant_id, name)
                );
                CREATE INDEX IF NOT EXISTS idx_projects_tenant
                    ON projects (tenant_id, created_at);
                CREATE TABLE IF NOT EXISTS tasks (
                    id TEXT PRIMARY KEY,
                    project_id TEXT NOT NULL REFERENCES projects(id),
                    tenant_id TEXT NOT NULL REFERENCES tenants(id),
                    title TEXT NOT NULL,
                    description TEXT,
                    priority TEXT NOT NULL,
                    status TEXT NOT NULL,
                    assigned_to TEXT,
                    created_by TEXT NOT NULL,
                    due_date INTEGER,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_tasks_project
                    ON tasks (project_id, created_at);
                CREATE INDEX IF NOT EXISTS idx_tasks_tenant
                    ON tasks (tenant_id);
                CREATE TABLE IF NOT EXISTS audit_logs (
                    id TEXT PRIMARY KEY,
                    tenant_id TEXT NOT NULL,
                    user_id TEXT,
                    action TEXT NOT NULL,
                    entity_type TEXT NOT NULL,
                    entity_id TEXT,
                    recorded_at INTEGER NOT NULL,
                    ip_address TEXT
                );
                CREATE INDEX IF NOT EXISTS idx_audit_tenant_time
                    ON audit_logs (tenant_id, recorded_at);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(value) if value == SCHEMA_VERSION => {}
        Some(value) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "unsupported schema version: {value}"
            )));
        }
    }
    tx.commit()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

// ============================================================================
// SECTION: Row Mapping
// ============================================================================

/// Parses a stored role label.
fn parse_role(label: &str) -> Result<Role, rusqlite::Error> {
    match label {
        "user" => Ok(Role::User),
        "tenant_admin" => Ok(Role::TenantAdmin),
        "super_admin" => Ok(Role::SuperAdmin),
        other => Err(invalid_label("role", other)),
    }
}

/// Parses a stored tenant status label.
fn parse_tenant_status(label: &str) -> Result<TenantStatus, rusqlite::Error> {
    match label {
        "active" => Ok(TenantStatus::Active),
        "suspended" => Ok(TenantStatus::Suspended),
        other => Err(invalid_label("tenant status", other)),
    }
}

/// Parses a stored subscription label.
fn parse_subscription(label: &str) -> Result<SubscriptionType, rusqlite::Error> {
    match label {
        "free" => Ok(SubscriptionType::Free),
        "standard" => Ok(SubscriptionType::Standard),
        "enterprise" => Ok(SubscriptionType::Enterprise),
        other => Err(invalid_label("subscription type", other)),
    }
}

/// Parses a stored priority label.
fn parse_priority(label: &str) -> Result<Priority, rusqlite::Error> {
    match label {
        "low" => Ok(Priority::Low),
        "medium" => Ok(Priority::Medium),
        "high" => Ok(Priority::High),
        other => Err(invalid_label("priority", other)),
    }
}

/// Parses a stored project status label.
fn parse_project_status(label: &str) -> Result<ProjectStatus, rusqlite::Error> {
    match label {
        "active" => Ok(ProjectStatus::Active),
        "on_hold" => Ok(ProjectStatus::OnHold),
        "completed" => Ok(ProjectStatus::Completed),
        other => Err(invalid_label("project status", other)),
    }
}

/// Parses a stored task status label.
fn parse_task_status(label: &str) -> Result<TaskStatus, rusqlite::Error> {
    match label {
        "todo" => Ok(TaskStatus::Todo),
        "in_progress" => Ok(TaskStatus::InProgress),
        "completed" => Ok(TaskStatus::Completed),
        other => Err(invalid_label("task status", other)),
    }
}

/// Builds the error reported for an unrecognized stored label.
fn invalid_label(kind: &str, label: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidParameterName(format!("unrecognized {kind} label: {label}"))
}

/// Maps a full tenant row. Column order: id, name, subdomain, status,
/// subscription_type, max_users, max_projects, created_at, updated_at.
fn read_tenant(row: &Row<'_>) -> Result<Tenant, rusqlite::Error> {
    Ok(Tenant {
        id: TenantId::new(row.get::<_, String>(0)?),
        name: row.get(1)?,
        subdomain: row.get(2)?,
        status: parse_tenant_status(&row.get::<_, String>(3)?)?,
        subscription_type: parse_subscription(&row.get::<_, String>(4)?)?,
        max_users: row.get(5)?,
        max_projects: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Maps a full user row. Column order: id, tenant_id, email, password_hash,
/// full_name, role, is_active, created_at, updated_at.
fn read_user(row: &Row<'_>) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: UserId::new(row.get::<_, String>(0)?),
        tenant_id: TenantId::new(row.get::<_, String>(1)?),
        email: row.get(2)?,
        password_hash: row.get(3)?,
        full_name: row.get(4)?,
        role: parse_role(&row.get::<_, String>(5)?)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Maps a full project row. Column order: id, tenant_id, name, description,
/// priority, status, created_by, created_at, updated_at.
fn read_project(row: &Row<'_>) -> Result<Project, rusqlite::Error> {
    Ok(Project {
        id: ProjectId::new(row.get::<_, String>(0)?),
        tenant_id: TenantId::new(row.get::<_, String>(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        priority: parse_priority(&row.get::<_, String>(4)?)?,
        status: parse_project_status(&row.get::<_, String>(5)?)?,
        created_by: UserId::new(row.get::<_, String>(6)?),
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

/// Maps a full task row. Column order: id, project_id, tenant_id, title,
/// description, priority, status, assigned_to, created_by, due_date,
/// created_at, updated_at.
fn read_task(row: &Row<'_>) -> Result<Task, rusqlite::Error> {
    Ok(Task {
        id: TaskId::new(row.get::<_, String>(0)?),
        project_id: ProjectId::new(row.get::<_, String>(1)?),
        tenant_id: TenantId::new(row.get::<_, String>(2)?),
        title: row.get(3)?,
        description: row.get(4)?,
        priority: parse_priority(&row.get::<_, String>(5)?)?,
        status: parse_task_status(&row.get::<_, String>(6)?)?,
        assigned_to: row.get::<_, Option<String>>(7)?.map(UserId::new),
        created_by: UserId::new(row.get::<_, String>(8)?),
        due_date: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

/// Full tenant column list shared by tenant queries.
const TENANT_COLUMNS: &str = "id, name, subdomain, status, subscription_type, max_users, \
                              max_projects, created_at, updated_at";
/// Full user column list shared by user queries.
const USER_COLUMNS: &str =
    "id, tenant_id, email, password_hash, full_name, role, is_active, created_at, updated_at";
/// Full project column list shared by project queries.
const PROJECT_COLUMNS: &str =
    "id, tenant_id, name, description, priority, status, created_by, created_at, updated_at";
/// Full task column list shared by task queries.
const TASK_COLUMNS: &str = "id, project_id, tenant_id, title, description, priority, status, \
                            assigned_to, created_by, due_date, created_at, updated_at";

// ============================================================================
// SECTION: Transaction Helpers
// ============================================================================

/// Appends the audit row inside the given connection or transaction.
fn insert_audit(connection: &Connection, audit: &AuditRecord) -> Result<(), StoreError> {
    connection
        .execute(
            "INSERT INTO audit_logs (id, tenant_id, user_id, action, entity_type, entity_id, \
             recorded_at, ip_address) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                AuditEntryId::generate().as_str(),
                audit.tenant_id.as_str(),
                audit.user_id.as_ref().map(|id| id.as_str().to_string()),
                audit.action.as_str(),
                audit.entity_type.as_str(),
                audit.entity_id,
                audit.recorded_at,
                audit.ip_address,
            ],
        )
        .map_err(|err| db_err(&err))?;
    Ok(())
}

/// Counts active users of one tenant inside the transaction.
fn active_user_count(connection: &Connection, tenant_id: &TenantId) -> Result<u32, StoreError> {
    connection
        .query_row(
            "SELECT COUNT(1) FROM users WHERE tenant_id = ?1 AND is_active = 1",
            params![tenant_id.as_str()],
            |row| row.get(0),
        )
        .map_err(|err| db_err(&err))
}

/// Counts projects of one tenant inside the transaction.
fn project_count(connection: &Connection, tenant_id: &TenantId) -> Result<u32, StoreError> {
    connection
        .query_row(
            "SELECT COUNT(1) FROM projects WHERE tenant_id = ?1",
            params![tenant_id.as_str()],
            |row| row.get(0),
        )
        .map_err(|err| db_err(&err))
}

/// Converts a `COUNT` result into the stats width.
fn stat_count(count: i64) -> Result<u64, StoreError> {
    u64::try_from(count).map_err(|err| StoreError::Io(format!("count out of range: {err}")))
}

/// Loads the quota limits of one tenant inside the transaction.
fn tenant_limits(connection: &Connection, tenant_id: &TenantId) -> Result<(u32, u32), StoreError> {
    connection
        .query_row(
            "SELECT max_users, max_projects FROM tenants WHERE id = ?1",
            params![tenant_id.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|err| db_err(&err))?
        .ok_or(StoreError::NotFound(EntityKind::Tenant))
}

/// Loads a full user row scoped to its expected tenant inside the transaction.
fn scoped_user_row(
    connection: &Connection,
    id: &UserId,
    tenant_id: &TenantId,
) -> Result<User, StoreError> {
    let row = connection
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id.as_str()],
            read_user,
        )
        .optional()
        .map_err(|err| db_err(&err))?
        .ok_or(StoreError::NotFound(EntityKind::User))?;
    if &row.tenant_id != tenant_id {
        return Err(StoreError::TenantMismatch);
    }
    Ok(row)
}

/// Loads a full project row scoped to its expected tenant inside the
/// transaction.
fn scoped_project_row(
    connection: &Connection,
    id: &ProjectId,
    tenant_id: &TenantId,
) -> Result<Project, StoreError> {
    let row = connection
        .query_row(
            &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
            params![id.as_str()],
            read_project,
        )
        .optional()
        .map_err(|err| db_err(&err))?
        .ok_or(StoreError::NotFound(EntityKind::Project))?;
    if &row.tenant_id != tenant_id {
        return Err(StoreError::TenantMismatch);
    }
    Ok(row)
}

/// Loads a full task row scoped to its expected tenant inside the transaction.
fn scoped_task_row(
    connection: &Connection,
    id: &TaskId,
    tenant_id: &TenantId,
) -> Result<Task, StoreError> {
    let row = connection
        .query_row(
            &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
            params![id.as_str()],
            read_task,
        )
        .optional()
        .map_err(|err| db_err(&err))?
        .ok_or(StoreError::NotFound(EntityKind::Task))?;
    if &row.tenant_id != tenant_id {
        return Err(StoreError::TenantMismatch);
    }
    Ok(row)
}

/// Re-checks an assignee's tenant membership and active flag inside the
/// transaction.
fn check_assignee(
    connection: &Connection,
    tenant_id: &TenantId,
    assignee: &UserId,
) -> Result<(), StoreError> {
    let ok: Option<bool> = connection
        .query_row(
            "SELECT (tenant_id = ?2 AND is_active = 1) FROM users WHERE id = ?1",
            params![assignee.as_str(), tenant_id.as_str()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| db_err(&err))?;
    match ok {
        Some(true) => Ok(()),
        Some(false) | None => Err(StoreError::TenantMismatch),
    }
}

/// Writes a full user row back inside the transaction.
fn persist_user(connection: &Connection, user: &User) -> Result<(), StoreError> {
    connection
        .execute(
            "UPDATE users SET email = ?2, password_hash = ?3, full_name = ?4, role = ?5, \
             is_active = ?6, updated_at = ?7 WHERE id = ?1",
            params![
                user.id.as_str(),
                user.email,
                user.password_hash,
                user.full_name,
                user.role.as_str(),
                user.is_active,
                user.updated_at,
            ],
        )
        .map_err(|err| db_err(&err))?;
    Ok(())
}

// ============================================================================
// SECTION: TrackerStore Implementation
// ============================================================================

impl TrackerStore for SqliteTrackerStore {
    fn tenant_facts(&self, id: &TenantId) -> Result<Option<TenantFacts>, StoreError> {
        let connection = self.lock()?;
        connection
            .query_row(
                "SELECT id, status FROM tenants WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(TenantFacts {
                        id: TenantId::new(row.get::<_, String>(0)?),
                        status: parse_tenant_status(&row.get::<_, String>(1)?)?,
                    })
                },
            )
            .optional()
            .map_err(|err| db_err(&err))
    }

    fn user_facts(&self, id: &UserId) -> Result<Option<UserFacts>, StoreError> {
        let connection = self.lock()?;
        connection
            .query_row(
                "SELECT id, tenant_id, role, is_active FROM users WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(UserFacts {
                        id: UserId::new(row.get::<_, String>(0)?),
                        tenant_id: TenantId::new(row.get::<_, String>(1)?),
                        role: parse_role(&row.get::<_, String>(2)?)?,
                        is_active: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(|err| db_err(&err))
    }

    fn project_facts(&self, id: &ProjectId) -> Result<Option<ProjectFacts>, StoreError> {
        let connection = self.lock()?;
        connection
            .query_row(
                "SELECT id, tenant_id, created_by FROM projects WHERE id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(ProjectFacts {
                        id: ProjectId::new(row.get::<_, String>(0)?),
                        tenant_id: TenantId::new(row.get::<_, String>(1)?),
                        created_by: UserId::new(row.get::<_, String>(2)?),
                    })
                },
            )
            .optional()
            .map_err(|err| db_err(&err))
    }

    fn task_facts(&self, id: &TaskId) -> Result<Option<TaskFacts>, StoreError> {
        let connection = self.lock()?;
        // The project join is authoritative for the owning tenant.
        connection
            .query_row(
                "SELECT t.id, t.project_id, p.tenant_id, t.created_by, t.assigned_to
                 FROM tasks t JOIN projects p ON p.id = t.project_id
                 WHERE t.id = ?1",
                params![id.as_str()],
                |row| {
                    Ok(TaskFacts {
                        id: TaskId::new(row.get::<_, String>(0)?),
                        project_id: ProjectId::new(row.get::<_, String>(1)?),
                        tenant_id: TenantId::new(row.get::<_, String>(2)?),
                        created_by: UserId::new(row.get::<_, String>(3)?),
                        assigned_to: row.get::<_, Option<String>>(4)?.map(UserId::new),
                    })
                },
            )
            .optional()
            .map_err(|err| db_err(&err))
    }

    fn load_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, StoreError> {
        let connection = self.lock()?;
        connection
            .query_row(
                &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1"),
                params![id.as_str()],
                read_tenant,
            )
            .optional()
            .map_err(|err| db_err(&err))
    }

    fn tenant_stats(&self, id: &TenantId) -> Result<TenantStats, StoreError> {
        let connection = self.lock()?;
        let (users, projects, tasks): (i64, i64, i64) = connection
            .query_row(
                "SELECT
                    (SELECT COUNT(1) FROM users WHERE tenant_id = ?1),
                    (SELECT COUNT(1) FROM projects WHERE tenant_id = ?1),
                    (SELECT COUNT(1) FROM tasks WHERE tenant_id = ?1)",
                params![id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(|err| db_err(&err))?;
        Ok(TenantStats {
            total_users: stat_count(users)?,
            total_projects: stat_count(projects)?,
            total_tasks: stat_count(tasks)?,
        })
    }

    fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(&format!(
                "SELECT {TENANT_COLUMNS} FROM tenants ORDER BY created_at DESC, id"
            ))
            .map_err(|err| db_err(&err))?;
        let rows = statement
            .query_map(params![], read_tenant)
            .map_err(|err| db_err(&err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| db_err(&err))
    }

    fn list_users(&self, tenant_id: &TenantId) -> Result<Vec<User>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users WHERE tenant_id = ?1 \
                 ORDER BY created_at DESC, id"
            ))
            .map_err(|err| db_err(&err))?;
        let rows = statement
            .query_map(params![tenant_id.as_str()], read_user)
            .map_err(|err| db_err(&err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| db_err(&err))
    }

    fn list_projects(
        &self,
        tenant_id: &TenantId,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(&format!(
                "SELECT {PROJECT_COLUMNS} FROM projects
                 WHERE tenant_id = ?1
                   AND (?2 IS NULL OR status = ?2)
                   AND (?3 IS NULL OR priority = ?3)
                   AND (?4 IS NULL OR created_by = ?4)
                 ORDER BY created_at DESC, id"
            ))
            .map_err(|err| db_err(&err))?;
        let rows = statement
            .query_map(
                params![
                    tenant_id.as_str(),
                    filter.status.map(ProjectStatus::as_str),
                    filter.priority.map(Priority::as_str),
                    filter.created_by.as_ref().map(|id| id.as_str().to_string()),
                ],
                read_project,
            )
            .map_err(|err| db_err(&err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| db_err(&err))
    }

    fn list_tasks(
        &self,
        project_id: &ProjectId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        let connection = self.lock()?;
        let mut statement = connection
            .prepare(&format!(
                "SELECT {TASK_COLUMNS} FROM tasks
                 WHERE project_id = ?1
                   AND (?2 IS NULL OR status = ?2)
                   AND (?3 IS NULL OR priority = ?3)
                   AND (?4 IS NULL OR assigned_to = ?4)
                 ORDER BY created_at DESC, id"
            ))
            .map_err(|err| db_err(&err))?;
        let rows = statement
            .query_map(
                params![
                    project_id.as_str(),
                    filter.status.map(TaskStatus::as_str),
                    filter.priority.map(Priority::as_str),
                    filter
                        .assigned_to
                        .as_ref()
                        .map(|id| id.as_str().to_string()),
                ],
                read_task,
            )
            .map_err(|err| db_err(&err))?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(|err| db_err(&err))
    }

    fn find_login_user(
        &self,
        subdomain: &str,
        email: &str,
    ) -> Result<Option<(Tenant, User)>, StoreError> {
        let connection = self.lock()?;
        connection
            .query_row(
                "SELECT t.id, t.name, t.subdomain, t.status, t.subscription_type, t.max_users, \
                 t.max_projects, t.created_at, t.updated_at, u.id, u.tenant_id, u.email, \
                 u.password_hash, u.full_name, u.role, u.is_active, u.created_at, u.updated_at
                 FROM tenants t JOIN users u ON u.tenant_id = t.id
                 WHERE t.subdomain = ?1 AND u.email = ?2 COLLATE NOCASE",
                params![subdomain, email],
                |row| {
                    let tenant = Tenant {
                        id: TenantId::new(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                        subdomain: row.get(2)?,
                        status: parse_tenant_status(&row.get::<_, String>(3)?)?,
                        subscription_type: parse_subscription(&row.get::<_, String>(4)?)?,
                        max_users: row.get(5)?,
                        max_projects: row.get(6)?,
                        created_at: row.get(7)?,
                        updated_at: row.get(8)?,
                    };
                    let user = User {
                        id: UserId::new(row.get::<_, String>(9)?),
                        tenant_id: TenantId::new(row.get::<_, String>(10)?),
                        email: row.get(11)?,
                        password_hash: row.get(12)?,
                        full_name: row.get(13)?,
                        role: parse_role(&row.get::<_, String>(14)?)?,
                        is_active: row.get(15)?,
                        created_at: row.get(16)?,
                        updated_at: row.get(17)?,
                    };
                    Ok((tenant, user))
                },
            )
            .optional()
            .map_err(|err| db_err(&err))
    }

    fn register_tenant(
        &self,
        tenant: &Tenant,
        admin: &User,
        audit: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let taken: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM tenants WHERE subdomain = ?1)",
                params![tenant.subdomain],
                |row| row.get(0),
            )
            .map_err(|err| db_err(&err))?;
        if taken {
            return Err(StoreError::Conflict(format!(
                "subdomain '{}' is already registered",
                tenant.subdomain
            )));
        }
        tx.execute(
            "INSERT INTO tenants (id, name, subdomain, status, subscription_type, max_users, \
             max_projects, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                tenant.id.as_str(),
                tenant.name,
                tenant.subdomain,
                tenant.status.as_str(),
                tenant.subscription_type.as_str(),
                tenant.max_users,
                tenant.max_projects,
                tenant.created_at,
                tenant.updated_at,
            ],
        )
        .map_err(|err| db_err(&err))?;
        insert_user(&tx, admin)?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))
    }

    fn update_tenant(
        &self,
        id: &TenantId,
        update: &TenantUpdate,
        audit: &AuditRecord,
    ) -> Result<Tenant, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let mut tenant = tx
            .query_row(
                &format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1"),
                params![id.as_str()],
                read_tenant,
            )
            .optional()
            .map_err(|err| db_err(&err))?
            .ok_or(StoreError::NotFound(EntityKind::Tenant))?;
        if let Some(max_users) = update.max_users {
            let current = active_user_count(&tx, id)?;
            if max_users < current {
                return Err(StoreError::Conflict(format!(
                    "cannot lower max_users to {max_users}: tenant has {current} active users"
                )));
            }
            tenant.max_users = max_users;
        }
        if let Some(max_projects) = update.max_projects {
            let current = project_count(&tx, id)?;
            if max_projects < current {
                return Err(StoreError::Conflict(format!(
                    "cannot lower max_projects to {max_projects}: tenant has {current} projects"
                )));
            }
            tenant.max_projects = max_projects;
        }
        if let Some(name) = &update.name {
            tenant.name.clone_from(name);
        }
        if let Some(status) = update.status {
            tenant.status = status;
        }
        if let Some(subscription) = update.subscription_type {
            tenant.subscription_type = subscription;
        }
        tenant.updated_at = audit.recorded_at;
        tx.execute(
            "UPDATE tenants SET name = ?2, status = ?3, subscription_type = ?4, max_users = ?5, \
             max_projects = ?6, updated_at = ?7 WHERE id = ?1",
            params![
                tenant.id.as_str(),
                tenant.name,
                tenant.status.as_str(),
                tenant.subscription_type.as_str(),
                tenant.max_users,
                tenant.max_projects,
                tenant.updated_at,
            ],
        )
        .map_err(|err| db_err(&err))?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(tenant)
    }

    fn create_user(&self, user: &User, audit: &AuditRecord) -> Result<User, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let (max_users, _) = tenant_limits(&tx, &user.tenant_id)?;
        let current = active_user_count(&tx, &user.tenant_id)?;
        if current >= max_users {
            return Err(StoreError::QuotaExceeded {
                resource: "users",
                limit: max_users,
                current,
            });
        }
        let taken: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE tenant_id = ?1 AND email = ?2 COLLATE \
                 NOCASE)",
                params![user.tenant_id.as_str(), user.email],
                |row| row.get(0),
            )
            .map_err(|err| db_err(&err))?;
        if taken {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already in use within the tenant",
                user.email
            )));
        }
        insert_user(&tx, user)?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(user.clone())
    }

    fn update_user(
        &self,
        id: &UserId,
        tenant_id: &TenantId,
        update: &UserUpdate,
        audit: &AuditRecord,
    ) -> Result<User, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let mut user = scoped_user_row(&tx, id, tenant_id)?;
        // Reactivation consumes an active-user slot, so it re-checks quota
        // like a create does.
        if update.is_active == Some(true) && !user.is_active {
            let (max_users, _) = tenant_limits(&tx, tenant_id)?;
            let current = active_user_count(&tx, tenant_id)?;
            if current >= max_users {
                return Err(StoreError::QuotaExceeded {
                    resource: "users",
                    limit: max_users,
                    current,
                });
            }
        }
        if let Some(full_name) = &update.full_name {
            user.full_name.clone_from(full_name);
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        if let Some(is_active) = update.is_active {
            user.is_active = is_active;
        }
        user.updated_at = audit.recorded_at;
        persist_user(&tx, &user)?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(user)
    }

    fn deactivate_user(
        &self,
        id: &UserId,
        tenant_id: &TenantId,
        audit: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let mut user = scoped_user_row(&tx, id, tenant_id)?;
        user.is_active = false;
        user.updated_at = audit.recorded_at;
        persist_user(&tx, &user)?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))
    }

    fn create_project(
        &self,
        project: &Project,
        audit: &AuditRecord,
    ) -> Result<Project, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let (_, max_projects) = tenant_limits(&tx, &project.tenant_id)?;
        let current = project_count(&tx, &project.tenant_id)?;
        if current >= max_projects {
            return Err(StoreError::QuotaExceeded {
                resource: "projects",
                limit: max_projects,
                current,
            });
        }
        let taken: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE tenant_id = ?1 AND name = ?2)",
                params![project.tenant_id.as_str(), project.name],
                |row| row.get(0),
            )
            .map_err(|err| db_err(&err))?;
        if taken {
            return Err(StoreError::Conflict(format!(
                "project name '{}' is already in use within the tenant",
                project.name
            )));
        }
        tx.execute(
            "INSERT INTO projects (id, tenant_id, name, description, priority, status, \
             created_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                project.id.as_str(),
                project.tenant_id.as_str(),
                project.name,
                project.description,
                project.priority.as_str(),
                project.status.as_str(),
                project.created_by.as_str(),
                project.created_at,
                project.updated_at,
            ],
        )
        .map_err(|err| db_err(&err))?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(project.clone())
    }

    fn update_project(
        &self,
        id: &ProjectId,
        tenant_id: &TenantId,
        update: &ProjectUpdate,
        audit: &AuditRecord,
    ) -> Result<Project, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let mut project = scoped_project_row(&tx, id, tenant_id)?;
        if let Some(name) = &update.name {
            let taken: bool = tx
                .query_row(
                    "SELECT EXISTS(SELECT 1 FROM projects WHERE tenant_id = ?1 AND name = ?2 AND \
                     id <> ?3)",
                    params![tenant_id.as_str(), name, id.as_str()],
                    |row| row.get(0),
                )
                .map_err(|err| db_err(&err))?;
            if taken {
                return Err(StoreError::Conflict(format!(
                    "project name '{name}' is already in use within the tenant"
                )));
            }
            project.name.clone_from(name);
        }
        if let Some(description) = &update.description {
            project.description.clone_from(description);
        }
        if let Some(priority) = update.priority {
            project.priority = priority;
        }
        if let Some(status) = update.status {
            project.status = status;
        }
        project.updated_at = audit.recorded_at;
        tx.execute(
            "UPDATE projects SET name = ?2, description = ?3, priority = ?4, status = ?5, \
             updated_at = ?6 WHERE id = ?1",
            params![
                project.id.as_str(),
                project.name,
                project.description,
                project.priority.as_str(),
                project.status.as_str(),
                project.updated_at,
            ],
        )
        .map_err(|err| db_err(&err))?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(project)
    }

    fn delete_project(
        &self,
        id: &ProjectId,
        tenant_id: &TenantId,
        audit: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        scoped_project_row(&tx, id, tenant_id)?;
        let task_count: u32 = tx
            .query_row(
                "SELECT COUNT(1) FROM tasks WHERE project_id = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .map_err(|err| db_err(&err))?;
        if task_count > 0 {
            return Err(StoreError::Conflict(format!(
                "project still owns {task_count} tasks"
            )));
        }
        tx.execute(
            "DELETE FROM projects WHERE id = ?1",
            params![id.as_str()],
        )
        .map_err(|err| db_err(&err))?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))
    }

    fn create_task(&self, task: &Task, audit: &AuditRecord) -> Result<Task, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let project_tenant: Option<String> = tx
            .query_row(
                "SELECT tenant_id FROM projects WHERE id = ?1",
                params![task.project_id.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| db_err(&err))?;
        match project_tenant {
            None => return Err(StoreError::NotFound(EntityKind::Project)),
            Some(tenant) if tenant != task.tenant_id.as_str() => {
                return Err(StoreError::TenantMismatch);
            }
            Some(_) => {}
        }
        if let Some(assignee) = &task.assigned_to {
            check_assignee(&tx, &task.tenant_id, assignee)?;
        }
        tx.execute(
            "INSERT INTO tasks (id, project_id, tenant_id, title, description, priority, status, \
             assigned_to, created_by, due_date, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, \
             ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                task.id.as_str(),
                task.project_id.as_str(),
                task.tenant_id.as_str(),
                task.title,
                task.description,
                task.priority.as_str(),
                task.status.as_str(),
                task.assigned_to.as_ref().map(|id| id.as_str().to_string()),
                task.created_by.as_str(),
                task.due_date,
                task.created_at,
                task.updated_at,
            ],
        )
        .map_err(|err| db_err(&err))?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(task.clone())
    }

    fn update_task(
        &self,
        id: &TaskId,
        tenant_id: &TenantId,
        update: &TaskUpdate,
        audit: &AuditRecord,
    ) -> Result<Task, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let mut task = scoped_task_row(&tx, id, tenant_id)?;
        if let Some(Some(assignee)) = &update.assigned_to {
            check_assignee(&tx, tenant_id, assignee)?;
        }
        if let Some(title) = &update.title {
            task.title.clone_from(title);
        }
        if let Some(description) = &update.description {
            task.description.clone_from(description);
        }
        if let Some(priority) = update.priority {
            task.priority = priority;
        }
        if let Some(status) = update.status {
            task.status = status;
        }
        if let Some(assigned_to) = &update.assigned_to {
            task.assigned_to.clone_from(assigned_to);
        }
        if let Some(due_date) = update.due_date {
            task.due_date = due_date;
        }
        task.updated_at = audit.recorded_at;
        persist_task(&tx, &task)?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(task)
    }

    fn update_task_status(
        &self,
        id: &TaskId,
        tenant_id: &TenantId,
        status: TaskStatus,
        audit: &AuditRecord,
    ) -> Result<Task, StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        let mut task = scoped_task_row(&tx, id, tenant_id)?;
        task.status = status;
        task.updated_at = audit.recorded_at;
        persist_task(&tx, &task)?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))?;
        Ok(task)
    }

    fn delete_task(
        &self,
        id: &TaskId,
        tenant_id: &TenantId,
        audit: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut connection = self.lock()?;
        let tx = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|err| db_err(&err))?;
        scoped_task_row(&tx, id, tenant_id)?;
        tx.execute("DELETE FROM tasks WHERE id = ?1", params![id.as_str()])
            .map_err(|err| db_err(&err))?;
        insert_audit(&tx, audit)?;
        tx.commit().map_err(|err| db_err(&err))
    }

    fn record_audit(&self, audit: &AuditRecord) -> Result<(), StoreError> {
        let connection = self.lock()?;
        insert_audit(&connection, audit)
    }

    fn readiness(&self) -> Result<(), StoreError> {
        let connection = self.lock()?;
        connection
            .query_row("SELECT 1", params![], |_| Ok(()))
            .map_err(|err| db_err(&err))
    }
}

/// Inserts a full user row inside the transaction.
fn insert_user(connection: &Connection, user: &User) -> Result<(), StoreError> {
    connection
        .execute(
            "INSERT INTO users (id, tenant_id, email, password_hash, full_name, role, is_active, \
             created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                user.id.as_str(),
                user.tenant_id.as_str(),
                user.email,
                user.password_hash,
                user.full_name,
                user.role.as_str(),
                user.is_active,
                user.created_at,
                user.updated_at,
            ],
        )
        .map_err(|err| db_err(&err))?;
    Ok(())
}

/// Writes a full task row back inside the transaction.
fn persist_task(connection: &Connection, task: &Task) -> Result<(), StoreError> {
    connection
        .execute(
            "UPDATE tasks SET title = ?2, description = ?3, priority = ?4, status = ?5, \
             assigned_to = ?6, due_date = ?7, updated_at = ?8 WHERE id = ?1",
            params![
                task.id.as_str(),
                task.title,
                task.description,
                task.priority.as_str(),
                task.status.as_str(),
                task.assigned_to.as_ref().map(|id| id.as_str().to_string()),
                task.due_date,
                task.updated_at,
            ],
        )
        .map_err(|err| db_err(&err))?;
    Ok(())
}
