// crates/taskhive-core/src/store/memory.rs
// ============================================================================
// Module: In-Memory Tracker Store
// Description: Mutex-guarded map-backed implementation of the store contract.
// Purpose: Reference backend for tests and non-durable deployments.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! A map-backed [`TrackerStore`] guarded by one mutex. Holding the lock for
//! the whole mutator gives the same atomicity a database transaction gives the
//! durable backend: uniqueness and quota re-checks, the write, and the audit
//! row all land together or not at all. Uniqueness and quota semantics mirror
//! the durable backend exactly so the engine test-suite exercises the real
//! invariants.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::core::entities::EntityKind;
use crate::core::entities::Project;
use crate::core::entities::Task;
use crate::core::entities::TaskStatus;
use crate::core::entities::Tenant;
use crate::core::entities::TenantStats;
use crate::core::entities::User;
use crate::core::identifiers::ProjectId;
use crate::core::identifiers::TaskId;
use crate::core::identifiers::TenantId;
use crate::core::identifiers::UserId;
use crate::core::update::ProjectUpdate;
use crate::core::update::TaskUpdate;
use crate::core::update::TenantUpdate;
use crate::core::update::UserUpdate;
use crate::interfaces::AuditRecord;
use crate::interfaces::ProjectFacts;
use crate::interfaces::ProjectFilter;
use crate::interfaces::StoreError;
use crate::interfaces::TaskFacts;
use crate::interfaces::TaskFilter;
use crate::interfaces::TenantFacts;
use crate::interfaces::TrackerStore;
use crate::interfaces::UserFacts;

// ============================================================================
// SECTION: Store State
// ============================================================================

/// All tracker state behind the store mutex.
#[derive(Debug, Default)]
struct StoreInner {
    /// Tenant rows by identifier.
    tenants: BTreeMap<TenantId, Tenant>,
    /// User rows by identifier.
    users: BTreeMap<UserId, User>,
    /// Project rows by identifier.
    projects: BTreeMap<ProjectId, Project>,
    /// Task rows by identifier.
    tasks: BTreeMap<TaskId, Task>,
    /// Audit rows in append order.
    audit: Vec<AuditRecord>,
}

impl StoreInner {
    /// Counts active users of one tenant.
    fn active_user_count(&self, tenant_id: &TenantId) -> u32 {
        let count = self
            .users
            .values()
            .filter(|user| &user.tenant_id == tenant_id && user.is_active)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Counts projects of one tenant.
    fn project_count(&self, tenant_id: &TenantId) -> u32 {
        let count = self
            .projects
            .values()
            .filter(|project| &project.tenant_id == tenant_id)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Checks tenant-scoped email uniqueness, ignoring one user row.
    fn email_taken(&self, tenant_id: &TenantId, email: &str, exclude: Option<&UserId>) -> bool {
        self.users.values().any(|user| {
            &user.tenant_id == tenant_id
                && Some(&user.id) != exclude
                && user.email.eq_ignore_ascii_case(email)
        })
    }

    /// Checks tenant-scoped project-name uniqueness, ignoring one row.
    fn project_name_taken(
        &self,
        tenant_id: &TenantId,
        name: &str,
        exclude: Option<&ProjectId>,
    ) -> bool {
        self.projects.values().any(|project| {
            &project.tenant_id == tenant_id && Some(&project.id) != exclude && project.name == name
        })
    }

    /// Verifies an assignee belongs to the tenant and is active.
    fn check_assignee(&self, tenant_id: &TenantId, assignee: &UserId) -> Result<(), StoreError> {
        match self.users.get(assignee) {
            Some(user) if &user.tenant_id == tenant_id && user.is_active => Ok(()),
            Some(_) | None => Err(StoreError::TenantMismatch),
        }
    }

    /// Fetches a user row scoped to its expected tenant.
    fn scoped_user(&mut self, id: &UserId, tenant_id: &TenantId) -> Result<&mut User, StoreError> {
        match self.users.get_mut(id) {
            Some(user) if &user.tenant_id == tenant_id => Ok(user),
            Some(_) => Err(StoreError::TenantMismatch),
            None => Err(StoreError::NotFound(EntityKind::User)),
        }
    }

    /// Fetches a project row scoped to its expected tenant.
    fn scoped_project(
        &mut self,
        id: &ProjectId,
        tenant_id: &TenantId,
    ) -> Result<&mut Project, StoreError> {
        match self.projects.get_mut(id) {
            Some(project) if &project.tenant_id == tenant_id => Ok(project),
            Some(_) => Err(StoreError::TenantMismatch),
            None => Err(StoreError::NotFound(EntityKind::Project)),
        }
    }

    /// Fetches a task row scoped to its expected tenant.
    fn scoped_task(&mut self, id: &TaskId, tenant_id: &TenantId) -> Result<&mut Task, StoreError> {
        match self.tasks.get_mut(id) {
            Some(task) if &task.tenant_id == tenant_id => Ok(task),
            Some(_) => Err(StoreError::TenantMismatch),
            None => Err(StoreError::NotFound(EntityKind::Task)),
        }
    }
}

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// Map-backed tracker store.
#[derive(Debug, Default)]
pub struct InMemoryTrackerStore {
    /// Guarded store state.
    inner: Mutex<StoreInner>,
}

impl InMemoryTrackerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the audit log in append order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] when the store lock is poisoned.
    pub fn audit_log(&self) -> Result<Vec<AuditRecord>, StoreError> {
        Ok(self.lock()?.audit.clone())
    }

    /// Acquires the store lock.
    fn lock(&self) -> Result<std::sync::MutexGuard<'_, StoreInner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Io("store lock poisoned".to_string()))
    }
}

impl TrackerStore for InMemoryTrackerStore {
    fn tenant_facts(&self, id: &TenantId) -> Result<Option<TenantFacts>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.tenants.get(id).map(|tenant| TenantFacts {
            id: tenant.id.clone(),
            status: tenant.status,
        }))
    }

    fn user_facts(&self, id: &UserId) -> Result<Option<UserFacts>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.users.get(id).map(|user| UserFacts {
            id: user.id.clone(),
            tenant_id: user.tenant_id.clone(),
            role: user.role,
            is_active: user.is_active,
        }))
    }

    fn project_facts(&self, id: &ProjectId) -> Result<Option<ProjectFacts>, StoreError> {
        let inner = self.lock()?;
        Ok(inner.projects.get(id).map(|project| ProjectFacts {
            id: project.id.clone(),
            tenant_id: project.tenant_id.clone(),
            created_by: project.created_by.clone(),
        }))
    }

    fn task_facts(&self, id: &TaskId) -> Result<Option<TaskFacts>, StoreError> {
        let inner = self.lock()?;
        let Some(task) = inner.tasks.get(id) else {
            return Ok(None);
        };
        // The project join is authoritative; a task whose project is gone is
        // treated as absent.
        let Some(project) = inner.projects.get(&task.project_id) else {
            return Ok(None);
        };
        Ok(Some(TaskFacts {
            id: task.id.clone(),
            project_id: task.project_id.clone(),
            tenant_id: project.tenant_id.clone(),
            created_by: task.created_by.clone(),
            assigned_to: task.assigned_to.clone(),
        }))
    }

    fn load_tenant(&self, id: &TenantId) -> Result<Option<Tenant>, StoreError> {
        Ok(self.lock()?.tenants.get(id).cloned())
    }

    fn tenant_stats(&self, id: &TenantId) -> Result<TenantStats, StoreError> {
        let inner = self.lock()?;
        let users = inner
            .users
            .values()
            .filter(|user| &user.tenant_id == id)
            .count();
        let projects = inner
            .projects
            .values()
            .filter(|project| &project.tenant_id == id)
            .count();
        let tasks = inner
            .tasks
            .values()
            .filter(|task| &task.tenant_id == id)
            .count();
        Ok(TenantStats {
            total_users: u64::try_from(users).unwrap_or(u64::MAX),
            total_projects: u64::try_from(projects).unwrap_or(u64::MAX),
            total_tasks: u64::try_from(tasks).unwrap_or(u64::MAX),
        })
    }

    fn list_tenants(&self) -> Result<Vec<Tenant>, StoreError> {
        let inner = self.lock()?;
        let mut rows: Vec<Tenant> = inner.tenants.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn list_users(&self, tenant_id: &TenantId) -> Result<Vec<User>, StoreError> {
        let inner = self.lock()?;
        let mut rows: Vec<User> = inner
            .users
            .values()
            .filter(|user| &user.tenant_id == tenant_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn list_projects(
        &self,
        tenant_id: &TenantId,
        filter: &ProjectFilter,
    ) -> Result<Vec<Project>, StoreError> {
        let inner = self.lock()?;
        let mut rows: Vec<Project> = inner
            .projects
            .values()
            .filter(|project| {
                &project.tenant_id == tenant_id
                    && filter.status.is_none_or(|status| project.status == status)
                    && filter
                        .priority
                        .is_none_or(|priority| project.priority == priority)
                    && filter
                        .created_by
                        .as_ref()
                        .is_none_or(|creator| &project.created_by == creator)
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn list_tasks(
        &self,
        project_id: &ProjectId,
        filter: &TaskFilter,
    ) -> Result<Vec<Task>, StoreError> {
        let inner = self.lock()?;
        let mut rows: Vec<Task> = inner
            .tasks
            .values()
            .filter(|task| {
                &task.project_id == project_id
                    && filter.status.is_none_or(|status| task.status == status)
                    && filter
                        .priority
                        .is_none_or(|priority| task.priority == priority)
                    && filter
                        .assigned_to
                        .as_ref()
                        .is_none_or(|assignee| task.assigned_to.as_ref() == Some(assignee))
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    fn find_login_user(
        &self,
        subdomain: &str,
        email: &str,
    ) -> Result<Option<(Tenant, User)>, StoreError> {
        let inner = self.lock()?;
        let Some(tenant) = inner
            .tenants
            .values()
            .find(|tenant| tenant.subdomain == subdomain)
        else {
            return Ok(None);
        };
        let Some(user) = inner
            .users
            .values()
            .find(|user| user.tenant_id == tenant.id && user.email.eq_ignore_ascii_case(email))
        else {
            return Ok(None);
        };
        Ok(Some((tenant.clone(), user.clone())))
    }

    fn register_tenant(
        &self,
        tenant: &Tenant,
        admin: &User,
        audit: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        if inner
            .tenants
            .values()
            .any(|existing| existing.subdomain == tenant.subdomain)
        {
            return Err(StoreError::Conflict(format!(
                "subdomain '{}' is already registered",
                tenant.subdomain
            )));
        }
        inner.tenants.insert(tenant.id.clone(), tenant.clone());
        inner.users.insert(admin.id.clone(), admin.clone());
        inner.audit.push(audit.clone());
        Ok(())
    }

    fn update_tenant(
        &self,
        id: &TenantId,
        update: &TenantUpdate,
        audit: &AuditRecord,
    ) -> Result<Tenant, StoreError> {
        let mut inner = self.lock()?;
        if let Some(max_users) = update.max_users {
            let current = inner.active_user_count(id);
            if max_users < current {
                return Err(StoreError::Conflict(format!(
                    "cannot lower max_users to {max_users}: tenant has {current} active users"
                )));
            }
        }
        if let Some(max_projects) = update.max_projects {
            let current = inner.project_count(id);
            if max_projects < current {
                return Err(StoreError::Conflict(format!(
                    "cannot lower max_projects to {max_projects}: tenant has {current} projects"
                )));
            }
        }
        let tenant = inner
            .tenants
            .get_mut(id)
            .ok_or(StoreError::NotFound(EntityKind::Tenant))?;
        if let Some(name) = &update.name {
            tenant.name.clone_from(name);
        }
        if let Some(status) = update.status {
            tenant.status = status;
        }
        if let Some(subscription) = update.subscription_type {
            tenant.subscription_type = subscription;
        }
        if let Some(max_users) = update.max_users {
            tenant.max_users = max_users;
        }
        if let Some(max_projects) = update.max_projects {
            tenant.max_projects = max_projects;
        }
        tenant.updated_at = audit.recorded_at;
        let updated = tenant.clone();
        inner.audit.push(audit.clone());
        Ok(updated)
    }

    fn create_user(&self, user: &User, audit: &AuditRecord) -> Result<User, StoreError> {
        let mut inner = self.lock()?;
        let tenant = inner
            .tenants
            .get(&user.tenant_id)
            .ok_or(StoreError::NotFound(EntityKind::Tenant))?;
        let limit = tenant.max_users;
        let current = inner.active_user_count(&user.tenant_id);
        if current >= limit {
            return Err(StoreError::QuotaExceeded {
                resource: "users",
                limit,
                current,
            });
        }
        if inner.email_taken(&user.tenant_id, &user.email, None) {
            return Err(StoreError::Conflict(format!(
                "email '{}' is already in use within the tenant",
                user.email
            )));
        }
        inner.users.insert(user.id.clone(), user.clone());
        inner.audit.push(audit.clone());
        Ok(user.clone())
    }

    fn update_user(
        &self,
        id: &UserId,
        tenant_id: &TenantId,
        update: &UserUpdate,
        audit: &AuditRecord,
    ) -> Result<User, StoreError> {
        let mut inner = self.lock()?;
        // Reactivation consumes an active-user slot, so it re-checks quota
        // like a create does.
        if update.is_active == Some(true) {
            let reactivating = inner
                .users
                .get(id)
                .is_some_and(|user| &user.tenant_id == tenant_id && !user.is_active);
            if reactivating {
                let limit = inner
                    .tenants
                    .get(tenant_id)
                    .ok_or(StoreError::NotFound(EntityKind::Tenant))?
                    .max_users;
                let current = inner.active_user_count(tenant_id);
                if current >= limit {
                    return Err(StoreError::QuotaExceeded {
                        resource: "users",
                        limit,
                        current,
                    });
                }
            }
        }
        let user = inner.scoped_user(id, tenant_id)?;
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
        let updated = user.clone();
        inner.audit.push(audit.clone());
        Ok(updated)
    }

    fn deactivate_user(
        &self,
        id: &UserId,
        tenant_id: &TenantId,
        audit: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        let user = inner.scoped_user(id, tenant_id)?;
        user.is_active = false;
        user.updated_at = audit.recorded_at;
        inner.audit.push(audit.clone());
        Ok(())
    }

    fn create_project(
        &self,
        project: &Project,
        audit: &AuditRecord,
    ) -> Result<Project, StoreError> {
        let mut inner = self.lock()?;
        let tenant = inner
            .tenants
            .get(&project.tenant_id)
            .ok_or(StoreError::NotFound(EntityKind::Tenant))?;
        let limit = tenant.max_projects;
        let current = inner.project_count(&project.tenant_id);
        if current >= limit {
            return Err(StoreError::QuotaExceeded {
                resource: "projects",
                limit,
                current,
            });
        }
        if inner.project_name_taken(&project.tenant_id, &project.name, None) {
            return Err(StoreError::Conflict(format!(
                "project name '{}' is already in use within the tenant",
                project.name
            )));
        }
        inner.projects.insert(project.id.clone(), project.clone());
        inner.audit.push(audit.clone());
        Ok(project.clone())
    }

    fn update_project(
        &self,
        id: &ProjectId,
        tenant_id: &TenantId,
        update: &ProjectUpdate,
        audit: &AuditRecord,
    ) -> Result<Project, StoreError> {
        let mut inner = self.lock()?;
        if let Some(name) = &update.name {
            if inner.project_name_taken(tenant_id, name, Some(id)) {
                return Err(StoreError::Conflict(format!(
                    "project name '{name}' is already in use within the tenant"
                )));
            }
        }
        let project = inner.scoped_project(id, tenant_id)?;
        if let Some(name) = &update.name {
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
        let updated = project.clone();
        inner.audit.push(audit.clone());
        Ok(updated)
    }

    fn delete_project(
        &self,
        id: &ProjectId,
        tenant_id: &TenantId,
        audit: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.scoped_project(id, tenant_id)?;
        let task_count = inner
            .tasks
            .values()
            .filter(|task| &task.project_id == id)
            .count();
        if task_count > 0 {
            return Err(StoreError::Conflict(format!(
                "project still owns {task_count} tasks"
            )));
        }
        inner.projects.remove(id);
        inner.audit.push(audit.clone());
        Ok(())
    }

    fn create_task(&self, task: &Task, audit: &AuditRecord) -> Result<Task, StoreError> {
        let mut inner = self.lock()?;
        let project = inner
            .projects
            .get(&task.project_id)
            .ok_or(StoreError::NotFound(EntityKind::Project))?;
        if project.tenant_id != task.tenant_id {
            return Err(StoreError::TenantMismatch);
        }
        if let Some(assignee) = &task.assigned_to {
            inner.check_assignee(&task.tenant_id, assignee)?;
        }
        inner.tasks.insert(task.id.clone(), task.clone());
        inner.audit.push(audit.clone());
        Ok(task.clone())
    }

    fn update_task(
        &self,
        id: &TaskId,
        tenant_id: &TenantId,
        update: &TaskUpdate,
        audit: &AuditRecord,
    ) -> Result<Task, StoreError> {
        let mut inner = self.lock()?;
        if let Some(Some(assignee)) = &update.assigned_to {
            inner.check_assignee(tenant_id, assignee)?;
        }
        let task = inner.scoped_task(id, tenant_id)?;
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
        let updated = task.clone();
        inner.audit.push(audit.clone());
        Ok(updated)
    }

    fn update_task_status(
        &self,
        id: &TaskId,
        tenant_id: &TenantId,
        status: TaskStatus,
        audit: &AuditRecord,
    ) -> Result<Task, StoreError> {
        let mut inner = self.lock()?;
        let task = inner.scoped_task(id, tenant_id)?;
        task.status = status;
        task.updated_at = audit.recorded_at;
        let updated = task.clone();
        inner.audit.push(audit.clone());
        Ok(updated)
    }

    fn delete_task(
        &self,
        id: &TaskId,
        tenant_id: &TenantId,
        audit: &AuditRecord,
    ) -> Result<(), StoreError> {
        let mut inner = self.lock()?;
        inner.scoped_task(id, tenant_id)?;
        inner.tasks.remove(id);
        inner.audit.push(audit.clone());
        Ok(())
    }

    fn record_audit(&self, audit: &AuditRecord) -> Result<(), StoreError> {
        self.lock()?.audit.push(audit.clone());
        Ok(())
    }
}
