/// In-memory store for tests and database-less local runs
///
/// All state sits behind one `RwLock`, so every multi-step operation
/// (project + owner membership, redemption, task move + history) is applied
/// under a single write guard and is atomic with respect to other callers

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    InvitationStore, NotificationStore, ProjectStore, Store, StoreError, StoreHealth, StoreResult,
    TaskStore, UserStore,
};
use crate::models::{
    invitation::{Invitation, NewInvitation, Redemption},
    membership::{MemberRole, ProjectMember},
    notification::Notification,
    project::{CreateProject, Project},
    task::{CreateTask, StatusChange, Task, TaskStatus},
    task_history::TaskHistory,
    user::{CreateUser, User},
};

/// Thread-safe in-memory store
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    usernames: HashMap<String, Uuid>,
    projects: HashMap<Uuid, Project>,
    /// Insertion order doubles as join order
    members: Vec<ProjectMember>,
    /// Keyed by token digest
    invitations: HashMap<String, Invitation>,
    tasks: HashMap<Uuid, Task>,
    task_order: Vec<Uuid>,
    history: Vec<TaskHistory>,
    next_history_id: i64,
    notifications: Vec<Notification>,
}

impl MemoryState {
    fn is_member(&self, project_id: Uuid, user_id: Uuid) -> bool {
        self.members
            .iter()
            .any(|m| m.project_id == project_id && m.user_id == user_id)
    }

    fn add_member(&mut self, project_id: Uuid, user_id: Uuid, role: MemberRole) {
        if self.is_member(project_id, user_id) {
            return;
        }
        self.members.push(ProjectMember {
            project_id,
            user_id,
            role,
            created_at: Utc::now(),
        });
    }
}

impl InMemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, MemoryState>> {
        self.state
            .read()
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, MemoryState>> {
        self.state
            .write()
            .map_err(|err| StoreError::Unavailable(err.to_string()))
    }

    /// Overrides an invitation's deadline
    ///
    /// Lets tests exercise expiry without sleeping
    pub fn set_invitation_expiry(&self, invitation_id: Uuid, expires_at: DateTime<Utc>) -> StoreResult<bool> {
        let mut state = self.write()?;
        match state.invitations.values_mut().find(|i| i.id == invitation_id) {
            Some(invitation) => {
                invitation.expires_at = expires_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.write()?;
        if state.usernames.contains_key(&data.username) {
            return Err(StoreError::Conflict("username".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: data.username,
            password_hash: data.password_hash,
            created_at: Utc::now(),
        };
        state.usernames.insert(user.username.clone(), user.id);
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.read()?;
        Ok(state
            .usernames
            .get(username)
            .and_then(|id| state.users.get(id))
            .cloned())
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn insert_project(&self, data: CreateProject) -> StoreResult<Project> {
        let mut state = self.write()?;
        let project = Project {
            id: Uuid::new_v4(),
            name: data.name,
            owner_id: data.owner_id,
            created_at: Utc::now(),
        };
        state.projects.insert(project.id, project.clone());
        state.add_member(project.id, data.owner_id, MemberRole::Owner);
        Ok(project)
    }

    async fn find_project(&self, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn list_projects_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Project>> {
        let state = self.read()?;
        Ok(state
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| state.projects.get(&m.project_id).cloned())
            .collect())
    }

    async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        Ok(self.read()?.is_member(project_id, user_id))
    }
}

#[async_trait]
impl InvitationStore for InMemoryStore {
    async fn insert_invitation(&self, data: NewInvitation) -> StoreResult<Invitation> {
        let mut state = self.write()?;
        if state.invitations.contains_key(&data.token_hash) {
            return Err(StoreError::Conflict("invitation token".to_string()));
        }

        let invitation = Invitation {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            token_hash: data.token_hash,
            expires_at: data.expires_at,
            created_by: data.created_by,
            used: false,
            created_at: Utc::now(),
        };
        state
            .invitations
            .insert(invitation.token_hash.clone(), invitation.clone());
        Ok(invitation)
    }

    async fn redeem_invitation(
        &self,
        token_hash: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Redemption> {
        let mut state = self.write()?;

        let project_id = match state.invitations.get_mut(token_hash) {
            None => return Ok(Redemption::Unknown),
            Some(invitation) if invitation.is_expired_at(now) => return Ok(Redemption::Expired),
            Some(invitation) if invitation.used => return Ok(Redemption::AlreadyUsed),
            Some(invitation) => {
                invitation.used = true;
                invitation.project_id
            }
        };

        state.add_member(project_id, user_id, MemberRole::Member);
        Ok(Redemption::Joined { project_id })
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn insert_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.write()?;
        if let Some(assignee_id) = data.assignee_id {
            if !state.users.contains_key(&assignee_id) {
                return Err(StoreError::InvalidReference("assignee".to_string()));
            }
        }

        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            project_id: data.project_id,
            title: data.title,
            description: data.description,
            status: TaskStatus::Todo,
            assignee_id: data.assignee_id,
            created_at: now,
            updated_at: now,
        };
        state.task_order.push(task.id);
        state.tasks.insert(task.id, task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(self.read()?.tasks.get(&id).cloned())
    }

    async fn list_tasks(&self, project_id: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.read()?;
        Ok(state
            .task_order
            .iter()
            .filter_map(|id| state.tasks.get(id))
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn transition_task(
        &self,
        id: Uuid,
        to: TaskStatus,
        changed_by: Uuid,
    ) -> StoreResult<Option<StatusChange>> {
        let mut state = self.write()?;
        let now = Utc::now();

        let (project_id, from) = match state.tasks.get_mut(&id) {
            Some(task) => {
                let from = task.status;
                task.status = to;
                task.updated_at = now;
                (task.project_id, from)
            }
            None => return Ok(None),
        };

        state.next_history_id += 1;
        let history_id = state.next_history_id;
        state.history.push(TaskHistory {
            id: history_id,
            task_id: id,
            from_status: from,
            to_status: to,
            changed_by,
            changed_at: now,
        });

        Ok(Some(StatusChange {
            task_id: id,
            project_id,
            from,
            to,
        }))
    }

    async fn task_history(&self, task_id: Uuid) -> StoreResult<Vec<TaskHistory>> {
        Ok(self
            .read()?
            .history
            .iter()
            .filter(|h| h.task_id == task_id)
            .cloned()
            .collect())
    }

    async fn count_tasks_by_status(&self, project_id: Uuid) -> StoreResult<Vec<(TaskStatus, i64)>> {
        let state = self.read()?;
        let mut counts: HashMap<TaskStatus, i64> = HashMap::new();
        for task in state.tasks.values().filter(|t| t.project_id == project_id) {
            *counts.entry(task.status).or_insert(0) += 1;
        }
        Ok(counts.into_iter().collect())
    }
}

#[async_trait]
impl NotificationStore for InMemoryStore {
    async fn insert_notification(&self, user_id: Uuid, message: &str) -> StoreResult<Notification> {
        let mut state = self.write()?;
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            message: message.to_string(),
            read: false,
            created_at: Utc::now(),
        };
        state.notifications.push(notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, user_id: Uuid) -> StoreResult<Vec<Notification>> {
        Ok(self
            .read()?
            .notifications
            .iter()
            .rev()
            .filter(|n| n.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_notification_read(&self, id: Uuid, user_id: Uuid) -> StoreResult<bool> {
        let mut state = self.write()?;
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == id && n.user_id == user_id)
        {
            Some(notification) => {
                notification.read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn health(&self) -> StoreHealth {
        StoreHealth {
            backend: "memory",
            healthy: self.state.read().is_ok(),
            pool: None,
        }
    }

    async fn close(&self) {}
}
