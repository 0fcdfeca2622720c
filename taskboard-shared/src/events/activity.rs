/// Activity events published to live subscribers
///
/// Serialized with an internal `type` tag, e.g.
///
/// ```json
/// {"type":"task_moved","project_id":"…","task_id":"…","from":"todo","to":"doing","by":"…"}
/// ```
///
/// Invitation tokens never appear in an event.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::task::TaskStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActivityEvent {
    InvitationCreated {
        project_id: Uuid,
        invitation_id: Uuid,
        by: Uuid,
    },
    UserJoined {
        project_id: Uuid,
        user_id: Uuid,
    },
    TaskCreated {
        project_id: Uuid,
        task_id: Uuid,
        title: String,
        by: Uuid,
    },
    TaskMoved {
        project_id: Uuid,
        task_id: Uuid,
        from: TaskStatus,
        to: TaskStatus,
        by: Uuid,
    },
}

impl ActivityEvent {
    /// Wire name, used as the SSE event name
    pub fn event_type(&self) -> &'static str {
        match self {
            ActivityEvent::InvitationCreated { .. } => "invitation_created",
            ActivityEvent::UserJoined { .. } => "user_joined",
            ActivityEvent::TaskCreated { .. } => "task_created",
            ActivityEvent::TaskMoved { .. } => "task_moved",
        }
    }

    pub fn project_id(&self) -> Uuid {
        match self {
            ActivityEvent::InvitationCreated { project_id, .. }
            | ActivityEvent::UserJoined { project_id, .. }
            | ActivityEvent::TaskCreated { project_id, .. }
            | ActivityEvent::TaskMoved { project_id, .. } => *project_id,
        }
    }

    /// User who performed the action
    pub fn actor(&self) -> Uuid {
        match self {
            ActivityEvent::InvitationCreated { by, .. }
            | ActivityEvent::TaskCreated { by, .. }
            | ActivityEvent::TaskMoved { by, .. } => *by,
            ActivityEvent::UserJoined { user_id, .. } => *user_id,
        }
    }

    /// Human-readable text stored as the actor's notification
    pub fn notification_message(&self) -> String {
        match self {
            ActivityEvent::InvitationCreated { project_id, .. } => {
                format!("Invitation created for project {}", project_id)
            }
            ActivityEvent::UserJoined { project_id, .. } => format!("Joined project {}", project_id),
            ActivityEvent::TaskCreated { project_id, title, .. } => {
                format!("Task \"{}\" created in project {}", title, project_id)
            }
            ActivityEvent::TaskMoved { task_id, to, .. } => format!("Task {} moved to {}", task_id, to),
        }
    }
}
