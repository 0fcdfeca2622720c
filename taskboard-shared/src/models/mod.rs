/// Database models for the task board
///
/// Each model owns its SQL. The PostgreSQL store delegates to these methods;
/// the in-memory store mirrors their semantics.
///
/// # Models
///
/// - `user`: accounts and credential hashes
/// - `project`: projects (the tenant boundary)
/// - `membership`: user-project links with roles
/// - `invitation`: single-use join tokens (stored hashed)
/// - `task`: tasks and the status workflow
/// - `task_history`: append-only move log
/// - `notification`: durable per-user activity messages

pub mod invitation;
pub mod membership;
pub mod notification;
pub mod project;
pub mod task;
pub mod task_history;
pub mod user;
