/// API route handlers
///
/// - `health`: health check
/// - `auth`: register and login
/// - `projects`: projects, invitations, joining, reports
/// - `tasks`: task creation, listing, moves, history
/// - `notifications`: stored notifications and the live stream

pub mod auth;
pub mod health;
pub mod notifications;
pub mod projects;
pub mod tasks;
