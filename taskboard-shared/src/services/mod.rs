/// Domain services
///
/// Each service wraps an `Arc<dyn Store>` and is cheap to clone.
///
/// - [`identity`]: registration, login, bearer-token resolution
/// - [`membership`]: projects, membership checks, invitations
/// - [`workflow`]: tasks and status moves
/// - [`reporting`]: per-status task counts

pub mod identity;
pub mod membership;
pub mod reporting;
pub mod workflow;

pub use identity::{IdentityService, IdentitySettings, IssuedToken};
pub use membership::{IssuedInvitation, MembershipManager};
pub use reporting::{ProjectReport, Reporting};
pub use workflow::TaskWorkflow;
