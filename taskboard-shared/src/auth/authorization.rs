/// Project membership checks
///
/// Access control is flat: any member of a project may act on it. The only
/// distinction callers need is "project doesn't exist" (404) versus "exists
/// but you're not in it" (403).
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::authorization::require_membership;
/// use taskboard_shared::store::InMemoryStore;
/// use uuid::Uuid;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = InMemoryStore::new();
/// require_membership(&store, Uuid::new_v4(), Uuid::new_v4()).await?;
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::store::ProjectStore;

/// Ensures `user_id` is a member of `project_id`
///
/// # Errors
///
/// - `CoreError::NotFound` if the project doesn't exist
/// - `CoreError::Forbidden` if the user isn't a member
pub async fn require_membership<S>(store: &S, project_id: Uuid, user_id: Uuid) -> CoreResult<()>
where
    S: ProjectStore + ?Sized,
{
    if store.is_member(project_id, user_id).await? {
        return Ok(());
    }

    match store.find_project(project_id).await? {
        Some(_) => Err(CoreError::Forbidden(format!(
            "not a member of project {}",
            project_id
        ))),
        None => Err(CoreError::not_found("project")),
    }
}
