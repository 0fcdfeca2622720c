/// Projects, membership and invitations
///
/// Invitation tokens leave this module exactly once, in the
/// [`IssuedInvitation`] returned to the issuer. Logs carry the invitation id,
/// never the token.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::authorization::require_membership;
use crate::auth::invitation_token::{generate_invitation_token, hash_invitation_token, is_well_formed};
use crate::error::{CoreError, CoreResult};
use crate::models::invitation::{Invitation, NewInvitation, Redemption};
use crate::models::project::{CreateProject, Project};
use crate::store::Store;

/// Default invitation lifetime (24 hours)
pub const DEFAULT_INVITATION_TTL_SECONDS: i64 = 86_400;

/// A stored invitation plus the plaintext token for its issuer
#[derive(Debug, Clone)]
pub struct IssuedInvitation {
    pub invitation: Invitation,
    pub token: String,
}

impl IssuedInvitation {
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.invitation.expires_at
    }
}

#[derive(Clone)]
pub struct MembershipManager {
    store: Arc<dyn Store>,
}

impl MembershipManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a project owned by `owner_id`
    ///
    /// The owner's membership is written in the same transaction.
    pub async fn create_project(&self, name: &str, owner_id: Uuid) -> CoreResult<Project> {
        let project = self
            .store
            .insert_project(CreateProject {
                name: name.to_string(),
                owner_id,
            })
            .await?;

        info!(project_id = %project.id, owner_id = %owner_id, "Project created");
        Ok(project)
    }

    pub async fn list_projects_for_user(&self, user_id: Uuid) -> CoreResult<Vec<Project>> {
        Ok(self.store.list_projects_for_user(user_id).await?)
    }

    pub async fn is_member(&self, project_id: Uuid, user_id: Uuid) -> CoreResult<bool> {
        Ok(self.store.is_member(project_id, user_id).await?)
    }

    /// Fails with `NotFound` or `Forbidden` unless the user is a member
    pub async fn require_member(&self, project_id: Uuid, user_id: Uuid) -> CoreResult<()> {
        require_membership(self.store.as_ref(), project_id, user_id).await
    }

    /// Issues a single-use invitation valid for `ttl`
    ///
    /// The caller is expected to have checked membership.
    pub async fn create_invitation(
        &self,
        project_id: Uuid,
        issuer_id: Uuid,
        ttl: Duration,
    ) -> CoreResult<IssuedInvitation> {
        let (token, token_hash) = generate_invitation_token();
        let invitation = self
            .store
            .insert_invitation(NewInvitation {
                project_id,
                token_hash,
                expires_at: Utc::now() + ttl,
                created_by: issuer_id,
            })
            .await?;

        info!(
            invitation_id = %invitation.id,
            project_id = %project_id,
            issuer_id = %issuer_id,
            expires_at = %invitation.expires_at,
            "Invitation created"
        );

        Ok(IssuedInvitation { invitation, token })
    }

    /// Redeems a token and returns the joined project's id
    ///
    /// # Errors
    ///
    /// - `CoreError::InvalidToken` for unknown or already used tokens
    /// - `CoreError::Expired` when the deadline has passed, used or not
    pub async fn redeem_invitation(&self, token: &str, user_id: Uuid) -> CoreResult<Uuid> {
        if !is_well_formed(token) {
            return Err(CoreError::InvalidToken);
        }

        let outcome = self
            .store
            .redeem_invitation(&hash_invitation_token(token), user_id, Utc::now())
            .await?;

        match outcome {
            Redemption::Joined { project_id } => {
                info!(project_id = %project_id, user_id = %user_id, "Invitation redeemed");
                Ok(project_id)
            }
            Redemption::Expired => {
                warn!(user_id = %user_id, "Expired invitation presented");
                Err(CoreError::Expired)
            }
            Redemption::Unknown | Redemption::AlreadyUsed => Err(CoreError::InvalidToken),
        }
    }
}
