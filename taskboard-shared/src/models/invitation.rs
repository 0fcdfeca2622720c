/// Invitation model and database operations
///
/// Invitations are single-use, time-boxed grants to join a project. The table
/// stores the SHA-256 digest of the token, never the token itself.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     expires_at TIMESTAMPTZ NOT NULL,
///     created_by UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     used BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// # Redemption
///
/// [`Invitation::redeem`] locks the row, checks expiry, then flips `used`
/// with a conditional update and inserts the membership in the same
/// transaction. Two concurrent redemptions of one token serialize on the row
/// lock and exactly one of them sees `used = FALSE`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::membership::MemberRole;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: Uuid,

    /// Project the token grants access to
    pub project_id: Uuid,

    /// SHA-256 hex digest of the token
    #[serde(skip_serializing, default)]
    pub token_hash: String,

    /// Redemption deadline
    pub expires_at: DateTime<Utc>,

    /// Member who issued the invitation
    pub created_by: Uuid,

    /// Flips to true exactly once
    pub used: bool,

    pub created_at: DateTime<Utc>,
}

/// Input for storing a freshly generated invitation
#[derive(Debug, Clone)]
pub struct NewInvitation {
    pub project_id: Uuid,
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
    pub created_by: Uuid,
}

/// Result of a redemption attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redemption {
    /// Token consumed; the user is now a member of `project_id`
    Joined { project_id: Uuid },

    /// No invitation carries this token
    Unknown,

    /// Deadline passed (checked before `used`)
    Expired,

    /// Token was consumed earlier
    AlreadyUsed,
}

impl Invitation {
    /// Returns true when the invitation can no longer be redeemed at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub async fn create(pool: &PgPool, data: NewInvitation) -> Result<Self, sqlx::Error> {
        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (project_id, token_hash, expires_at, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, project_id, token_hash, expires_at, created_by, used, created_at
            "#,
        )
        .bind(data.project_id)
        .bind(&data.token_hash)
        .bind(data.expires_at)
        .bind(data.created_by)
        .fetch_one(pool)
        .await?;

        Ok(invitation)
    }

    /// Redeems the invitation whose token hashes to `token_hash`
    ///
    /// `now` is supplied by the caller so expiry is judged against one clock.
    /// A user who is already a member still consumes the token.
    pub async fn redeem(
        pool: &PgPool,
        token_hash: &str,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Redemption, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let invitation = sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, project_id, token_hash, expires_at, created_by, used, created_at
            FROM invitations
            WHERE token_hash = $1
            FOR UPDATE
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&mut *tx)
        .await?;

        let invitation = match invitation {
            Some(invitation) => invitation,
            None => return Ok(Redemption::Unknown),
        };

        if invitation.is_expired_at(now) {
            return Ok(Redemption::Expired);
        }

        if invitation.used {
            return Ok(Redemption::AlreadyUsed);
        }

        let claimed = sqlx::query(
            r#"
            UPDATE invitations
            SET used = TRUE
            WHERE id = $1 AND used = FALSE
            "#,
        )
        .bind(invitation.id)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Ok(Redemption::AlreadyUsed);
        }

        sqlx::query(
            r#"
            INSERT INTO project_members (project_id, user_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, user_id) DO NOTHING
            "#,
        )
        .bind(invitation.project_id)
        .bind(user_id)
        .bind(MemberRole::Member)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Redemption::Joined {
            project_id: invitation.project_id,
        })
    }
}
