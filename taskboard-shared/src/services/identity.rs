/// Registration, credential checks and session tokens
///
/// Argon2id work runs on the blocking pool so request workers are not
/// stalled while a hash is computed.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::auth::jwt::{self, Claims, JwtError};
use crate::auth::password::{self, HashingParams};
use crate::error::{CoreError, CoreResult};
use crate::models::user::{CreateUser, User};
use crate::store::{Store, StoreError};

/// Settings for credential handling
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    /// HS256 signing secret
    pub jwt_secret: String,

    /// Session lifetime
    pub token_ttl: Duration,

    /// Cost of newly created password hashes
    pub hashing: HashingParams,
}

/// A signed session token and its deadline
#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct IdentityService {
    store: Arc<dyn Store>,
    settings: Arc<IdentitySettings>,
}

impl IdentityService {
    pub fn new(store: Arc<dyn Store>, settings: IdentitySettings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }

    /// Creates an account
    ///
    /// # Errors
    ///
    /// `CoreError::Conflict` when the username is taken
    pub async fn register(&self, username: &str, password: &str) -> CoreResult<User> {
        if self.store.find_user_by_username(username).await?.is_some() {
            return Err(CoreError::Conflict("username already registered".to_string()));
        }

        let password = password.to_string();
        let params = self.settings.hashing;
        let password_hash =
            tokio::task::spawn_blocking(move || password::hash_password_with(&password, &params))
                .await
                .map_err(|e| CoreError::Credential(e.to_string()))??;

        let user = self
            .store
            .insert_user(CreateUser {
                username: username.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent registration
                StoreError::Conflict(_) => {
                    CoreError::Conflict("username already registered".to_string())
                }
                other => CoreError::Store(other),
            })?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Checks a username/password pair
    ///
    /// Unknown usernames and wrong passwords are indistinguishable.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> CoreResult<User> {
        let user = self
            .store
            .find_user_by_username(username)
            .await?
            .ok_or_else(invalid_credentials)?;

        let password = password.to_string();
        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || password::verify_password(&password, &hash))
            .await
            .map_err(|e| CoreError::Credential(e.to_string()))??;

        if !matches {
            debug!(username = %username, "Password mismatch");
            return Err(invalid_credentials());
        }

        Ok(user)
    }

    /// Signs a session token for `user`
    pub fn issue_token(&self, user: &User) -> CoreResult<IssuedToken> {
        let claims = Claims::with_expiration(user.id, user.username.clone(), self.settings.token_ttl);
        let token = jwt::create_token(&claims, &self.settings.jwt_secret)
            .map_err(|e| CoreError::Credential(e.to_string()))?;

        Ok(IssuedToken {
            token,
            expires_at: claims.expires_at(),
        })
    }

    /// Verifies credentials and issues a token
    pub async fn login(&self, username: &str, password: &str) -> CoreResult<IssuedToken> {
        let user = self.verify_credentials(username, password).await?;
        let issued = self.issue_token(&user)?;
        info!(user_id = %user.id, "User logged in");
        Ok(issued)
    }

    /// Resolves a bearer token to its user
    ///
    /// # Errors
    ///
    /// `CoreError::Unauthorized` for bad signatures, expired tokens, and
    /// tokens whose user no longer exists
    pub async fn current_user(&self, token: &str) -> CoreResult<User> {
        let claims = jwt::validate_token(token, &self.settings.jwt_secret).map_err(|e| match e {
            JwtError::Expired => CoreError::Unauthorized("token expired".to_string()),
            JwtError::InvalidIssuer => CoreError::Unauthorized("invalid issuer".to_string()),
            _ => CoreError::Unauthorized("invalid token".to_string()),
        })?;

        self.store
            .find_user(claims.sub)
            .await?
            .ok_or_else(|| CoreError::Unauthorized("user no longer exists".to_string()))
    }
}

fn invalid_credentials() -> CoreError {
    CoreError::Unauthorized("invalid credentials".to_string())
}
