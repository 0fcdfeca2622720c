/// Authentication and authorization utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: session token generation and validation
/// - [`invitation_token`]: single-use join tokens, hashed at rest
/// - [`authorization`]: project membership checks
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::auth::password::{hash_password, verify_password};
/// use taskboard_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), "alice");
/// let token = create_token(&claims, "secret-key")?;
/// let _ = validate_token(&token, "secret-key")?;
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod invitation_token;
pub mod jwt;
pub mod password;
