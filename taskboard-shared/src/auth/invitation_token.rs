/// Invitation token generation and hashing
///
/// An invitation token is 32 bytes from the OS CSPRNG, hex-encoded into a
/// 64-character string. Only the SHA-256 digest of the token is persisted;
/// the plaintext is returned once to the issuer and never logged.
///
/// # Example
///
/// ```
/// use taskboard_shared::auth::invitation_token::{generate_invitation_token, hash_invitation_token};
///
/// let (token, hash) = generate_invitation_token();
/// assert_eq!(token.len(), 64);
/// assert_eq!(hash, hash_invitation_token(&token));
/// ```

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Number of random bytes behind each token
pub const TOKEN_BYTES: usize = 32;

/// Length of the hex-encoded token
pub const TOKEN_LENGTH: usize = TOKEN_BYTES * 2;

/// Generates a fresh invitation token
///
/// # Returns
///
/// Tuple of (plaintext_token, sha256_hash)
pub fn generate_invitation_token() -> (String, String) {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);

    let token = hex::encode(bytes);
    let hash = hash_invitation_token(&token);

    (token, hash)
}

/// Hashes a presented token for lookup
///
/// Deterministic, so the digest doubles as the lookup key.
pub fn hash_invitation_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Returns true if `token` has the shape of an issued token
///
/// Lets callers reject garbage before touching storage.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.chars().all(|c| c.is_ascii_hexdigit())
}
