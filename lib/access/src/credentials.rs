//  CREDENTIALS.rs
//
//  Created:
//    18 Oct 2026, 13:02:11
//  Last edited:
//    18 Oct 2026, 13:48:30
//  Auto updated?
//    Yes
//
//  Description:
//!   Hashes and verifies the secrets that users register and activate
//!   with: passwords (Argon2id) and invitation tokens (SHA-256).
//

use std::time::Duration;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString};
use argon2::Argon2;
use sha2::{Digest as _, Sha256};
use specifications::errors::{ClassifiedError, ErrorKind};
use thiserror::Error;
use tokio::task::spawn_blocking;
use tracing::debug;
use uuid::Uuid;


/***** CONSTANTS *****/
/// How long an invitation may be used to activate an account.
pub const INVITATION_TTL: Duration = Duration::from_secs(3 * 24 * 60 * 60);





/***** ERRORS *****/
/// Defines errors originating from hashing or verifying secrets.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Argon2 refused to hash the password.
    #[error("Failed to hash password")]
    Hash {
        #[source]
        err: argon2::password_hash::Error,
    },
    /// What the store gave us is not a PHC string.
    #[error("Stored password hash is malformed")]
    MalformedHash {
        #[source]
        err: argon2::password_hash::Error,
    },
    /// Verification failed for another reason than a wrong password.
    #[error("Failed to verify password")]
    Verify {
        #[source]
        err: argon2::password_hash::Error,
    },
    /// The blocking worker doing the hashing panicked or was cancelled.
    #[error("Password worker failed: {msg}")]
    Worker { msg: String },
}
impl ClassifiedError for CredentialError {
    #[inline]
    fn kind(&self) -> ErrorKind { ErrorKind::Internal }
}





/***** LIBRARY *****/
/// A freshly generated invitation token, together with the hash under which it is stored.
#[derive(Clone, Debug)]
pub struct InvitationToken {
    /// Handed out to the user. Never stored.
    pub token: String,
    /// What the store keeps.
    pub hash:  String,
}
impl InvitationToken {
    /// Generates a new random token.
    #[inline]
    pub fn generate() -> Self {
        let token: String = Uuid::new_v4().to_string();
        let hash: String = hash_token(&token);
        Self { token, hash }
    }
}

/// Hashes an invitation token the way it is stored.
///
/// # Returns
/// The lowercase hexadecimal SHA-256 digest of `token`.
#[inline]
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }



/// Hashes a password for storage, on a blocking worker.
///
/// # Returns
/// The PHC string of an Argon2id hash with a random salt.
///
/// # Errors
/// This function errors if hashing failed or the worker died.
pub async fn hash_password(password: String) -> Result<String, CredentialError> {
    spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default().hash_password(password.as_bytes(), &salt).map(|hash| hash.to_string()).map_err(|err| CredentialError::Hash { err })
    })
    .await
    .map_err(|err| CredentialError::Worker { msg: err.to_string() })?
}

/// Checks a password against a stored hash, on a blocking worker.
///
/// # Returns
/// Whether the password matches.
///
/// # Errors
/// This function errors if the hash is malformed, verification failed for another reason than a
/// mismatch, or the worker died.
pub async fn verify_password(password: String, hash: String) -> Result<bool, CredentialError> {
    spawn_blocking(move || {
        let parsed: PasswordHash = PasswordHash::new(&hash).map_err(|err| CredentialError::MalformedHash { err })?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password mismatch");
                Ok(false)
            },
            Err(err) => Err(CredentialError::Verify { err }),
        }
    })
    .await
    .map_err(|err| CredentialError::Worker { msg: err.to_string() })?
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passwords_verify_against_their_own_hash_only() {
        let hash = hash_password("correct horse".into()).await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("battery staple".into(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error_not_a_mismatch() {
        let err = verify_password("whatever".into(), "plaintext".into()).await.unwrap_err();
        assert!(matches!(err, CredentialError::MalformedHash { .. }));
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn invitation_tokens_are_stored_hashed() {
        let a = InvitationToken::generate();
        let b = InvitationToken::generate();
        assert_ne!(a.token, b.token);
        assert_eq!(a.hash, hash_token(&a.token));
        assert_eq!(a.hash.len(), 64);
        assert_ne!(a.hash, a.token);
    }
}
