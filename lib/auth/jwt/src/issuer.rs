//  ISSUER.rs
//
//  Created:
//    17 Oct 2026, 14:10:31
//  Last edited:
//    18 Oct 2026, 11:05:13
//  Auto updated?
//    Yes
//
//  Description:
//!   Signs tokens that the [`JwtResolver`](crate::JwtResolver) will accept.
//

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use specifications::errors::{ClassifiedError, ErrorKind};
use thiserror::Error;
use tracing::debug;

use crate::claims::{Claims, SubjectClaim};
use crate::config::{ConfigError, TokenConfig};


/***** ERRORS *****/
/// Defines errors originating from signing tokens.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("Failed to sign JWT for user {user_id}")]
    Sign {
        user_id: String,
        #[source]
        err:     jsonwebtoken::errors::Error,
    },
}
impl ClassifiedError for IssueError {
    #[inline]
    fn kind(&self) -> ErrorKind { ErrorKind::Internal }
}





/***** LIBRARY *****/
/// Issues HS256-signed tokens for users.
pub struct JwtIssuer {
    key:      EncodingKey,
    issuer:   String,
    audience: String,
    expiry:   i64,
}
impl JwtIssuer {
    /// Constructor for the JwtIssuer.
    ///
    /// # Arguments
    /// - `config`: The [`TokenConfig`] to sign with.
    ///
    /// # Errors
    /// This function errors if the given `config` is invalid.
    pub fn new(config: &TokenConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let expiry: i64 = i64::try_from(config.expiry.as_secs()).map_err(|_| ConfigError::ExpiryOutOfRange { expiry: config.expiry })?;
        Ok(Self {
            key: EncodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            audience: config.audience.clone(),
            expiry,
        })
    }

    /// Builds the claims for a fresh token for the given user.
    pub fn claims_for(&self, user_id: i64) -> Claims {
        let now: i64 = Utc::now().timestamp();
        Claims {
            sub: SubjectClaim::Number(user_id),
            iss: self.issuer.clone(),
            aud: self.audience.clone().into(),
            exp: now.saturating_add(self.expiry),
            iat: now,
            nbf: now,
        }
    }

    /// Issues a token for the given user.
    ///
    /// # Errors
    /// This function errors if signing failed.
    #[inline]
    pub fn issue(&self, user_id: i64) -> Result<String, IssueError> { self.sign(&self.claims_for(user_id)) }

    /// Signs arbitrary claims.
    ///
    /// # Errors
    /// This function errors if signing failed.
    pub fn sign(&self, claims: &Claims) -> Result<String, IssueError> {
        debug!("Signing JWT for user {} (expires {})", claims.sub, claims.exp);
        jsonwebtoken::encode(&Header::new(Algorithm::HS256), claims, &self.key).map_err(|err| IssueError::Sign { user_id: claims.sub.to_string(), err })
    }
}





/***** TESTS *****/
