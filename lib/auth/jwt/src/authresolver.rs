//  AUTHRESOLVER.rs
//
//  Created:
//    23 Oct 2024, 10:37:53
//  Last edited:
//    17 Oct 2026, 15:12:48
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides the actual [`AuthResolver`] implementation.
//

use std::convert::Infallible;
use std::future::Future;

use chrono::Utc;
use http::HeaderMap;
use jsonwebtoken::{Algorithm, DecodingKey, TokenData, Validation};
use specifications::authresolver::{extract_credential, HeaderError};
use specifications::errors::{ClassifiedError, ErrorKind};
use specifications::models::Subject;
use specifications::AuthResolver;
use thiserror::Error;
use tracing::{debug, span, Instrument as _, Level};

use crate::claims::Claims;
use crate::config::{ConfigError, TokenConfig};


/***** CONSTANTS *****/
/// The scheme that must precede the token in the `Authorization`-header.
pub const BEARER_SCHEME: &str = "Bearer";

/// The claims that every token must carry.
const REQUIRED_CLAIMS: [&str; 4] = ["exp", "iss", "aud", "sub"];





/***** ERRORS *****/
/// Represents client-side errors which the server can't fix.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The 'Authorization'-header was absent or unusable.
    #[error("Failed to extract bearer token")]
    Header {
        #[source]
        err: HeaderError,
    },
    /// The token failed to verify (signature, algorithm, issuer, audience, expiry or claim shape).
    #[error("Failed to validate JWT")]
    JwtValidate {
        #[source]
        err: jsonwebtoken::errors::Error,
    },
    /// The token expired at or before the current time.
    #[error("JWT expired at {exp}")]
    Expired { exp: i64 },
    /// The subject claim was not a numeric user ID.
    #[error("JWT subject {raw:?} is not a user ID")]
    IllegalSubject { raw: String },
}
impl ClassifiedError for ClientError {
    #[inline]
    fn kind(&self) -> ErrorKind { ErrorKind::Unauthorized }
}





/***** LIBRARY *****/
/// Authenticates HTTP requests by verifying the bearer JWT in their headers.
///
/// This is pure verification over the token's own claims and the configured secret; it never
/// touches the network or a store.
pub struct JwtResolver {
    /// The key with which to verify signatures.
    key: DecodingKey,
    /// What the claims must look like.
    validation: Validation,
}
impl JwtResolver {
    /// Constructor for the JwtResolver.
    ///
    /// # Arguments
    /// - `config`: The [`TokenConfig`] carrying the shared secret and expected issuer/audience.
    ///
    /// # Returns
    /// A new instance of Self, ready to rumble.
    ///
    /// # Errors
    /// This function errors if the given `config` is invalid.
    pub fn new(config: &TokenConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_nbf = true;
        validation.set_issuer(&[&config.issuer]);
        validation.set_audience(&[&config.audience]);
        validation.set_required_spec_claims(&REQUIRED_CLAIMS);

        Ok(Self { key: DecodingKey::from_secret(config.secret.as_bytes()), validation })
    }

    /// Verifies a raw token and extracts the subject from it.
    ///
    /// # Arguments
    /// - `raw`: The token, without the scheme.
    ///
    /// # Returns
    /// The [`Subject`] the token was issued to.
    ///
    /// # Errors
    /// This function errors if the token does not verify, has expired or does not carry a numeric
    /// subject.
    pub fn validate(&self, raw: &str) -> Result<Subject, ClientError> {
        debug!("Validating JWT with {:?}...", self.validation.algorithms);
        let data: TokenData<Claims> = jsonwebtoken::decode(raw, &self.key, &self.validation).map_err(|err| ClientError::JwtValidate { err })?;

        // The library accepts `exp == now`; we want it strictly in the future
        let now: i64 = Utc::now().timestamp();
        if data.claims.exp <= now {
            return Err(ClientError::Expired { exp: data.claims.exp });
        }

        match data.claims.sub.user_id() {
            Some(id) => {
                debug!("Validating OK (subject {id})");
                Ok(Subject { id })
            },
            None => Err(ClientError::IllegalSubject { raw: data.claims.sub.to_string() }),
        }
    }
}
impl AuthResolver for JwtResolver {
    type Context = Subject;
    type ClientError = ClientError;
    type ServerError = Infallible;


    fn authorize(&self, headers: &HeaderMap) -> impl Send + Future<Output = Result<Result<Self::Context, Self::ClientError>, Self::ServerError>> {
        let res: Result<Subject, ClientError> = match extract_credential(headers, BEARER_SCHEME) {
            Ok(raw) => self.validate(raw),
            Err(err) => Err(ClientError::Header { err }),
        };
        async move { Ok(res) }.instrument(span!(Level::DEBUG, "JwtResolver::authorize"))
    }
}





/***** TESTS *****/
