//  LIB.rs
//
//  Created:
//    24 Oct 2024, 13:50:43
//  Last edited:
//    17 Oct 2026, 15:40:19
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements an [`AuthResolver`] that admits a single operator account
//!   through HTTP Basic authentication.
//

use std::convert::Infallible;
use std::future::Future;

use base64ct::{Base64, Encoding as _};
use http::HeaderMap;
use specifications::authresolver::{extract_credential, HeaderError};
use specifications::errors::{ClassifiedError, ErrorKind};
use specifications::AuthResolver;
use subtle::ConstantTimeEq as _;
use thiserror::Error;
use tracing::{debug, span, Instrument as _, Level};


/***** CONSTANTS *****/
/// The scheme that must precede the credentials in the `Authorization`-header.
pub const BASIC_SCHEME: &str = "Basic";

/// The challenge to send along with rejections.
pub const BASIC_CHALLENGE: &str = "Basic realm=\"restricted\", charset=\"UTF-8\"";

/// The default operator username.
pub const DEFAULT_USERNAME: &str = "admin";





/***** ERRORS *****/
/// Represents client-side errors which the server can't fix.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The 'Authorization'-header was absent or unusable.
    #[error("Failed to extract basic credentials")]
    Header {
        #[source]
        err: HeaderError,
    },
    /// The credentials were not valid base64.
    #[error("Basic credentials are not valid base64")]
    Base64 {
        #[source]
        err: base64ct::Error,
    },
    /// The decoded credentials were not valid UTF-8.
    #[error("Basic credentials are not valid UTF-8")]
    NonUtf8 {
        #[source]
        err: std::string::FromUtf8Error,
    },
    /// The decoded credentials had no colon separating the username from the password.
    #[error("Basic credentials are not of the form '<username>:<password>'")]
    MissingSeparator,
    /// The credentials did not match.
    #[error("Invalid basic credentials")]
    InvalidCredentials,
}
impl ClassifiedError for ClientError {
    #[inline]
    fn kind(&self) -> ErrorKind { ErrorKind::Unauthorized }
}





/***** LIBRARY *****/
/// The single account admitted by the [`BasicResolver`].
#[derive(Clone)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
}
impl Default for BasicAuthConfig {
    #[inline]
    fn default() -> Self { Self { username: DEFAULT_USERNAME.into(), password: String::new() } }
}
impl std::fmt::Debug for BasicAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthConfig").field("username", &self.username).field("password", &"<redacted>").finish()
    }
}



/// Defines an [`AuthResolver`] that checks Basic credentials against a single configured account.
#[derive(Clone, Debug)]
pub struct BasicResolver {
    config: BasicAuthConfig,
}
impl BasicResolver {
    /// Constructor for the BasicResolver.
    ///
    /// # Arguments
    /// - `config`: The [`BasicAuthConfig`] describing the account to admit.
    ///
    /// # Returns
    /// A new BasicResolver.
    #[inline]
    pub const fn new(config: BasicAuthConfig) -> Self { Self { config } }

    /// Checks the credential part of a Basic `Authorization`-header.
    ///
    /// # Arguments
    /// - `raw`: The base64-encoded `<username>:<password>` pair.
    ///
    /// # Returns
    /// The name of the admitted account.
    ///
    /// # Errors
    /// This function errors if the credential is malformed or does not match the configured account.
    pub fn validate(&self, raw: &str) -> Result<String, ClientError> {
        let decoded: Vec<u8> = Base64::decode_vec(raw).map_err(|err| ClientError::Base64 { err })?;
        let decoded: String = String::from_utf8(decoded).map_err(|err| ClientError::NonUtf8 { err })?;
        let (username, password): (&str, &str) = decoded.split_once(':').ok_or(ClientError::MissingSeparator)?;

        // Compare both, always, so timing does not reveal which one was wrong
        let user_ok = username.as_bytes().ct_eq(self.config.username.as_bytes());
        let pass_ok = password.as_bytes().ct_eq(self.config.password.as_bytes());
        if bool::from(user_ok & pass_ok) {
            debug!("Basic credentials OK for {username:?}");
            Ok(username.into())
        } else {
            Err(ClientError::InvalidCredentials)
        }
    }
}
impl AuthResolver for BasicResolver {
    type Context = String;
    type ClientError = ClientError;
    type ServerError = Infallible;


    fn authorize(&self, headers: &HeaderMap) -> impl Send + Future<Output = Result<Result<Self::Context, Self::ClientError>, Self::ServerError>> {
        let res: Result<String, ClientError> = match extract_credential(headers, BASIC_SCHEME) {
            Ok(raw) => self.validate(raw),
            Err(err) => Err(ClientError::Header { err }),
        };
        async move { Ok(res) }.instrument(span!(Level::DEBUG, "BasicResolver::authorize"))
    }
}





/***** TESTS *****/
