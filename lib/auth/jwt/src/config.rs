//  CONFIG.rs
//
//  Created:
//    17 Oct 2026, 13:20:42
//  Last edited:
//    17 Oct 2026, 13:36:08
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the configuration shared by the token resolver and issuer.
//

use std::time::Duration;

use thiserror::Error;


/***** CONSTANTS *****/
/// The default lifetime of issued tokens (3 days).
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(3 * 24 * 60 * 60);

/// The default value of the `iss`- and `aud`-claims.
pub const DEFAULT_ISSUER: &str = "social-go";





/***** ERRORS *****/
/// Defines the ways in which a [`TokenConfig`] may be unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The shared secret was empty.
    #[error("Token secret cannot be empty")]
    EmptySecret,
    /// The issuer was empty.
    #[error("Token issuer cannot be empty")]
    EmptyIssuer,
    /// The audience was empty.
    #[error("Token audience cannot be empty")]
    EmptyAudience,
    /// The expiry does not fit in a JWT timestamp.
    #[error("Token expiry of {}s is out of range", expiry.as_secs())]
    ExpiryOutOfRange { expiry: Duration },
}





/***** LIBRARY *****/
/// Configures how tokens are signed and what claims they must carry.
#[derive(Clone)]
pub struct TokenConfig {
    /// The shared secret with which tokens are signed (HS256).
    pub secret:   String,
    /// The expected value of the `iss`-claim.
    pub issuer:   String,
    /// The expected value of the `aud`-claim.
    pub audience: String,
    /// How long issued tokens remain valid.
    pub expiry:   Duration,
}
impl Default for TokenConfig {
    #[inline]
    fn default() -> Self {
        Self { secret: String::new(), issuer: DEFAULT_ISSUER.into(), audience: DEFAULT_ISSUER.into(), expiry: DEFAULT_EXPIRY }
    }
}
impl TokenConfig {
    /// Checks whether this configuration can be used to sign and verify tokens.
    ///
    /// # Errors
    /// This function errors if any of the fields is empty, or the expiry is absurdly large.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.is_empty() {
            return Err(ConfigError::EmptySecret);
        }
        if self.issuer.is_empty() {
            return Err(ConfigError::EmptyIssuer);
        }
        if self.audience.is_empty() {
            return Err(ConfigError::EmptyAudience);
        }
        if i64::try_from(self.expiry.as_secs()).is_err() {
            return Err(ConfigError::ExpiryOutOfRange { expiry: self.expiry });
        }
        Ok(())
    }
}
// Never print the secret
impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("expiry", &self.expiry)
            .finish()
    }
}
