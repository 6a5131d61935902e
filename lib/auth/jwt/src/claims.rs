//  CLAIMS.rs
//
//  Created:
//    17 Oct 2026, 13:38:55
//  Last edited:
//    18 Oct 2026, 11:02:47
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the claims carried by the tokens we issue and accept.
//

use std::fmt::{Display, Formatter, Result as FResult};

use serde::{Deserialize, Serialize};


/***** LIBRARY *****/
/// The `sub`-claim, which may be encoded either as a JSON string or as a JSON integer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SubjectClaim {
    Number(i64),
    Text(String),
}
impl SubjectClaim {
    /// Interprets the subject as a numeric user ID.
    ///
    /// # Returns
    /// The user ID, or [`None`] if this is a string that does not parse as one.
    #[inline]
    pub fn user_id(&self) -> Option<i64> {
        match self {
            Self::Number(id) => Some(*id),
            Self::Text(raw) => raw.parse().ok(),
        }
    }
}
impl Display for SubjectClaim {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Number(id) => write!(f, "{id}"),
            Self::Text(raw) => write!(f, "{raw}"),
        }
    }
}



/// The `aud`-claim, which may be a single audience or a list of them.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AudienceClaim {
    One(String),
    Many(Vec<String>),
}
impl AudienceClaim {
    /// Checks whether the given audience is among the ones in this claim.
    #[inline]
    pub fn contains(&self, audience: &str) -> bool {
        match self {
            Self::One(aud) => aud == audience,
            Self::Many(auds) => auds.iter().any(|aud| aud == audience),
        }
    }
}
impl From<String> for AudienceClaim {
    #[inline]
    fn from(value: String) -> Self { Self::One(value) }
}



/// The claims in our tokens.
///
/// Every field without a default is required; tokens lacking one, or carrying one of the wrong
/// type, are rejected before any of it is used.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// The user the token was issued to.
    pub sub: SubjectClaim,
    /// Who issued the token.
    pub iss: String,
    /// Who the token is intended for.
    pub aud: AudienceClaim,
    /// When the token expires (UNIX timestamp, seconds).
    pub exp: i64,
    /// When the token was issued (UNIX timestamp, seconds).
    #[serde(default)]
    pub iat: i64,
    /// Before when the token is not yet valid (UNIX timestamp, seconds).
    #[serde(default)]
    pub nbf: i64,
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn audience_may_be_string_or_list() {
        let one: AudienceClaim = serde_json::from_value(json!("social-core")).unwrap();
        assert_eq!(one, AudienceClaim::One("social-core".into()));
        assert!(one.contains("social-core"));

        let many: AudienceClaim = serde_json::from_value(json!(["web", "social-core"])).unwrap();
        assert!(many.contains("social-core"));
        assert!(!many.contains("mobile"));
    }

    #[test]
    fn issued_audience_stays_a_string() {
        let claims = Claims {
            sub: SubjectClaim::Number(1),
            iss: "social-go".into(),
            aud: AudienceClaim::from("social-go".to_string()),
            exp: 0,
            iat: 0,
            nbf: 0,
        };
        assert_eq!(serde_json::to_value(&claims).unwrap()["aud"], json!("social-go"));
    }
}
