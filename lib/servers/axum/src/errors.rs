//  ERRORS.rs
//
//  Created:
//    17 Oct 2026, 21:30:12
//  Last edited:
//    18 Oct 2026, 15:10:44
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines how failures of handlers and middleware become replies.
//

use std::error::Error;
use std::num::ParseIntError;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_server_spec::{ErrorResponse, FeedQueryError, MAX_EMAIL_LEN, MAX_PASSWORD_LEN, MIN_PASSWORD_LEN};
use error_trace::ErrorTrace as _;
use specifications::errors::{ClassifiedError, ErrorKind};
use thiserror::Error;
use tracing::{error, info};


/***** CONSTANTS *****/
/// How client mistakes are labelled in the logs.
const BAD_REQUEST_KIND: &str = "bad-request";





/***** ERRORS *****/
/// Everything that may go wrong while handling a request.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The body of the request was not the JSON we expected.
    #[error("Malformed request body")]
    Body {
        #[source]
        err: JsonRejection,
    },
    /// The query string could not be read at all.
    #[error("Malformed query")]
    Query {
        #[source]
        err: QueryRejection,
    },
    /// The query of a feed request was out of bounds.
    #[error("Illegal feed query")]
    Feed {
        #[source]
        err: FeedQueryError,
    },
    /// An ID in the path was not an integer.
    #[error("Illegal {what} ID {raw:?}")]
    IllegalId {
        what: &'static str,
        raw:  String,
        #[source]
        err:  ParseIntError,
    },
    /// A field was given but empty.
    #[error("Field {field:?} may not be empty")]
    EmptyField { field: &'static str },
    /// A field was shorter than allowed.
    #[error("Field {field:?} must be at least {min} characters (got {len})")]
    FieldTooShort { field: &'static str, len: usize, min: usize },
    /// A field was longer than allowed.
    #[error("Field {field:?} may be at most {max} characters (got {len})")]
    FieldTooLong { field: &'static str, len: usize, max: usize },
    /// The email field does not hold an email address.
    #[error("Field \"email\" must be an email address")]
    IllegalEmail,
    /// The email and password given do not belong to an active user.
    #[error("Invalid credentials for {email:?}")]
    BadCredentials { email: String },
    /// The actor is known but may not act on the post.
    #[error("User {actor} may not {action} post {post}")]
    Forbidden { actor: i64, action: &'static str, post: i64 },
    /// Some component we rely on failed, and told us in what way.
    #[error("Failed to {what}")]
    Failed {
        what: &'static str,
        kind: ErrorKind,
        #[source]
        err:  Box<dyn 'static + Send + Sync + Error>,
    },
}
impl ApiError {
    /// Wraps an error that knows its own class.
    ///
    /// # Arguments
    /// - `what`: What we were doing when it failed (e.g., `update post`).
    /// - `err`: The [`ClassifiedError`] itself.
    ///
    /// # Returns
    /// An [`ApiError::Failed`] with the same class as `err`.
    #[inline]
    pub fn failed(what: &'static str, err: impl 'static + Send + Sync + ClassifiedError) -> Self {
        Self::Failed { what, kind: err.kind(), err: Box::new(err) }
    }

    /// Returns the class of this error.
    ///
    /// # Returns
    /// The [`ErrorKind`], or [`None`] if this is a mistake of the client that is explained to them.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Body { .. }
            | Self::Query { .. }
            | Self::Feed { .. }
            | Self::IllegalId { .. }
            | Self::EmptyField { .. }
            | Self::FieldTooShort { .. }
            | Self::FieldTooLong { .. }
            | Self::IllegalEmail => None,
            Self::Forbidden { .. } => Some(ErrorKind::Forbidden),
            Self::BadCredentials { .. } => Some(ErrorKind::Unauthorized),
            Self::Failed { kind, .. } => Some(*kind),
        }
    }

    /// Returns the status code with which to reply.
    #[inline]
    pub fn status_code(&self) -> StatusCode { self.kind().map_or(StatusCode::BAD_REQUEST, |kind| kind.status_code()) }

    /// Returns the message the client gets to see.
    ///
    /// Mistakes of the client are explained to them. Anything else only reveals its class.
    pub fn message(&self) -> String {
        match (self, self.kind()) {
            (Self::Body { err }, _) => format!("{self}: {}", err.body_text()),
            (Self::Query { err }, _) => format!("{self}: {}", err.body_text()),
            (Self::Feed { err }, _) => format!("{self}: {err}"),
            (_, None) => self.to_string(),
            (_, Some(kind)) => kind.message().into(),
        }
    }
}
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status: StatusCode = self.status_code();
        let kind: String = self.kind().map_or_else(|| BAD_REQUEST_KIND.into(), |kind| kind.to_string());
        if status.is_server_error() {
            error!(kind = %kind, "{}", self.trace());
        } else {
            info!(kind = %kind, "{}", self.trace());
        }
        reply(status, self.message())
    }
}





/***** HELPER FUNCTIONS *****/
/// Builds a JSON error reply.
///
/// # Arguments
/// - `status`: The [`StatusCode`] to reply with.
/// - `message`: The message to put in the body.
///
/// # Returns
/// A [`Response`] carrying an [`ErrorResponse`].
#[inline]
pub fn reply(status: StatusCode, message: impl Into<String>) -> Response { (status, Json(ErrorResponse { error: message.into() })).into_response() }

/// Checks the length of a text field, counted in characters.
///
/// # Errors
/// This function errors if `value` is empty while `required`, or longer than `max`.
pub fn check_text(field: &'static str, value: &str, max: usize, required: bool) -> Result<(), ApiError> {
    if required && value.trim().is_empty() {
        return Err(ApiError::EmptyField { field });
    }
    let len: usize = value.chars().count();
    if len > max {
        return Err(ApiError::FieldTooLong { field, len, max });
    }
    Ok(())
}

/// Checks that a password has an acceptable length, counted in characters.
///
/// # Errors
/// This function errors if `password` is too short or too long.
pub fn check_password(password: &str) -> Result<(), ApiError> {
    check_text("password", password, MAX_PASSWORD_LEN, true)?;
    let len: usize = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(ApiError::FieldTooShort { field: "password", len, min: MIN_PASSWORD_LEN });
    }
    Ok(())
}

/// Checks that an email address looks like one: some local part, an `@`, and a domain.
///
/// # Errors
/// This function errors if it doesn't, or if it is too long.
pub fn check_email(email: &str) -> Result<(), ApiError> {
    check_text("email", email, MAX_EMAIL_LEN, true)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() && !domain.contains('@') && !email.contains(char::is_whitespace) => Ok(()),
        _ => Err(ApiError::IllegalEmail),
    }
}

/// Parses an ID from the path.
#[inline]
pub fn parse_id(what: &'static str, raw: &str) -> Result<i64, ApiError> {
    raw.parse().map_err(|err| ApiError::IllegalId { what, raw: raw.into(), err })
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[derive(Debug, Error)]
    #[error("version moved on")]
    struct Moved;
    impl ClassifiedError for Moved {
        fn kind(&self) -> ErrorKind { ErrorKind::Conflict }
    }

    #[test]
    fn failures_keep_their_class_but_not_their_details() {
        let err = ApiError::failed("update post", Moved);
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.message(), "conflict");

        let err = ApiError::Failed { what: "resolve user", kind: ErrorKind::Internal, err: Box::new(io::Error::other("redis at 10.0.0.3 is down")) };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!err.message().contains("10.0.0.3"));
    }

    #[test]
    fn forbidden_stays_forbidden() {
        let err = ApiError::Forbidden { actor: 2, action: "delete", post: 1 };
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.message(), "forbidden");
    }

    #[test]
    fn text_limits_count_characters() {
        assert!(check_text("title", &"é".repeat(100), 100, true).is_ok());
        assert!(matches!(check_text("title", &"a".repeat(101), 100, true), Err(ApiError::FieldTooLong { len: 101, .. })));
        assert!(matches!(check_text("content", "  ", 1000, true), Err(ApiError::EmptyField { field: "content" })));
        assert!(check_text("content", "", 1000, false).is_ok());
    }

    #[test]
    fn client_mistakes_have_no_kind() {
        assert_eq!(ApiError::IllegalEmail.kind(), None);
        assert_eq!(ApiError::IllegalEmail.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::failed("update post", Moved).kind(), Some(ErrorKind::Conflict));

        let err = ApiError::BadCredentials { email: "alice@example.com".into() };
        assert_eq!((err.kind(), err.status_code()), (Some(ErrorKind::Unauthorized), StatusCode::UNAUTHORIZED));
        assert!(!err.message().contains("alice"));
    }

    #[test]
    fn registration_fields_are_checked() {
        assert!(check_email("alice@example.com").is_ok());
        for bad in ["alice", "@example.com", "alice@", "a@b@c", "al ice@example.com"] {
            assert!(matches!(check_email(bad), Err(ApiError::IllegalEmail)), "accepted {bad:?}");
        }
        assert!(matches!(check_email(""), Err(ApiError::EmptyField { field: "email" })));

        assert!(check_password("abc").is_ok());
        assert!(matches!(check_password("ab"), Err(ApiError::FieldTooShort { len: 2, min: 3, .. })));
        assert!(matches!(check_password(&"p".repeat(73)), Err(ApiError::FieldTooLong { len: 73, .. })));
    }

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("post", "42").unwrap(), 42);
        let err = parse_id("post", "abc").unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.message(), "Illegal post ID \"abc\"");
    }
}
