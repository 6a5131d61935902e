//  ERRORS.rs
//
//  Created:
//    17 Oct 2026, 10:20:03
//  Last edited:
//    17 Oct 2026, 14:41:19
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the error taxonomy shared by every component of the
//!   admission path.
//

use std::convert::Infallible;
use std::error::Error;
use std::fmt::{Display, Formatter, Result as FResult};

use http::StatusCode;


/***** LIBRARY *****/
/// The classes in which every failure of the admission path falls.
///
/// Each class maps to exactly one status code and one fixed, generic message. Anything more
/// specific stays in the logs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The client exceeded its request budget; it may retry later.
    RateLimited,
    /// The credential was missing, malformed, invalid or expired.
    Unauthorized,
    /// The client is authenticated, but neither owns the resource nor has a sufficient role.
    Forbidden,
    /// The resource does not exist.
    NotFound,
    /// The write raced another write (version mismatch) or duplicates a relationship.
    Conflict,
    /// Some piece of infrastructure (cache, store, configuration) failed.
    Internal,
}
impl ErrorKind {
    /// Returns the status code associated with this class.
    ///
    /// # Returns
    /// A [`StatusCode`].
    #[inline]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the message that clients see for this class.
    ///
    /// # Returns
    /// A static string that never carries details about the specific failure.
    #[inline]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::RateLimited => "rate limit exceeded",
            Self::Unauthorized => "unauthorized",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not found",
            Self::Conflict => "conflict",
            Self::Internal => "the server encountered a problem and could not process your request",
        }
    }
}
impl Display for ErrorKind {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::RateLimited => write!(f, "rate-limited"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::Forbidden => write!(f, "forbidden"),
            Self::NotFound => write!(f, "not-found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Internal => write!(f, "internal"),
        }
    }
}



/// Extends an [`Error`] with the class it falls in.
pub trait ClassifiedError: Error {
    /// Returns the class of this error.
    ///
    /// # Returns
    /// An [`ErrorKind`].
    fn kind(&self) -> ErrorKind;
}

impl ClassifiedError for Infallible {
    #[inline]
    fn kind(&self) -> ErrorKind { match *self {} }
}





/***** TESTS *****/
