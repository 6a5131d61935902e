//  AUTHRESOLVER.rs
//
//  Created:
//    23 Oct 2024, 10:31:06
//  Last edited:
//    17 Oct 2026, 11:02:37
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the [`AuthResolver`] trait, which can take an HTTP request
//!   and use it to authenticate it.
//

use std::future::Future;

use http::header::{ToStrError, AUTHORIZATION};
use http::HeaderMap;
use thiserror::Error;

use crate::errors::{ClassifiedError, ErrorKind};


/***** ERRORS *****/
/// Defines the ways in which an `Authorization`-header may be unusable before we even look at the
/// credential in it.
#[derive(Debug, Error)]
pub enum HeaderError {
    /// No 'Authorization' header found in request.
    #[error("Missing header {header:?} in request")]
    NotFound { header: &'static str },
    /// The given 'Authorization'-header did not contain valid UTF-8.
    #[error("Value of header {header:?} in request is non-UTF-8")]
    NonUtf8 {
        header: &'static str,
        #[source]
        err:    ToStrError,
    },
    /// The header did not consist of exactly a scheme and a credential.
    #[error("Value of header {header:?} in request is not of the form '{scheme} <credential>' (found {parts} space-separated part(s))")]
    Malformed { header: &'static str, scheme: &'static str, parts: usize },
    /// The header used another scheme than we expected.
    #[error("Value of header {header:?} in request does not use the {scheme:?} scheme")]
    WrongScheme { header: &'static str, scheme: &'static str },
}
impl ClassifiedError for HeaderError {
    #[inline]
    fn kind(&self) -> ErrorKind { ErrorKind::Unauthorized }
}





/***** HELPER FUNCTIONS *****/
/// Extracts the credential part from an `Authorization`-header that uses the given scheme.
///
/// The header must consist of exactly two tokens separated by a single space, the first of which
/// equals `scheme` literally.
///
/// # Arguments
/// - `headers`: The headers of the request to extract the credential from.
/// - `scheme`: The scheme (e.g., `Bearer`) that the header must use.
///
/// # Returns
/// The raw credential, borrowed from the header.
///
/// # Errors
/// This function errors if the header is absent, not UTF-8, or not of the form `<scheme> <credential>`.
pub fn extract_credential<'h>(headers: &'h HeaderMap, scheme: &'static str) -> Result<&'h str, HeaderError> {
    let header: &'static str = AUTHORIZATION.as_str();
    let value: &str = match headers.get(AUTHORIZATION) {
        Some(v) => v.to_str().map_err(|err| HeaderError::NonUtf8 { header, err })?,
        None => return Err(HeaderError::NotFound { header }),
    };

    let parts: Vec<&str> = value.split(' ').collect();
    if parts.len() != 2 || parts[1].is_empty() {
        return Err(HeaderError::Malformed { header, scheme, parts: parts.len() });
    }
    if parts[0] != scheme {
        return Err(HeaderError::WrongScheme { header, scheme });
    }
    Ok(parts[1])
}





/***** LIBRARY *****/
/// A resolver that takes an HTTP request and (hopefully) authenticates it.
///
/// Note that the AuthResolver is intended to be used in a distributed context. As such, any
/// reference to `self` is done immutably only.
pub trait AuthResolver {
    /// Something produced by the resolver that can later be used to identify the user (e.g., some
    /// identifier).
    type Context;
    /// Client-side errors produced by the AuthResolver.
    type ClientError: 'static + Send + Sync + ClassifiedError;
    /// Server-side errors produced by the AuthResolver.
    type ServerError: 'static + Send + Sync + ClassifiedError;


    /// Resolves the given HTTP request to some authorization context.
    ///
    /// # Arguments
    /// - `headers`: The headers of the HTTP request to resolve.
    ///
    /// # Returns
    /// An [`AuthResolver::Context`] that can be used to identify the user later.
    ///
    /// # Errors
    /// This function can error when it fails to authenticate the user. There are two levels at
    /// which it can do so:
    /// - The _outer_ [`Result`] is used to indicate _server_ errors (e.g., misconfiguration); and
    /// - The _inner_ [`Result`] is used to indicate _user_ errors (e.g., no token, wrong token, etc).
    ///
    /// The first will always result in a (vague) 500 INTERNAL SERVER ERROR to the user, whereas
    /// the second results in a (equally vague) 401 UNAUTHORIZED.
    fn authorize(&self, headers: &HeaderMap) -> impl Send + Future<Output = Result<Result<Self::Context, Self::ClientError>, Self::ServerError>>;
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    fn headers(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_credential() {
        let headers = headers("Bearer abc.def.ghi");
        assert_eq!(extract_credential(&headers, "Bearer").unwrap(), "abc.def.ghi");
    }

    #[test]
    fn rejects_missing_header() {
        assert!(matches!(extract_credential(&HeaderMap::new(), "Bearer"), Err(HeaderError::NotFound { .. })));
    }

    #[test]
    fn rejects_wrong_number_of_parts() {
        for value in ["Bearer", "Bearer a b", "Bearer  a", "Bearer "] {
            let headers = headers(value);
            assert!(matches!(extract_credential(&headers, "Bearer"), Err(HeaderError::Malformed { .. })), "accepted {value:?}");
        }
    }

    #[test]
    fn rejects_other_scheme() {
        let headers = headers("Basic YWRtaW46cGFzc3dvcmQ=");
        assert!(matches!(extract_credential(&headers, "Bearer"), Err(HeaderError::WrongScheme { .. })));
        // The scheme is matched literally
        let headers = self::headers("bearer token");
        assert!(matches!(extract_credential(&headers, "Bearer"), Err(HeaderError::WrongScheme { .. })));
    }
}
