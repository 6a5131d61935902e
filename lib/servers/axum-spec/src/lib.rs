//  LIB.rs
//
//  Created:
//    06 Dec 2024, 17:59:58
//  Last edited:
//    18 Oct 2026, 14:36:05
//  Auto updated?
//    Yes
//
//  Description:
//!   Pseudo-server that defines the API endpoint locations, methods and
//!   request/response bodies for the `axum-server`.
//

use std::borrow::Cow;
#[cfg(feature = "axum")]
use std::convert::Infallible;
use std::num::ParseIntError;

#[cfg(feature = "axum")]
use axum::handler::Handler;
#[cfg(feature = "axum")]
use axum::routing::method_routing::{delete, get, patch, post, put};
#[cfg(feature = "axum")]
use axum::routing::MethodRouter;
use chrono::NaiveDateTime;
use http::Method;
use itertools::Itertools as _;
use serde::{Deserialize, Serialize};
use specifications::models::{FeedQuery, SortOrder, User, MAX_FEED_LIMIT};
use thiserror::Error;


/***** CONSTANTS *****/
/// The longest title a post may have, in characters.
pub const MAX_TITLE_LEN: usize = 100;
/// The longest content a post may have, in characters.
pub const MAX_CONTENT_LEN: usize = 1000;

/// The longest username, in characters.
pub const MAX_USERNAME_LEN: usize = 100;
/// The longest email address, in characters.
pub const MAX_EMAIL_LEN: usize = 255;
/// The shortest password, in characters.
pub const MIN_PASSWORD_LEN: usize = 3;
/// The longest password, in characters.
pub const MAX_PASSWORD_LEN: usize = 72;

/// The most tags a feed may be filtered on.
pub const MAX_FEED_TAGS: usize = 5;
/// The longest text a feed may be searched for, in characters.
pub const MAX_FEED_SEARCH_LEN: usize = 100;
/// How `since` and `until` are written in feed queries.
pub const FEED_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";





/***** ERRORS *****/
/// Defines what may be wrong with the query of a feed request.
#[derive(Debug, Error)]
pub enum FeedQueryError {
    #[error("Query parameter {param:?} must be an integer (got {raw:?})")]
    IllegalInteger {
        param: &'static str,
        raw:   String,
        #[source]
        err:   ParseIntError,
    },
    #[error("Query parameter {param:?} must be between {min} and {max} (got {value})")]
    OutOfRange { param: &'static str, value: i64, min: i64, max: i64 },
    #[error("Query parameter \"sort\" must be \"asc\" or \"desc\" (got {raw:?})")]
    IllegalSort { raw: String },
    #[error("At most {max} tags may be given (got {got})")]
    TooManyTags { got: usize, max: usize },
    #[error("Query parameter \"search\" may be at most {max} characters (got {len})")]
    SearchTooLong { len: usize, max: usize },
    #[error("Query parameter {param:?} must be a time like \"YYYY-MM-DD HH:MM:SS\" (got {raw:?})")]
    IllegalTime {
        param: &'static str,
        raw:   String,
        #[source]
        err:   chrono::ParseError,
    },
}





/***** HELPER FUNCTIONS *****/
/// Parses an integer query parameter and checks its bounds.
fn parse_bounded(param: &'static str, raw: Option<String>, default: i64, min: i64, max: i64) -> Result<i64, FeedQueryError> {
    let value: i64 = match raw {
        Some(raw) => raw.trim().parse().map_err(|err| FeedQueryError::IllegalInteger { param, raw, err })?,
        None => return Ok(default),
    };
    if value < min || value > max {
        return Err(FeedQueryError::OutOfRange { param, value, min, max });
    }
    Ok(value)
}

/// Parses a time query parameter, read as UTC.
fn parse_time(param: &'static str, raw: Option<String>) -> Result<Option<chrono::DateTime<chrono::Utc>>, FeedQueryError> {
    match raw {
        Some(raw) => match NaiveDateTime::parse_from_str(raw.trim(), FEED_TIME_FORMAT) {
            Ok(time) => Ok(Some(time.and_utc())),
            Err(err) => Err(FeedQueryError::IllegalTime { param, raw, err }),
        },
        None => Ok(None),
    }
}





/***** AUXILLARY *****/
/// Defines where to find an endpoint in the API.
pub struct EndpointPath {
    /// The method to apply.
    pub method: Method,
    /// The path where to find it.
    ///
    /// You can use path arguments to allow clients to instantiate them. For example, the path
    /// ```plain
    /// /v1/posts/{postID}
    /// ```
    /// will cause the user to have to given an argument in [`EndpointPath::instantiated_path()`]. Note
    /// that path arguments are defined as path segments wrapped in curly brackets.
    pub path:   &'static str,
}
impl EndpointPath {
    /// Runs the appropriate [`axum`] function on this endpointpath.
    ///
    /// # Arguments
    /// - `handler`: Some handler to call when the path + method is matched.
    ///
    /// # Returns
    /// A new [`MethodRouter`] that encodes to axum when to call the given `handler`.
    ///
    /// # Panics
    /// This function panics if the endpoint uses a method other than GET, POST, PUT, PATCH or
    /// DELETE.
    #[cfg(feature = "axum")]
    pub fn handler<H, T, S>(&self, handler: H) -> MethodRouter<S, Infallible>
    where
        H: Handler<T, S>,
        T: 'static,
        S: Clone + Send + Sync + 'static,
    {
        match self.method {
            Method::GET => get(handler),
            Method::POST => post(handler),
            Method::PUT => put(handler),
            Method::PATCH => patch(handler),
            Method::DELETE => delete(handler),
            ref other => panic!("Unsupported method {other} for endpoint {:?}", self.path),
        }
    }

    /// Returns a string that find the path where this route may be found.
    ///
    /// Note that, if there are any parameters in it, these are instantiated by the given list of
    /// values. Therefore, this function tends to be used when using the API.
    ///
    /// # Returns
    /// A [`Cow<'static, str>`] that encodes the location of this endpoint.
    ///
    /// # Panics
    /// This function panics if the number of arguments given does not match the number of
    /// arguments in the path.
    #[inline]
    #[track_caller]
    pub fn instantiated_path<'a>(&self, args: impl IntoIterator<Item = &'a str>) -> Cow<'static, str> {
        let mut args = args.into_iter();
        let mut replace_count: usize = 0;
        let path = self
            .path
            .split('/')
            .map(|component| {
                if component.starts_with('{') && component.ends_with('}') {
                    let res = args.next().unwrap_or_else(|| panic!("Not enough arguments given for path {:?} (got {replace_count})", self.path));
                    replace_count += 1;
                    res
                } else {
                    component
                }
            })
            .join("/");

        // Assert none are left
        if args.next().is_some() {
            panic!("Too many arguments given for path {:?} (expected {replace_count})", self.path);
        }

        if replace_count == 0 { Cow::Borrowed(self.path) } else { Cow::Owned(path) }
    }
}



/// The body of every error reply.
///
/// The message is fixed per class of error and never carries details.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}





/***** LIBRARY *****/
/// Path of the endpoint that reports whether the server is up. Guarded by basic authentication.
pub const HEALTH_PATH: EndpointPath = EndpointPath { method: Method::GET, path: "/v1/health" };

/// Replied when checking health.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct HealthResponse {
    /// Always `ok` if you get to see it.
    pub status:  String,
    /// The environment the server runs in (e.g., `development`).
    pub env:     String,
    /// The version of the server.
    pub version: String,
}



/// Path of the endpoint to write a new post.
pub const CREATE_POST_PATH: EndpointPath = EndpointPath { method: Method::POST, path: "/v1/posts" };

/// What to send in the body of a request when creating a new post. The server replies with the
/// stored post.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct CreatePostRequest {
    /// At most [`MAX_TITLE_LEN`] characters.
    pub title:   String,
    /// At most [`MAX_CONTENT_LEN`] characters.
    pub content: String,
    #[serde(default)]
    pub tags:    Vec<String>,
}



/// Path of the endpoint to retrieve a post.
pub const GET_POST_PATH: EndpointPath = EndpointPath { method: Method::GET, path: "/v1/posts/{postID}" };



/// Path of the endpoint to edit a post. Only its owner and moderators may do so.
pub const UPDATE_POST_PATH: EndpointPath = EndpointPath { method: Method::PATCH, path: "/v1/posts/{postID}" };

/// What to send in the body of a request when updating a post. The server replies with the post as
/// updated.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct UpdatePostRequest {
    /// The new title, if it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title:   Option<String>,
    /// The new content, if it changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// The version of the post this edit is based on. If omitted, the edit applies to whatever
    /// version the server reads just before writing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}



/// Path of the endpoint to remove a post. Only its owner and admins may do so.
pub const DELETE_POST_PATH: EndpointPath = EndpointPath { method: Method::DELETE, path: "/v1/posts/{postID}" };



/// Path of the endpoint to retrieve a user.
pub const GET_USER_PATH: EndpointPath = EndpointPath { method: Method::GET, path: "/v1/users/{userID}" };



/// Path of the endpoint to let the caller follow a user.
pub const FOLLOW_PATH: EndpointPath = EndpointPath { method: Method::PUT, path: "/v1/users/{userID}/follow" };

/// Path of the endpoint to let the caller stop following a user.
pub const UNFOLLOW_PATH: EndpointPath = EndpointPath { method: Method::PUT, path: "/v1/users/{userID}/unfollow" };





/// Path of the endpoint to register a new user. The user is inactive until they use the token in
/// the reply on [`ACTIVATE_PATH`].
pub const REGISTER_PATH: EndpointPath = EndpointPath { method: Method::POST, path: "/v1/authentication/user" };

/// What to send in the body of a request when registering.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegisterRequest {
    /// At most [`MAX_USERNAME_LEN`] characters.
    pub username: String,
    /// At most [`MAX_EMAIL_LEN`] characters.
    pub email:    String,
    /// Between [`MIN_PASSWORD_LEN`] and [`MAX_PASSWORD_LEN`] characters.
    pub password: String,
}

/// Replied when registering: the new user, and the token with which to activate them.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegisterResponse {
    #[serde(flatten)]
    pub user:  User,
    pub token: String,
}



/// Path of the endpoint to exchange an email and password for a bearer token.
pub const TOKEN_PATH: EndpointPath = EndpointPath { method: Method::POST, path: "/v1/authentication/token" };

/// What to send in the body of a request for a token.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TokenRequest {
    pub email:    String,
    pub password: String,
}

/// Replied when a token is issued.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct TokenResponse {
    pub token: String,
}



/// Path of the endpoint to activate a registered user.
pub const ACTIVATE_PATH: EndpointPath = EndpointPath { method: Method::PUT, path: "/v1/users/activate/{token}" };



/// Path of the endpoint listing the posts of the caller and of everyone they follow.
pub const FEED_PATH: EndpointPath = EndpointPath { method: Method::GET, path: "/v1/users/feed" };

/// The query of a feed request, as given.
///
/// Everything is optional and read as text, so that [`FeedParams::into_query()`] decides what is
/// malformed.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FeedParams {
    /// Between 1 and [`MAX_FEED_LIMIT`]; defaults to the maximum.
    pub limit:  Option<String>,
    /// At least 0; defaults to 0.
    pub offset: Option<String>,
    /// `asc` or `desc`; defaults to `desc`.
    pub sort:   Option<String>,
    /// Comma-separated, at most [`MAX_FEED_TAGS`].
    pub tags:   Option<String>,
    /// At most [`MAX_FEED_SEARCH_LEN`] characters.
    pub search: Option<String>,
    /// Formatted as [`FEED_TIME_FORMAT`], in UTC.
    pub since:  Option<String>,
    /// Formatted as [`FEED_TIME_FORMAT`], in UTC.
    pub until:  Option<String>,
}
impl FeedParams {
    /// Validates the parameters.
    ///
    /// # Returns
    /// The [`FeedQuery`] they describe, with defaults filled in.
    ///
    /// # Errors
    /// This function errors if any of the parameters is malformed or out of bounds.
    pub fn into_query(self) -> Result<FeedQuery, FeedQueryError> {
        let limit: i64 = parse_bounded("limit", self.limit, MAX_FEED_LIMIT, 1, MAX_FEED_LIMIT)?;
        let offset: i64 = parse_bounded("offset", self.offset, 0, 0, i64::MAX)?;
        let sort: SortOrder = match self.sort.as_deref().map(str::trim) {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(other) => return Err(FeedQueryError::IllegalSort { raw: other.into() }),
        };

        let tags: Vec<String> = self
            .tags
            .as_deref()
            .map(|raw| raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()).map(String::from).collect())
            .unwrap_or_default();
        if tags.len() > MAX_FEED_TAGS {
            return Err(FeedQueryError::TooManyTags { got: tags.len(), max: MAX_FEED_TAGS });
        }

        let search: Option<String> = self.search.filter(|search| !search.is_empty());
        if let Some(search) = &search {
            let len: usize = search.chars().count();
            if len > MAX_FEED_SEARCH_LEN {
                return Err(FeedQueryError::SearchTooLong { len, max: MAX_FEED_SEARCH_LEN });
            }
        }

        Ok(FeedQuery { limit, offset, sort, tags, search, since: parse_time("since", self.since)?, until: parse_time("until", self.until)? })
    }
}





/***** TESTS *****/
