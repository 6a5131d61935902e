//  AUTH.rs
//
//  Created:
//    23 Oct 2024, 11:58:43
//  Last edited:
//    18 Oct 2026, 15:32:19
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the server's admission and authentication middleware.
//

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{RETRY_AFTER, WWW_AUTHENTICATE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use basic_auth::BASIC_CHALLENGE;
use error_trace::ErrorTrace as _;
use specifications::errors::{ClassifiedError, ErrorKind};
use specifications::models::{Subject, User};
use specifications::ratelimiter::RateDecision;
use specifications::{AuthResolver, Cache, RateLimiter, UserStore};
use thiserror::Error;
use tracing::field::Empty;
use tracing::{debug, error, info, span, Instrument as _, Level, Span};

use crate::errors::reply;
use crate::server::AxumServer;


/***** CONSTANTS *****/
/// The header set by proxies carrying the chain of client addresses.
const FORWARDED_FOR: &str = "x-forwarded-for";
/// The header set by proxies carrying the original client address.
const REAL_IP: &str = "x-real-ip";
/// The client key used when nothing identifies the client.
const UNKNOWN_CLIENT: &str = "unknown";





/***** ERRORS *****/
/// Wraps what auth resolvers complain about, for logging.
#[derive(Debug, Error)]
enum Error<E> {
    #[error("Failed to authorize incoming request")]
    AuthorizeFailed {
        #[source]
        err: E,
    },
}





/***** AUXILLARY *****/
/// The key under which a request's client was admitted.
#[derive(Clone, Debug)]
struct ClientKey(String);

/// Who is making a request, as established by the middleware. Handlers of bearer-protected routes
/// get it as an [`Extension`](axum::Extension).
#[derive(Clone, Debug)]
pub struct RequestContext {
    /// The key the client was admitted under.
    pub client: String,
    /// The user the bearer token resolved to.
    pub user:   User,
}





/***** HELPER FUNCTIONS *****/
/// Returns the value of a header if it's there and readable.
#[inline]
fn header<'h>(headers: &'h HeaderMap, name: &str) -> Option<&'h str> { headers.get(name).and_then(|v| v.to_str().ok()) }

/// Decides by what key to count a request's client.
///
/// If proxy headers are trusted, they take precedence over the peer address, the first entry of
/// `X-Forwarded-For` being the original client. Otherwise only the peer address counts.
///
/// # Arguments
/// - `headers`: The headers of the request.
/// - `peer`: The address of the peer that connected to us, if known.
/// - `trust_proxy_headers`: Whether to read `X-Forwarded-For` and `X-Real-IP`.
///
/// # Returns
/// Some string identifying the client.
fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy_headers: bool) -> String {
    if !trust_proxy_headers {
        return peer.map_or_else(|| UNKNOWN_CLIENT.into(), |addr| addr.ip().to_string());
    }
    if let Some(client) = header(headers, FORWARDED_FOR).and_then(|v| v.split(',').next()).map(str::trim).filter(|v| !v.is_empty()) {
        return client.into();
    }
    if let Some(client) = header(headers, REAL_IP).map(str::trim).filter(|v| !v.is_empty()) {
        return client.into();
    }
    match peer {
        Some(addr) => addr.ip().to_string(),
        None => UNKNOWN_CLIENT.into(),
    }
}

/// Rounds a delay up to whole seconds for use in `Retry-After`.
///
/// Never returns less than one.
#[inline]
fn retry_after_secs(delay: Duration) -> u64 { (delay.as_secs() + u64::from(delay.subsec_nanos() > 0)).max(1) }





/***** LIBRARY *****/
impl<A, B, L, C, D> AxumServer<A, B, L, C, D>
where
    A: 'static + Send + Sync + AuthResolver<Context = Subject>,
    B: 'static + Send + Sync + AuthResolver,
    B::Context: 'static + Send + Sync + Clone,
    L: 'static + Send + Sync + RateLimiter,
    C: 'static + Send + Sync + Cache,
    D: 'static + Send + Sync + Clone + UserStore,
{
    /// Counts the request against its client's budget, and rejects it if it's spent.
    pub(crate) async fn admit(State(this): State<Arc<Self>>, mut request: Request, next: Next) -> Response {
        let peer: Option<SocketAddr> = request.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| *addr);
        let client: String = client_key(request.headers(), peer, this.trust_proxy_headers);

        match this.limiter.check(&client) {
            RateDecision::Allowed { remaining } => {
                debug!("Admitted request of {client:?} to {} ({remaining} remaining)", request.uri().path());
                request.extensions_mut().insert(ClientKey(client));
                next.run(request).await
            },
            RateDecision::Limited { retry_after } => {
                let secs: u64 = retry_after_secs(retry_after);
                info!("Rate limited client {client:?} on {} for another {secs}s", request.uri().path());
                let mut res = reply(ErrorKind::RateLimited.status_code(), ErrorKind::RateLimited.message());
                res.headers_mut().insert(RETRY_AFTER, HeaderValue::from(secs));
                res
            },
        }
    }

    /// Validates the bearer token, and resolves its subject to a [`User`] that is injected into
    /// the request.
    pub(crate) async fn authenticate(State(this): State<Arc<Self>>, mut request: Request, next: Next) -> Response {
        let span = span!(Level::INFO, "AxumServer::authenticate", path = request.uri().path(), user = Empty);
        async move {
            // Do the auth thingy
            let subject: Subject = match this.auth.authorize(request.headers()).await {
                Ok(Ok(subject)) => subject,
                Ok(Err(err)) => {
                    let err = Error::AuthorizeFailed { err };
                    info!("{}", err.trace());
                    return reply(StatusCode::UNAUTHORIZED, ErrorKind::Unauthorized.message());
                },
                Err(err) => {
                    let err = Error::AuthorizeFailed { err };
                    error!("{}", err.trace());
                    return reply(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal.message());
                },
            };

            // Then find out who that is
            let user: User = match this.identity.resolve(subject.id).await {
                Ok(user) => user,
                // A valid token for a user that is gone is as good as no token
                Err(err) if err.kind() == ErrorKind::NotFound => {
                    info!("{}", err.trace());
                    return reply(StatusCode::UNAUTHORIZED, ErrorKind::Unauthorized.message());
                },
                Err(err) => {
                    error!("{}", err.trace());
                    return reply(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal.message());
                },
            };
            Span::current().record("user", user.id);
            debug!("Request made by user {} ({:?}, role {:?})", user.id, user.username, user.role.name);

            // If we found a user, then inject it in the request as an extension; then continue
            let client: String = request.extensions().get::<ClientKey>().map(|ClientKey(client)| client.clone()).unwrap_or_else(|| UNKNOWN_CLIENT.into());
            request.extensions_mut().insert(RequestContext { client, user });
            next.run(request).await
        }
        .instrument(span)
        .await
    }

    /// Validates the basic credentials of operators.
    pub(crate) async fn authenticate_operator(State(this): State<Arc<Self>>, mut request: Request, next: Next) -> Response {
        let context: B::Context = match this.basic.authorize(request.headers()).await {
            Ok(Ok(context)) => context,
            Ok(Err(err)) => {
                let err = Error::AuthorizeFailed { err };
                info!("{}", err.trace());
                let mut res = reply(StatusCode::UNAUTHORIZED, ErrorKind::Unauthorized.message());
                res.headers_mut().insert(WWW_AUTHENTICATE, HeaderValue::from_static(BASIC_CHALLENGE));
                return res;
            },
            Err(err) => {
                let err = Error::AuthorizeFailed { err };
                error!("{}", err.trace());
                return reply(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Internal.message());
            },
        };

        request.extensions_mut().insert(context);
        next.run(request).await
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    #[test]
    fn client_is_first_forwarded_address() {
        let peer: SocketAddr = ([10, 0, 0, 1], 4321).into();
        let headers = headers(&[(FORWARDED_FOR, "203.0.113.7, 10.0.0.2"), (REAL_IP, "198.51.100.1")]);
        assert_eq!(client_key(&headers, Some(peer), true), "203.0.113.7");
    }

    #[test]
    fn untrusted_proxy_headers_are_ignored() {
        let peer: SocketAddr = ([10, 0, 0, 1], 4321).into();
        let headers = headers(&[(FORWARDED_FOR, "203.0.113.7"), (REAL_IP, "198.51.100.1")]);
        assert_eq!(client_key(&headers, Some(peer), false), "10.0.0.1");
        assert_eq!(client_key(&headers, None, false), UNKNOWN_CLIENT);
    }

    #[test]
    fn client_falls_back_to_real_ip_then_peer() {
        let peer: SocketAddr = ([10, 0, 0, 1], 4321).into();
        assert_eq!(client_key(&headers(&[(REAL_IP, "198.51.100.1")]), Some(peer), true), "198.51.100.1");
        assert_eq!(client_key(&headers(&[(FORWARDED_FOR, " ")]), Some(peer), true), "10.0.0.1");
        assert_eq!(client_key(&HeaderMap::new(), None, true), UNKNOWN_CLIENT);
    }

    #[test]
    fn retry_after_rounds_up_to_at_least_a_second() {
        assert_eq!(retry_after_secs(Duration::from_millis(4200)), 5);
        assert_eq!(retry_after_secs(Duration::from_secs(5)), 5);
        assert_eq!(retry_after_secs(Duration::from_millis(1)), 1);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
    }
}
