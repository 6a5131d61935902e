//  MOD.rs
//
//  Created:
//    18 Oct 2026, 09:12:40
//  Last edited:
//    18 Oct 2026, 17:02:40
//  Auto updated?
//    Yes
//
//  Description:
//!   Sets up a complete server on a throwaway database for the
//!   integration tests.
//

#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use social_core::auth::basic::{BasicAuthConfig, BasicResolver};
use social_core::auth::jwt::{JwtIssuer, JwtResolver, TokenConfig};
use social_core::caches::memory::MemoryCache;
use social_core::databases::sqlite::{DatabaseConfig, SQLiteDatabase};
use social_core::limiters::fixed_window::{FixedWindowLimiter, RateLimitConfig};
use social_core::servers::axum::AxumServer;
use social_core::spec::models::{NewPost, NewUser, Post, User};
use social_core::spec::{PostStore as _, RateLimiter, UserStore as _};
use tempfile::TempDir;
use tower::ServiceExt as _;


/***** CONSTANTS *****/
pub const OPERATOR: &str = "admin";
pub const OPERATOR_PASSWORD: &str = "correct horse battery staple";





/***** LIBRARY *****/
/// A running API with some people in it.
pub struct Harness {
    /// Keeps the database alive.
    _dir:       TempDir,
    pub router: Router,
    pub issuer: JwtIssuer,
    pub db:     SQLiteDatabase,
    /// Has role `user`.
    pub alice:  User,
    /// Has role `user`.
    pub bob:    User,
    /// Has role `moderator`.
    pub mod_:   User,
    /// Has role `admin`.
    pub admin:  User,
}
impl Harness {
    /// Builds the server with the given rate limits.
    pub async fn new(limits: RateLimitConfig) -> Self { Self::with_limiter(FixedWindowLimiter::new(limits).unwrap()).await }

    /// Builds the server with the given rate limiter.
    ///
    /// Clients are told apart by `X-Forwarded-For`, as if behind a proxy.
    #[inline]
    pub async fn with_limiter<L: 'static + Send + Sync + RateLimiter>(limiter: L) -> Self { Self::build(limiter, true).await }

    /// Builds the server with the given rate limiter, optionally believing proxy headers.
    pub async fn build<L: 'static + Send + Sync + RateLimiter>(limiter: L, trust_proxy_headers: bool) -> Self {
        let dir = TempDir::new().unwrap();
        let db = SQLiteDatabase::new(dir.path().join("social.db"), DatabaseConfig::default()).await.unwrap();

        let mut users = Vec::with_capacity(4);
        for (name, role) in [("alice", "user"), ("bob", "user"), ("mod", "moderator"), ("root", "admin")] {
            users.push(
                db.create_user(NewUser { username: name.into(), email: format!("{name}@example.com"), is_active: true, role: role.into() })
                    .await
                    .unwrap(),
            );
        }
        let mut users = users.into_iter();

        let tokens = TokenConfig { secret: "integration-secret".into(), ..Default::default() };
        let basic = BasicAuthConfig { username: OPERATOR.into(), password: OPERATOR_PASSWORD.into() };
        let server = AxumServer::new(
            ([127, 0, 0, 1], 0),
            "test",
            JwtResolver::new(&tokens).unwrap(),
            BasicResolver::new(basic),
            JwtIssuer::new(&tokens).unwrap(),
            limiter,
            MemoryCache::new(),
            db.clone(),
        )
        .trust_proxy_headers(trust_proxy_headers);

        Self {
            _dir: dir,
            router: server.router(),
            issuer: JwtIssuer::new(&tokens).unwrap(),
            db,
            alice: users.next().unwrap(),
            bob: users.next().unwrap(),
            mod_: users.next().unwrap(),
            admin: users.next().unwrap(),
        }
    }

    /// Builds the server without rate limits.
    pub async fn unlimited() -> Self { Self::new(RateLimitConfig { enabled: false, ..Default::default() }).await }

    /// Returns a bearer token for the given user.
    pub fn token(&self, user: &User) -> String { self.issuer.issue(user.id).unwrap() }

    /// Writes a post owned by `owner` directly to the database.
    pub async fn post(&self, owner: &User) -> Post {
        self.db
            .create_post(NewPost { title: "Hello".into(), content: "First post".into(), user_id: owner.id, tags: vec!["intro".into()] })
            .await
            .unwrap()
    }

    /// Sends a request to the API.
    ///
    /// # Returns
    /// The status, headers and (JSON, if any) body of the reply.
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let res = self.router.clone().oneshot(request).await.unwrap();
        let status = res.status();
        let headers = res.headers().clone();
        let body = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body = if body.is_empty() { Value::Null } else { serde_json::from_slice(&body).unwrap() };
        (status, headers, body)
    }

    /// Sends a JSON request without credentials.
    pub async fn send_anonymous(&self, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(path);
        let body = match body {
            Some(body) => {
                req = req.header("content-type", "application/json");
                Body::from(body.to_string())
            },
            None => Body::empty(),
        };
        let (status, _, body) = self.send(req.body(body).unwrap()).await;
        (status, body)
    }

    /// Sends a request with the given bearer token.
    pub async fn send_with_token(&self, token: &str, method: Method, path: &str) -> (StatusCode, Value) {
        let req = Request::builder().method(method).uri(path).header("authorization", format!("Bearer {token}"));
        let (status, _, body) = self.send(req.body(Body::empty()).unwrap()).await;
        (status, body)
    }

    /// Sends a request as the given user.
    pub async fn send_as(&self, user: &User, method: Method, path: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(path).header("authorization", format!("Bearer {}", self.token(user)));
        let body = match body {
            Some(body) => {
                req = req.header("content-type", "application/json");
                Body::from(body.to_string())
            },
            None => Body::empty(),
        };
        let (status, _, body) = self.send(req.body(body).unwrap()).await;
        (status, body)
    }
}
