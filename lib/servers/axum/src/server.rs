//  SERVER.rs
//
//  Created:
//    23 Oct 2024, 10:28:29
//  Last edited:
//    18 Oct 2026, 15:58:12
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the server itself, and how its routes are put together.
//

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use access_control::{AuthorizationEvaluator, IdentityResolver};
use axum::middleware::from_fn_with_state;
use axum::Router;
use axum_server_spec::{
    ACTIVATE_PATH, CREATE_POST_PATH, DELETE_POST_PATH, FEED_PATH, FOLLOW_PATH, GET_POST_PATH, GET_USER_PATH, HEALTH_PATH, REGISTER_PATH, TOKEN_PATH,
    UNFOLLOW_PATH, UPDATE_POST_PATH,
};
use jwt_auth::JwtIssuer;
use never_say_never::Never;
use specifications::models::Subject;
use specifications::{AccountStore, AuthResolver, Cache, FollowerStore, PostStore, RateLimiter, RoleStore, Server, UserStore};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, info, span, Instrument as _, Level};


/***** ERRORS *****/
/// Defines errors emitted by the [`AxumServer`].
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to bind the listener.
    #[error("Failed to bind server on {addr}")]
    Bind {
        addr: SocketAddr,
        #[source]
        err:  std::io::Error,
    },
    /// The server crashed while serving.
    #[error("Failed to serve on {addr}")]
    Serve {
        addr: SocketAddr,
        #[source]
        err:  std::io::Error,
    },
    /// The server stopped while it was supposed to run forever.
    #[error("Server on {addr} stopped unexpectedly")]
    Stopped { addr: SocketAddr },
}





/***** LIBRARY *****/
/// Defines the [`axum`] [`Server`] that puts admission, authentication, identity resolution and
/// authorization in front of the social API.
///
/// Every request is first counted against its client's budget. Bearer-protected routes then have
/// their token validated and the subject resolved to a user, which handlers receive as an
/// extension. The health route is guarded by basic authentication instead. Registering,
/// activating and logging in need no authentication at all.
pub struct AxumServer<A, B, L, C, D> {
    /// The address on which to bind the server.
    pub(crate) addr:     SocketAddr,
    /// The environment we report to be running in.
    pub(crate) env:      String,
    /// The auth resolver for resolving bearer tokens.
    pub(crate) auth:     A,
    /// The auth resolver guarding the operator routes.
    pub(crate) basic:    B,
    /// Mints the tokens that `auth` accepts.
    pub(crate) issuer:   JwtIssuer,
    /// The rate limiter that decides whether to admit requests at all.
    pub(crate) limiter:  L,
    /// Whether clients are identified by `X-Forwarded-For`/`X-Real-IP` rather than the peer.
    pub(crate) trust_proxy_headers: bool,
    /// Turns authenticated subjects into users.
    pub(crate) identity: IdentityResolver<D, C>,
    /// Decides whether users may touch posts of others.
    pub(crate) authz:    AuthorizationEvaluator<D>,
    /// The backend storing everything.
    pub(crate) data:     D,
}
impl<A, B, L, C, D: Clone> AxumServer<A, B, L, C, D> {
    /// Constructor for the AxumServer.
    ///
    /// # Arguments
    /// - `addr`: The address on which to listen once [`serve()`](AxumServer::serve())ing.
    /// - `env`: The name of the environment the server runs in, reported on health checks.
    /// - `auth`: The [`AuthResolver`] used to authenticate bearer tokens.
    /// - `basic`: The [`AuthResolver`] used to authenticate operators.
    /// - `issuer`: The [`JwtIssuer`] minting tokens that `auth` accepts.
    /// - `limiter`: The [`RateLimiter`] used to admit requests.
    /// - `cache`: The [`Cache`] used to speed up user lookups.
    /// - `data`: The store used to keep users, roles, posts and followers.
    ///
    /// # Returns
    /// A new AxumServer, ready to serve its opponents. It identifies clients by their peer address
    /// only; see [`AxumServer::trust_proxy_headers()`].
    #[inline]
    #[allow(clippy::too_many_arguments)]
    pub fn new(addr: impl Into<SocketAddr>, env: impl Into<String>, auth: A, basic: B, issuer: JwtIssuer, limiter: L, cache: C, data: D) -> Self
    where
        C: Cache,
        D: UserStore + RoleStore,
    {
        Self {
            addr: addr.into(),
            env: env.into(),
            auth,
            basic,
            issuer,
            limiter,
            trust_proxy_headers: false,
            identity: IdentityResolver::new(data.clone(), cache),
            authz: AuthorizationEvaluator::new(data.clone()),
            data,
        }
    }

    /// Sets whether clients are identified by the `X-Forwarded-For` and `X-Real-IP` headers.
    ///
    /// Only enable this when the server sits behind a proxy that sets them.
    #[inline]
    pub fn trust_proxy_headers(mut self, trust: bool) -> Self {
        self.trust_proxy_headers = trust;
        self
    }
}
impl<A, B, L, C, D> AxumServer<A, B, L, C, D>
where
    A: 'static + Send + Sync + AuthResolver<Context = Subject>,
    B: 'static + Send + Sync + AuthResolver,
    B::Context: 'static + Send + Sync + Clone,
    L: 'static + Send + Sync + RateLimiter,
    C: 'static + Send + Sync + Cache,
    D: 'static + Send + Sync + Clone + UserStore + AccountStore + RoleStore + PostStore + FollowerStore,
{
    /// Builds the [`Router`] serving this server's API.
    ///
    /// This is what [`Server::serve()`] runs, but it's useful on its own to drive the API without
    /// binding to a port.
    ///
    /// # Returns
    /// A [`Router`] with all routes and middleware in place.
    pub fn router(self) -> Router {
        let this: Arc<Self> = Arc::new(self);

        debug!("Building axum paths...");
        let protected: Router<Arc<Self>> = Router::new()
            .route(CREATE_POST_PATH.path, CREATE_POST_PATH.handler(Self::create_post))
            .route(GET_POST_PATH.path, GET_POST_PATH.handler(Self::get_post))
            .route(UPDATE_POST_PATH.path, UPDATE_POST_PATH.handler(Self::update_post))
            .route(DELETE_POST_PATH.path, DELETE_POST_PATH.handler(Self::delete_post))
            .route(FEED_PATH.path, FEED_PATH.handler(Self::feed))
            .route(GET_USER_PATH.path, GET_USER_PATH.handler(Self::get_user))
            .route(FOLLOW_PATH.path, FOLLOW_PATH.handler(Self::follow))
            .route(UNFOLLOW_PATH.path, UNFOLLOW_PATH.handler(Self::unfollow))
            .route_layer(from_fn_with_state(this.clone(), Self::authenticate));
        let operator: Router<Arc<Self>> = Router::new()
            .route(HEALTH_PATH.path, HEALTH_PATH.handler(Self::health))
            .route_layer(from_fn_with_state(this.clone(), Self::authenticate_operator));
        let public: Router<Arc<Self>> = Router::new()
            .route(REGISTER_PATH.path, REGISTER_PATH.handler(Self::register))
            .route(TOKEN_PATH.path, TOKEN_PATH.handler(Self::create_token))
            .route(ACTIVATE_PATH.path, ACTIVATE_PATH.handler(Self::activate));

        // Admission goes around everything, including routes that don't exist
        protected.merge(operator).merge(public).layer(from_fn_with_state(this.clone(), Self::admit)).with_state(this)
    }
}
impl<A, B, L, C, D> Server for AxumServer<A, B, L, C, D>
where
    A: 'static + Send + Sync + AuthResolver<Context = Subject>,
    B: 'static + Send + Sync + AuthResolver,
    B::Context: 'static + Send + Sync + Clone,
    L: 'static + Send + Sync + RateLimiter,
    C: 'static + Send + Sync + Cache,
    D: 'static + Send + Sync + Clone + UserStore + AccountStore + RoleStore + PostStore + FollowerStore,
{
    type Error = Error;

    fn serve(self) -> impl Future<Output = Result<Never, Self::Error>> {
        let addr: SocketAddr = self.addr;
        async move {
            self.serve_until(std::future::pending()).await?;
            Err(Error::Stopped { addr })
        }
    }

    fn serve_until<F>(self, shutdown: F) -> impl Future<Output = Result<(), Self::Error>>
    where
        F: 'static + Send + Future<Output = ()>,
    {
        let addr: SocketAddr = self.addr;
        async move {
            let router: Router = self.router();

            debug!("Binding server on {addr}...");
            let listener: TcpListener = TcpListener::bind(addr).await.map_err(|err| Error::Bind { addr, err })?;

            info!("Now serving on {addr}");
            axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>())
                .with_graceful_shutdown(shutdown)
                .await
                .map_err(|err| Error::Serve { addr, err })?;
            info!("Server on {addr} stopped");
            Ok(())
        }
        .instrument(span!(Level::INFO, "AxumServer::serve", addr = %addr))
    }
}
