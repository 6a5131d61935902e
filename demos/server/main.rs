//  MAIN.rs
//
//  Created:
//    24 Oct 2024, 13:55:22
//  Last edited:
//    18 Oct 2026, 18:40:19
//  Auto updated?
//    Yes
//
//  Description:
//!   Runs the social API on a SQLite database, with or without a Redis
//!   cache in front of user lookups.
//

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Parser};
use error_trace::trace;
use social_core::auth::basic::{BasicAuthConfig, BasicResolver};
use social_core::auth::jwt::{JwtIssuer, JwtResolver, TokenConfig, DEFAULT_ISSUER};
use social_core::caches::no_op::NoOpCache;
use social_core::caches::redis::{RedisCache, RedisCacheConfig, DEFAULT_URL};
use social_core::databases::sqlite::{DatabaseConfig, SQLiteDatabase};
use social_core::limiters::fixed_window::{FixedWindowLimiter, RateLimitConfig};
use social_core::servers::axum::AxumServer;
use social_core::spec::{Cache, Server as _};
use tokio::signal::unix::{signal, SignalKind};
use tracing::level_filters::LevelFilter;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::EnvFilter;


/***** ARGUMENTS *****/
/// Defines the arguments for this binary.
#[derive(Debug, Parser)]
struct Arguments {
    /// Whether to enable DEBUG-level logging.
    #[clap(long)]
    debug: bool,
    /// Whether to enable TRACE-level logging. Implies '--debug'.
    #[clap(long)]
    trace: bool,

    /// The address/port on which to bind the server.
    #[clap(short, long, env = "ADDR", default_value = "127.0.0.1:8080")]
    address:  SocketAddr,
    /// The environment to report on health checks.
    #[clap(long, env = "ENV", default_value = "development")]
    env:      String,
    /// The path to the database file to create/use.
    #[clap(short, long, env = "DB_ADDR", default_value = "./social.db")]
    database: PathBuf,

    /// The secret with which bearer tokens are signed.
    #[clap(long, env = "TOKEN_SECRET", hide_env_values = true)]
    token_secret:   String,
    /// The issuer bearer tokens must name.
    #[clap(long, env = "TOKEN_ISS", default_value = DEFAULT_ISSUER)]
    token_issuer:   String,
    /// The audience bearer tokens must name.
    #[clap(long, env = "TOKEN_AUD", default_value = DEFAULT_ISSUER)]
    token_audience: String,
    /// How long issued bearer tokens last, in seconds.
    #[clap(long, env = "TOKEN_EXP", default_value_t = 3 * 24 * 60 * 60)]
    token_expiry:   u64,

    /// The username of the operator allowed to check health.
    #[clap(long, env = "BASIC_AUTH_USER", default_value = "admin")]
    basic_user:     String,
    /// The password of the operator allowed to check health.
    #[clap(long, env = "BASIC_AUTH_PASSWORD", hide_env_values = true)]
    basic_password: String,

    /// Whether to rate limit clients.
    #[clap(long, env = "RATE_LIMITER_ENABLED", default_value_t = false, action = ArgAction::Set)]
    rate_limit:          bool,
    /// How many requests a client may make per window.
    #[clap(long, env = "RATE_LIMITER_REQUESTS_PER_TIME_FRAME", default_value_t = 20)]
    rate_limit_requests: u32,
    /// How long a rate limiting window lasts, in seconds.
    #[clap(long, env = "RATE_LIMITER_TIME_FRAME", default_value_t = 5)]
    rate_limit_window:   u64,
    /// Whether to tell clients apart by `X-Forwarded-For`/`X-Real-IP`. Only enable behind a proxy
    /// that sets them.
    #[clap(long, env = "TRUST_PROXY_HEADERS", default_value_t = false, action = ArgAction::Set)]
    trust_proxy_headers: bool,

    /// Whether to cache users in Redis.
    #[clap(long, env = "REDIS_ENABLED", default_value_t = false, action = ArgAction::Set)]
    redis:      bool,
    /// Where to find Redis.
    #[clap(long, env = "REDIS_ADDR", default_value = DEFAULT_URL)]
    redis_addr:     String,
    /// The password of Redis, if not in the address.
    #[clap(long, env = "REDIS_PW", default_value = "", hide_env_values = true)]
    redis_password: String,
    /// The Redis database to use.
    #[clap(long, env = "REDIS_DB", default_value_t = 0)]
    redis_db:       i64,
}





/***** HELPER FUNCTIONS *****/
/// Waits until we are asked to stop.
async fn shutdown_signal() {
    tokio::select! {
        _ = async move {
            match signal(SignalKind::interrupt()) {
                Ok(mut sign) => sign.recv().await,
                Err(err) => {
                    warn!("{}", trace!(("Failed to register SIGINT signal handler"), err));
                    warn!("Graceful shutdown by Ctrl+C disabled");
                    std::future::pending().await
                },
            }
        } => {
            debug!("Received SIGINT");
        },
        _ = async move {
            match signal(SignalKind::terminate()) {
                Ok(mut sign) => sign.recv().await,
                Err(err) => {
                    warn!("{}", trace!(("Failed to register SIGTERM signal handler"), err));
                    warn!("Graceful shutdown by Docker disabled");
                    std::future::pending().await
                },
            }
        } => {
            debug!("Received SIGTERM");
        },
    }
}

/// Serves the API with the given cache until we're told to stop.
async fn serve<C: 'static + Send + Sync + Cache>(args: &Arguments, cache: C, db: SQLiteDatabase) {
    let tokens = TokenConfig {
        secret:   args.token_secret.clone(),
        issuer:   args.token_issuer.clone(),
        audience: args.token_audience.clone(),
        expiry:   Duration::from_secs(args.token_expiry),
    };
    let (auth, issuer) = match JwtResolver::new(&tokens).and_then(|auth| Ok((auth, JwtIssuer::new(&tokens)?))) {
        Ok(pair) => pair,
        Err(err) => {
            error!("{}", trace!(("Failed to configure bearer authentication"), err));
            std::process::exit(1);
        },
    };
    let basic = BasicResolver::new(BasicAuthConfig { username: args.basic_user.clone(), password: args.basic_password.clone() });
    let limits =
        RateLimitConfig { requests_per_window: args.rate_limit_requests, window: Duration::from_secs(args.rate_limit_window), enabled: args.rate_limit };
    let limiter = match FixedWindowLimiter::new(limits) {
        Ok(limiter) => limiter,
        Err(err) => {
            error!("{}", trace!(("Failed to configure rate limiting"), err));
            std::process::exit(1);
        },
    };

    // OK, setup the server
    let server = AxumServer::new(args.address, args.env.clone(), auth, basic, issuer, limiter, cache, db).trust_proxy_headers(args.trust_proxy_headers);
    match server.serve_until(shutdown_signal()).await {
        Ok(()) => info!("Done"),
        Err(err) => {
            error!("{}", trace!(("Failed to serve the server"), err));
            std::process::exit(1);
        },
    }
}





/***** ENTRYPOINT *****/
#[tokio::main]
async fn main() {
    // Parse the arguments
    let args = Arguments::parse();

    // Setup the logger
    let level: Level = if args.trace {
        Level::TRACE
    } else if args.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt().with_env_filter(EnvFilter::builder().with_default_directive(LevelFilter::from_level(level).into()).from_env_lossy()).init();
    info!("{} - v{}", env!("CARGO_CRATE_NAME"), env!("CARGO_PKG_VERSION"));

    // Setup the database
    let db = match SQLiteDatabase::new(&args.database, DatabaseConfig::default()).await {
        Ok(db) => db,
        Err(err) => {
            error!("{}", trace!(("Failed to create database connector"), err));
            std::process::exit(1);
        },
    };

    // The cache is picked once; everything after is generic over it
    if args.redis {
        let config = RedisCacheConfig {
            url: args.redis_addr.clone(),
            password: Some(args.redis_password.clone()),
            db: args.redis_db,
            ..Default::default()
        };
        match RedisCache::new(&config) {
            Ok(cache) => serve(&args, cache, db).await,
            Err(err) => {
                error!("{}", trace!(("Failed to connect to Redis"), err));
                std::process::exit(1);
            },
        }
    } else {
        info!("Running without a user cache");
        serve(&args, NoOpCache::new(), db).await
    }
}
