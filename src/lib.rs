//  LIB.rs
//
//  Created:
//    18 Oct 2024, 17:31:50
//  Last edited:
//    17 Oct 2026, 10:12:41
//  Auto updated?
//    Yes
//
//  Description:
//!   Request admission and consistency control for a social-networking
//!   backend: rate limiting, token authentication, cache-aside identity
//!   resolution, role-hierarchy authorization and optimistic concurrency
//!   control over posts.
//

// Import the libraries
pub mod servers {
    #[cfg(feature = "axum-server")]
    pub use axum_server as axum;
}

pub mod auth {
    #[cfg(feature = "basic-auth")]
    pub use basic_auth as basic;
    #[cfg(feature = "jwt-auth")]
    pub use jwt_auth as jwt;
}

pub mod limiters {
    #[cfg(feature = "fixed-window-limiter")]
    pub use fixed_window_limiter as fixed_window;
}

pub mod caches {
    #[cfg(feature = "memory-cache")]
    pub use memory_cache as memory;
    #[cfg(feature = "no-op-cache")]
    pub use no_op_cache as no_op;
    #[cfg(feature = "redis-cache")]
    pub use redis_cache as redis;
}

#[cfg(feature = "access")]
pub use access_control as access;

pub mod databases {
    #[cfg(feature = "sqlite-database")]
    pub use sqlite_database as sqlite;
}

pub use specifications as spec;
