//  LIB.rs
//
//  Created:
//    18 Oct 2024, 17:38:02
//  Last edited:
//    18 Oct 2026, 11:52:50
//  Auto updated?
//    Yes
//
//  Description:
//!   Provides public interfaces for things to be compatible with the
//!   social-core library.
//

// Declare modules
pub mod authresolver;
pub mod cache;
pub mod databaseconn;
pub mod errors;
pub mod models;
pub mod ratelimiter;
pub mod server;

// Import some things into the main scope
pub use authresolver::AuthResolver;
pub use cache::Cache;
pub use databaseconn::{AccountStore, FollowerStore, PostStore, RoleStore, UserStore};
pub use errors::{ClassifiedError, ErrorKind};
pub use ratelimiter::RateLimiter;
pub use server::Server;
