//  LIB.rs
//
//  Created:
//    22 Oct 2024, 14:37:34
//  Last edited:
//    17 Oct 2026, 19:02:18
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the user, role, post and follower stores for an SQLite
//!   backend, including optimistically concurrent post updates.
//

// Declare modules
mod databaseconn;
mod models;
mod schema;

// Import some of it
pub use databaseconn::*;
