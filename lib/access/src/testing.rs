//  TESTING.rs
//
//  Created:
//    17 Oct 2026, 18:05:51
//  Last edited:
//    17 Oct 2026, 18:58:20
//  Auto updated?
//    Yes
//
//  Description:
//!   Doubles for the stores and caches that the tests of this crate run
//!   against.
//

use std::collections::HashMap;
use std::future::{ready, Future};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::DateTime;
use specifications::cache::{Cache, CacheKey};
use specifications::errors::{ClassifiedError, ErrorKind};
use specifications::models::{NewUser, Role, User};
use specifications::{RoleStore, UserStore};
use thiserror::Error;


/***** ERRORS *****/
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not there")]
    NotFound,
    #[error("store is down")]
    Down,
}
impl ClassifiedError for StoreError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound => ErrorKind::NotFound,
            Self::Down => ErrorKind::Internal,
        }
    }
}





/***** LIBRARY *****/
pub fn role(name: &str, level: i32) -> Role { Role { id: level.into(), name: name.into(), level, description: String::new() } }

pub fn user(id: i64, role_name: &str, level: i32) -> User {
    User {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        created_at: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        is_active: true,
        role: role(role_name, level),
    }
}



/// A [`UserStore`] and [`RoleStore`] that remembers how often it was asked something.
pub struct CountingUserStore {
    users: Option<HashMap<i64, User>>,
    roles: HashMap<String, Role>,
    calls: AtomicUsize,
}
impl CountingUserStore {
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Some(users.into_iter().map(|u| (u.id, u)).collect()),
            roles: [role("user", 1), role("moderator", 2), role("admin", 3)].into_iter().map(|r| (r.name.clone(), r)).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// A store that fails everything.
    pub fn down() -> Self { Self { users: None, roles: HashMap::new(), calls: AtomicUsize::new(0) } }

    pub fn calls(&self) -> usize { self.calls.load(Ordering::SeqCst) }
}
impl UserStore for CountingUserStore {
    type Error = StoreError;

    fn get_user(&self, id: i64) -> impl Send + Future<Output = Result<User, Self::Error>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ready(match &self.users {
            Some(users) => users.get(&id).cloned().ok_or(StoreError::NotFound),
            None => Err(StoreError::Down),
        })
    }

    fn create_user(&self, _user: NewUser) -> impl Send + Future<Output = Result<User, Self::Error>> { ready(Err(StoreError::Down)) }
}
impl RoleStore for CountingUserStore {
    type Error = StoreError;

    fn get_role_by_name(&self, name: &str) -> impl Send + Future<Output = Result<Role, Self::Error>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ready(match &self.users {
            Some(_) => self.roles.get(name).cloned().ok_or(StoreError::NotFound),
            None => Err(StoreError::Down),
        })
    }
}



/// A [`Cache`] that fails to either read or write.
pub struct BrokenCache {
    reads: bool,
}
impl BrokenCache {
    pub fn reads() -> Self { Self { reads: true } }

    pub fn writes() -> Self { Self { reads: false } }
}
impl Cache for BrokenCache {
    type Error = io::Error;

    fn get(&self, _key: &CacheKey) -> impl Send + Future<Output = Result<Option<Vec<u8>>, Self::Error>> {
        ready(if self.reads { Err(io::Error::new(io::ErrorKind::ConnectionRefused, "cache unreachable")) } else { Ok(None) })
    }

    fn set(&self, _key: &CacheKey, _value: Vec<u8>, _ttl: Duration) -> impl Send + Future<Output = Result<(), Self::Error>> {
        ready(Err(io::Error::new(io::ErrorKind::ConnectionReset, "cache went away")))
    }
}
