//  MODELS.rs
//
//  Created:
//    05 Nov 2024, 12:10:56
//  Last edited:
//    18 Oct 2026, 12:06:14
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the rows as they live in the SQLite database.
//

use chrono::NaiveDateTime;
use diesel::prelude::*;
use specifications::models::{Follower, Post, Role, User};

use crate::schema::{followers, posts, roles, user_invitations, users};


/***** LIBRARY *****/
#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name = roles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteRole {
    pub id:          i64,
    pub name:        String,
    pub level:       i32,
    pub description: String,
}
impl From<SqliteRole> for Role {
    #[inline]
    fn from(value: SqliteRole) -> Self { Self { id: value.id, name: value.name, level: value.level, description: value.description } }
}



#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteUser {
    pub id:         i64,
    pub username:   String,
    pub email:      String,
    pub created_at: NaiveDateTime,
    pub is_active:  bool,
    pub role_id:    i64,
}
impl SqliteUser {
    /// Combines this row with the row of its role.
    #[inline]
    pub fn with_role(self, role: SqliteRole) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            created_at: self.created_at.and_utc(),
            is_active: self.is_active,
            role: role.into(),
        }
    }
}

#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewSqliteUser<'a> {
    pub username:   &'a str,
    pub email:      &'a str,
    pub created_at: NaiveDateTime,
    pub is_active:  bool,
    pub role_id:    i64,
    /// PHC string of the password, if the user may log in.
    pub password:   Option<&'a str>,
}



/// An invitation to activate a user, keyed by the hash of its token.
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = user_invitations)]
pub struct NewSqliteInvitation<'a> {
    pub token:   &'a str,
    pub user_id: i64,
    pub expiry:  NaiveDateTime,
}



#[derive(Clone, Debug, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqlitePost {
    pub id:         i64,
    pub title:      String,
    pub content:    String,
    pub user_id:    i64,
    /// JSON-encoded list of strings.
    pub tags:       String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub version:    i64,
}
impl SqlitePost {
    /// Converts this row into a [`Post`].
    ///
    /// # Errors
    /// This function errors if the tags are not a JSON list of strings.
    pub fn into_post(self) -> Result<Post, serde_json::Error> {
        Ok(Post {
            id: self.id,
            title: self.title,
            content: self.content,
            user_id: self.user_id,
            tags: serde_json::from_str(&self.tags)?,
            version: self.version,
            created_at: self.created_at.and_utc(),
            updated_at: self.updated_at.and_utc(),
        })
    }
}

/// A new post. Its version is left to the database.
#[derive(Clone, Debug, Insertable)]
#[diesel(table_name = posts)]
pub struct NewSqlitePost<'a> {
    pub title:      &'a str,
    pub content:    &'a str,
    pub user_id:    i64,
    pub tags:       String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}



#[derive(Clone, Debug, Insertable, Queryable, Selectable)]
#[diesel(table_name = followers)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SqliteFollower {
    pub user_id:     i64,
    pub follower_id: i64,
    pub created_at:  NaiveDateTime,
}
impl From<SqliteFollower> for Follower {
    #[inline]
    fn from(value: SqliteFollower) -> Self { Self { user_id: value.user_id, follower_id: value.follower_id, created_at: value.created_at.and_utc() } }
}
