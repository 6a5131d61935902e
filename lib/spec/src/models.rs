//  MODELS.rs
//
//  Created:
//    18 Oct 2024, 17:50:16
//  Last edited:
//    18 Oct 2026, 11:44:18
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the records that the admission path inspects: users, their
//!   roles, posts and follow relations. Also defines what is needed to
//!   register users and to page through their feed.
//

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};


/***** CONSTANTS *****/
/// The name of the role that every new user gets.
pub const USER_ROLE: &str = "user";
/// The name of the role needed to edit other people's posts.
pub const MODERATOR_ROLE: &str = "moderator";
/// The name of the role needed to delete other people's posts.
pub const ADMIN_ROLE: &str = "admin";

/// The largest page of a feed, which is also the default page size.
pub const MAX_FEED_LIMIT: i64 = 20;





/***** LIBRARY *****/
/// The identity extracted from a verified credential, before it has been resolved to a [`User`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Subject {
    /// The ID of the user the credential was issued to.
    pub id: i64,
}



/// A role that users can have.
///
/// Roles are totally ordered by their `level`; a higher level implies every permission of the lower
/// levels.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Role {
    pub id: i64,
    /// The name by which the role is looked up.
    pub name: String,
    /// The position of this role in the hierarchy.
    pub level: i32,
    pub description: String,
}



/// A resolved user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    /// Whether the user has activated their account.
    pub is_active: bool,
    /// The role of this user, embedded.
    pub role: Role,
}

/// What the store knows about a user that may log in.
#[derive(Clone, Debug)]
pub struct Credentials {
    pub user: User,
    /// The PHC string of the user's password.
    pub password_hash: String,
}

/// An invitation that activates the user it is stored with.
#[derive(Clone, Debug)]
pub struct NewInvitation {
    /// Hash of the token handed out to the user. The token itself is never stored.
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

/// What is needed to create a new [`User`].
#[derive(Clone, Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub is_active: bool,
    /// The name of the [`Role`] to give this user.
    pub role: String,
}



/// A post written by a user.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// The ID of the user owning this post.
    pub user_id: i64,
    pub tags: Vec<String>,
    /// Advanced by exactly one on every successful mutation.
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What is needed to create a new [`Post`].
#[derive(Clone, Debug)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub user_id: i64,
    pub tags: Vec<String>,
}

/// The new values of the mutable fields of a [`Post`].
#[derive(Clone, Debug)]
pub struct PostUpdate {
    /// The post to update.
    pub id: i64,
    pub title: String,
    pub content: String,
}



/// A follow relation between two users.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Follower {
    /// The user being followed.
    pub user_id: i64,
    /// The user doing the following.
    pub follower_id: i64,
    pub created_at: DateTime<Utc>,
}



/// The order in which a feed lists posts, by creation time.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Selects one page of a user's feed.
///
/// A feed consists of the posts of the user themselves and of everyone they follow.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FeedQuery {
    /// At most [`MAX_FEED_LIMIT`].
    pub limit: i64,
    pub offset: i64,
    pub sort: SortOrder,
    /// Posts must carry all of these tags.
    pub tags: Vec<String>,
    /// Posts must contain this in their title or content.
    pub search: Option<String>,
    /// Posts must be created at or after this time.
    pub since: Option<DateTime<Utc>>,
    /// Posts must be created at or before this time.
    pub until: Option<DateTime<Utc>>,
}
impl Default for FeedQuery {
    #[inline]
    fn default() -> Self {
        Self { limit: MAX_FEED_LIMIT, offset: 0, sort: SortOrder::Desc, tags: Vec::new(), search: None, since: None, until: None }
    }
}
