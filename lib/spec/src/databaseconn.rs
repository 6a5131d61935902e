//  DATABASECONN.rs
//
//  Created:
//    18 Oct 2024, 17:38:33
//  Last edited:
//    18 Oct 2026, 11:52:31
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines interfaces to the persistent store that acts as the single
//!   source of truth for users, roles, posts and follow relations.
//

use std::future::Future;

use crate::errors::ClassifiedError;
use crate::models::{Credentials, FeedQuery, NewInvitation, NewPost, NewUser, Post, PostUpdate, Role, User};


/***** LIBRARY *****/
/// Defines how users are read from and written to the backend database.
pub trait UserStore {
    /// The type of errors returned by the store.
    ///
    /// Must classify a missing user as [`ErrorKind::NotFound`](crate::errors::ErrorKind::NotFound).
    type Error: 'static + Send + Sync + ClassifiedError;


    /// Retrieves a user, together with its role.
    ///
    /// # Arguments
    /// - `id`: The ID of the user to retrieve.
    ///
    /// # Returns
    /// The [`User`] with that ID.
    ///
    /// # Errors
    /// This function errors if the user does not exist or the backend failed.
    fn get_user(&self, id: i64) -> impl Send + Future<Output = Result<User, Self::Error>>;

    /// Adds a new user to the database.
    ///
    /// # Arguments
    /// - `user`: The [`NewUser`] to add.
    ///
    /// # Returns
    /// The [`User`] as stored, with its ID and resolved role.
    ///
    /// # Errors
    /// This function errors if the username or email is already taken, the role is unknown or the
    /// backend failed.
    fn create_user(&self, user: NewUser) -> impl Send + Future<Output = Result<User, Self::Error>>;
}



/// Defines how accounts are registered, activated and logged into.
pub trait AccountStore {
    /// The type of errors returned by the store.
    ///
    /// Must classify unknown or expired invitations and unknown credentials as
    /// [`ErrorKind::NotFound`](crate::errors::ErrorKind::NotFound).
    type Error: 'static + Send + Sync + ClassifiedError;


    /// Adds a new user together with its password and an invitation to activate it, atomically.
    ///
    /// # Arguments
    /// - `user`: The [`NewUser`] to add.
    /// - `password_hash`: The PHC string of the user's password.
    /// - `invitation`: The [`NewInvitation`] with which the user may activate their account.
    ///
    /// # Returns
    /// The [`User`] as stored.
    ///
    /// # Errors
    /// This function errors if the username or email is already taken, the role is unknown or the
    /// backend failed. In none of those cases is anything stored.
    fn create_and_invite(&self, user: NewUser, password_hash: String, invitation: NewInvitation) -> impl Send + Future<Output = Result<User, Self::Error>>;

    /// Activates the user invited with the given token, and consumes all of their invitations.
    ///
    /// # Arguments
    /// - `token_hash`: The hash of the token handed out on invitation.
    ///
    /// # Returns
    /// The ID of the activated user.
    ///
    /// # Errors
    /// This function errors if no unexpired invitation has that hash, or the backend failed.
    fn activate(&self, token_hash: String) -> impl Send + Future<Output = Result<i64, Self::Error>>;

    /// Retrieves the credentials of the active user with the given email.
    ///
    /// # Errors
    /// This function errors if there is no active user with that email and a password, or the
    /// backend failed.
    fn get_credentials(&self, email: &str) -> impl Send + Future<Output = Result<Credentials, Self::Error>>;
}



/// Defines how roles are read from the backend database.
pub trait RoleStore {
    /// The type of errors returned by the store.
    type Error: 'static + Send + Sync + ClassifiedError;


    /// Retrieves a role by its name.
    ///
    /// # Arguments
    /// - `name`: The name of the role to retrieve.
    ///
    /// # Returns
    /// The [`Role`] with that name.
    ///
    /// # Errors
    /// This function errors if there is no such role or the backend failed.
    fn get_role_by_name(&self, name: &str) -> impl Send + Future<Output = Result<Role, Self::Error>>;
}



/// Defines how posts are read from and written to the backend database.
pub trait PostStore {
    /// The type of errors returned by the store.
    ///
    /// Must classify missing posts as [`ErrorKind::NotFound`](crate::errors::ErrorKind::NotFound)
    /// and rejected conditional writes as [`ErrorKind::Conflict`](crate::errors::ErrorKind::Conflict).
    type Error: 'static + Send + Sync + ClassifiedError;


    /// Adds a new post. Its version is assigned by the store.
    fn create_post(&self, post: NewPost) -> impl Send + Future<Output = Result<Post, Self::Error>>;

    /// Retrieves a post by ID.
    fn get_post(&self, id: i64) -> impl Send + Future<Output = Result<Post, Self::Error>>;

    /// Conditionally updates a post.
    ///
    /// The update is applied, and the version advanced by exactly one, in a single atomic operation
    /// that only matches if the stored version still equals `expected_version`. Nothing is retried.
    ///
    /// # Arguments
    /// - `update`: The [`PostUpdate`] with the new values.
    /// - `expected_version`: The version the caller last read.
    ///
    /// # Returns
    /// The new version of the post.
    ///
    /// # Errors
    /// This function errors with a conflict if the version has moved on, with not-found if the post
    /// is gone, or with an internal error if the backend failed. In none of those cases has the
    /// write been applied.
    fn update_post(&self, update: PostUpdate, expected_version: i64) -> impl Send + Future<Output = Result<i64, Self::Error>>;

    /// Removes a post.
    fn delete_post(&self, id: i64) -> impl Send + Future<Output = Result<(), Self::Error>>;

    /// Lists one page of the posts of a user and of everyone they follow.
    ///
    /// # Arguments
    /// - `user_id`: The user whose feed to list.
    /// - `query`: A [`FeedQuery`] that filters, orders and pages the posts.
    ///
    /// # Errors
    /// This function errors if the backend failed. An unknown user merely has an empty feed.
    fn get_user_feed(&self, user_id: i64, query: FeedQuery) -> impl Send + Future<Output = Result<Vec<Post>, Self::Error>>;
}



/// Defines how the follow graph is written to the backend database.
pub trait FollowerStore {
    /// The type of errors returned by the store.
    ///
    /// Must classify a duplicate follow as [`ErrorKind::Conflict`](crate::errors::ErrorKind::Conflict).
    type Error: 'static + Send + Sync + ClassifiedError;


    /// Lets `follower_id` follow `user_id`.
    fn follow(&self, follower_id: i64, user_id: i64) -> impl Send + Future<Output = Result<(), Self::Error>>;

    /// Lets `follower_id` stop following `user_id`. Unfollowing someone not followed is a no-op.
    fn unfollow(&self, follower_id: i64, user_id: i64) -> impl Send + Future<Output = Result<(), Self::Error>>;
}
