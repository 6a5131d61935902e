//  DATABASECONN.rs
//
//  Created:
//    22 Oct 2024, 14:37:56
//  Last edited:
//    18 Oct 2026, 12:41:55
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the actual stores on top of a pool of SQLite connections.
//

use std::error::Error;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use deadpool_diesel::sqlite::{BuildError, Manager, Pool, PoolError};
use deadpool_diesel::Runtime;
use diesel::connection::SimpleConnection as _;
use diesel::expression_methods::{BoolExpressionMethods as _, EscapeExpressionMethods as _, TextExpressionMethods as _};
use diesel::result::DatabaseErrorKind;
use diesel::{ExpressionMethods as _, OptionalExtension as _, QueryDsl as _, RunQueryDsl as _, SelectableHelper as _, SqliteConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness as _};
use specifications::errors::{ClassifiedError, ErrorKind};
use specifications::models::{Credentials, FeedQuery, Follower, NewInvitation, NewPost, NewUser, Post, PostUpdate, Role, SortOrder, User};
use specifications::{AccountStore, FollowerStore, PostStore, RoleStore, UserStore};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, span, Instrument as _, Level};

use crate::models::{NewSqliteInvitation, NewSqlitePost, NewSqliteUser, SqliteFollower, SqlitePost, SqliteRole, SqliteUser};


/***** CONSTANTS *****/
/// The migrations that create (and seed) the schema.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Escapes wildcards in `LIKE` patterns.
const LIKE_ESCAPE: char = '\\';

/// Executed on every connection before it is used.
const CONNECTION_PRAGMAS: &str = "PRAGMA busy_timeout = 5000; PRAGMA foreign_keys = ON;";





/***** ERRORS *****/
/// Defines errors originating from the [`SQLiteDatabase`].
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Failed to build the connection pool.
    #[error("Failed to create connection pool for backend database {:?}", path.display())]
    PoolBuild {
        path: PathBuf,
        #[source]
        err:  BuildError,
    },
    /// Failed to get a connection from the pool.
    #[error("Failed to connect to backend database {:?}", path.display())]
    Connect {
        path: PathBuf,
        #[source]
        err:  PoolError,
    },
    /// The blocking worker running a query panicked or was aborted.
    #[error("Failed to {op} in backend database {:?}: worker failed: {msg}", path.display())]
    Interact { path: PathBuf, op: &'static str, msg: String },
    /// The operation did not complete in time. It may still commit.
    #[error("Timed out after {}ms trying to {op} in backend database {:?}", timeout.as_millis(), path.display())]
    Timeout { path: PathBuf, op: &'static str, timeout: Duration },
    /// Failed to apply the embedded migrations.
    #[error("Failed to apply migrations to backend database {:?}", path.display())]
    Migrate {
        path: PathBuf,
        #[source]
        err:  Box<dyn 'static + Send + Sync + Error>,
    },
    /// Failed to prepare a connection.
    #[error("Failed to set connection pragmas")]
    Pragma {
        #[source]
        err: diesel::result::Error,
    },
    /// A query failed for another reason than the ones below.
    #[error("Failed to {op}")]
    Query {
        op:  &'static str,
        #[source]
        err: diesel::result::Error,
    },
    /// The tags of a post could not be (de)serialized.
    #[error("Failed to (de)serialize tags of post")]
    Tags {
        #[source]
        err: serde_json::Error,
    },

    /// The requested user does not exist.
    #[error("User {id} not found")]
    UserNotFound { id: i64 },
    /// The requested role does not exist.
    #[error("Role {name:?} not found")]
    RoleNotFound { name: String },
    /// The requested post does not exist.
    #[error("Post {id} not found")]
    PostNotFound { id: i64 },
    /// No unexpired invitation matches the given token.
    #[error("No pending invitation matches the given token")]
    InvitationNotFound,
    /// No active user with a password has the given email.
    #[error("No active user with email {email:?} may log in")]
    CredentialsNotFound { email: String },

    /// A conditional update found another version than expected.
    #[error("Post {id} is at version {actual}, not the expected version {expected}")]
    VersionConflict { id: i64, expected: i64, actual: i64 },
    /// A username or email is already taken.
    #[error("Username {username:?} or email {email:?} is already taken")]
    DuplicateUser { username: String, email: String },
    /// The follow relation already exists.
    #[error("User {follower_id} already follows user {user_id}")]
    AlreadyFollowing { follower_id: i64, user_id: i64 },
    /// A user attempted to follow themselves.
    #[error("User {id} cannot follow themselves")]
    SelfFollow { id: i64 },
}
impl ClassifiedError for DatabaseError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::UserNotFound { .. }
            | Self::RoleNotFound { .. }
            | Self::PostNotFound { .. }
            | Self::InvitationNotFound
            | Self::CredentialsNotFound { .. } => ErrorKind::NotFound,
            Self::VersionConflict { .. } | Self::DuplicateUser { .. } | Self::AlreadyFollowing { .. } | Self::SelfFollow { .. } => ErrorKind::Conflict,
            Self::PoolBuild { .. }
            | Self::Connect { .. }
            | Self::Interact { .. }
            | Self::Timeout { .. }
            | Self::Migrate { .. }
            | Self::Pragma { .. }
            | Self::Query { .. }
            | Self::Tags { .. } => ErrorKind::Internal,
        }
    }
}
// Note: only used by transactions, for failing to begin or commit them
impl From<diesel::result::Error> for DatabaseError {
    #[inline]
    fn from(value: diesel::result::Error) -> Self { Self::Query { op: "run transaction", err: value } }
}





/***** AUXILLARY *****/
/// Configures the [`SQLiteDatabase`].
#[derive(Clone, Copy, Debug)]
pub struct DatabaseConfig {
    /// The maximum number of pooled connections.
    pub pool_size:  usize,
    /// How long a single store operation may take, including waiting for a connection.
    pub op_timeout: Duration,
}
impl Default for DatabaseConfig {
    #[inline]
    fn default() -> Self { Self { pool_size: 8, op_timeout: Duration::from_secs(5) } }
}





/***** HELPER FUNCTIONS *****/
#[inline]
fn now() -> NaiveDateTime { Utc::now().naive_utc() }

/// Retrieves a user joined with its role.
fn load_user(conn: &mut SqliteConnection, id: i64) -> Result<User, DatabaseError> {
    use crate::schema::{roles, users};

    users::table
        .inner_join(roles::table)
        .filter(users::id.eq(id))
        .select((SqliteUser::as_select(), SqliteRole::as_select()))
        .first::<(SqliteUser, SqliteRole)>(conn)
        .optional()
        .map_err(|err| DatabaseError::Query { op: "get user", err })?
        .map(|(user, role)| user.with_role(role))
        .ok_or(DatabaseError::UserNotFound { id })
}

/// Inserts a user with the role of the given name. Must run in a transaction.
fn insert_user(conn: &mut SqliteConnection, user: &NewUser, password: Option<&str>) -> Result<User, DatabaseError> {
    use crate::schema::{roles, users};

    let role: SqliteRole = roles::table
        .filter(roles::name.eq(&user.role))
        .select(SqliteRole::as_select())
        .first(conn)
        .optional()
        .map_err(|err| DatabaseError::Query { op: "get role", err })?
        .ok_or_else(|| DatabaseError::RoleNotFound { name: user.role.clone() })?;

    let model =
        NewSqliteUser { username: &user.username, email: &user.email, created_at: now(), is_active: user.is_active, role_id: role.id, password };
    let row: SqliteUser =
        diesel::insert_into(users::table).values(&model).returning(SqliteUser::as_returning()).get_result(conn).map_err(|err| match err {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                DatabaseError::DuplicateUser { username: user.username.clone(), email: user.email.clone() }
            },
            err => DatabaseError::Query { op: "insert user", err },
        })?;
    debug!("Created user {} with role {:?}", row.id, role.name);
    Ok(row.with_role(role))
}

/// Makes `LIKE` treat every character of `value` literally.
fn escape_like(value: &str) -> String {
    let mut res = String::with_capacity(value.len());
    for c in value.chars() {
        if c == LIKE_ESCAPE || c == '%' || c == '_' {
            res.push(LIKE_ESCAPE);
        }
        res.push(c);
    }
    res
}

/// Retrieves a single post.
fn load_post(conn: &mut SqliteConnection, id: i64) -> Result<Post, DatabaseError> {
    use crate::schema::posts;

    posts::table
        .find(id)
        .select(SqlitePost::as_select())
        .first(conn)
        .optional()
        .map_err(|err| DatabaseError::Query { op: "get post", err })?
        .ok_or(DatabaseError::PostNotFound { id })?
        .into_post()
        .map_err(|err| DatabaseError::Tags { err })
}





/***** LIBRARY *****/
/// The persistent store, backed by an SQLite file.
///
/// Implements [`UserStore`], [`RoleStore`], [`PostStore`] and [`FollowerStore`]. Every operation
/// runs on a blocking worker of the pool and is bounded by the configured timeout.
#[derive(Clone)]
pub struct SQLiteDatabase {
    /// The path to the file that we represent. Only retained during runtime for debugging.
    path:       PathBuf,
    /// The pool of connections.
    pool:       Pool,
    op_timeout: Duration,
}
impl SQLiteDatabase {
    /// Opens (or creates) the database at the given path and brings its schema up-to-date.
    ///
    /// # Arguments
    /// - `path`: The path to the SQLite file.
    /// - `config`: A [`DatabaseConfig`] with pool and timeout settings.
    ///
    /// # Returns
    /// A new SQLiteDatabase, ready to serve.
    ///
    /// # Errors
    /// This function errors if the pool could not be built or the migrations failed to apply.
    pub async fn new(path: impl Into<PathBuf>, config: DatabaseConfig) -> Result<Self, DatabaseError> {
        let path: PathBuf = path.into();
        let span = span!(Level::INFO, "SQLiteDatabase::new", path = %path.display());
        async move {
            debug!("Creating connection pool of {} connection(s)...", config.pool_size);
            let manager = Manager::new(path.to_string_lossy(), Runtime::Tokio1);
            let pool: Pool =
                Pool::builder(manager).max_size(config.pool_size).build().map_err(|err| DatabaseError::PoolBuild { path: path.clone(), err })?;
            let this = Self { path, pool, op_timeout: config.op_timeout };

            // WAL is a property of the file, so it only needs setting once
            let mpath: PathBuf = this.path.clone();
            let applied: usize = this
                .interact("apply migrations", move |conn| {
                    conn.batch_execute("PRAGMA journal_mode = WAL;").map_err(|err| DatabaseError::Pragma { err })?;
                    conn.run_pending_migrations(MIGRATIONS).map(|versions| versions.len()).map_err(|err| DatabaseError::Migrate { path: mpath, err })
                })
                .await?;
            info!("Opened SQLite database {:?} ({applied} migration(s) applied)", this.path.display());
            Ok(this)
        }
        .instrument(span)
        .await
    }

    /// Returns the path of the backing file.
    #[inline]
    pub fn path(&self) -> &Path { &self.path }

    /// Lists who follows the given user.
    ///
    /// # Errors
    /// This function errors if the backend failed.
    pub async fn get_followers(&self, user_id: i64) -> Result<Vec<Follower>, DatabaseError> {
        use crate::schema::followers;

        self.interact("get followers", move |conn| {
            followers::table
                .filter(followers::user_id.eq(user_id))
                .order_by(followers::follower_id.asc())
                .select(SqliteFollower::as_select())
                .load(conn)
                .map(|rows| rows.into_iter().map(Follower::from).collect())
                .map_err(|err| DatabaseError::Query { op: "get followers", err })
        })
        .await
    }

    /// Runs the given closure on a pooled connection, on a blocking worker, within the timeout.
    ///
    /// # Arguments
    /// - `op`: A short description of what happens, for errors.
    /// - `work`: The closure to run.
    ///
    /// # Errors
    /// This function errors if no connection could be obtained, the worker failed, the operation
    /// timed out, or `work` itself errored.
    async fn interact<T, F>(&self, op: &'static str, work: F) -> Result<T, DatabaseError>
    where
        T: 'static + Send,
        F: 'static + Send + FnOnce(&mut SqliteConnection) -> Result<T, DatabaseError>,
    {
        let run = async {
            let conn = self.pool.get().await.map_err(|err| DatabaseError::Connect { path: self.path.clone(), err })?;
            match conn
                .interact(move |conn| {
                    conn.batch_execute(CONNECTION_PRAGMAS).map_err(|err| DatabaseError::Pragma { err })?;
                    work(conn)
                })
                .await
            {
                Ok(res) => res,
                Err(err) => Err(DatabaseError::Interact { path: self.path.clone(), op, msg: err.to_string() }),
            }
        };

        let res = timeout(self.op_timeout, run).await;
        match res {
            Ok(res) => res,
            Err(_) => Err(DatabaseError::Timeout { path: self.path.clone(), op, timeout: self.op_timeout }),
        }
    }
}

impl UserStore for SQLiteDatabase {
    type Error = DatabaseError;

    fn get_user(&self, id: i64) -> impl Send + Future<Output = Result<User, Self::Error>> {
        self.interact("get user", move |conn| load_user(conn, id)).instrument(span!(Level::DEBUG, "SQLiteDatabase::get_user", user = id))
    }

    fn create_user(&self, user: NewUser) -> impl Send + Future<Output = Result<User, Self::Error>> {
        let span = span!(Level::INFO, "SQLiteDatabase::create_user", username = %user.username);
        self.interact("create user", move |conn| conn.immediate_transaction(|conn| insert_user(conn, &user, None))).instrument(span)
    }
}

impl AccountStore for SQLiteDatabase {
    type Error = DatabaseError;

    fn create_and_invite(&self, user: NewUser, password_hash: String, invitation: NewInvitation) -> impl Send + Future<Output = Result<User, Self::Error>> {
        use crate::schema::user_invitations;

        let span = span!(Level::INFO, "SQLiteDatabase::create_and_invite", username = %user.username);
        self.interact("create and invite user", move |conn| {
            conn.immediate_transaction(|conn| {
                let created: User = insert_user(conn, &user, Some(&password_hash))?;
                let model = NewSqliteInvitation { token: &invitation.token_hash, user_id: created.id, expiry: invitation.expires_at.naive_utc() };
                diesel::insert_into(user_invitations::table)
                    .values(&model)
                    .execute(conn)
                    .map_err(|err| DatabaseError::Query { op: "insert invitation", err })?;
                debug!("Invited user {} until {}", created.id, invitation.expires_at);
                Ok(created)
            })
        })
        .instrument(span)
    }

    fn activate(&self, token_hash: String) -> impl Send + Future<Output = Result<i64, Self::Error>> {
        use crate::schema::{user_invitations, users};

        self.interact("activate user", move |conn| {
            conn.immediate_transaction(|conn| {
                let user_id: i64 = user_invitations::table
                    .filter(user_invitations::token.eq(&token_hash))
                    .filter(user_invitations::expiry.gt(now()))
                    .select(user_invitations::user_id)
                    .first(conn)
                    .optional()
                    .map_err(|err| DatabaseError::Query { op: "get invitation", err })?
                    .ok_or(DatabaseError::InvitationNotFound)?;

                diesel::update(users::table.find(user_id))
                    .set(users::is_active.eq(true))
                    .execute(conn)
                    .map_err(|err| DatabaseError::Query { op: "activate user", err })?;
                diesel::delete(user_invitations::table.filter(user_invitations::user_id.eq(user_id)))
                    .execute(conn)
                    .map_err(|err| DatabaseError::Query { op: "delete invitations", err })?;
                debug!("Activated user {user_id}");
                Ok(user_id)
            })
        })
        .instrument(span!(Level::INFO, "SQLiteDatabase::activate"))
    }

    fn get_credentials(&self, email: &str) -> impl Send + Future<Output = Result<Credentials, Self::Error>> {
        use crate::schema::{roles, users};

        let email: String = email.into();
        self.interact("get credentials", move |conn| {
            let row: Option<(SqliteUser, SqliteRole, Option<String>)> = users::table
                .inner_join(roles::table)
                .filter(users::email.eq(&email))
                .filter(users::is_active.eq(true))
                .select((SqliteUser::as_select(), SqliteRole::as_select(), users::password))
                .first(conn)
                .optional()
                .map_err(|err| DatabaseError::Query { op: "get credentials", err })?;
            match row {
                Some((user, role, Some(password_hash))) => Ok(Credentials { user: user.with_role(role), password_hash }),
                _ => Err(DatabaseError::CredentialsNotFound { email }),
            }
        })
        .instrument(span!(Level::DEBUG, "SQLiteDatabase::get_credentials"))
    }
}

impl RoleStore for SQLiteDatabase {
    type Error = DatabaseError;

    fn get_role_by_name(&self, name: &str) -> impl Send + Future<Output = Result<Role, Self::Error>> {
        use crate::schema::roles;

        let name: String = name.into();
        self.interact("get role", move |conn| {
            let row: Option<SqliteRole> = roles::table
                .filter(roles::name.eq(&name))
                .select(SqliteRole::as_select())
                .first(conn)
                .optional()
                .map_err(|err| DatabaseError::Query { op: "get role", err })?;
            row.map(Role::from).ok_or(DatabaseError::RoleNotFound { name })
        })
        .instrument(span!(Level::DEBUG, "SQLiteDatabase::get_role_by_name"))
    }
}

impl PostStore for SQLiteDatabase {
    type Error = DatabaseError;

    fn create_post(&self, post: NewPost) -> impl Send + Future<Output = Result<Post, Self::Error>> {
        use crate::schema::posts;

        let span = span!(Level::INFO, "SQLiteDatabase::create_post", user = post.user_id);
        self.interact("create post", move |conn| {
            let tags: String = serde_json::to_string(&post.tags).map_err(|err| DatabaseError::Tags { err })?;
            let now: NaiveDateTime = now();
            let model = NewSqlitePost { title: &post.title, content: &post.content, user_id: post.user_id, tags, created_at: now, updated_at: now };
            let row: SqlitePost = diesel::insert_into(posts::table)
                .values(&model)
                .returning(SqlitePost::as_returning())
                .get_result(conn)
                .map_err(|err| match err {
                    diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => DatabaseError::UserNotFound { id: post.user_id },
                    err => DatabaseError::Query { op: "insert post", err },
                })?;
            debug!("Created post {} (version {})", row.id, row.version);
            row.into_post().map_err(|err| DatabaseError::Tags { err })
        })
        .instrument(span)
    }

    fn get_post(&self, id: i64) -> impl Send + Future<Output = Result<Post, Self::Error>> {
        self.interact("get post", move |conn| load_post(conn, id)).instrument(span!(Level::DEBUG, "SQLiteDatabase::get_post", post = id))
    }

    fn update_post(&self, update: PostUpdate, expected_version: i64) -> impl Send + Future<Output = Result<i64, Self::Error>> {
        use crate::schema::posts;

        let span = span!(Level::INFO, "SQLiteDatabase::update_post", post = update.id, expected = expected_version);
        self.interact("update post", move |conn| {
            let PostUpdate { id, title, content } = update;

            // The version check and the write are one statement; no lock is held in between
            let new_version: Option<i64> = diesel::update(posts::table.filter(posts::id.eq(id)).filter(posts::version.eq(expected_version)))
                .set((posts::title.eq(title), posts::content.eq(content), posts::updated_at.eq(now()), posts::version.eq(posts::version + 1)))
                .returning(posts::version)
                .get_result(conn)
                .optional()
                .map_err(|err| DatabaseError::Query { op: "update post", err })?;
            if let Some(version) = new_version {
                debug!("Updated post {id} to version {version}");
                return Ok(version);
            }

            // Nothing matched; find out why
            let actual: Option<i64> = posts::table
                .find(id)
                .select(posts::version)
                .first(conn)
                .optional()
                .map_err(|err| DatabaseError::Query { op: "get post version", err })?;
            match actual {
                Some(actual) => {
                    info!("Rejected update of post {id}: expected version {expected_version}, found {actual}");
                    Err(DatabaseError::VersionConflict { id, expected: expected_version, actual })
                },
                None => Err(DatabaseError::PostNotFound { id }),
            }
        })
        .instrument(span)
    }

    fn delete_post(&self, id: i64) -> impl Send + Future<Output = Result<(), Self::Error>> {
        use crate::schema::posts;

        self.interact("delete post", move |conn| {
            let deleted: usize = diesel::delete(posts::table.find(id)).execute(conn).map_err(|err| DatabaseError::Query { op: "delete post", err })?;
            if deleted == 0 {
                return Err(DatabaseError::PostNotFound { id });
            }
            debug!("Deleted post {id}");
            Ok(())
        })
        .instrument(span!(Level::INFO, "SQLiteDatabase::delete_post", post = id))
    }

    fn get_user_feed(&self, user_id: i64, query: FeedQuery) -> impl Send + Future<Output = Result<Vec<Post>, Self::Error>> {
        use crate::schema::{followers, posts};

        let span = span!(Level::DEBUG, "SQLiteDatabase::get_user_feed", user = user_id);
        self.interact("get user feed", move |conn| {
            let followed = followers::table.filter(followers::follower_id.eq(user_id)).select(followers::user_id);
            let mut select =
                posts::table.filter(posts::user_id.eq(user_id).or(posts::user_id.eq_any(followed))).select(SqlitePost::as_select()).into_boxed();

            if let Some(search) = &query.search {
                let pattern: String = format!("%{}%", escape_like(search));
                select = select.filter(posts::title.like(pattern.clone()).escape(LIKE_ESCAPE).or(posts::content.like(pattern).escape(LIKE_ESCAPE)));
            }
            // Tags are a JSON list, so an element matches exactly when its quoted form occurs
            for tag in &query.tags {
                let quoted: String = serde_json::to_string(tag).map_err(|err| DatabaseError::Tags { err })?;
                select = select.filter(posts::tags.like(format!("%{}%", escape_like(&quoted))).escape(LIKE_ESCAPE));
            }
            if let Some(since) = query.since {
                select = select.filter(posts::created_at.ge(since.naive_utc()));
            }
            if let Some(until) = query.until {
                select = select.filter(posts::created_at.le(until.naive_utc()));
            }
            select = match query.sort {
                SortOrder::Asc => select.order_by((posts::created_at.asc(), posts::id.asc())),
                SortOrder::Desc => select.order_by((posts::created_at.desc(), posts::id.desc())),
            };

            let rows: Vec<SqlitePost> =
                select.limit(query.limit).offset(query.offset).load(conn).map_err(|err| DatabaseError::Query { op: "get user feed", err })?;
            debug!("Found {} post(s) for the feed of user {user_id}", rows.len());
            rows.into_iter().map(|row| row.into_post().map_err(|err| DatabaseError::Tags { err })).collect()
        })
        .instrument(span)
    }
}

impl FollowerStore for SQLiteDatabase {
    type Error = DatabaseError;

    fn follow(&self, follower_id: i64, user_id: i64) -> impl Send + Future<Output = Result<(), Self::Error>> {
        use crate::schema::{followers, users};

        self.interact("follow user", move |conn| {
            if follower_id == user_id {
                return Err(DatabaseError::SelfFollow { id: user_id });
            }
            conn.immediate_transaction(|conn| {
                let exists: Option<i64> =
                    users::table.find(user_id).select(users::id).first(conn).optional().map_err(|err| DatabaseError::Query { op: "get user", err })?;
                if exists.is_none() {
                    return Err(DatabaseError::UserNotFound { id: user_id });
                }

                let model = SqliteFollower { user_id, follower_id, created_at: now() };
                diesel::insert_into(followers::table).values(&model).execute(conn).map_err(|err| match err {
                    diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => DatabaseError::AlreadyFollowing { follower_id, user_id },
                    diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => DatabaseError::UserNotFound { id: follower_id },
                    err => DatabaseError::Query { op: "insert follower", err },
                })?;
                debug!("User {follower_id} now follows user {user_id}");
                Ok(())
            })
        })
        .instrument(span!(Level::INFO, "SQLiteDatabase::follow", follower = follower_id, user = user_id))
    }

    fn unfollow(&self, follower_id: i64, user_id: i64) -> impl Send + Future<Output = Result<(), Self::Error>> {
        use crate::schema::followers;

        self.interact("unfollow user", move |conn| {
            diesel::delete(followers::table.filter(followers::user_id.eq(user_id)).filter(followers::follower_id.eq(follower_id)))
                .execute(conn)
                .map(|_| ())
                .map_err(|err| DatabaseError::Query { op: "delete follower", err })
        })
        .instrument(span!(Level::INFO, "SQLiteDatabase::unfollow", follower = follower_id, user = user_id))
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Duration as TimeDelta};
    use specifications::models::{ADMIN_ROLE, MODERATOR_ROLE, USER_ROLE};
    use tempfile::TempDir;

    use super::*;

    async fn open() -> (TempDir, SQLiteDatabase) {
        let dir = TempDir::new().unwrap();
        let db = SQLiteDatabase::new(dir.path().join("social.db"), DatabaseConfig::default()).await.unwrap();
        (dir, db)
    }

    async fn alice(db: &SQLiteDatabase) -> User {
        db.create_user(NewUser { username: "alice".into(), email: "alice@example.com".into(), is_active: true, role: USER_ROLE.into() })
            .await
            .unwrap()
    }

    async fn post_by(db: &SQLiteDatabase, user_id: i64) -> Post {
        db.create_post(NewPost { title: "Hello".into(), content: "World".into(), user_id, tags: vec!["intro".into()] }).await.unwrap()
    }

    fn edit(id: i64, title: &str) -> PostUpdate { PostUpdate { id, title: title.into(), content: "Edited".into() } }

    #[tokio::test(flavor = "multi_thread")]
    async fn seeds_role_hierarchy() {
        let (_dir, db) = open().await;
        let user = db.get_role_by_name(USER_ROLE).await.unwrap();
        let moderator = db.get_role_by_name(MODERATOR_ROLE).await.unwrap();
        let admin = db.get_role_by_name(ADMIN_ROLE).await.unwrap();
        assert!(user.level < moderator.level && moderator.level < admin.level);

        let err = db.get_role_by_name("overlord").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reopening_keeps_data() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("social.db");
        let id = alice(&SQLiteDatabase::new(&path, DatabaseConfig::default()).await.unwrap()).await.id;
        let db = SQLiteDatabase::new(&path, DatabaseConfig::default()).await.unwrap();
        assert_eq!(db.get_user(id).await.unwrap().username, "alice");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn users_come_with_their_role() {
        let (_dir, db) = open().await;
        let created = alice(&db).await;
        let fetched = db.get_user(created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.role.name, USER_ROLE);
        assert_eq!(fetched.role.level, 1);

        assert!(matches!(db.get_user(created.id + 1).await, Err(DatabaseError::UserNotFound { .. })));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn duplicate_users_conflict() {
        let (_dir, db) = open().await;
        alice(&db).await;
        let err = db
            .create_user(NewUser { username: "alice".into(), email: "other@example.com".into(), is_active: true, role: USER_ROLE.into() })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = db
            .create_user(NewUser { username: "bob".into(), email: "bob@example.com".into(), is_active: true, role: "overlord".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::RoleNotFound { .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn posts_start_at_version_zero_and_advance_by_one() {
        let (_dir, db) = open().await;
        let user = alice(&db).await;
        let post = post_by(&db, user.id).await;
        assert_eq!(post.version, 0);
        assert_eq!(post.tags, vec!["intro".to_string()]);

        assert_eq!(db.update_post(edit(post.id, "First"), 0).await.unwrap(), 1);
        assert_eq!(db.update_post(edit(post.id, "Second"), 1).await.unwrap(), 2);
        let stored = db.get_post(post.id).await.unwrap();
        assert_eq!((stored.title.as_str(), stored.version), ("Second", 2));
        assert!(stored.updated_at >= stored.created_at);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn stale_version_is_rejected_without_writing() {
        let (_dir, db) = open().await;
        let user = alice(&db).await;
        let post = post_by(&db, user.id).await;
        for v in 0..4 {
            db.update_post(edit(post.id, "Bump"), v).await.unwrap();
        }

        let err = db.update_post(edit(post.id, "Stale"), 3).await.unwrap_err();
        assert!(matches!(err, DatabaseError::VersionConflict { expected: 3, actual: 4, .. }), "{err:?}");
        assert_eq!(err.kind(), ErrorKind::Conflict);
        let stored = db.get_post(post.id).await.unwrap();
        assert_eq!((stored.title.as_str(), stored.version), ("Bump", 4));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn updating_missing_post_is_not_found() {
        let (_dir, db) = open().await;
        let err = db.update_post(edit(404, "Nope"), 0).await.unwrap_err();
        assert!(matches!(err, DatabaseError::PostNotFound { id: 404 }));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_from_same_version_admit_one() {
        let (_dir, db) = open().await;
        let user = alice(&db).await;
        let post = post_by(&db, user.id).await;
        let version = db.update_post(edit(post.id, "Base"), 0).await.unwrap();

        let db = Arc::new(db);
        let handles: Vec<_> = (0..2)
            .map(|i| {
                let db = db.clone();
                tokio::spawn(async move { db.update_post(edit(post.id, &format!("Writer {i}")), version).await })
            })
            .collect();
        let mut results = Vec::new();
        for handle in handles {
            results.push(handle.await.unwrap());
        }

        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        let loser = results.into_iter().find_map(Result::err).unwrap();
        assert_eq!(loser.kind(), ErrorKind::Conflict);
        assert_eq!(db.get_post(post.id).await.unwrap().version, version + 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn deleting_twice_is_not_found() {
        let (_dir, db) = open().await;
        let user = alice(&db).await;
        let post = post_by(&db, user.id).await;
        db.delete_post(post.id).await.unwrap();
        assert!(matches!(db.delete_post(post.id).await, Err(DatabaseError::PostNotFound { .. })));
        assert!(matches!(db.get_post(post.id).await, Err(DatabaseError::PostNotFound { .. })));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn follow_graph() {
        let (_dir, db) = open().await;
        let alice = alice(&db).await;
        let bob = db
            .create_user(NewUser { username: "bob".into(), email: "bob@example.com".into(), is_active: true, role: USER_ROLE.into() })
            .await
            .unwrap();

        db.follow(bob.id, alice.id).await.unwrap();
        let followers = db.get_followers(alice.id).await.unwrap();
        assert_eq!(followers.iter().map(|f| f.follower_id).collect::<Vec<_>>(), vec![bob.id]);

        assert!(matches!(db.follow(bob.id, alice.id).await, Err(DatabaseError::AlreadyFollowing { .. })));
        assert!(matches!(db.follow(alice.id, alice.id).await, Err(DatabaseError::SelfFollow { .. })));
        assert_eq!(db.follow(bob.id, 9999).await.unwrap_err().kind(), ErrorKind::NotFound);

        db.unfollow(bob.id, alice.id).await.unwrap();
        db.unfollow(bob.id, alice.id).await.unwrap();
        assert!(db.get_followers(alice.id).await.unwrap().is_empty());
    }

    fn newcomer(name: &str) -> NewUser { NewUser { username: name.into(), email: format!("{name}@example.com"), is_active: false, role: USER_ROLE.into() } }

    fn invitation(token_hash: &str, expires_in: TimeDelta) -> NewInvitation {
        NewInvitation { token_hash: token_hash.into(), expires_at: Utc::now() + expires_in }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn invited_users_log_in_only_once_activated() {
        let (_dir, db) = open().await;
        let user = db.create_and_invite(newcomer("carol"), "$argon2id$stub".into(), invitation("hash-1", TimeDelta::days(3))).await.unwrap();
        assert!(!user.is_active);
        assert!(matches!(db.get_credentials("carol@example.com").await, Err(DatabaseError::CredentialsNotFound { .. })));

        assert_eq!(db.activate("hash-1".into()).await.unwrap(), user.id);
        assert!(db.get_user(user.id).await.unwrap().is_active);
        let creds = db.get_credentials("carol@example.com").await.unwrap();
        assert_eq!((creds.user.id, creds.password_hash.as_str()), (user.id, "$argon2id$stub"));

        // Invitations are consumed
        assert_eq!(db.activate("hash-1".into()).await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn expired_invitations_do_not_activate() {
        let (_dir, db) = open().await;
        let user = db.create_and_invite(newcomer("dave"), "$argon2id$stub".into(), invitation("hash-2", TimeDelta::seconds(-1))).await.unwrap();
        assert!(matches!(db.activate("hash-2".into()).await, Err(DatabaseError::InvitationNotFound)));
        assert!(!db.get_user(user.id).await.unwrap().is_active);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn users_without_password_cannot_log_in() {
        let (_dir, db) = open().await;
        alice(&db).await;
        assert_eq!(db.get_credentials("alice@example.com").await.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn failed_registration_leaves_no_invitation() {
        let (_dir, db) = open().await;
        alice(&db).await;
        let mut dup = newcomer("alice");
        dup.email = "alice2@example.com".into();
        let err = db.create_and_invite(dup, "$argon2id$stub".into(), invitation("hash-3", TimeDelta::days(3))).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(matches!(db.activate("hash-3".into()).await, Err(DatabaseError::InvitationNotFound)));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn feed_has_own_and_followed_posts_only() {
        let (_dir, db) = open().await;
        let alice = alice(&db).await;
        let bob = db.create_user(NewUser { username: "bob".into(), email: "bob@example.com".into(), is_active: true, role: USER_ROLE.into() }).await.unwrap();
        let eve = db.create_user(NewUser { username: "eve".into(), email: "eve@example.com".into(), is_active: true, role: USER_ROLE.into() }).await.unwrap();
        let own = post_by(&db, alice.id).await;
        let followed = post_by(&db, bob.id).await;
        post_by(&db, eve.id).await;
        db.follow(alice.id, bob.id).await.unwrap();

        let feed = db.get_user_feed(alice.id, FeedQuery::default()).await.unwrap();
        assert_eq!(feed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![followed.id, own.id]);
        let feed = db.get_user_feed(alice.id, FeedQuery { sort: SortOrder::Asc, limit: 1, offset: 1, ..Default::default() }).await.unwrap();
        assert_eq!(feed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![followed.id]);

        // Bob does not follow Alice back
        let feed = db.get_user_feed(bob.id, FeedQuery::default()).await.unwrap();
        assert_eq!(feed.iter().map(|p| p.id).collect::<Vec<_>>(), vec![followed.id]);
        assert!(db.get_user_feed(9999, FeedQuery::default()).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn feed_filters_on_search_tags_and_time() {
        let (_dir, db) = open().await;
        let alice = alice(&db).await;
        let rust = db
            .create_post(NewPost { title: "Borrowing".into(), content: "100% safe".into(), user_id: alice.id, tags: vec!["rust".into(), "tips".into()] })
            .await
            .unwrap();
        let go = db.create_post(NewPost { title: "Goroutines".into(), content: "Channels".into(), user_id: alice.id, tags: vec!["go".into()] }).await.unwrap();

        let search = |s: &str| FeedQuery { search: Some(s.into()), ..Default::default() };
        assert_eq!(db.get_user_feed(alice.id, search("borrow")).await.unwrap().iter().map(|p| p.id).collect::<Vec<_>>(), vec![rust.id]);
        assert_eq!(db.get_user_feed(alice.id, search("chan")).await.unwrap().iter().map(|p| p.id).collect::<Vec<_>>(), vec![go.id]);
        // Wildcards are taken literally
        assert_eq!(db.get_user_feed(alice.id, search("0%")).await.unwrap().iter().map(|p| p.id).collect::<Vec<_>>(), vec![rust.id]);
        assert!(db.get_user_feed(alice.id, search("_")).await.unwrap().is_empty());

        let tags = |t: &[&str]| FeedQuery { tags: t.iter().map(|t| t.to_string()).collect(), ..Default::default() };
        assert_eq!(db.get_user_feed(alice.id, tags(&["rust", "tips"])).await.unwrap().len(), 1);
        assert!(db.get_user_feed(alice.id, tags(&["rust", "go"])).await.unwrap().is_empty());
        assert!(db.get_user_feed(alice.id, tags(&["rus"])).await.unwrap().is_empty());

        let past = DateTime::from_timestamp(1_000_000_000, 0).unwrap();
        let feed = db.get_user_feed(alice.id, FeedQuery { since: Some(past), ..Default::default() }).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert!(db.get_user_feed(alice.id, FeedQuery { until: Some(past), ..Default::default() }).await.unwrap().is_empty());
    }
}
