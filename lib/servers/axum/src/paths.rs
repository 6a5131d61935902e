//  PATHS.rs
//
//  Created:
//    23 Oct 2024, 11:56:03
//  Last edited:
//    18 Oct 2026, 16:24:51
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the handlers for the various API paths.
//

use std::sync::Arc;

use access_control::{hash_password, hash_token, verify_password, InvitationToken, INVITATION_TTL};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use axum_server_spec::{
    CreatePostRequest, FeedParams, HealthResponse, RegisterRequest, RegisterResponse, TokenRequest, TokenResponse, UpdatePostRequest, MAX_CONTENT_LEN,
    MAX_TITLE_LEN, MAX_USERNAME_LEN,
};
use chrono::Utc;
use specifications::errors::{ClassifiedError as _, ErrorKind};
use specifications::models::{Credentials, FeedQuery, NewInvitation, NewPost, NewUser, Post, PostUpdate, User, ADMIN_ROLE, MODERATOR_ROLE, USER_ROLE};
use specifications::{AccountStore, Cache, FollowerStore, PostStore, RoleStore, UserStore};
use tracing::{debug, info, span, Instrument as _, Level};

use crate::auth::RequestContext;
use crate::errors::{check_email, check_password, check_text, parse_id, ApiError};
use crate::server::AxumServer;


/***** CONSTANTS *****/
/// The status reported by a healthy server.
const HEALTHY: &str = "ok";





/***** LIBRARIES *****/
impl<A, B, L, C, D> AxumServer<A, B, L, C, D>
where
    C: 'static + Send + Sync + Cache,
    D: 'static + Send + Sync + Clone + UserStore + AccountStore + RoleStore + PostStore + FollowerStore,
{
    /// Decides whether `actor` may act on `post`, given the role needed when they don't own it.
    ///
    /// # Errors
    /// This function errors with [`ApiError::Forbidden`] if they may not, or with an internal
    /// error if we failed to find out.
    async fn check_access(&self, actor: &User, post: &Post, required_role: &str, action: &'static str) -> Result<(), ApiError> {
        let access = self.authz.authorize(actor, post.user_id, required_role).await.map_err(|err| ApiError::failed("authorize user", err))?;
        if access.is_granted() {
            debug!("User {} may {action} post {} as {access:?}", actor.id, post.id);
            Ok(())
        } else {
            Err(ApiError::Forbidden { actor: actor.id, action, post: post.id })
        }
    }



    /// Handler for `GET /v1/health`.
    pub(crate) async fn health(State(this): State<Arc<Self>>) -> Json<HealthResponse> {
        Json(HealthResponse { status: HEALTHY.into(), env: this.env.clone(), version: env!("CARGO_PKG_VERSION").into() })
    }



    /// Handler for `POST /v1/posts` (i.e., writing a new post).
    pub(crate) async fn create_post(
        State(this): State<Arc<Self>>,
        Extension(RequestContext { client, user: actor }): Extension<RequestContext>,
        body: Result<Json<CreatePostRequest>, JsonRejection>,
    ) -> Result<(StatusCode, Json<Post>), ApiError> {
        let Json(body) = body.map_err(|err| ApiError::Body { err })?;
        check_text("title", &body.title, MAX_TITLE_LEN, true)?;
        check_text("content", &body.content, MAX_CONTENT_LEN, true)?;

        let post: Post = this
            .data
            .create_post(NewPost { title: body.title, content: body.content, user_id: actor.id, tags: body.tags })
            .await
            .map_err(|err| ApiError::failed("create post", err))?;
        info!("User {} created post {} (from {client:?})", actor.id, post.id);
        Ok((StatusCode::CREATED, Json(post)))
    }

    /// Handler for `GET /v1/posts/{postID}`.
    pub(crate) async fn get_post(State(this): State<Arc<Self>>, Path(raw): Path<String>) -> Result<Json<Post>, ApiError> {
        let id: i64 = parse_id("post", &raw)?;
        this.data.get_post(id).await.map(Json).map_err(|err| ApiError::failed("retrieve post", err))
    }

    /// Handler for `PATCH /v1/posts/{postID}` (i.e., editing a post).
    ///
    /// Only the owner and moderators (or higher) may edit. The edit is conditional on the version
    /// the client read, or, if they don't say, on the version we read here.
    pub(crate) async fn update_post(
        State(this): State<Arc<Self>>,
        Extension(RequestContext { user: actor, .. }): Extension<RequestContext>,
        Path(raw): Path<String>,
        body: Result<Json<UpdatePostRequest>, JsonRejection>,
    ) -> Result<Json<Post>, ApiError> {
        let id: i64 = parse_id("post", &raw)?;
        async move {
            let post: Post = this.data.get_post(id).await.map_err(|err| ApiError::failed("retrieve post", err))?;
            this.check_access(&actor, &post, MODERATOR_ROLE, "update").await?;

            let Json(body) = body.map_err(|err| ApiError::Body { err })?;
            if let Some(title) = &body.title {
                check_text("title", title, MAX_TITLE_LEN, false)?;
            }
            if let Some(content) = &body.content {
                check_text("content", content, MAX_CONTENT_LEN, false)?;
            }

            let expected: i64 = body.version.unwrap_or(post.version);
            let update = PostUpdate { id, title: body.title.unwrap_or(post.title), content: body.content.unwrap_or(post.content) };
            let version: i64 = this.data.update_post(update, expected).await.map_err(|err| ApiError::failed("update post", err))?;
            info!("User {} updated post {id} from version {expected} to {version}", actor.id);

            let post: Post = this.data.get_post(id).await.map_err(|err| ApiError::failed("retrieve updated post", err))?;
            Ok(Json(post))
        }
        .instrument(span!(Level::INFO, "AxumServer::update_post", post = id))
        .await
    }

    /// Handler for `DELETE /v1/posts/{postID}`. Only the owner and admins may delete.
    pub(crate) async fn delete_post(
        State(this): State<Arc<Self>>,
        Extension(RequestContext { user: actor, .. }): Extension<RequestContext>,
        Path(raw): Path<String>,
    ) -> Result<StatusCode, ApiError> {
        let id: i64 = parse_id("post", &raw)?;
        let post: Post = this.data.get_post(id).await.map_err(|err| ApiError::failed("retrieve post", err))?;
        this.check_access(&actor, &post, ADMIN_ROLE, "delete").await?;

        this.data.delete_post(id).await.map_err(|err| ApiError::failed("delete post", err))?;
        info!("User {} deleted post {id}", actor.id);
        Ok(StatusCode::NO_CONTENT)
    }



    /// Handler for `POST /v1/authentication/user` (i.e., registering).
    ///
    /// The user is created inactive, together with an invitation whose token is in the reply.
    pub(crate) async fn register(
        State(this): State<Arc<Self>>,
        body: Result<Json<RegisterRequest>, JsonRejection>,
    ) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
        let Json(body) = body.map_err(|err| ApiError::Body { err })?;
        check_text("username", &body.username, MAX_USERNAME_LEN, true)?;
        check_email(&body.email)?;
        check_password(&body.password)?;

        let password_hash: String = hash_password(body.password).await.map_err(|err| ApiError::failed("hash password", err))?;
        let invitation = InvitationToken::generate();
        let user: User = this
            .data
            .create_and_invite(
                NewUser { username: body.username, email: body.email, is_active: false, role: USER_ROLE.into() },
                password_hash,
                NewInvitation { token_hash: invitation.hash, expires_at: Utc::now() + INVITATION_TTL },
            )
            .await
            .map_err(|err| ApiError::failed("register user", err))?;
        info!("Registered user {} ({:?}), pending activation", user.id, user.username);
        Ok((StatusCode::CREATED, Json(RegisterResponse { user, token: invitation.token })))
    }

    /// Handler for `POST /v1/authentication/token` (i.e., logging in).
    pub(crate) async fn create_token(
        State(this): State<Arc<Self>>,
        body: Result<Json<TokenRequest>, JsonRejection>,
    ) -> Result<(StatusCode, Json<TokenResponse>), ApiError> {
        let Json(body) = body.map_err(|err| ApiError::Body { err })?;
        check_email(&body.email)?;
        check_password(&body.password)?;

        // Unknown, inactive and password-less users are all just bad credentials
        let creds: Credentials = match this.data.get_credentials(&body.email).await {
            Ok(creds) => creds,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("{err}");
                return Err(ApiError::BadCredentials { email: body.email });
            },
            Err(err) => return Err(ApiError::failed("get credentials", err)),
        };
        if !verify_password(body.password, creds.password_hash).await.map_err(|err| ApiError::failed("verify password", err))? {
            return Err(ApiError::BadCredentials { email: body.email });
        }

        let token: String = this.issuer.issue(creds.user.id).map_err(|err| ApiError::failed("issue token", err))?;
        info!("Issued token to user {}", creds.user.id);
        Ok((StatusCode::CREATED, Json(TokenResponse { token })))
    }

    /// Handler for `PUT /v1/users/activate/{token}`.
    pub(crate) async fn activate(State(this): State<Arc<Self>>, Path(token): Path<String>) -> Result<StatusCode, ApiError> {
        let user_id: i64 = this.data.activate(hash_token(&token)).await.map_err(|err| ApiError::failed("activate user", err))?;
        info!("Activated user {user_id}");
        Ok(StatusCode::NO_CONTENT)
    }



    /// Handler for `GET /v1/users/feed`.
    pub(crate) async fn feed(
        State(this): State<Arc<Self>>,
        Extension(RequestContext { user: actor, .. }): Extension<RequestContext>,
        params: Result<Query<FeedParams>, QueryRejection>,
    ) -> Result<Json<Vec<Post>>, ApiError> {
        let Query(params) = params.map_err(|err| ApiError::Query { err })?;
        let query: FeedQuery = params.into_query().map_err(|err| ApiError::Feed { err })?;
        debug!("Listing feed of user {} with {query:?}", actor.id);
        this.data.get_user_feed(actor.id, query).await.map(Json).map_err(|err| ApiError::failed("get feed", err))
    }

    /// Handler for `GET /v1/users/{userID}`.
    pub(crate) async fn get_user(State(this): State<Arc<Self>>, Path(raw): Path<String>) -> Result<Json<User>, ApiError> {
        let id: i64 = parse_id("user", &raw)?;
        this.identity.resolve(id).await.map(Json).map_err(|err| ApiError::failed("resolve user", err))
    }

    /// Handler for `PUT /v1/users/{userID}/follow`.
    pub(crate) async fn follow(
        State(this): State<Arc<Self>>,
        Extension(RequestContext { user: actor, .. }): Extension<RequestContext>,
        Path(raw): Path<String>,
    ) -> Result<StatusCode, ApiError> {
        let id: i64 = parse_id("user", &raw)?;
        this.data.follow(actor.id, id).await.map_err(|err| ApiError::failed("follow user", err))?;
        info!("User {} now follows user {id}", actor.id);
        Ok(StatusCode::NO_CONTENT)
    }

    /// Handler for `PUT /v1/users/{userID}/unfollow`.
    pub(crate) async fn unfollow(
        State(this): State<Arc<Self>>,
        Extension(RequestContext { user: actor, .. }): Extension<RequestContext>,
        Path(raw): Path<String>,
    ) -> Result<StatusCode, ApiError> {
        let id: i64 = parse_id("user", &raw)?;
        this.data.unfollow(actor.id, id).await.map_err(|err| ApiError::failed("unfollow user", err))?;
        info!("User {} no longer follows user {id}", actor.id);
        Ok(StatusCode::NO_CONTENT)
    }
}
