//  AUTHORIZATION.rs
//
//  Created:
//    17 Oct 2026, 18:22:47
//  Last edited:
//    17 Oct 2026, 18:57:03
//  Auto updated?
//    Yes
//
//  Description:
//!   Implements the [`AuthorizationEvaluator`], which decides whether a
//!   user may act on a resource based on ownership and role level.
//

use std::error::Error;

use specifications::errors::{ClassifiedError, ErrorKind};
use specifications::models::{Role, User};
use specifications::RoleStore;
use thiserror::Error;
use tracing::{debug, info};


/***** ERRORS *****/
/// Defines the errors originating from evaluating access.
///
/// Note that being denied is not an error, but an [`Access`].
#[derive(Debug, Error)]
pub enum AuthorizeError {
    /// The required role could not be retrieved, for whatever reason.
    #[error("Failed to retrieve required role {role:?}")]
    RoleLookup {
        role: String,
        #[source]
        err:  Box<dyn 'static + Send + Sync + Error>,
    },
}
impl ClassifiedError for AuthorizeError {
    #[inline]
    fn kind(&self) -> ErrorKind { ErrorKind::Internal }
}





/***** AUXILLARY *****/
/// The outcome of an [`AuthorizationEvaluator::authorize()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Access {
    /// The actor owns the resource.
    Owner,
    /// The actor does not own the resource, but its role is high enough.
    Privileged,
    /// The actor may not act on the resource.
    Denied,
}
impl Access {
    /// Returns whether the actor may go ahead.
    #[inline]
    pub const fn is_granted(&self) -> bool { !matches!(self, Self::Denied) }
}





/***** LIBRARY *****/
/// Decides whether users may act on resources owned by others.
#[derive(Clone, Debug)]
pub struct AuthorizationEvaluator<R> {
    roles: R,
}
impl<R: RoleStore> AuthorizationEvaluator<R> {
    /// Constructor for the AuthorizationEvaluator.
    ///
    /// # Arguments
    /// - `roles`: The [`RoleStore`] to look up required roles in.
    #[inline]
    pub const fn new(roles: R) -> Self { Self { roles } }

    /// Decides whether `actor` may act on a resource owned by `owner_id`.
    ///
    /// Owners are always allowed, without asking the store. Anyone else is allowed iff their role's
    /// level is at least that of `required_role`.
    ///
    /// # Arguments
    /// - `actor`: The resolved [`User`] attempting the action.
    /// - `owner_id`: The ID of the user owning the resource.
    /// - `required_role`: The name of the lowest [`Role`] that may act on other people's resources.
    ///
    /// # Returns
    /// The [`Access`] the actor has.
    ///
    /// # Errors
    /// This function errors if the required role could not be retrieved. That includes it not
    /// existing, which is a configuration problem rather than a reason to deny.
    pub async fn authorize(&self, actor: &User, owner_id: i64, required_role: &str) -> Result<Access, AuthorizeError> {
        if actor.id == owner_id {
            debug!("User {} owns the resource", actor.id);
            return Ok(Access::Owner);
        }

        let required: Role =
            self.roles.get_role_by_name(required_role).await.map_err(|err| AuthorizeError::RoleLookup { role: required_role.into(), err: Box::new(err) })?;
        if actor.role.level >= required.level {
            debug!("User {} has role {:?} (level {}) >= {:?} (level {})", actor.id, actor.role.name, actor.role.level, required.name, required.level);
            Ok(Access::Privileged)
        } else {
            info!(
                "Denied user {} with role {:?} (level {}) acting on resource of user {owner_id}; needs {:?} (level {})",
                actor.id, actor.role.name, actor.role.level, required.name, required.level
            );
            Ok(Access::Denied)
        }
    }
}





/***** TESTS *****/
#[cfg(test)]
mod tests {
    use specifications::models::{ADMIN_ROLE, MODERATOR_ROLE};

    use super::*;
    use crate::testing::{user, CountingUserStore};

    fn evaluator() -> AuthorizationEvaluator<CountingUserStore> { AuthorizationEvaluator::new(CountingUserStore::with_users(vec![])) }

    #[tokio::test]
    async fn owner_is_allowed_without_asking_store() {
        let evaluator = evaluator();
        assert_eq!(evaluator.authorize(&user(1, "user", 1), 1, ADMIN_ROLE).await.unwrap(), Access::Owner);
        assert_eq!(evaluator.roles.calls(), 0);

        // Even when the store would have failed
        let evaluator = AuthorizationEvaluator::new(CountingUserStore::down());
        assert_eq!(evaluator.authorize(&user(1, "user", 1), 1, ADMIN_ROLE).await.unwrap(), Access::Owner);
    }

    #[tokio::test]
    async fn role_level_decides_for_non_owners() {
        let evaluator = evaluator();
        assert_eq!(evaluator.authorize(&user(2, "moderator", 2), 1, MODERATOR_ROLE).await.unwrap(), Access::Privileged);
        assert_eq!(evaluator.authorize(&user(3, "admin", 3), 1, MODERATOR_ROLE).await.unwrap(), Access::Privileged);
        assert_eq!(evaluator.authorize(&user(4, "user", 1), 1, MODERATOR_ROLE).await.unwrap(), Access::Denied);
        assert_eq!(evaluator.authorize(&user(2, "moderator", 2), 1, ADMIN_ROLE).await.unwrap(), Access::Denied);
        assert!(!Access::Denied.is_granted());
    }

    #[tokio::test]
    async fn failed_role_lookup_is_internal_not_denied() {
        let evaluator = AuthorizationEvaluator::new(CountingUserStore::down());
        let err = evaluator.authorize(&user(2, "admin", 3), 1, MODERATOR_ROLE).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);

        let err = self::evaluator().authorize(&user(2, "admin", 3), 1, "overlord").await.unwrap_err();
        assert!(matches!(err, AuthorizeError::RoleLookup { ref role, .. } if role == "overlord"));
    }
}
