//! The user directory contract consumed by the HTTP surface and both agents.
//!
//! Not-found is reported as `Ok(None)` / `Ok(false)`; errors are reserved for
//! persistence or integration failures.

use async_trait::async_trait;

use crate::domain::user::{NewUser, User, UserFilter, UserId, UserPatch};
use crate::errors::ApplicationError;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<User, ApplicationError>;

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, ApplicationError>;

    /// Merge-patch update; fields absent from `patch` keep their stored value.
    async fn update(&self, id: UserId, patch: UserPatch)
        -> Result<Option<User>, ApplicationError>;

    /// Returns `true` when a record existed and was removed.
    async fn delete(&self, id: UserId) -> Result<bool, ApplicationError>;

    /// Returns the number of removed records.
    async fn delete_all(&self) -> Result<u64, ApplicationError>;

    async fn list(&self, filter: UserFilter) -> Result<Vec<User>, ApplicationError>;
}
