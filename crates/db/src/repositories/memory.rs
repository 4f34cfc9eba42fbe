use std::collections::BTreeMap;

use chrono::Utc;
use tokio::sync::RwLock;

use agentic_core::directory::UserDirectory;
use agentic_core::domain::user::{NewUser, User, UserFilter, UserId, UserPatch};
use agentic_core::errors::ApplicationError;

struct DirectoryState {
    users: BTreeMap<UserId, User>,
    next_id: i64,
}

/// Process-local directory used by tests and offline runs.
pub struct InMemoryUserDirectory {
    state: RwLock<DirectoryState>,
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self { state: RwLock::new(DirectoryState { users: BTreeMap::new(), next_id: 1 }) }
    }
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn create(&self, new_user: NewUser) -> Result<User, ApplicationError> {
        let mut state = self.state.write().await;
        let id = UserId(state.next_id);
        state.next_id += 1;

        let user = User {
            id,
            name: new_user.name,
            age: new_user.age,
            job_title: new_user.job_title,
            created_at: Utc::now(),
            updated_at: None,
        };
        state.users.insert(id, user.clone());
        Ok(user)
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, ApplicationError> {
        let state = self.state.read().await;
        Ok(state.users.get(&id).cloned())
    }

    async fn update(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> Result<Option<User>, ApplicationError> {
        let mut state = self.state.write().await;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply_to(user);
        user.updated_at = Some(Utc::now());
        Ok(Some(user.clone()))
    }

    async fn delete(&self, id: UserId) -> Result<bool, ApplicationError> {
        let mut state = self.state.write().await;
        Ok(state.users.remove(&id).is_some())
    }

    async fn delete_all(&self) -> Result<u64, ApplicationError> {
        let mut state = self.state.write().await;
        let removed = state.users.len() as u64;
        state.users.clear();
        Ok(removed)
    }

    async fn list(&self, filter: UserFilter) -> Result<Vec<User>, ApplicationError> {
        let state = self.state.read().await;
        Ok(state.users.values().filter(|user| filter.matches(user)).cloned().collect())
    }
}
