use std::sync::Mutex;

use async_trait::async_trait;

use agentic_core::directory::UserDirectory;
use agentic_core::domain::user::{NewUser, User, UserFilter, UserId, UserPatch};
use agentic_core::errors::ApplicationError;
use agentic_db::InMemoryUserDirectory;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DirectoryCall {
    Create(NewUser),
    GetById(UserId),
    Update(UserId, UserPatch),
    Delete(UserId),
    DeleteAll,
    List(UserFilter),
}

/// In-memory directory that records every call made through the trait.
/// A failing directory still records, then answers with a persistence error.
#[derive(Default)]
pub struct RecordingDirectory {
    inner: InMemoryUserDirectory,
    calls: Mutex<Vec<DirectoryCall>>,
    failure: Option<String>,
}

impl RecordingDirectory {
    /// Seeds users with ids from 1; seeding is not recorded.
    pub async fn with_users(users: &[(&str, i32, &str)]) -> Self {
        let directory = Self::default();
        for (name, age, job_title) in users {
            directory
                .inner
                .create(NewUser::new(*name, *age, *job_title))
                .await
                .expect("seed user");
        }
        directory
    }

    pub fn failing(message: &str) -> Self {
        Self { failure: Some(message.to_string()), ..Self::default() }
    }

    pub fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn recorded_patches(&self) -> Vec<(UserId, UserPatch)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DirectoryCall::Update(id, patch) => Some((id, patch)),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: DirectoryCall) -> Result<(), ApplicationError> {
        self.calls.lock().expect("calls lock").push(call);
        match &self.failure {
            Some(message) => Err(ApplicationError::Persistence(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl UserDirectory for RecordingDirectory {
    async fn create(&self, new_user: NewUser) -> Result<User, ApplicationError> {
        self.record(DirectoryCall::Create(new_user.clone()))?;
        self.inner.create(new_user).await
    }

    async fn get_by_id(&self, id: UserId) -> Result<Option<User>, ApplicationError> {
        self.record(DirectoryCall::GetById(id))?;
        self.inner.get_by_id(id).await
    }

    async fn update(
        &self,
        id: UserId,
        patch: UserPatch,
    ) -> Result<Option<User>, ApplicationError> {
        self.record(DirectoryCall::Update(id, patch.clone()))?;
        self.inner.update(id, patch).await
    }

    async fn delete(&self, id: UserId) -> Result<bool, ApplicationError> {
        self.record(DirectoryCall::Delete(id))?;
        self.inner.delete(id).await
    }

    async fn delete_all(&self) -> Result<u64, ApplicationError> {
        self.record(DirectoryCall::DeleteAll)?;
        self.inner.delete_all().await
    }

    async fn list(&self, filter: UserFilter) -> Result<Vec<User>, ApplicationError> {
        self.record(DirectoryCall::List(filter.clone()))?;
        self.inner.list(filter).await
    }
}
