use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use agentic_core::directory::UserDirectory;
use agentic_core::domain::user::{NewUser, UserFilter, UserId, UserPatch};
use agentic_core::errors::ApplicationError;

use crate::llm::ToolSpec;

/// Text-returning facade over the user directory.
///
/// Both the tool-calling model and the fallback agent see directory results
/// through this type: records come back as JSON, not-found and deletions as
/// plain sentences, and failures as `Error: ...` text. Nothing here returns
/// an error to the caller.
#[derive(Clone)]
pub struct UserApi {
    directory: Arc<dyn UserDirectory>,
}

impl UserApi {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub async fn register_user(&self, name: &str, age: i32, job_title: &str) -> String {
        match self.directory.create(NewUser::new(name, age, job_title)).await {
            Ok(user) => to_json(&user),
            Err(error) => failure("register_user", error),
        }
    }

    pub async fn update_user(&self, id: i64, patch: UserPatch) -> String {
        match self.directory.update(UserId(id), patch).await {
            Ok(Some(user)) => to_json(&user),
            Ok(None) => not_found(id),
            Err(error) => failure("update_user", error),
        }
    }

    pub async fn delete_user(&self, id: i64) -> String {
        match self.directory.delete(UserId(id)).await {
            Ok(true) => "User deleted successfully.".to_string(),
            Ok(false) => not_found(id),
            Err(error) => failure("delete_user", error),
        }
    }

    pub async fn delete_all_users(&self) -> String {
        match self.directory.delete_all().await {
            Ok(count) => format!("All {count} users deleted successfully."),
            Err(error) => failure("delete_all_users", error),
        }
    }

    pub async fn get_all_users(&self, filter: UserFilter) -> String {
        match self.directory.list(filter).await {
            Ok(users) => to_json(&users),
            Err(error) => failure("get_all_users", error),
        }
    }

    pub async fn get_user_by_id(&self, id: i64) -> String {
        match self.directory.get_by_id(UserId(id)).await {
            Ok(Some(user)) => to_json(&user),
            Ok(None) => not_found(id),
            Err(error) => failure("get_user_by_id", error),
        }
    }
}

fn not_found(id: i64) -> String {
    format!("User with ID {id} not found.")
}

fn failure(operation: &'static str, error: ApplicationError) -> String {
    error!(
        event_name = "agent.tools.directory_failed",
        operation,
        error = %error,
        "user directory call failed"
    );
    format!("Error: {error}")
}

fn to_json<T: Serialize>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|error| format!("Error: {error}"))
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// JSON schema of the argument object.
    fn parameters(&self) -> Value;
    async fn execute(&self, input: Value) -> Result<String>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UserApiFunction {
    RegisterUser,
    UpdateUser,
    DeleteUser,
    DeleteAllUsers,
    GetAllUsers,
    GetUserById,
}

impl UserApiFunction {
    pub const ALL: [UserApiFunction; 6] = [
        Self::RegisterUser,
        Self::UpdateUser,
        Self::DeleteUser,
        Self::DeleteAllUsers,
        Self::GetAllUsers,
        Self::GetUserById,
    ];
}

pub struct UserApiTool {
    function: UserApiFunction,
    api: Arc<UserApi>,
}

impl UserApiTool {
    pub fn new(function: UserApiFunction, api: Arc<UserApi>) -> Self {
        Self { function, api }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterArgs {
    name: String,
    age: i32,
    job_title: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateArgs {
    id: i64,
    name: Option<String>,
    age: Option<i32>,
    job_title: Option<String>,
}

#[derive(Deserialize)]
struct IdArgs {
    id: i64,
}

#[derive(Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListArgs {
    job_title_filter: Option<String>,
    min_age: Option<i32>,
    max_age: Option<i32>,
}

fn parse_args<T: for<'de> Deserialize<'de>>(tool: &str, input: Value) -> Result<T> {
    let input = if input.is_null() { json!({}) } else { input };
    serde_json::from_value(input).with_context(|| format!("invalid arguments for `{tool}`"))
}

#[async_trait]
impl Tool for UserApiTool {
    fn name(&self) -> &'static str {
        match self.function {
            UserApiFunction::RegisterUser => "register_user",
            UserApiFunction::UpdateUser => "update_user",
            UserApiFunction::DeleteUser => "delete_user",
            UserApiFunction::DeleteAllUsers => "delete_all_users",
            UserApiFunction::GetAllUsers => "get_all_users",
            UserApiFunction::GetUserById => "get_user_by_id",
        }
    }

    fn description(&self) -> &'static str {
        match self.function {
            UserApiFunction::RegisterUser => "Registers a new user with name, age and job title.",
            UserApiFunction::UpdateUser => {
                "Updates an existing user. Only the provided fields are changed."
            }
            UserApiFunction::DeleteUser => "Deletes a single user by ID.",
            UserApiFunction::DeleteAllUsers => {
                "Deletes ALL users. Only use when the user explicitly asks for it."
            }
            UserApiFunction::GetAllUsers => {
                "Lists users, optionally filtered by job title and an age range."
            }
            UserApiFunction::GetUserById => "Gets a single user by ID.",
        }
    }

    fn parameters(&self) -> Value {
        match self.function {
            UserApiFunction::RegisterUser => json!({
                "type": "object",
                "properties": {
                    "name": { "type": "string", "description": "Full name of the user" },
                    "age": { "type": "integer", "description": "Age in years" },
                    "jobTitle": { "type": "string", "description": "Job title" }
                },
                "required": ["name", "age", "jobTitle"]
            }),
            UserApiFunction::UpdateUser => json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": "ID of the user to update" },
                    "name": { "type": "string" },
                    "age": { "type": "integer" },
                    "jobTitle": { "type": "string" }
                },
                "required": ["id"]
            }),
            UserApiFunction::DeleteUser | UserApiFunction::GetUserById => json!({
                "type": "object",
                "properties": {
                    "id": { "type": "integer", "description": "ID of the user" }
                },
                "required": ["id"]
            }),
            UserApiFunction::DeleteAllUsers => json!({ "type": "object", "properties": {} }),
            UserApiFunction::GetAllUsers => json!({
                "type": "object",
                "properties": {
                    "jobTitleFilter": {
                        "type": "string",
                        "description": "Case-sensitive substring of the job title"
                    },
                    "minAge": { "type": "integer" },
                    "maxAge": { "type": "integer" }
                }
            }),
        }
    }

    async fn execute(&self, input: Value) -> Result<String> {
        let name = self.name();
        let output = match self.function {
            UserApiFunction::RegisterUser => {
                let args: RegisterArgs = parse_args(name, input)?;
                self.api.register_user(&args.name, args.age, &args.job_title).await
            }
            UserApiFunction::UpdateUser => {
                let args: UpdateArgs = parse_args(name, input)?;
                let patch =
                    UserPatch { name: args.name, age: args.age, job_title: args.job_title };
                self.api.update_user(args.id, patch).await
            }
            UserApiFunction::DeleteUser => {
                let args: IdArgs = parse_args(name, input)?;
                self.api.delete_user(args.id).await
            }
            UserApiFunction::DeleteAllUsers => self.api.delete_all_users().await,
            UserApiFunction::GetAllUsers => {
                let args: ListArgs = parse_args(name, input)?;
                let filter = UserFilter {
                    job_title: args.job_title_filter,
                    min_age: args.min_age,
                    max_age: args.max_age,
                };
                self.api.get_all_users(filter).await
            }
            UserApiFunction::GetUserById => {
                let args: IdArgs = parse_args(name, input)?;
                self.api.get_user_by_id(args.id).await
            }
        };
        Ok(output)
    }
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    /// Registry holding the six user-management functions.
    pub fn user_api(api: Arc<UserApi>) -> Self {
        let mut registry = Self::default();
        for function in UserApiFunction::ALL {
            registry.register(UserApiTool::new(function, Arc::clone(&api)));
        }
        registry
    }

    pub fn register<T>(&mut self, tool: T)
    where
        T: Tool + 'static,
    {
        self.tools.insert(tool.name().to_string(), Box::new(tool));
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(Box::as_ref)
    }

    /// Tool declarations sorted by name.
    pub fn specs(&self) -> Vec<ToolSpec> {
        let mut specs: Vec<ToolSpec> = self
            .tools
            .values()
            .map(|tool| ToolSpec {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters(),
            })
            .collect();
        specs.sort_by(|left, right| left.name.cmp(&right.name));
        specs
    }

    pub async fn execute(&self, name: &str, input: Value) -> Result<String> {
        let tool = self.get(name).ok_or_else(|| anyhow!("unknown tool `{name}`"))?;
        tool.execute(input).await
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{json, Value};

    use agentic_core::domain::user::{NewUser, UserFilter, UserId, UserPatch};

    use super::{ToolRegistry, UserApi};
    use crate::test_support::{DirectoryCall, RecordingDirectory};

    #[tokio::test]
    async fn user_api_renders_directory_results_as_text() {
        let directory = RecordingDirectory::with_users(&[("Ahmed", 30, "Engineer")]).await;
        let api = UserApi::new(Arc::new(directory));

        let record: Value =
            serde_json::from_str(&api.get_user_by_id(1).await).expect("record is json");
        assert_eq!(record["name"], "Ahmed");
        assert_eq!(record["jobTitle"], "Engineer");

        assert_eq!(api.get_user_by_id(9).await, "User with ID 9 not found.");
        assert_eq!(api.delete_user(9).await, "User with ID 9 not found.");
        assert_eq!(api.delete_user(1).await, "User deleted successfully.");
        assert_eq!(api.delete_all_users().await, "All 0 users deleted successfully.");
        assert_eq!(api.get_all_users(UserFilter::default()).await, "[]");
    }

    #[tokio::test]
    async fn directory_failures_become_error_text() {
        let directory = Arc::new(RecordingDirectory::failing("disk full"));
        let api = UserApi::new(directory.clone());

        assert_eq!(
            api.register_user("Sara", 24, "Designer").await,
            "Error: persistence failure: disk full"
        );
        assert!(api.delete_all_users().await.starts_with("Error: "));
        assert_eq!(directory.calls(), vec![
            DirectoryCall::Create(NewUser::new("Sara", 24, "Designer")),
            DirectoryCall::DeleteAll,
        ]);
    }

    #[tokio::test]
    async fn registry_exposes_six_sorted_user_functions() {
        let api = Arc::new(UserApi::new(Arc::new(RecordingDirectory::default())));
        let registry = ToolRegistry::user_api(api);

        assert_eq!(registry.len(), 6);
        let names: Vec<String> = registry.specs().into_iter().map(|spec| spec.name).collect();
        assert_eq!(names, vec![
            "delete_all_users",
            "delete_user",
            "get_all_users",
            "get_user_by_id",
            "register_user",
            "update_user",
        ]);
    }

    #[tokio::test]
    async fn registry_executes_tools_with_camel_case_arguments() {
        let directory = Arc::new(RecordingDirectory::default());
        let registry = ToolRegistry::user_api(Arc::new(UserApi::new(directory.clone())));

        let created = registry
            .execute("register_user", json!({ "name": "Sara", "age": 24, "jobTitle": "Designer" }))
            .await
            .expect("register executes");
        assert!(created.contains("\"jobTitle\":\"Designer\""));

        let updated = registry
            .execute("update_user", json!({ "id": 1, "age": 25 }))
            .await
            .expect("update executes");
        assert!(updated.contains("\"age\":25"));
        assert_eq!(directory.recorded_patches(), vec![(
            UserId(1),
            UserPatch { age: Some(25), ..UserPatch::default() }
        )]);

        let listed = registry
            .execute("get_all_users", Value::Null)
            .await
            .expect("list executes with no arguments");
        assert!(listed.starts_with('['));
    }

    #[tokio::test]
    async fn registry_rejects_unknown_tools_and_bad_arguments() {
        let registry =
            ToolRegistry::user_api(Arc::new(UserApi::new(Arc::new(RecordingDirectory::default()))));

        assert!(registry.execute("drop_tables", json!({})).await.is_err());
        let error = registry
            .execute("delete_user", json!({ "id": "seven" }))
            .await
            .expect_err("id must be an integer");
        assert!(error.to_string().contains("delete_user"));
    }
}
