use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use agentic_agent::AgentRuntime;
use agentic_core::directory::UserDirectory;
use agentic_core::domain::user::{NewUser, User, UserFilter, UserId, UserPatch};
use agentic_core::errors::{ApplicationError, DomainError, InterfaceError};

pub const MAX_PROMPT_CHARS: usize = 1000;
const CONVERSE_FAILURE: &str = "An unexpected error occurred. Please try again later.";

#[derive(Clone)]
pub struct ApiState {
    pub directory: Arc<dyn UserDirectory>,
    pub runtime: Arc<AgentRuntime>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/api/user", get(list_users))
        .route("/api/user/register", post(register_user))
        .route("/api/user/all", delete(delete_all_users))
        .route("/api/user/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/api/agent/converse", post(converse))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub name: String,
    pub age: i32,
    pub job_title: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    pub job_title_filter: Option<String>,
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AgentRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResponse {
    pub success: bool,
    pub message: String,
    pub execution_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub correlation_id: String,
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Interface(InterfaceError),
    Unexpected { correlation_id: String },
}

impl ApiError {
    fn application(error: ApplicationError, correlation_id: &str) -> Self {
        Self::Interface(error.into_interface(correlation_id))
    }

    fn bad_request(message: impl Into<String>, correlation_id: &str) -> Self {
        Self::application(DomainError::InvariantViolation(message.into()).into(), correlation_id)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND.into_response(),
            Self::Interface(interface) => {
                let status = match &interface {
                    InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
                    InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                    InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                };
                let message = match &interface {
                    InterfaceError::BadRequest { message, .. } => message.clone(),
                    other => other.user_message().to_string(),
                };
                let body = ErrorBody {
                    error: message,
                    correlation_id: interface.correlation_id().to_string(),
                };
                (status, Json(body)).into_response()
            }
            Self::Unexpected { correlation_id } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody { error: CONVERSE_FAILURE.to_string(), correlation_id }),
            )
                .into_response(),
        }
    }
}

fn new_correlation_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn failure(operation: &'static str, error: ApplicationError, correlation_id: &str) -> ApiError {
    error!(
        event_name = "api.user.directory_failed",
        correlation_id = %correlation_id,
        operation,
        error = %error,
        "user directory call failed"
    );
    ApiError::application(error, correlation_id)
}

async fn register_user(
    State(state): State<ApiState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let correlation_id = new_correlation_id();
    let Json(request) =
        payload.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;

    let new_user = NewUser::new(request.name, request.age, request.job_title);
    new_user.validate().map_err(|error| ApiError::application(error.into(), &correlation_id))?;

    let user = state
        .directory
        .create(new_user)
        .await
        .map_err(|error| failure("register", error, &correlation_id))?;

    info!(
        event_name = "api.user.registered",
        correlation_id = %correlation_id,
        user_id = user.id.0,
        "user registered"
    );

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/api/user/{}", user.id))],
        format!("User '{}' was registered successfully with ID {}.", user.name, user.id),
    ))
}

async fn get_user(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    let correlation_id = new_correlation_id();
    state
        .directory
        .get_by_id(UserId(id))
        .await
        .map_err(|error| failure("get", error, &correlation_id))?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn update_user(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
    payload: Result<Json<UserPatch>, JsonRejection>,
) -> Result<String, ApiError> {
    let correlation_id = new_correlation_id();
    let Json(patch) =
        payload.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;
    patch.validate().map_err(|error| ApiError::application(error.into(), &correlation_id))?;

    let updated = state
        .directory
        .update(UserId(id), patch)
        .await
        .map_err(|error| failure("update", error, &correlation_id))?;
    if updated.is_none() {
        return Err(ApiError::NotFound);
    }

    info!(
        event_name = "api.user.updated",
        correlation_id = %correlation_id,
        user_id = id,
        "user updated"
    );
    Ok(format!("User with ID {id} was updated successfully."))
}

async fn delete_user(
    State(state): State<ApiState>,
    Path(id): Path<i64>,
) -> Result<String, ApiError> {
    let correlation_id = new_correlation_id();
    let removed = state
        .directory
        .delete(UserId(id))
        .await
        .map_err(|error| failure("delete", error, &correlation_id))?;
    if !removed {
        return Err(ApiError::NotFound);
    }

    info!(
        event_name = "api.user.deleted",
        correlation_id = %correlation_id,
        user_id = id,
        "user deleted"
    );
    Ok(format!("User with ID {id} was deleted successfully."))
}

async fn delete_all_users(State(state): State<ApiState>) -> Result<String, ApiError> {
    let correlation_id = new_correlation_id();
    let count = state
        .directory
        .delete_all()
        .await
        .map_err(|error| failure("delete_all", error, &correlation_id))?;

    warn!(
        event_name = "api.user.deleted_all",
        correlation_id = %correlation_id,
        count,
        "all users deleted"
    );
    Ok(format!("All {count} users have been deleted successfully."))
}

async fn list_users(
    State(state): State<ApiState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<User>>, ApiError> {
    let correlation_id = new_correlation_id();
    let filter = UserFilter {
        job_title: query.job_title_filter,
        min_age: query.min_age,
        max_age: query.max_age,
    };
    let users = state
        .directory
        .list(filter)
        .await
        .map_err(|error| failure("list", error, &correlation_id))?;
    Ok(Json(users))
}

async fn converse(
    State(state): State<ApiState>,
    payload: Result<Json<AgentRequest>, JsonRejection>,
) -> Result<Json<AgentResponse>, ApiError> {
    let correlation_id = new_correlation_id();
    let Json(request) =
        payload.map_err(|rejection| ApiError::bad_request(rejection.body_text(), &correlation_id))?;

    if request.prompt.trim().is_empty() {
        return Err(ApiError::bad_request("prompt is required", &correlation_id));
    }
    if request.prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(ApiError::bad_request(
            format!("prompt must be at most {MAX_PROMPT_CHARS} characters"),
            &correlation_id,
        ));
    }

    info!(
        event_name = "api.agent.converse",
        correlation_id = %correlation_id,
        prompt = %request.prompt,
        "processing agent request"
    );

    let started = Instant::now();
    match state.runtime.handle_prompt(&request.prompt).await {
        Ok(reply) => {
            let execution_time_ms = started.elapsed().as_millis() as u64;
            info!(
                event_name = "api.agent.replied",
                correlation_id = %correlation_id,
                used_fallback = reply.used_fallback,
                execution_time_ms,
                "agent request completed"
            );
            Ok(Json(AgentResponse { success: true, message: reply.message, execution_time_ms }))
        }
        Err(error) => {
            error!(
                event_name = "api.agent.failed",
                correlation_id = %correlation_id,
                error = %error,
                "unexpected error in converse endpoint"
            );
            Err(ApiError::Unexpected { correlation_id })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use agentic_agent::llm::{ChatMessage, LlmClient, LlmError, ToolSpec};
    use agentic_agent::AgentRuntime;
    use agentic_core::directory::UserDirectory;
    use agentic_db::InMemoryUserDirectory;

    use super::{router, ApiState};

    fn app() -> Router {
        let directory: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());
        let runtime = Arc::new(AgentRuntime::offline(Arc::clone(&directory)));
        router(ApiState { directory, runtime })
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request")
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder().method(method).uri(uri).body(Body::empty()).expect("request")
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, String) {
        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, String::from_utf8(bytes.to_vec()).expect("utf8 body"))
    }

    async fn register(app: &Router, name: &str, age: i32, job_title: &str) {
        let (status, _) = send(
            app,
            json_request(
                "POST",
                "/api/user/register",
                json!({ "name": name, "age": age, "jobTitle": job_title }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn register_returns_created_with_location() {
        let app = app();
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/user/register",
                json!({ "name": "Ahmed", "age": 30, "jobTitle": "Engineer" }),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(
            response.headers().get(header::LOCATION).and_then(|value| value.to_str().ok()),
            Some("/api/user/1")
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        assert_eq!(&body[..], b"User 'Ahmed' was registered successfully with ID 1.");

        let (status, body) = send(&app, empty_request("GET", "/api/user/1")).await;
        assert_eq!(status, StatusCode::OK);
        let record: Value = serde_json::from_str(&body).expect("json record");
        assert_eq!(record["jobTitle"], "Engineer");
        assert_eq!(record["age"], 30);
    }

    #[tokio::test]
    async fn register_rejects_invalid_input() {
        let app = app();

        let (status, body) = send(
            &app,
            json_request("POST", "/api/user/register", json!({ "name": "Sara", "age": 0, "jobTitle": "QA" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("age must be in range"));

        let (status, body) =
            send(&app, json_request("POST", "/api/user/register", json!({ "age": 20 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("name is required"));

        let (status, _) = send(
            &app,
            json_request(
                "POST",
                "/api/user/register",
                json!({ "name": "x".repeat(101), "age": 20, "jobTitle": "QA" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn missing_users_return_not_found() {
        let app = app();

        for request in [
            empty_request("GET", "/api/user/42"),
            empty_request("DELETE", "/api/user/42"),
            json_request("PUT", "/api/user/42", json!({ "age": 40 })),
        ] {
            let (status, body) = send(&app, request).await;
            assert_eq!(status, StatusCode::NOT_FOUND);
            assert!(body.is_empty());
        }
    }

    #[tokio::test]
    async fn update_delete_and_delete_all_report_success_text() {
        let app = app();
        register(&app, "Ahmed", 30, "Engineer").await;
        register(&app, "Sara", 24, "Designer").await;

        let (status, body) =
            send(&app, json_request("PUT", "/api/user/1", json!({ "age": 31 }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "User with ID 1 was updated successfully.");

        let (_, body) = send(&app, empty_request("GET", "/api/user/1")).await;
        let record: Value = serde_json::from_str(&body).expect("json record");
        assert_eq!(record["age"], 31);
        assert_eq!(record["name"], "Ahmed");

        let (status, _) =
            send(&app, json_request("PUT", "/api/user/1", json!({ "age": 200 }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&app, empty_request("DELETE", "/api/user/2")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "User with ID 2 was deleted successfully.");

        let (status, body) = send(&app, empty_request("DELETE", "/api/user/all")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "All 1 users have been deleted successfully.");
    }

    #[tokio::test]
    async fn list_applies_query_filters() {
        let app = app();
        register(&app, "Ahmed", 30, "Engineer").await;
        register(&app, "Sara", 24, "Designer").await;
        register(&app, "Omar", 45, "Senior Engineer").await;

        let (status, body) = send(&app, empty_request("GET", "/api/user")).await;
        assert_eq!(status, StatusCode::OK);
        let all: Vec<Value> = serde_json::from_str(&body).expect("json array");
        assert_eq!(all.len(), 3);

        let (_, body) =
            send(&app, empty_request("GET", "/api/user?jobTitleFilter=Engineer&maxAge=40")).await;
        let filtered: Vec<Value> = serde_json::from_str(&body).expect("json array");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["name"], "Ahmed");
    }

    #[tokio::test]
    async fn converse_wraps_fallback_reply_in_envelope() {
        let app = app();
        register(&app, "Ahmed", 30, "Engineer").await;

        let (status, body) = send(
            &app,
            json_request("POST", "/api/agent/converse", json!({ "prompt": "get user id 1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let envelope: Value = serde_json::from_str(&body).expect("json envelope");
        assert_eq!(envelope["success"], true);
        assert_eq!(
            envelope["message"],
            "[Fallback Agent - AR/EN] User [ID: 1] Name: Ahmed, Age: 30, Job: Engineer"
        );
        assert!(envelope["executionTimeMs"].is_u64());
    }

    #[tokio::test]
    async fn converse_validates_prompt() {
        let app = app();

        let (status, _) =
            send(&app, json_request("POST", "/api/agent/converse", json!({ "prompt": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            json_request("POST", "/api/agent/converse", json!({ "prompt": "a".repeat(1001) })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("at most 1000 characters"));
    }

    struct BrokenModel;

    #[async_trait]
    impl LlmClient for BrokenModel {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<ChatMessage, LlmError> {
            Err(LlmError::Status { status: 500, body: "out of memory".to_string() })
        }
    }

    #[tokio::test]
    async fn converse_hides_model_failures_behind_generic_error() {
        let directory: Arc<dyn UserDirectory> = Arc::new(InMemoryUserDirectory::new());
        let runtime =
            Arc::new(AgentRuntime::with_client(Arc::new(BrokenModel), Arc::clone(&directory), 5));
        let app = router(ApiState { directory, runtime });

        let (status, body) = send(
            &app,
            json_request("POST", "/api/agent/converse", json!({ "prompt": "list users" })),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let error: Value = serde_json::from_str(&body).expect("json error");
        assert_eq!(error["error"], "An unexpected error occurred. Please try again later.");
        assert!(!body.contains("out of memory"));
    }
}
