pub mod ask;
pub mod doctor;
pub mod migrate;

use serde::Serialize;

use agentic_core::config::{AppConfig, DatabaseConfig, LoadOptions};
use agentic_db::{connect_with_settings, migrations, DbPool};

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
        };
        Self { exit_code, output: serialize_payload(payload) }
    }
}

/// A failed command step: error class, message, and process exit code.
#[derive(Debug)]
struct StepFailure {
    error_class: &'static str,
    message: String,
    exit_code: u8,
}

impl StepFailure {
    fn new(error_class: &'static str, message: impl Into<String>, exit_code: u8) -> Self {
        Self { error_class, message: message.into(), exit_code }
    }

    fn into_result(self, command: &str) -> CommandResult {
        CommandResult::failure(command, self.error_class, self.message, self.exit_code)
    }
}

fn load_config() -> Result<AppConfig, StepFailure> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        StepFailure::new("config_validation", format!("configuration issue: {error}"), 2)
    })
}

fn current_thread_runtime() -> Result<tokio::runtime::Runtime, StepFailure> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        StepFailure::new("runtime_init", format!("failed to initialize async runtime: {error}"), 3)
    })
}

async fn open_migrated_pool(database: &DatabaseConfig) -> Result<DbPool, StepFailure> {
    let pool =
        connect_with_settings(&database.url, database.max_connections, database.timeout_secs)
            .await
            .map_err(|error| StepFailure::new("db_connectivity", error.to_string(), 4))?;
    if let Err(error) = migrations::run_pending(&pool).await {
        pool.close().await;
        return Err(StepFailure::new("migration", error.to_string(), 5));
    }
    Ok(pool)
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}
