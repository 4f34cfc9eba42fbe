use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use agentic_agent::{AgentRuntime, LlmError};
use agentic_core::config::{AppConfig, ConfigError};
use agentic_core::directory::UserDirectory;
use agentic_db::{connect_with_settings, migrations, DbPool, SqlUserDirectory};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub directory: Arc<dyn UserDirectory>,
    pub agent_runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("agent runtime initialization failed: {0}")]
    Agent(#[source] LlmError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let directory: Arc<dyn UserDirectory> = Arc::new(SqlUserDirectory::new(db_pool.clone()));
    let agent_runtime = AgentRuntime::from_config(&config.llm, Arc::clone(&directory))
        .map_err(BootstrapError::Agent)?;
    info!(
        event_name = "system.bootstrap.agent_ready",
        correlation_id = "bootstrap",
        llm_enabled = config.llm.enabled,
        llm_model = %config.llm.model,
        "agent runtime initialized"
    );

    Ok(Application { config, db_pool, directory, agent_runtime: Arc::new(agent_runtime) })
}
