use std::sync::Arc;

use agentic_agent::AgentRuntime;
use agentic_core::directory::UserDirectory;
use agentic_db::SqlUserDirectory;

use crate::commands::{
    current_thread_runtime, load_config, open_migrated_pool, CommandResult, StepFailure,
};

const COMMAND: &str = "ask";
const MAX_PROMPT_CHARS: usize = 1000;

/// Runs one prompt against the configured database. `offline` bypasses the model.
pub fn run(prompt: &str, offline: bool) -> CommandResult {
    match answer(prompt, offline) {
        Ok(message) => CommandResult::success(COMMAND, message),
        Err(failure) => failure.into_result(COMMAND),
    }
}

fn answer(prompt: &str, offline: bool) -> Result<String, StepFailure> {
    if prompt.trim().is_empty() {
        return Err(StepFailure::new("invalid_prompt", "prompt must not be empty", 2));
    }
    if prompt.chars().count() > MAX_PROMPT_CHARS {
        return Err(StepFailure::new(
            "invalid_prompt",
            format!("prompt must be at most {MAX_PROMPT_CHARS} characters"),
            2,
        ));
    }

    let config = load_config()?;
    let runtime = current_thread_runtime()?;

    runtime.block_on(async {
        let pool = open_migrated_pool(&config.database).await?;
        let directory: Arc<dyn UserDirectory> = Arc::new(SqlUserDirectory::new(pool.clone()));

        let agent = if offline {
            Ok(AgentRuntime::offline(directory))
        } else {
            AgentRuntime::from_config(&config.llm, directory)
        };
        let reply = match agent {
            Ok(agent) => agent.handle_prompt(prompt).await,
            Err(error) => Err(error),
        };

        pool.close().await;
        reply
            .map(|reply| reply.message)
            .map_err(|error| StepFailure::new("agent", error.to_string(), 6))
    })
}
