use agentic_db::migrations::MIGRATOR;

use crate::commands::{
    current_thread_runtime, load_config, open_migrated_pool, CommandResult, StepFailure,
};

const COMMAND: &str = "migrate";

pub fn run() -> CommandResult {
    let outcome = load_config().and_then(|config| {
        let runtime = current_thread_runtime()?;
        runtime.block_on(async {
            let pool = open_migrated_pool(&config.database).await?;
            pool.close().await;
            Ok::<(), StepFailure>(())
        })
    });

    match outcome {
        Ok(()) => CommandResult::success(
            COMMAND,
            format!("applied pending migrations ({} known)", MIGRATOR.iter().count()),
        ),
        Err(failure) => failure.into_result(COMMAND),
    }
}
