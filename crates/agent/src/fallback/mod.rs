//! Rule-based agent used when the language model cannot be reached.
//!
//! A request moves linearly through
//! `Start -> Classified -> Extracted -> Dispatched -> Formatted -> Done`
//! and performs at most one directory call. Every failure is folded into the
//! returned text.

pub mod dispatch;
pub mod format;
pub mod intent;
pub mod slots;

use std::sync::Arc;

use tracing::{info, warn};

use crate::tools::UserApi;
use dispatch::{Command, Resolution};
use format::format_directory_output;
pub use intent::Intent;

const REPLY_TAG: &str = "[Fallback Agent - AR/EN]";

pub const MISSING_UPDATE_ID_MESSAGE: &str = "[Fallback Agent] I understood you want to update a user, but I couldn't find the ID. Please specify 'id X'.";

pub const UNRECOGNIZED_MESSAGE: &str = "[Fallback Agent] I understood you want to do something, but since the AI brain (Ollama) is offline, I can only handle 'Register', 'Get Users', and 'Delete All' commands (English or Arabic) right now.";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FallbackStage {
    Start,
    Classified,
    Extracted,
    Dispatched,
    Formatted,
    Done,
}

/// Result of one fallback request: the reply text plus where the request stopped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FallbackOutcome {
    pub intent: Intent,
    pub stage: FallbackStage,
    pub message: String,
}

pub struct FallbackAgent {
    api: Arc<UserApi>,
}

impl FallbackAgent {
    pub fn new(api: Arc<UserApi>) -> Self {
        Self { api }
    }

    pub async fn handle(&self, prompt: &str) -> FallbackOutcome {
        info!(event_name = "agent.fallback.prompt", prompt, "fallback agent processing prompt");

        let intent = intent::classify(prompt);
        info!(
            event_name = "agent.fallback.classified",
            intent = intent.as_str(),
            "fallback agent detected intent"
        );
        if intent == Intent::Unrecognized {
            return FallbackOutcome {
                intent,
                stage: FallbackStage::Classified,
                message: UNRECOGNIZED_MESSAGE.to_string(),
            };
        }

        let command = match dispatch::resolve(intent, prompt) {
            Resolution::Ready { command, slots } => {
                info!(
                    event_name = "agent.fallback.extracted",
                    intent = intent.as_str(),
                    id = ?slots.id,
                    name = ?slots.name,
                    age = ?slots.age,
                    job_title = ?slots.job_title,
                    "fallback agent extracted slots"
                );
                command
            }
            Resolution::MissingUpdateId { slots } => {
                warn!(
                    event_name = "agent.fallback.missing_id",
                    intent = intent.as_str(),
                    name = ?slots.name,
                    age = ?slots.age,
                    job_title = ?slots.job_title,
                    "update prompt carried no usable id"
                );
                return FallbackOutcome {
                    intent,
                    stage: FallbackStage::Extracted,
                    message: MISSING_UPDATE_ID_MESSAGE.to_string(),
                };
            }
            Resolution::Unresolved => {
                return FallbackOutcome {
                    intent,
                    stage: FallbackStage::Extracted,
                    message: UNRECOGNIZED_MESSAGE.to_string(),
                };
            }
        };

        let raw = dispatch::dispatch(&self.api, &command).await;
        let formatted = format_directory_output(&raw);

        FallbackOutcome { intent, stage: FallbackStage::Done, message: reply(&command, &formatted) }
    }
}

fn reply(command: &Command, formatted: &str) -> String {
    match command {
        Command::Register(_) => format!(
            "{REPLY_TAG} I've registered the user successfully. (AI was offline, used logic). Details:\n{formatted}"
        ),
        Command::List => format!("{REPLY_TAG} Here is the list of users:\n{formatted}"),
        _ => format!("{REPLY_TAG} {formatted}"),
    }
}
