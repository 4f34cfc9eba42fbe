use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use agentic_core::config::LlmConfig;
use agentic_core::directory::UserDirectory;

use crate::conversation::ToolCallingAgent;
use crate::fallback::FallbackAgent;
use crate::llm::{LlmClient, LlmError, OpenAiCompatibleClient};
use crate::tools::{ToolRegistry, UserApi};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AgentReply {
    pub message: String,
    pub used_fallback: bool,
}

/// Routes prompts to the model-driven agent, switching to the rule-based
/// fallback when the model endpoint is unreachable or disabled.
pub struct AgentRuntime {
    primary: Option<ToolCallingAgent>,
    fallback: FallbackAgent,
}

impl AgentRuntime {
    pub fn new(primary: Option<ToolCallingAgent>, fallback: FallbackAgent) -> Self {
        Self { primary, fallback }
    }

    pub fn from_config(
        config: &LlmConfig,
        directory: Arc<dyn UserDirectory>,
    ) -> Result<Self, LlmError> {
        if !config.enabled {
            return Ok(Self::offline(directory));
        }
        let client: Arc<dyn LlmClient> = Arc::new(OpenAiCompatibleClient::from_config(config)?);
        Ok(Self::with_client(client, directory, config.max_tool_rounds as usize))
    }

    pub fn with_client(
        client: Arc<dyn LlmClient>,
        directory: Arc<dyn UserDirectory>,
        max_tool_rounds: usize,
    ) -> Self {
        let api = Arc::new(UserApi::new(directory));
        let tools = Arc::new(ToolRegistry::user_api(Arc::clone(&api)));
        Self::new(
            Some(ToolCallingAgent::new(client, tools, max_tool_rounds)),
            FallbackAgent::new(api),
        )
    }

    /// Runtime without a model; every prompt goes to the fallback agent.
    pub fn offline(directory: Arc<dyn UserDirectory>) -> Self {
        Self::new(None, FallbackAgent::new(Arc::new(UserApi::new(directory))))
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    pub async fn handle_prompt(&self, prompt: &str) -> Result<AgentReply, LlmError> {
        let Some(primary) = &self.primary else {
            return Ok(self.run_fallback(prompt).await);
        };

        match primary.run(prompt).await {
            Ok(message) => {
                info!(event_name = "agent.primary.completed", "model-driven agent answered");
                Ok(AgentReply { message, used_fallback: false })
            }
            Err(error) if error.is_unreachable() => {
                warn!(
                    event_name = "agent.primary.unreachable",
                    error = %error,
                    "language model is offline, switching to fallback agent"
                );
                Ok(self.run_fallback(prompt).await)
            }
            Err(error) => Err(error),
        }
    }

    async fn run_fallback(&self, prompt: &str) -> AgentReply {
        let outcome = self.fallback.handle(prompt).await;
        info!(
            event_name = "agent.fallback.completed",
            intent = outcome.intent.as_str(),
            stage = ?outcome.stage,
            "fallback agent answered"
        );
        AgentReply { message: outcome.message, used_fallback: true }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::AgentRuntime;
    use crate::fallback::UNRECOGNIZED_MESSAGE;
    use crate::llm::{ChatMessage, LlmClient, LlmError, ToolSpec};
    use crate::test_support::{DirectoryCall, RecordingDirectory};

    enum Behavior {
        Answer(&'static str),
        Refused,
        ServerError,
    }

    struct FixedClient(Behavior);

    #[async_trait]
    impl LlmClient for FixedClient {
        async fn chat(
            &self,
            _messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<ChatMessage, LlmError> {
            match self.0 {
                Behavior::Answer(text) => Ok(ChatMessage::assistant(text)),
                Behavior::Refused => {
                    Err(LlmError::Unreachable("tcp connect error: Connection refused".to_string()))
                }
                Behavior::ServerError => {
                    Err(LlmError::Status { status: 500, body: "model crashed".to_string() })
                }
            }
        }
    }

    #[tokio::test]
    async fn primary_answer_is_returned_without_fallback() {
        let runtime = AgentRuntime::with_client(
            Arc::new(FixedClient(Behavior::Answer("Hello!"))),
            Arc::new(RecordingDirectory::default()),
            5,
        );

        let reply = runtime.handle_prompt("hi").await.expect("reply");
        assert_eq!(reply.message, "Hello!");
        assert!(!reply.used_fallback);
    }

    #[tokio::test]
    async fn unreachable_model_switches_to_fallback() {
        let directory = Arc::new(RecordingDirectory::default());
        let runtime = AgentRuntime::with_client(
            Arc::new(FixedClient(Behavior::Refused)),
            directory.clone(),
            5,
        );

        let reply = runtime.handle_prompt("delete all users").await.expect("reply");
        assert!(reply.used_fallback);
        assert_eq!(reply.message, "[Fallback Agent - AR/EN] All 0 users deleted successfully.");
        assert_eq!(directory.calls(), vec![DirectoryCall::DeleteAll]);
    }

    #[tokio::test]
    async fn other_model_errors_propagate() {
        let runtime = AgentRuntime::with_client(
            Arc::new(FixedClient(Behavior::ServerError)),
            Arc::new(RecordingDirectory::default()),
            5,
        );

        let error = runtime.handle_prompt("list users").await.expect_err("status error");
        assert!(matches!(error, LlmError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn offline_runtime_always_uses_fallback() {
        let runtime = AgentRuntime::offline(Arc::new(RecordingDirectory::default()));
        assert!(!runtime.has_primary());

        let reply = runtime.handle_prompt("sing a song").await.expect("reply");
        assert!(reply.used_fallback);
        assert_eq!(reply.message, UNRECOGNIZED_MESSAGE);
    }
}
