use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::llm::{ChatMessage, LlmClient, LlmError};
use crate::tools::ToolRegistry;

pub const DEFAULT_REPLY: &str = "Task completed.";

pub const SYSTEM_PROMPT: &str = "You are 'Agentic', an intelligent and precise assistant for the User Management System.
CORE RESPONSIBILITIES:
1. Support multiple languages, including Arabic and English.
2. Use the provided tools to manage users (Create, Read, Update, Delete).
3. If a user request is ambiguous, ASK for clarification instead of guessing.

AVAILABLE TOOLS:
- register_user: Registers a new user. REQUIRED: name, age, jobTitle.
- update_user: Updates an existing user. REQUIRED: id.
- delete_user: Deletes a user. REQUIRED: id.
- delete_all_users: Deletes ALL users. CAUTION: Only use if explicitly requested.
- get_all_users: Lists users. OPTIONAL: jobTitleFilter, minAge, maxAge.
- get_user_by_id: Gets a user. REQUIRED: id.

RESPONSE GUIDELINES:
- After a tool executes, confirm the action in the SAME language the user used.
- Include key details (ID, Name) in your confirmation.
- If the tool fails, explain why based on the error message.";

/// Model-driven agent: model turn, tool execution, model turn, bounded by `max_rounds`.
pub struct ToolCallingAgent {
    client: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    max_rounds: usize,
}

impl ToolCallingAgent {
    pub fn new(client: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, max_rounds: usize) -> Self {
        Self { client, tools, max_rounds: max_rounds.max(1) }
    }

    pub async fn run(&self, prompt: &str) -> Result<String, LlmError> {
        let specs = self.tools.specs();
        let mut messages = vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)];

        for round in 1..=self.max_rounds {
            let reply = self.client.chat(&messages, &specs).await?;
            if reply.tool_calls.is_empty() {
                return Ok(final_text(reply.content));
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);
            for call in calls {
                info!(
                    event_name = "agent.tool.invoked",
                    round,
                    tool = %call.function.name,
                    "model requested tool call"
                );
                let output = match parse_arguments(&call.function.arguments) {
                    Ok(arguments) => self.tools.execute(&call.function.name, arguments).await,
                    Err(error) => Err(error),
                };
                let content = output.unwrap_or_else(|error| {
                    warn!(
                        event_name = "agent.tool.failed",
                        tool = %call.function.name,
                        error = %error,
                        "tool call failed"
                    );
                    format!("Error: {error}")
                });
                messages.push(ChatMessage::tool_result(call.id, content));
            }
        }

        warn!(
            event_name = "agent.tool.rounds_exhausted",
            max_rounds = self.max_rounds,
            "tool round limit reached, requesting final answer"
        );
        let reply = self.client.chat(&messages, &[]).await?;
        Ok(final_text(reply.content))
    }
}

fn parse_arguments(raw: &str) -> anyhow::Result<Value> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(raw)?)
}

fn final_text(content: Option<String>) -> String {
    content.filter(|text| !text.trim().is_empty()).unwrap_or_else(|| DEFAULT_REPLY.to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{ToolCallingAgent, DEFAULT_REPLY};
    use crate::llm::{ChatMessage, ChatRole, FunctionCall, LlmClient, LlmError, ToolCall, ToolSpec};
    use crate::test_support::{DirectoryCall, RecordingDirectory};
    use crate::tools::{ToolRegistry, UserApi};

    /// Replays canned assistant messages and records what it was sent.
    struct ScriptedClient {
        replies: Mutex<VecDeque<ChatMessage>>,
        transcripts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl ScriptedClient {
        fn new(replies: Vec<ChatMessage>) -> Self {
            Self { replies: Mutex::new(replies.into()), transcripts: Mutex::new(Vec::new()) }
        }

        fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
            self.transcripts.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedClient {
        async fn chat(
            &self,
            messages: &[ChatMessage],
            _tools: &[ToolSpec],
        ) -> Result<ChatMessage, LlmError> {
            self.transcripts.lock().expect("lock").push(messages.to_vec());
            self.replies
                .lock()
                .expect("lock")
                .pop_front()
                .ok_or_else(|| LlmError::Decode("script exhausted".to_string()))
        }
    }

    fn tool_call(id: &str, name: &str, arguments: &str) -> ChatMessage {
        ChatMessage {
            role: ChatRole::Assistant,
            content: None,
            tool_calls: vec![ToolCall {
                id: id.to_string(),
                kind: "function".to_string(),
                function: FunctionCall { name: name.to_string(), arguments: arguments.to_string() },
            }],
            tool_call_id: None,
        }
    }

    fn agent(client: Arc<ScriptedClient>, directory: Arc<RecordingDirectory>, rounds: usize) -> ToolCallingAgent {
        let tools = Arc::new(ToolRegistry::user_api(Arc::new(UserApi::new(directory))));
        ToolCallingAgent::new(client, tools, rounds)
    }

    #[tokio::test]
    async fn executes_tool_calls_and_returns_final_answer() {
        let directory =
            Arc::new(RecordingDirectory::with_users(&[("Ahmed", 30, "Engineer")]).await);
        let client = Arc::new(ScriptedClient::new(vec![
            tool_call("call_1", "get_user_by_id", r#"{"id":1}"#),
            ChatMessage::assistant("User 1 is Ahmed."),
        ]));

        let answer = agent(client.clone(), directory.clone(), 5)
            .run("who is user 1?")
            .await
            .expect("agent run");

        assert_eq!(answer, "User 1 is Ahmed.");
        assert_eq!(directory.calls().len(), 1);
        assert!(matches!(directory.calls()[0], DirectoryCall::GetById(_)));

        let second_turn = &client.transcripts()[1];
        let tool_message = second_turn.last().expect("tool result sent back");
        assert_eq!(tool_message.role, ChatRole::Tool);
        assert_eq!(tool_message.tool_call_id.as_deref(), Some("call_1"));
        assert!(tool_message.content.as_deref().unwrap_or_default().contains("\"name\":\"Ahmed\""));
    }

    #[tokio::test]
    async fn tool_failures_are_fed_back_as_error_text() {
        let directory = Arc::new(RecordingDirectory::default());
        let client = Arc::new(ScriptedClient::new(vec![
            tool_call("call_1", "delete_user", "not json"),
            ChatMessage::assistant("I could not do that."),
        ]));

        agent(client.clone(), directory.clone(), 5).run("delete").await.expect("agent run");

        let tool_message = client.transcripts()[1].last().cloned().expect("tool message");
        assert!(tool_message.content.unwrap_or_default().starts_with("Error: "));
        assert!(directory.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_answer_becomes_default_reply() {
        let client = Arc::new(ScriptedClient::new(vec![ChatMessage {
            role: ChatRole::Assistant,
            content: Some("   ".to_string()),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }]));

        let answer = agent(client, Arc::new(RecordingDirectory::default()), 5)
            .run("hello")
            .await
            .expect("agent run");
        assert_eq!(answer, DEFAULT_REPLY);
    }

    #[tokio::test]
    async fn round_limit_forces_a_final_tool_free_turn() {
        let client = Arc::new(ScriptedClient::new(vec![
            tool_call("call_1", "get_all_users", "{}"),
            tool_call("call_2", "get_all_users", ""),
            ChatMessage::assistant("Here are the users."),
        ]));
        let directory = Arc::new(RecordingDirectory::default());

        let answer =
            agent(client.clone(), directory.clone(), 2).run("list").await.expect("agent run");

        assert_eq!(answer, "Here are the users.");
        assert_eq!(directory.calls().len(), 2);
        assert_eq!(client.transcripts().len(), 3);
    }

    #[tokio::test]
    async fn client_errors_propagate() {
        let client = Arc::new(ScriptedClient::new(Vec::new()));
        let error = agent(client, Arc::new(RecordingDirectory::default()), 5)
            .run("anything")
            .await
            .expect_err("script is empty");
        assert!(matches!(error, LlmError::Decode(_)));
    }
}
