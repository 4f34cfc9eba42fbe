//! Conversational access to the user directory.
//!
//! Prompts normally go to a tool-calling language model (`conversation`,
//! `llm`) that drives the six user-management functions in `tools`. When the
//! model endpoint cannot be reached, `runtime` hands the prompt to the
//! rule-based `fallback` agent, which classifies it (English or Arabic),
//! extracts arguments, makes a single directory call and renders the result.
//!
//! # Key Types
//!
//! - `AgentRuntime` - entry point, chooses between the two agents
//! - `ToolCallingAgent` - bounded model/tool loop
//! - `FallbackAgent` - deterministic classifier and slot extractor
//! - `UserApi` - text-returning facade shared by both agents

pub mod conversation;
pub mod fallback;
pub mod llm;
pub mod runtime;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use conversation::ToolCallingAgent;
pub use fallback::{FallbackAgent, FallbackOutcome, FallbackStage, Intent};
pub use llm::{LlmClient, LlmError, OpenAiCompatibleClient};
pub use runtime::{AgentReply, AgentRuntime};
pub use tools::{Tool, ToolRegistry, UserApi};
