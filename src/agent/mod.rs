//! Agent module - the bounded tool-calling loop.
//!
//! The agent follows a "tools in a loop" pattern with a hard round budget:
//! 1. Call the model, offering tools on every round but the last
//! 2. If the model requests tool calls, run them concurrently and feed the
//!    results back as tool messages
//! 3. Stop as soon as the model answers without tool calls, or after the
//!    final round, whose response is returned as-is

mod agent_loop;
mod conversation;

pub use agent_loop::{Agent, AgentError};
pub use conversation::{Conversation, RoundState, MAX_ROUNDS};
