//! Agent module - the ReAct control loop.
//!
//! The agent follows a "think, act, observe" pattern:
//! 1. Replay the history as the prompt and ask the model for one step
//! 2. Keep only the first `Thought:`/`Action:` pair of the reply
//! 3. If the action is `finish`, stop with the answer
//! 4. Otherwise run the named tool and append its observation
//! 5. Repeat until the cycle budget is exhausted

mod agent_loop;
mod history;
mod prompt;

pub use agent_loop::{Agent, AgentError, AgentEvent, Outcome, Session};
pub use history::{History, REQUEST_PREFIX};
pub use prompt::build_system_prompt;
