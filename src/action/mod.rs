//! The `Thought:` / `Action:` wire format spoken between model and agent.
//!
//! Model output is first cut down to a single Thought/Action step
//! ([`truncate_to_first_step`]), then the text after `Action:` is tokenized
//! and parsed into an [`Action`] by a small recursive-descent parser:
//!
//! ```text
//! action := IDENT "(" [ pair { "," pair } [ "," ] ] ")"
//! pair   := IDENT "=" value
//! value  := STRING | IDENT
//! ```
//!
//! `finish` is stricter: exactly one `answer` argument, and it must be a STRING.

mod lexer;
mod parser;
mod truncate;

use std::collections::BTreeMap;

use thiserror::Error;

pub use parser::parse_action;
pub use truncate::{truncate_to_first_step, Truncation};

pub const THOUGHT_MARKER: &str = "Thought:";
pub const ACTION_MARKER: &str = "Action:";
pub const OBSERVATION_MARKER: &str = "Observation:";

/// Name of the terminal action.
pub const FINISH: &str = "finish";

/// Named string arguments of a tool invocation.
pub type ToolArgs = BTreeMap<String, String>;

/// A parsed directive from one model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Terminal: the final answer for the user.
    Finish { answer: String },
    /// Non-terminal: call a tool with keyword arguments.
    Invoke { tool_name: String, arguments: ToolArgs },
}

/// Location and description of a grammar violation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at byte {offset})")]
pub struct SyntaxError {
    pub offset: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// Why a model output could not be turned into an [`Action`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("no `Action:` found in model output")]
    MissingAction,

    #[error("malformed finish action, expected finish(answer=\"...\"): {0}")]
    MalformedFinish(SyntaxError),

    #[error("malformed tool call, expected name(key=\"value\", ...): {0}")]
    MalformedCall(SyntaxError),
}

/// Return the trimmed text following the first `Action:` marker.
pub fn extract_action_text(output: &str) -> Option<&str> {
    output
        .find(ACTION_MARKER)
        .map(|idx| output[idx + ACTION_MARKER.len()..].trim())
}

/// Locate and parse the action in a (truncated) model output.
pub fn parse_model_output(output: &str) -> Result<Action, ActionError> {
    let text = extract_action_text(output).ok_or(ActionError::MissingAction)?;
    parse_action(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_text_runs_to_end_of_output() {
        let output = "Thought: think\nAction: get_weather(city=\"北京\")\n";
        assert_eq!(extract_action_text(output), Some("get_weather(city=\"北京\")"));
    }

    #[test]
    fn missing_action_marker() {
        assert_eq!(
            parse_model_output("Thought: I am not sure what to do"),
            Err(ActionError::MissingAction)
        );
    }

    #[test]
    fn finish_answer_has_no_quotes() {
        let action =
            parse_model_output("Thought: done\nAction: finish(answer=\"Paris is sunny\")").unwrap();
        assert_eq!(
            action,
            Action::Finish {
                answer: "Paris is sunny".to_string()
            }
        );
    }

    #[test]
    fn weather_call_is_parsed() {
        let action = parse_model_output(
            "Thought: 需要查天气\nAction: get_weather(city=\"北京\", days=\"0\")",
        )
        .unwrap();
        let mut expected = ToolArgs::new();
        expected.insert("city".into(), "北京".into());
        expected.insert("days".into(), "0".into());
        assert_eq!(
            action,
            Action::Invoke {
                tool_name: "get_weather".into(),
                arguments: expected,
            }
        );
    }
}
