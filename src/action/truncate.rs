//! Cut over-generated model output down to its first Thought/Action step.
//!
//! Models asked for one step often keep going and invent further steps or
//! their own `Observation:` lines. Only the first step may be executed.

use super::{ACTION_MARKER, OBSERVATION_MARKER, THOUGHT_MARKER};

/// Effective model output after truncation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation {
    pub text: String,
    /// True when the effective text differs from the trimmed raw output.
    pub truncated: bool,
}

/// Keep the span from the first `Thought:` through its `Action:` line(s), up to
/// the next line that starts a new `Thought:`, `Action:` or `Observation:`.
///
/// Output without a `Thought:`…`Action:` pair is returned unchanged.
pub fn truncate_to_first_step(output: &str) -> Truncation {
    let unchanged = || Truncation {
        text: output.to_string(),
        truncated: false,
    };

    let Some(thought) = output.find(THOUGHT_MARKER) else {
        return unchanged();
    };
    let search_from = thought + THOUGHT_MARKER.len();
    let Some(action) = output[search_from..].find(ACTION_MARKER) else {
        return unchanged();
    };
    let body_start = search_from + action + ACTION_MARKER.len();

    let end = step_boundary(output, body_start).unwrap_or(output.len());
    let span = output[thought..end].trim();

    Truncation {
        text: span.to_string(),
        truncated: span != output.trim(),
    }
}

/// Byte index of the first newline at or after `from` whose following line
/// (ignoring leading whitespace) opens another step.
fn step_boundary(output: &str, from: usize) -> Option<usize> {
    output[from..]
        .match_indices('\n')
        .map(|(idx, _)| from + idx)
        .find(|&newline| {
            let rest = output[newline + 1..].trim_start();
            [THOUGHT_MARKER, ACTION_MARKER, OBSERVATION_MARKER]
                .iter()
                .any(|marker| rest.starts_with(marker))
        })
}
