//! Append-only session transcript.

/// Prefix of the first history entry.
pub const REQUEST_PREFIX: &str = "用户请求: ";

/// Ordered transcript: the user request, then model outputs and observations.
///
/// Entries can only be appended. The whole history is replayed as the prompt
/// on every cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct History {
    entries: Vec<String>,
}

impl History {
    /// Start a transcript from the user's request.
    pub fn from_request(request: &str) -> Self {
        Self {
            entries: vec![format!("{}{}", REQUEST_PREFIX, request)],
        }
    }

    pub fn push(&mut self, entry: impl Into<String>) {
        self.entries.push(entry.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prompt text: all entries joined by newlines.
    pub fn render(&self) -> String {
        self.entries.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_request() {
        let history = History::from_request("今天北京天气怎么样");
        assert_eq!(history.entries(), ["用户请求: 今天北京天气怎么样"]);
    }

    #[test]
    fn render_joins_with_newlines() {
        let mut history = History::from_request("q");
        history.push("Thought: t\nAction: a()");
        history.push("Observation: o");
        assert_eq!(history.render(), "用户请求: q\nThought: t\nAction: a()\nObservation: o");
        assert_eq!(history.len(), 3);
        assert_eq!(history.last(), Some("Observation: o"));
    }
}
