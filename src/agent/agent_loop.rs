//! Core agent loop implementation.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;

use crate::action::{parse_model_output, truncate_to_first_step, Action, ActionError, ToolArgs};
use crate::config::Config;
use crate::llm::{LlmClient, LlmError, OpenAiCompatibleClient};
use crate::tools::{ToolError, ToolRegistry};

use super::history::History;
use super::prompt::build_system_prompt;

/// Errors that abort a session. Everything else ends in an [`Outcome`].
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("request must not be empty")]
    EmptyRequest,

    #[error("model call failed in cycle {cycle}: {source}")]
    Llm {
        cycle: usize,
        #[source]
        source: LlmError,
    },
}

/// Terminal state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model called `finish`.
    Finished { answer: String },
    /// The model output could not be parsed into an action.
    ParseFailed { error: ActionError },
    /// The cycle budget ran out before `finish`.
    BudgetExhausted { cycles: usize },
}

/// Result of one agent run.
#[derive(Debug, Clone)]
pub struct Session {
    pub history: History,
    /// Number of model calls made.
    pub cycles: usize,
    pub outcome: Outcome,
}

impl Session {
    /// The final answer, if the session finished.
    pub fn answer(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Finished { answer } => Some(answer),
            _ => None,
        }
    }
}

/// Progress notifications emitted while a session runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    CycleStarted { cycle: usize, max_cycles: usize },
    /// The model produced more than one step; `raw` is what it sent.
    OutputTruncated { raw: String },
    /// The effective model output appended to history.
    ModelOutput { text: String },
    /// The observation entry appended to history.
    Observation { text: String },
}

/// The ReAct agent.
pub struct Agent {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    system_prompt: String,
    max_cycles: usize,
    events: Option<mpsc::UnboundedSender<AgentEvent>>,
}

impl Agent {
    /// Create an agent over an injected model client and tool registry.
    pub fn new(llm: Arc<dyn LlmClient>, tools: Arc<ToolRegistry>, max_cycles: usize) -> Self {
        let system_prompt = build_system_prompt(&tools);
        Self {
            llm,
            tools,
            system_prompt,
            max_cycles,
            events: None,
        }
    }

    /// Create an agent with the HTTP model client and the default tools.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let llm = Arc::new(OpenAiCompatibleClient::from_config(config)?);
        let tools = Arc::new(ToolRegistry::with_defaults(&config.tools)?);
        Ok(Self::new(llm, tools, config.max_iterations))
    }

    /// Stream progress events to `tx`.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn max_cycles(&self) -> usize {
        self.max_cycles
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching.
            let _ = tx.send(event);
        }
    }

    /// Run think-act-observe cycles for `request` until the model finishes,
    /// its output cannot be parsed, or the cycle budget runs out.
    ///
    /// # Errors
    ///
    /// `AgentError::EmptyRequest` for a blank request, `AgentError::Llm` when
    /// the model call fails. Model calls are not retried.
    pub async fn run(&self, request: &str) -> Result<Session, AgentError> {
        let request = request.trim();
        if request.is_empty() {
            return Err(AgentError::EmptyRequest);
        }

        let mut history = History::from_request(request);

        for cycle in 1..=self.max_cycles {
            tracing::debug!("Agent cycle {}/{}", cycle, self.max_cycles);
            self.emit(AgentEvent::CycleStarted {
                cycle,
                max_cycles: self.max_cycles,
            });

            let prompt = history.render();
            let raw = self
                .llm
                .generate(&prompt, &self.system_prompt)
                .await
                .map_err(|source| AgentError::Llm { cycle, source })?;

            let step = truncate_to_first_step(&raw);
            if step.truncated {
                tracing::warn!("Dropped extra Thought/Action content from model output");
                self.emit(AgentEvent::OutputTruncated { raw });
            }

            let output = step.text;
            let parsed = parse_model_output(&output);
            self.emit(AgentEvent::ModelOutput {
                text: output.clone(),
            });
            history.push(output);

            let (tool_name, arguments) = match parsed {
                Ok(Action::Finish { answer }) => {
                    tracing::info!("Session finished after {} cycle(s)", cycle);
                    return Ok(Session {
                        history,
                        cycles: cycle,
                        outcome: Outcome::Finished { answer },
                    });
                }
                Ok(Action::Invoke {
                    tool_name,
                    arguments,
                }) => (tool_name, arguments),
                Err(error) => {
                    tracing::warn!("Could not parse model output: {}", error);
                    return Ok(Session {
                        history,
                        cycles: cycle,
                        outcome: Outcome::ParseFailed { error },
                    });
                }
            };

            let observation = format!("Observation: {}", self.observe(&tool_name, &arguments).await);
            self.emit(AgentEvent::Observation {
                text: observation.clone(),
            });
            history.push(observation);
        }

        tracing::info!("Cycle budget of {} exhausted without an answer", self.max_cycles);
        Ok(Session {
            history,
            cycles: self.max_cycles,
            outcome: Outcome::BudgetExhausted {
                cycles: self.max_cycles,
            },
        })
    }

    /// Execute a tool call. Failures become observation text for the model.
    async fn observe(&self, tool_name: &str, arguments: &ToolArgs) -> String {
        match self.tools.execute(tool_name, arguments).await {
            Ok(output) => output,
            Err(ToolError::Unknown(name)) => {
                tracing::warn!("Model requested undefined tool '{}'", name);
                format!("错误:未定义的工具 '{}'", name)
            }
            Err(ToolError::Failed { name, source }) => {
                tracing::warn!("Tool '{}' failed: {:#}", name, source);
                format!("错误: {:#}", source)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::tools::Tool;

    const WEATHER_STEP: &str = "Thought: 需要查天气\nAction: get_weather(city=\"北京\", days=\"0\")";
    const WEATHER_REPORT: &str = "北京今天天气: 晴天，气温15°C";

    /// Replays canned completions and records every prompt it receives.
    struct ScriptedLlm {
        responses: Mutex<VecDeque<String>>,
        repeat: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedLlm {
        fn new(responses: &[&str]) -> Self {
            Self {
                responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
                repeat: None,
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn repeating(response: &str) -> Self {
            Self {
                repeat: Some(response.to_string()),
                ..Self::new(&[])
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmClient for ScriptedLlm {
        async fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String, LlmError> {
            assert!(system_prompt.contains("finish(answer="));
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .or_else(|| self.repeat.clone())
                .ok_or(LlmError::Status {
                    status: 503,
                    body: "script exhausted".into(),
                })
        }
    }

    struct StubWeather {
        calls: Mutex<Vec<ToolArgs>>,
    }

    #[async_trait]
    impl Tool for StubWeather {
        fn name(&self) -> &str {
            "get_weather"
        }

        fn description(&self) -> &str {
            "stub weather"
        }

        fn usage(&self) -> &str {
            "get_weather(city=\"...\", days=\"...\")"
        }

        async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String> {
            self.calls.lock().unwrap().push(args.clone());
            Ok(WEATHER_REPORT.to_string())
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "always fails"
        }

        fn usage(&self) -> &str {
            "broken()"
        }

        async fn execute(&self, _args: &ToolArgs) -> anyhow::Result<String> {
            Err(anyhow::anyhow!("backend unavailable"))
        }
    }

    fn registry() -> Arc<ToolRegistry> {
        let mut tools = ToolRegistry::new();
        tools.register(StubWeather {
            calls: Mutex::new(Vec::new()),
        });
        tools.register(Broken);
        Arc::new(tools)
    }

    fn agent(llm: Arc<ScriptedLlm>, max_cycles: usize) -> Agent {
        Agent::new(llm, registry(), max_cycles)
    }

    #[tokio::test]
    async fn weather_then_finish() {
        let llm = Arc::new(ScriptedLlm::new(&[
            WEATHER_STEP,
            "Thought: 已知天气\nAction: finish(answer=\"北京今天晴天，气温15°C\")",
        ]));
        let session = agent(llm.clone(), 5).run("今天北京天气怎么样").await.unwrap();

        assert_eq!(session.answer(), Some("北京今天晴天，气温15°C"));
        assert_eq!(session.cycles, 2);
        assert_eq!(
            session.history.entries()[..3],
            [
                "用户请求: 今天北京天气怎么样".to_string(),
                WEATHER_STEP.to_string(),
                format!("Observation: {}", WEATHER_REPORT),
            ]
        );

        let prompts = llm.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], "用户请求: 今天北京天气怎么样");
        assert!(prompts[1].contains(WEATHER_STEP));
        assert!(prompts[1].ends_with(&format!("Observation: {}", WEATHER_REPORT)));
    }

    #[tokio::test]
    async fn history_grows_two_per_tool_cycle_and_one_for_finish() {
        let llm = Arc::new(ScriptedLlm::new(&[
            WEATHER_STEP,
            WEATHER_STEP,
            WEATHER_STEP,
            "Thought: ok\nAction: finish(answer=\"done\")",
        ]));
        let session = agent(llm, 5).run("q").await.unwrap();
        assert_eq!(session.cycles, 4);
        assert_eq!(session.history.len(), 1 + 2 * 3 + 1);
        assert_eq!(session.answer(), Some("done"));
    }

    #[tokio::test]
    async fn unknown_tool_is_observed_and_loop_continues() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "Thought: 传送过去\nAction: teleport(city=\"北京\")",
            "Thought: 算了\nAction: finish(answer=\"无法传送\")",
        ]));
        let session = agent(llm, 5).run("q").await.unwrap();

        let observation = &session.history.entries()[2];
        assert!(observation.starts_with("Observation: "));
        assert!(observation.contains("teleport"));
        assert!(observation.contains("未定义"));
        assert_eq!(session.answer(), Some("无法传送"));
    }

    #[tokio::test]
    async fn tool_failure_is_observed_and_loop_continues() {
        let llm = Arc::new(ScriptedLlm::new(&[
            "Thought: try\nAction: broken()",
            "Thought: give up\nAction: finish(answer=\"sorry\")",
        ]));
        let session = agent(llm, 5).run("q").await.unwrap();
        assert_eq!(session.history.entries()[2], "Observation: 错误: backend unavailable");
        assert_eq!(session.answer(), Some("sorry"));
    }

    #[tokio::test]
    async fn budget_is_exhausted_after_exactly_max_cycles() {
        let llm = Arc::new(ScriptedLlm::repeating(WEATHER_STEP));
        let session = agent(llm.clone(), 5).run("q").await.unwrap();

        assert_eq!(session.outcome, Outcome::BudgetExhausted { cycles: 5 });
        assert_eq!(session.cycles, 5);
        assert_eq!(session.answer(), None);
        assert_eq!(session.history.len(), 1 + 2 * 5);
        assert_eq!(llm.prompts().len(), 5);
    }

    #[tokio::test]
    async fn missing_action_ends_session() {
        let llm = Arc::new(ScriptedLlm::new(&["I think it is sunny."]));
        let session = agent(llm, 5).run("q").await.unwrap();
        assert_eq!(
            session.outcome,
            Outcome::ParseFailed {
                error: ActionError::MissingAction
            }
        );
        assert_eq!(session.history.len(), 2);
        assert_eq!(session.history.last(), Some("I think it is sunny."));
    }

    #[tokio::test]
    async fn malformed_finish_is_surfaced() {
        let llm = Arc::new(ScriptedLlm::new(&["Thought: done\nAction: finish(\"sunny\")"]));
        let session = agent(llm, 5).run("q").await.unwrap();
        assert!(matches!(
            session.outcome,
            Outcome::ParseFailed {
                error: ActionError::MalformedFinish(_)
            }
        ));
        assert_eq!(session.cycles, 1);
    }

    #[tokio::test]
    async fn malformed_call_is_surfaced() {
        let llm = Arc::new(ScriptedLlm::new(&["Thought: hm\nAction: get_weather city=北京"]));
        let session = agent(llm, 5).run("q").await.unwrap();
        assert!(matches!(
            session.outcome,
            Outcome::ParseFailed {
                error: ActionError::MalformedCall(_)
            }
        ));
    }

    #[tokio::test]
    async fn model_failure_aborts_the_session() {
        let llm = Arc::new(ScriptedLlm::new(&[WEATHER_STEP]));
        let err = agent(llm, 5).run("q").await.unwrap_err();
        assert!(matches!(err, AgentError::Llm { cycle: 2, .. }));
    }

    #[tokio::test]
    async fn empty_request_is_rejected() {
        let llm = Arc::new(ScriptedLlm::new(&[]));
        let err = agent(llm.clone(), 5).run("   ").await.unwrap_err();
        assert!(matches!(err, AgentError::EmptyRequest));
        assert!(llm.prompts().is_empty());
    }

    #[tokio::test]
    async fn over_generated_output_is_truncated_before_dispatch() {
        let raw = format!(
            "{}\nObservation: 北京下雪\nThought: 下雪了\nAction: finish(answer=\"下雪\")",
            WEATHER_STEP
        );
        let llm = Arc::new(ScriptedLlm::new(&[
            raw.as_str(),
            "Thought: 晴天\nAction: finish(answer=\"晴天\")",
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let session = agent(llm, 5).with_events(tx).run("q").await.unwrap();

        assert_eq!(session.history.entries()[1], WEATHER_STEP);
        assert_eq!(session.answer(), Some("晴天"));

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert_eq!(
            events[..4],
            [
                AgentEvent::CycleStarted {
                    cycle: 1,
                    max_cycles: 5
                },
                AgentEvent::OutputTruncated { raw: raw.clone() },
                AgentEvent::ModelOutput {
                    text: WEATHER_STEP.to_string()
                },
                AgentEvent::Observation {
                    text: format!("Observation: {}", WEATHER_REPORT)
                },
            ]
        );
    }
}
