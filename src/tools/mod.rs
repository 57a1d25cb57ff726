//! Tools the agent can call, and the registry that dispatches to them.
//!
//! A tool takes named string arguments (as parsed from
//! `name(key="value", ...)`) and returns a string observation.

mod attraction;
mod weather;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::action::ToolArgs;
use crate::config::ToolsConfig;

pub use attraction::AttractionTool;
pub use weather::WeatherTool;

/// A callable tool.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in `Action:` lines.
    fn name(&self) -> &str;

    /// What the tool does, shown in the system prompt.
    fn description(&self) -> &str;

    /// Call signature with an example, shown in the system prompt.
    fn usage(&self) -> &str;

    /// Run the tool. Errors are reported back to the model, never fatal.
    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String>;
}

/// Tool metadata for prompt building.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub usage: String,
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("tool '{0}' is not defined")]
    Unknown(String),

    #[error("tool '{name}' failed: {source}")]
    Failed {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Name → tool mapping. Built at startup, read-only while the agent runs.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the travel-assistant tools.
    pub fn with_defaults(config: &ToolsConfig) -> anyhow::Result<Self> {
        let mut registry = Self::new();
        registry.register(WeatherTool::new(config.weather_base_url.clone())?);
        registry.register(AttractionTool::new(
            config.tavily_base_url.clone(),
            config.tavily_api_key.clone(),
        )?);
        Ok(registry)
    }

    /// Add a tool, replacing any tool with the same name.
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_string();
        if self.tools.insert(name.clone(), Arc::new(tool)).is_some() {
            tracing::warn!("Tool '{}' registered twice, keeping the newer one", name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Metadata of all tools, sorted by name.
    pub fn list_tools(&self) -> Vec<ToolInfo> {
        let mut infos: Vec<ToolInfo> = self
            .tools
            .values()
            .map(|t| ToolInfo {
                name: t.name().to_string(),
                description: t.description().to_string(),
                usage: t.usage().to_string(),
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        infos
    }

    /// Call a tool by name.
    pub async fn execute(&self, name: &str, args: &ToolArgs) -> Result<String, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::Unknown(name.to_string()))?;

        tracing::info!("Executing tool: {} with args: {:?}", name, args);

        tool.execute(args).await.map_err(|source| ToolError::Failed {
            name: name.to_string(),
            source,
        })
    }
}

/// Fetch a required argument or fail with a message the model can act on.
pub(crate) fn required_arg<'a>(args: &'a ToolArgs, key: &str) -> anyhow::Result<&'a str> {
    args.get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Missing '{}' argument", key))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the text argument"
        }

        fn usage(&self) -> &str {
            "echo(text=\"...\")"
        }

        async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String> {
            Ok(required_arg(args, "text")?.to_string())
        }
    }

    fn args(pairs: &[(&str, &str)]) -> ToolArgs {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn registered_tool_is_executed() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo);
        assert!(registry.contains("echo"));
        let out = registry.execute("echo", &args(&[("text", "hi")])).await.unwrap();
        assert_eq!(out, "hi");
    }

    #[tokio::test]
    async fn unknown_tool_is_reported() {
        let registry = ToolRegistry::new();
        let err = registry.execute("teleport", &ToolArgs::new()).await.unwrap_err();
        assert!(matches!(err, ToolError::Unknown(ref n) if n == "teleport"));
    }

    #[tokio::test]
    async fn tool_failure_carries_the_cause() {
        let mut registry = ToolRegistry::new();
        registry.register(Echo);
        let err = registry.execute("echo", &ToolArgs::new()).await.unwrap_err();
        match err {
            ToolError::Failed { name, source } => {
                assert_eq!(name, "echo");
                assert!(source.to_string().contains("Missing 'text' argument"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn defaults_register_travel_tools() {
        let registry = ToolRegistry::with_defaults(&ToolsConfig::default()).unwrap();
        let names: Vec<String> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["get_attraction", "get_weather"]);
    }
}
