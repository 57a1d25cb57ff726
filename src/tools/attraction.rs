//! Attraction recommendations via the Tavily search API.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{required_arg, Tool};
use crate::action::ToolArgs;

const MAX_RESULTS_SHOWN: usize = 3;

/// `get_attraction(city, weather)`.
pub struct AttractionTool {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct SearchRequest<'a> {
    query: String,
    search_depth: &'a str,
    include_answer: bool,
    max_results: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
}

impl AttractionTool {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl Tool for AttractionTool {
    fn name(&self) -> &str {
        "get_attraction"
    }

    fn description(&self) -> &str {
        "根据城市和天气搜索推荐的旅游景点。city: 城市名称（必填）；weather: 天气描述（必填）"
    }

    fn usage(&self) -> &str {
        "get_attraction(city=\"城市名\", weather=\"天气描述\")"
    }

    async fn execute(&self, args: &ToolArgs) -> anyhow::Result<String> {
        let city = required_arg(args, "city")?;
        let weather = required_arg(args, "weather")?;

        let Some(api_key) = self.api_key.as_deref() else {
            return Ok("错误: 未配置 TAVILY_API_KEY，无法搜索景点推荐".to_string());
        };

        let request = SearchRequest {
            query: format!("{}在{}天气下最值得去的旅游景点推荐及理由", city, weather),
            search_depth: "basic",
            include_answer: true,
            max_results: 5,
        };

        let response = self
            .http
            .post(format!("{}/search", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow::anyhow!("HTTP error: {}", status));
        }

        let parsed: SearchResponse = response.json().await?;
        Ok(summarize(parsed))
    }
}

fn summarize(response: SearchResponse) -> String {
    if let Some(answer) = response.answer.filter(|a| !a.trim().is_empty()) {
        return answer;
    }

    let lines: Vec<String> = response
        .results
        .iter()
        .take(MAX_RESULTS_SHOWN)
        .map(|r| format!("- {}: {}", r.title, r.content))
        .collect();

    if lines.is_empty() {
        "抱歉，没有找到相关的旅游景点推荐。".to_string()
    } else {
        format!("根据搜索结果，为您找到以下信息:\n{}", lines.join("\n"))
    }
}
