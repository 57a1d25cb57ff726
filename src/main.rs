//! ReAct Agent - interactive travel assistant entry point.
//!
//! Reads one request from stdin, runs the agent and prints the transcript.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use react_agent::agent::{Agent, AgentEvent, Outcome};
use react_agent::config::Config;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const RULE: &str = "============================================================";

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Initialize logging; stdout is reserved for the conversation.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "react_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={} max_iterations={}",
        config.model, config.max_iterations
    );

    println!("{}", RULE);
    println!("欢迎使用智能旅行助手！");
    println!("{}", RULE);
    println!("示例: 请帮我查询一下今天北京的天气，然后根据天气推荐一个合适的旅游景点。");
    println!("{}", "-".repeat(RULE.len()));
    print!("请输入你的问题: ");
    io::stdout().flush()?;

    let mut request = String::new();
    io::stdin().lock().read_line(&mut request)?;
    let request = request.trim();

    if request.is_empty() {
        println!("错误: 输入不能为空！");
        return Ok(ExitCode::from(1));
    }

    println!("\n{}\n开始处理您的请求...\n{}\n", RULE, RULE);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let agent = Agent::from_config(&config)?.with_events(tx);

    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let result = agent.run(request).await;
    // Closing the channel lets the printer drain and stop.
    drop(agent);
    printer.await?;

    let session = result?;
    let code = match &session.outcome {
        Outcome::Finished { answer } => {
            println!("任务完成，最终答案: {}", answer);
            ExitCode::SUCCESS
        }
        Outcome::ParseFailed { error } => {
            println!("解析错误: {}", error);
            ExitCode::from(2)
        }
        Outcome::BudgetExhausted { cycles } => {
            println!("已达到最大循环次数 ({})，未能得到最终答案。", cycles);
            ExitCode::from(2)
        }
    };

    Ok(code)
}

fn print_event(event: &AgentEvent) {
    match event {
        AgentEvent::CycleStarted { cycle, .. } => println!("--- 循环 {} ---\n", cycle),
        AgentEvent::OutputTruncated { .. } => println!("已截断多余的 Thought-Action 对"),
        AgentEvent::ModelOutput { text } => println!("模型输出:\n{}\n", text),
        AgentEvent::Observation { text } => println!("{}\n{}", text, "=".repeat(40)),
    }
}
