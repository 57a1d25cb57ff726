//! # ReAct Agent
//!
//! A minimal tool-using travel assistant, plus a toy BPE tokenizer.
//!
//! This library provides:
//! - A ReAct agent loop driven by an OpenAI-compatible chat API
//! - A small grammar for the `Thought:` / `Action:` format models reply in
//! - Weather and attraction tools behind an injectable registry
//! - Byte Pair Encoding merge learning
//!
//! ## Architecture
//!
//! The agent follows the "think, act, observe" pattern:
//! 1. Replay the transcript to the model and get one Thought/Action step
//! 2. Parse the action: `finish(answer="...")` or `tool(key="value", ...)`
//! 3. Run the tool and append its observation to the transcript
//! 4. Repeat until the model finishes or the cycle budget runs out
//!
//! ## Example
//!
//! ```rust,ignore
//! use react_agent::{agent::Agent, config::Config};
//!
//! let config = Config::from_env()?;
//! let agent = Agent::from_config(&config)?;
//! let session = agent.run("今天北京天气怎么样").await?;
//! println!("{:?}", session.outcome);
//! ```

pub mod action;
pub mod agent;
pub mod bpe;
pub mod config;
pub mod llm;
pub mod tools;

pub use config::Config;
