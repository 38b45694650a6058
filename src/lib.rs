//! # Search Agent
//!
//! An OpenAI-compatible chat endpoint that lets the model search the web.
//!
//! This library provides:
//! - An HTTP API (`POST /v1/chat/completions`) compatible with OpenAI clients
//! - A bounded tool-calling loop around the upstream model
//! - A `search` tool backed by the upstream search API
//!
//! ## Architecture
//!
//! Each request runs the "tools in a loop" pattern with a fixed budget:
//! 1. Call the model with the conversation and the tool declarations
//! 2. Execute any requested tool calls concurrently
//! 3. Append the results and call the model again
//! 4. On the last round, call without tools and return whatever comes back
//!
//! ## Example
//!
//! ```rust,ignore
//! use search_agent::{api, config::Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod llm;
pub mod tools;
pub mod upstream;

pub use config::Config;
