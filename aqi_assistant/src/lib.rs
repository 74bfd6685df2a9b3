//! Conversational assistant over the current air-quality readings.
//!
//! Forwards user questions, with the readings folded into a system prompt,
//! to a hosted chat-completion API.

pub mod api;
pub mod config;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod types;
