//! LLM integration module

pub mod inference;
pub mod prompts;
pub mod analyzer;
