//! Candidate screener library

pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod processing;
pub mod llm;
pub mod output;

pub use config::Config;
pub use error::{Result, ScreenerError};
pub use llm::analyzer::{ScreeningClient, ScreeningOutcome};
pub use processing::batch::{BatchOrchestrator, BatchResult};
pub use processing::schema::{HiringDecision, ScreeningRecord};
