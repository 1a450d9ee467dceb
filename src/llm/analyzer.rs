//! Screening client: one schema-validated outcome per résumé

use crate::config::LlmConfig;
use crate::error::ScreenerError;
use crate::llm::inference::CompletionBackend;
use crate::llm::prompts::{PromptParams, PromptTemplates};
use crate::processing::batch::CancelFlag;
use crate::processing::document::JobDescription;
use crate::processing::schema::ScreeningRecord;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// Transport, provider status or empty reply
    ModelInvocation,
    /// Reply did not satisfy the screening schema
    SchemaValidation,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::ModelInvocation => f.write_str("model invocation"),
            FailureKind::SchemaValidation => f.write_str("schema validation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningFailure {
    pub kind: FailureKind,
    pub detail: String,
    pub attempts: u32,
}

impl ScreeningFailure {
    fn from_error(err: &ScreenerError, attempts: u32) -> Self {
        let kind = match err {
            ScreenerError::SchemaValidation(_) | ScreenerError::Serialization(_) => {
                FailureKind::SchemaValidation
            }
            _ => FailureKind::ModelInvocation,
        };
        Self {
            kind,
            detail: err.to_string(),
            attempts,
        }
    }

    /// The zero-score Reject record used when failures are ranked.
    pub fn fallback_record(&self) -> ScreeningRecord {
        ScreeningRecord::fallback(&self.detail)
    }
}

/// Result of screening one résumé. Never an `Err`: failures are data.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreeningOutcome {
    Success(ScreeningRecord),
    Failure(ScreeningFailure),
}

impl ScreeningOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ScreeningOutcome::Success(_))
    }

    /// Collapse to a record, substituting the fallback for failures.
    pub fn into_record(self) -> ScreeningRecord {
        match self {
            ScreeningOutcome::Success(record) => record,
            ScreeningOutcome::Failure(failure) => failure.fallback_record(),
        }
    }
}

/// Bounded exponential backoff for transient model failures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&LlmConfig::default())
    }
}

/// Sends (résumé, job description) pairs to a model and validates the replies
pub struct ScreeningClient<B> {
    backend: B,
    prompt_templates: PromptTemplates,
    retry: RetryPolicy,
    cancel: CancelFlag,
}

impl<B: CompletionBackend> ScreeningClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            prompt_templates: PromptTemplates::default(),
            retry: RetryPolicy::default(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Once cancelled, a failing request is reported instead of retried.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn model_name(&self) -> &str {
        self.backend.model_name()
    }

    /// Screen one résumé. Empty résumé text is sent as-is; the model scores it.
    pub async fn screen(&self, resume_text: &str, job: &JobDescription) -> ScreeningOutcome {
        let start_time = Instant::now();
        let prompt = self.prompt_templates.render_screening(&PromptParams {
            resume_content: resume_text.to_string(),
            job_content: job.text().to_string(),
        });

        let mut attempt = 0;
        loop {
            attempt += 1;
            let result = match self.backend.complete(&prompt).await {
                Ok(raw) => ScreeningRecord::from_model_reply(&raw),
                Err(e) => Err(e),
            };

            match result {
                Ok(record) => {
                    info!(
                        "Screened {} with {}: {} ({}) in {}ms",
                        record.candidate_name,
                        self.backend.model_name(),
                        record.match_score,
                        record.hiring_decision,
                        start_time.elapsed().as_millis()
                    );
                    return ScreeningOutcome::Success(record);
                }
                Err(e)
                    if e.is_transient()
                        && attempt <= self.retry.max_retries
                        && !self.cancel.is_cancelled() =>
                {
                    let delay = self.retry.delay_for(attempt - 1);
                    warn!("Attempt {} failed ({}); retrying in {:?}", attempt, e, delay);
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!("Screening failed after {} attempt(s): {}", attempt, e);
                    debug!("Prompt that failed was {} chars", prompt.user.len());
                    return ScreeningOutcome::Failure(ScreeningFailure::from_error(&e, attempt));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::llm::prompts::ScreeningPrompt;
    use crate::processing::schema::HiringDecision;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays scripted replies in order and records every prompt.
    struct ScriptedBackend {
        replies: Mutex<VecDeque<Result<String>>>,
        prompts: Mutex<Vec<ScreeningPrompt>>,
    }

    impl ScriptedBackend {
        fn new(replies: Vec<Result<String>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    impl CompletionBackend for &ScriptedBackend {
        async fn complete(&self, prompt: &ScreeningPrompt) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ScreenerError::EmptyResponse))
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn valid_reply(score: u8) -> String {
        serde_json::json!({
            "candidate_name": "Ada Lovelace",
            "match_score": score,
            "summary": "Analytical engineer",
            "must_have_check": ["Python"],
            "missing_critical_skills": ["Kubernetes"],
            "cultural_fit_analysis": "Curious",
            "interview_questions": ["Q1", "Q2", "Q3", "Q4"],
            "hiring_decision": "Potential"
        })
        .to_string()
    }

    fn job() -> JobDescription {
        JobDescription::new("Requires Python, 5 years experience", "inline").unwrap()
    }

    fn fast_retry(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_success_returns_validated_record() {
        let backend = ScriptedBackend::new(vec![Ok(valid_reply(72))]);
        let client = ScreeningClient::new(&backend).with_retry(RetryPolicy::none());

        let outcome = client.screen("Python, 6 years", &job()).await;
        match outcome {
            ScreeningOutcome::Success(record) => {
                assert_eq!(record.match_score, 72);
                assert_eq!(record.hiring_decision, HiringDecision::Potential);
            }
            other => panic!("expected success, got {:?}", other),
        }

        let prompts = backend.prompts.lock().unwrap();
        assert!(prompts[0].user.contains("Python, 6 years"));
        assert!(prompts[0].user.contains("Requires Python, 5 years experience"));
    }

    #[tokio::test]
    async fn test_failures_become_fallback_records() {
        let cases = vec![
            (Err(ScreenerError::Network("connection refused".into())), FailureKind::ModelInvocation),
            (Ok("{not json".to_string()), FailureKind::SchemaValidation),
            (Ok(r#"{"candidate_name":"X","match_score":50}"#.to_string()), FailureKind::SchemaValidation),
            (Ok(String::new()), FailureKind::ModelInvocation),
        ];

        for (reply, expected_kind) in cases {
            let backend = ScriptedBackend::new(vec![reply]);
            let client = ScreeningClient::new(&backend).with_retry(RetryPolicy::none());

            let outcome = client.screen("some cv", &job()).await;
            let failure = match &outcome {
                ScreeningOutcome::Failure(f) => f.clone(),
                other => panic!("expected failure, got {:?}", other),
            };
            assert_eq!(failure.kind, expected_kind);

            let record = outcome.into_record();
            assert_eq!(record.match_score, 0);
            assert_eq!(record.hiring_decision, HiringDecision::Reject);
            assert!(record.summary.starts_with("Error Details:"));
        }
    }

    #[tokio::test]
    async fn test_out_of_range_score_is_rejected_locally() {
        let reply = valid_reply(50).replace("\"match_score\":50", "\"match_score\":140");
        let backend = ScriptedBackend::new(vec![Ok(reply)]);
        let client = ScreeningClient::new(&backend).with_retry(RetryPolicy::none());

        let outcome = client.screen("cv", &job()).await;
        assert!(matches!(
            outcome,
            ScreeningOutcome::Failure(ScreeningFailure { kind: FailureKind::SchemaValidation, .. })
        ));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let backend = ScriptedBackend::new(vec![
            Err(ScreenerError::ModelStatus { status: 503, body: "overloaded".into() }),
            Err(ScreenerError::Network("reset".into())),
            Ok(valid_reply(90)),
        ]);
        let client = ScreeningClient::new(&backend).with_retry(fast_retry(2));

        let outcome = client.screen("cv", &job()).await;
        assert!(outcome.is_success());
        assert_eq!(backend.calls(), 3);
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let backend = ScriptedBackend::new(vec![
            Err(ScreenerError::Network("down".into())),
            Err(ScreenerError::Network("down".into())),
            Err(ScreenerError::Network("down".into())),
        ]);
        let client = ScreeningClient::new(&backend).with_retry(fast_retry(1));

        match client.screen("cv", &job()).await {
            ScreeningOutcome::Failure(failure) => assert_eq!(failure.attempts, 2),
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(backend.calls(), 2);
    }

    #[tokio::test]
    async fn test_schema_failures_are_not_retried() {
        let backend = ScriptedBackend::new(vec![Ok("nope".to_string()), Ok(valid_reply(80))]);
        let client = ScreeningClient::new(&backend).with_retry(fast_retry(3));

        assert!(!client.screen("cv", &job()).await.is_success());
        assert_eq!(backend.calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_client_stops_retrying() {
        let backend = ScriptedBackend::new(vec![
            Err(ScreenerError::Network("timed out".into())),
            Ok(valid_reply(90)),
        ]);
        let cancel = CancelFlag::new();
        let client = ScreeningClient::new(&backend)
            .with_retry(fast_retry(3))
            .with_cancel_flag(cancel.clone());
        cancel.cancel();

        match client.screen("cv", &job()).await {
            ScreeningOutcome::Failure(failure) => {
                assert_eq!(failure.kind, FailureKind::ModelInvocation);
                assert_eq!(failure.attempts, 1);
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(backend.calls(), 1);
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
    }
}
