//! Batch orchestration: extract, screen and rank a set of uploads

use crate::config::FailurePolicy;
use crate::error::{Result, ScreenerError};
use crate::input::InputManager;
use crate::llm::analyzer::{FailureKind, ScreeningClient, ScreeningOutcome};
use crate::llm::inference::CompletionBackend;
use crate::processing::document::{CandidateDocument, JobDescription};
use crate::processing::schema::{HiringDecision, ScreeningRecord};
use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Cooperative cancellation, checked between documents.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchProgress<'a> {
    pub processed: usize,
    pub total: usize,
    pub current: &'a str,
}

impl BatchProgress<'_> {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.processed as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureStage {
    Extraction,
    ModelInvocation,
    SchemaValidation,
}

impl From<FailureKind> for FailureStage {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::ModelInvocation => FailureStage::ModelInvocation,
            FailureKind::SchemaValidation => FailureStage::SchemaValidation,
        }
    }
}

impl fmt::Display for FailureStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureStage::Extraction => f.write_str("extraction"),
            FailureStage::ModelInvocation => f.write_str("model invocation"),
            FailureStage::SchemaValidation => f.write_str("schema validation"),
        }
    }
}

/// A document that produced no screening record of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentFailure {
    pub filename: String,
    pub stage: FailureStage,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    /// Ranked by score, highest first; ties keep upload order.
    pub records: Vec<ScreeningRecord>,
    pub failures: Vec<DocumentFailure>,
    /// Names of processed documents, in upload order
    pub upload_order: Vec<String>,
    pub total_documents: usize,
    pub processed_documents: usize,
    pub cancelled: bool,
    pub model: String,
    pub job_source: String,
    pub started_at: DateTime<Utc>,
    pub processing_time_ms: u64,
}

impl BatchResult {
    pub fn count_decision(&self, decision: HiringDecision) -> usize {
        self.records
            .iter()
            .filter(|r| r.hiring_decision == decision)
            .count()
    }

    /// Fails with `Cancelled` when the batch was stopped before anything was ranked.
    pub fn ensure_screened(&self) -> Result<()> {
        if self.cancelled && self.records.is_empty() {
            return Err(ScreenerError::Cancelled);
        }
        Ok(())
    }

    pub fn failure_for(&self, filename: &str) -> Option<&DocumentFailure> {
        self.failures.iter().find(|f| f.filename == filename)
    }

    /// Records re-ordered as their documents were uploaded.
    pub fn records_in_upload_order(&self) -> Vec<&ScreeningRecord> {
        let mut taken = vec![false; self.records.len()];
        self.upload_order
            .iter()
            .filter_map(|name| {
                let index = self
                    .records
                    .iter()
                    .enumerate()
                    .position(|(i, r)| !taken[i] && &r.filename == name)?;
                taken[index] = true;
                Some(&self.records[index])
            })
            .collect()
    }
}

/// Stable sort by score, descending.
pub fn rank_records(mut records: Vec<ScreeningRecord>) -> Vec<ScreeningRecord> {
    records.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    records
}

/// Drives extraction and screening over one batch of uploads, one document at a time.
pub struct BatchOrchestrator<B> {
    client: ScreeningClient<B>,
    input: InputManager,
    failure_policy: FailurePolicy,
    cancel: CancelFlag,
}

impl<B: CompletionBackend> BatchOrchestrator<B> {
    pub fn new(client: ScreeningClient<B>) -> Self {
        Self {
            client,
            input: InputManager::new(),
            failure_policy: FailurePolicy::default(),
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Shared with the client so a cancel also stops pending retries.
    pub fn with_cancel_flag(mut self, cancel: CancelFlag) -> Self {
        self.client = self.client.with_cancel_flag(cancel.clone());
        self.cancel = cancel;
        self
    }

    /// Screen every document against `job`.
    ///
    /// Per-document failures are recorded in the result, never returned as errors.
    pub async fn run<F>(
        &self,
        job: &JobDescription,
        documents: &[CandidateDocument],
        mut on_progress: F,
    ) -> BatchResult
    where
        F: FnMut(BatchProgress<'_>),
    {
        let start_time = Instant::now();
        let started_at = Utc::now();
        let total = documents.len();
        info!(
            "Screening {} document(s) against job description from {}",
            total,
            job.source()
        );

        let mut records = Vec::with_capacity(total);
        let mut failures = Vec::new();
        let mut upload_order = Vec::with_capacity(total);
        let mut processed = 0;
        let mut cancelled = false;

        for document in documents {
            if self.cancel.is_cancelled() {
                warn!("Batch cancelled after {} of {} documents", processed, total);
                cancelled = true;
                break;
            }

            match self.screen_document(job, document).await {
                Ok(record) => records.push(record),
                Err(failure) => {
                    warn!(
                        "Error processing {} ({}): {}",
                        failure.filename, failure.stage, failure.detail
                    );
                    if self.failure_policy == FailurePolicy::Flag {
                        records.push(
                            ScreeningRecord::fallback(&failure.detail).with_filename(&document.name),
                        );
                    }
                    failures.push(failure);
                }
            }

            upload_order.push(document.name.clone());
            processed += 1;
            on_progress(BatchProgress {
                processed,
                total,
                current: &document.name,
            });
        }

        let records = rank_records(records);
        let processing_time_ms = start_time.elapsed().as_millis() as u64;
        info!(
            "Batch finished: {} ranked, {} failed, {}ms",
            records.len(),
            failures.len(),
            processing_time_ms
        );

        BatchResult {
            records,
            failures,
            upload_order,
            total_documents: total,
            processed_documents: processed,
            cancelled,
            model: self.client.model_name().to_string(),
            job_source: job.source().to_string(),
            started_at,
            processing_time_ms,
        }
    }

    async fn screen_document(
        &self,
        job: &JobDescription,
        document: &CandidateDocument,
    ) -> std::result::Result<ScreeningRecord, DocumentFailure> {
        let text = self.input.extract_text(document).map_err(|e| DocumentFailure {
            filename: document.name.clone(),
            stage: FailureStage::Extraction,
            detail: e.to_string(),
        })?;

        match self.client.screen(&text, job).await {
            ScreeningOutcome::Success(record) => Ok(record.with_filename(&document.name)),
            ScreeningOutcome::Failure(failure) => Err(DocumentFailure {
                filename: document.name.clone(),
                stage: failure.kind.into(),
                detail: failure.detail,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, score: u8) -> ScreeningRecord {
        ScreeningRecord {
            candidate_name: name.to_string(),
            match_score: score,
            summary: String::new(),
            must_have_check: vec![],
            missing_critical_skills: vec![],
            cultural_fit_analysis: String::new(),
            interview_questions: vec!["a".into(), "b".into(), "c".into()],
            hiring_decision: HiringDecision::Potential,
            filename: format!("{}.pdf", name),
        }
    }

    #[test]
    fn test_rank_is_descending_and_stable() {
        let ranked = rank_records(vec![
            record("first-60", 60),
            record("top", 95),
            record("second-60", 60),
            record("low", 10),
            record("third-60", 60),
        ]);

        let names: Vec<_> = ranked.iter().map(|r| r.candidate_name.as_str()).collect();
        assert_eq!(names, vec!["top", "first-60", "second-60", "third-60", "low"]);
    }

    #[test]
    fn test_progress_fraction() {
        let progress = BatchProgress { processed: 1, total: 4, current: "a.pdf" };
        assert!((progress.fraction() - 0.25).abs() < f64::EPSILON);

        let empty = BatchProgress { processed: 0, total: 0, current: "" };
        assert_eq!(empty.fraction(), 1.0);
    }

    #[test]
    fn test_cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let clone = flag.clone();
        assert!(!flag.is_cancelled());
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    fn batch(records: Vec<ScreeningRecord>, cancelled: bool) -> BatchResult {
        BatchResult {
            upload_order: records.iter().map(|r| r.filename.clone()).collect(),
            processed_documents: records.len(),
            total_documents: 3,
            records,
            failures: vec![],
            cancelled,
            model: "test".to_string(),
            job_source: "inline".to_string(),
            started_at: Utc::now(),
            processing_time_ms: 0,
        }
    }

    #[test]
    fn test_cancelled_empty_batch_is_an_error() {
        let err = batch(vec![], true).ensure_screened().unwrap_err();
        assert!(matches!(err, ScreenerError::Cancelled));

        assert!(batch(vec![record("early", 70)], true).ensure_screened().is_ok());
        assert!(batch(vec![], false).ensure_screened().is_ok());
    }

    #[test]
    fn test_failure_stage_from_kind() {
        assert_eq!(FailureStage::from(FailureKind::ModelInvocation), FailureStage::ModelInvocation);
        assert_eq!(FailureStage::from(FailureKind::SchemaValidation), FailureStage::SchemaValidation);
    }
}
