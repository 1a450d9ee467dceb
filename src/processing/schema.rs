//! Screening record contract shared by the model request and local validation

use crate::error::{Result, ScreenerError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::LazyLock;

/// Name reserved for records that stand in for a failed screening.
pub const SYSTEM_ERROR_NAME: &str = "System Error";

pub const MIN_SCORE: i64 = 0;
pub const MAX_SCORE: i64 = 100;
pub const MIN_INTERVIEW_QUESTIONS: usize = 3;
pub const MAX_INTERVIEW_QUESTIONS: usize = 5;

static CODE_FENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("code fence pattern compiles")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HiringDecision {
    Shortlist,
    Potential,
    Reject,
}

impl HiringDecision {
    pub const ALL: [HiringDecision; 3] = [
        HiringDecision::Shortlist,
        HiringDecision::Potential,
        HiringDecision::Reject,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HiringDecision::Shortlist => "Shortlist",
            HiringDecision::Potential => "Potential",
            HiringDecision::Reject => "Reject",
        }
    }
}

impl fmt::Display for HiringDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HiringDecision {
    type Err = ScreenerError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ScreenerError::SchemaValidation(format!(
                "hiring_decision must be one of Shortlist, Potential, Reject (got '{}')",
                s
            )))
    }
}

impl TryFrom<String> for HiringDecision {
    type Error = ScreenerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<HiringDecision> for String {
    fn from(decision: HiringDecision) -> Self {
        decision.as_str().to_string()
    }
}

/// Validated analysis of one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScreeningRecord {
    pub candidate_name: String,
    pub match_score: u8,
    pub summary: String,
    pub must_have_check: Vec<String>,
    pub missing_critical_skills: Vec<String>,
    pub cultural_fit_analysis: String,
    pub interview_questions: Vec<String>,
    pub hiring_decision: HiringDecision,
    /// Set by the batch, never by the model.
    #[serde(default)]
    pub filename: String,
}

/// Shape the model is asked to produce. Every field is required.
#[derive(Debug, Deserialize)]
struct ModelReply {
    candidate_name: String,
    match_score: i64,
    summary: String,
    must_have_check: Vec<String>,
    missing_critical_skills: Vec<String>,
    cultural_fit_analysis: String,
    interview_questions: Vec<String>,
    hiring_decision: String,
}

impl ScreeningRecord {
    /// Parse and validate a raw model reply.
    ///
    /// The reply may be wrapped in a Markdown code fence; anything else that does not
    /// match the contract is a `SchemaValidation` error. `filename` is left empty.
    pub fn from_model_reply(raw: &str) -> Result<Self> {
        let body = strip_code_fence(raw);
        if body.is_empty() {
            return Err(ScreenerError::EmptyResponse);
        }

        let reply: ModelReply = serde_json::from_str(body)
            .map_err(|e| ScreenerError::SchemaValidation(format!("Malformed reply: {}", e)))?;

        let candidate_name = reply.candidate_name.trim().to_string();
        if candidate_name.is_empty() {
            return Err(ScreenerError::SchemaValidation(
                "candidate_name is empty".to_string(),
            ));
        }
        if candidate_name == SYSTEM_ERROR_NAME {
            return Err(ScreenerError::SchemaValidation(format!(
                "candidate_name '{}' is reserved",
                SYSTEM_ERROR_NAME
            )));
        }

        if !(MIN_SCORE..=MAX_SCORE).contains(&reply.match_score) {
            return Err(ScreenerError::SchemaValidation(format!(
                "match_score {} is outside {}..={}",
                reply.match_score, MIN_SCORE, MAX_SCORE
            )));
        }

        let questions = reply.interview_questions.len();
        if !(MIN_INTERVIEW_QUESTIONS..=MAX_INTERVIEW_QUESTIONS).contains(&questions) {
            return Err(ScreenerError::SchemaValidation(format!(
                "expected {}-{} interview_questions, got {}",
                MIN_INTERVIEW_QUESTIONS, MAX_INTERVIEW_QUESTIONS, questions
            )));
        }

        Ok(Self {
            candidate_name,
            match_score: reply.match_score as u8,
            summary: reply.summary,
            must_have_check: reply.must_have_check,
            missing_critical_skills: reply.missing_critical_skills,
            cultural_fit_analysis: reply.cultural_fit_analysis,
            interview_questions: reply.interview_questions,
            hiring_decision: reply.hiring_decision.parse()?,
            filename: String::new(),
        })
    }

    /// Sentinel record standing in for a document that could not be screened.
    pub fn fallback(detail: &str) -> Self {
        Self {
            candidate_name: SYSTEM_ERROR_NAME.to_string(),
            match_score: 0,
            summary: format!("Error Details: {}", detail),
            must_have_check: Vec::new(),
            missing_critical_skills: Vec::new(),
            cultural_fit_analysis: "N/A".to_string(),
            interview_questions: Vec::new(),
            hiring_decision: HiringDecision::Reject,
            filename: String::new(),
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn is_full_match(&self) -> bool {
        self.missing_critical_skills.is_empty()
    }
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    CODE_FENCE
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(trimmed)
}

enum FieldKind {
    Text,
    Score,
    List,
    Decision,
}

/// Model-facing fields, in record order.
const FIELDS: &[(&str, FieldKind, &str)] = &[
    ("candidate_name", FieldKind::Text, "Full name of the candidate"),
    ("match_score", FieldKind::Score, "Match score against the job description, integer 0-100"),
    ("summary", FieldKind::Text, "Short summary of the candidate's professional profile"),
    ("must_have_check", FieldKind::List, "Must-have skills the candidate HAS"),
    ("missing_critical_skills", FieldKind::List, "Must-have skills NOT found or insufficient"),
    ("cultural_fit_analysis", FieldKind::Text, "Soft skill and culture fit analysis based on CV keywords"),
    ("interview_questions", FieldKind::List, "3-5 specific technical questions verifying claimed skills"),
    ("hiring_decision", FieldKind::Decision, "Recommendation: 'Shortlist', 'Potential' or 'Reject'"),
];

fn decision_labels() -> Vec<&'static str> {
    HiringDecision::ALL.iter().map(|d| d.as_str()).collect()
}

/// JSON Schema for OpenAI-style `response_format: json_schema` requests.
pub fn response_json_schema() -> Value {
    let mut properties = Map::new();
    for (name, kind, description) in FIELDS {
        let property = match kind {
            FieldKind::Text => json!({ "type": "string", "description": description }),
            FieldKind::Score => json!({ "type": "integer", "description": description }),
            FieldKind::List => json!({
                "type": "array",
                "items": { "type": "string" },
                "description": description
            }),
            FieldKind::Decision => json!({
                "type": "string",
                "enum": decision_labels(),
                "description": description
            }),
        };
        properties.insert(name.to_string(), property);
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": FIELDS.iter().map(|(name, _, _)| *name).collect::<Vec<_>>(),
        "additionalProperties": false
    })
}

/// OpenAPI-subset schema for Gemini `responseSchema`.
pub fn gemini_response_schema() -> Value {
    let mut properties = Map::new();
    for (name, kind, description) in FIELDS {
        let property = match kind {
            FieldKind::Text => json!({ "type": "STRING", "description": description }),
            FieldKind::Score => json!({
                "type": "INTEGER",
                "description": description,
                "minimum": MIN_SCORE,
                "maximum": MAX_SCORE
            }),
            FieldKind::List => json!({
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": description
            }),
            FieldKind::Decision => json!({
                "type": "STRING",
                "enum": decision_labels(),
                "description": description
            }),
        };
        properties.insert(name.to_string(), property);
    }

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": FIELDS.iter().map(|(name, _, _)| *name).collect::<Vec<_>>(),
        "propertyOrdering": FIELDS.iter().map(|(name, _, _)| *name).collect::<Vec<_>>()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(score: i64, decision: &str) -> String {
        json!({
            "candidate_name": "Jane Doe",
            "match_score": score,
            "summary": "Backend engineer",
            "must_have_check": ["Python"],
            "missing_critical_skills": [],
            "cultural_fit_analysis": "Collaborative",
            "interview_questions": ["Q1", "Q2", "Q3"],
            "hiring_decision": decision
        })
        .to_string()
    }

    #[test]
    fn test_valid_reply_is_accepted() {
        let record = ScreeningRecord::from_model_reply(&reply(87, "Shortlist")).unwrap();
        assert_eq!(record.candidate_name, "Jane Doe");
        assert_eq!(record.match_score, 87);
        assert_eq!(record.hiring_decision, HiringDecision::Shortlist);
        assert!(record.filename.is_empty());
        assert!(record.is_full_match());
    }

    #[test]
    fn test_score_bounds() {
        assert!(ScreeningRecord::from_model_reply(&reply(0, "Reject")).is_ok());
        assert!(ScreeningRecord::from_model_reply(&reply(100, "Shortlist")).is_ok());

        for bad in [-1, 101, 250] {
            let err = ScreeningRecord::from_model_reply(&reply(bad, "Reject")).unwrap_err();
            assert!(matches!(err, ScreenerError::SchemaValidation(_)), "score {}", bad);
        }
    }

    #[test]
    fn test_decision_domain() {
        let record = ScreeningRecord::from_model_reply(&reply(50, " potential ")).unwrap();
        assert_eq!(record.hiring_decision, HiringDecision::Potential);

        let err = ScreeningRecord::from_model_reply(&reply(50, "Maybe")).unwrap_err();
        assert!(matches!(err, ScreenerError::SchemaValidation(_)));
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut value: Value = serde_json::from_str(&reply(70, "Potential")).unwrap();
        value.as_object_mut().unwrap().remove("summary");

        let err = ScreeningRecord::from_model_reply(&value.to_string()).unwrap_err();
        assert!(matches!(err, ScreenerError::SchemaValidation(_)));
        assert!(err.to_string().contains("summary"));
    }

    #[test]
    fn test_reserved_and_empty_names() {
        let mut value: Value = serde_json::from_str(&reply(70, "Potential")).unwrap();
        value["candidate_name"] = json!("System Error");
        assert!(ScreeningRecord::from_model_reply(&value.to_string()).is_err());

        value["candidate_name"] = json!("  ");
        assert!(ScreeningRecord::from_model_reply(&value.to_string()).is_err());
    }

    #[test]
    fn test_interview_question_count() {
        let mut value: Value = serde_json::from_str(&reply(70, "Potential")).unwrap();
        value["interview_questions"] = json!(["only one"]);
        assert!(ScreeningRecord::from_model_reply(&value.to_string()).is_err());

        value["interview_questions"] = json!(["1", "2", "3", "4", "5", "6"]);
        assert!(ScreeningRecord::from_model_reply(&value.to_string()).is_err());
    }

    #[test]
    fn test_code_fenced_reply() {
        let fenced = format!("```json\n{}\n```", reply(64, "Potential"));
        let record = ScreeningRecord::from_model_reply(&fenced).unwrap();
        assert_eq!(record.match_score, 64);
    }

    #[test]
    fn test_empty_and_garbage_replies() {
        assert!(matches!(
            ScreeningRecord::from_model_reply("   "),
            Err(ScreenerError::EmptyResponse)
        ));
        assert!(matches!(
            ScreeningRecord::from_model_reply("I think this candidate is great!"),
            Err(ScreenerError::SchemaValidation(_))
        ));
    }

    #[test]
    fn test_fallback_record() {
        let record = ScreeningRecord::fallback("connection refused").with_filename("a.pdf");
        assert_eq!(record.candidate_name, SYSTEM_ERROR_NAME);
        assert_eq!(record.match_score, 0);
        assert_eq!(record.hiring_decision, HiringDecision::Reject);
        assert_eq!(record.summary, "Error Details: connection refused");
        assert!(record.interview_questions.is_empty());
        assert_eq!(record.filename, "a.pdf");
    }

    #[test]
    fn test_schemas_require_every_field() {
        for schema in [response_json_schema(), gemini_response_schema()] {
            let required = schema["required"].as_array().unwrap();
            assert_eq!(required.len(), 8);
            assert!(required.iter().any(|f| f == "hiring_decision"));
            assert!(schema["properties"].get("filename").is_none());
            assert_eq!(
                schema["properties"]["hiring_decision"]["enum"],
                json!(["Shortlist", "Potential", "Reject"])
            );
        }
    }

    #[test]
    fn test_decision_serializes_as_label() {
        let value = serde_json::to_value(HiringDecision::Potential).unwrap();
        assert_eq!(value, json!("Potential"));
    }
}
