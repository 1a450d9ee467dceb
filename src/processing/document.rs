//! Documents flowing into a screening batch

use crate::error::{Result, ScreenerError};
use crate::input::file_detector::FileType;
use serde::{Deserialize, Serialize};

/// Operator-supplied role description, passed to the model verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescription {
    text: String,
    source: String,
}

impl JobDescription {
    /// Rejects descriptions that are empty or only whitespace.
    pub fn new(text: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(ScreenerError::InvalidInput(
                "Job description is empty".to_string(),
            ));
        }
        Ok(Self {
            text,
            source: source.into(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Where the text came from: a file path or "inline".
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// One uploaded résumé: a display name plus raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl CandidateDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    pub fn file_type(&self) -> FileType {
        FileType::from_name(&self.name)
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_description_rejects_blank_text() {
        assert!(JobDescription::new("   \n\t", "inline").is_err());

        let jd = JobDescription::new("Requires Python, 5 years experience", "inline").unwrap();
        assert_eq!(jd.text(), "Requires Python, 5 years experience");
        assert_eq!(jd.source(), "inline");
        assert_eq!(jd.word_count(), 5);
    }

    #[test]
    fn test_candidate_file_type_follows_name() {
        let doc = CandidateDocument::new("Jane Doe.pdf", b"%PDF-1.4".to_vec());
        assert_eq!(doc.file_type(), FileType::Pdf);
        assert_eq!(doc.size_bytes(), 8);
    }
}
