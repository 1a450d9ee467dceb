//! Prompt templates for candidate screening

use log::debug;
use serde::{Deserialize, Serialize};

/// Prompt templates sent with every screening request
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub system: String,
    pub screening: String,
}

impl Default for PromptTemplates {
    fn default() -> Self {
        Self {
            system: SYSTEM_TEMPLATE.to_string(),
            screening: SCREENING_TEMPLATE.to_string(),
        }
    }
}

/// Parameters for prompt template substitution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptParams {
    pub resume_content: String,
    pub job_content: String,
}

/// A rendered prompt ready for a backend
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningPrompt {
    pub system: String,
    pub user: String,
}

impl PromptTemplates {
    pub fn render_screening(&self, params: &PromptParams) -> ScreeningPrompt {
        let resume = if params.resume_content.trim().is_empty() {
            EMPTY_RESUME_PLACEHOLDER
        } else {
            params.resume_content.as_str()
        };

        let user = fill_placeholders(
            &self.screening,
            &[("{job}", params.job_content.as_str()), ("{resume}", resume)],
        );

        debug!(
            "Rendered screening prompt: {} chars (resume {}, job {})",
            user.len(),
            params.resume_content.len(),
            params.job_content.len()
        );

        ScreeningPrompt {
            system: self.system.clone(),
            user,
        }
    }
}

/// Single-pass substitution; inserted values are never scanned for placeholders.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|at| (at, *key, *value)))
            .min_by_key(|(at, _, _)| *at);

        match next {
            Some((at, key, value)) => {
                output.push_str(&rest[..at]);
                output.push_str(value);
                rest = &rest[at + key.len()..];
            }
            None => {
                output.push_str(rest);
                return output;
            }
        }
    }
}

const EMPTY_RESUME_PLACEHOLDER: &str = "(no text could be read from this CV)";

const SYSTEM_TEMPLATE: &str = "You are a Senior Talent Acquisition Specialist. \
You screen candidate CVs against a job description and answer only with JSON that matches the provided schema.";

const SCREENING_TEMPLATE: &str = r#"TASK: Screen the candidate CV below against the job description.

<JOB DESCRIPTION>
{job}
</JOB DESCRIPTION>

<CANDIDATE CV>
{resume}
</CANDIDATE CV>

INSTRUCTIONS:
1. Analyze the match based on Must-Have skills first; nice-to-have skills only adjust the score.
2. Provide a strict match_score as an integer from 0 to 100.
3. Set hiring_decision to exactly one of: Shortlist, Potential, Reject.
4. List confirmed must-have skills in must_have_check and absent ones in missing_critical_skills.
5. Write 3-5 specific technical interview_questions that verify skills the candidate claims.
6. If the CV is empty or unreadable, give a low score and list every must-have skill as missing.

IMPORTANT: Base every field on the actual CV content above, not on generic assumptions."#;
