//! Output formatters for screening results

use crate::config::OutputFormat;
use crate::error::Result;
use crate::output::report::to_csv_string;
use crate::processing::batch::BatchResult;
use crate::processing::schema::{HiringDecision, ScreeningRecord};
use colored::{Color, Colorize};

/// Trait for formatting a finished batch
pub trait OutputFormatter {
    fn format_report(&self, result: &BatchResult) -> Result<String>;
    fn supports_format(&self) -> OutputFormat;
}

/// Console formatter with a ranked summary table and optional detail
pub struct ConsoleFormatter {
    use_colors: bool,
    detailed: bool,
}

/// JSON formatter for structured consumers
pub struct JsonFormatter {
    pretty: bool,
}

pub struct MarkdownFormatter {
    include_metadata: bool,
}

pub struct CsvFormatter;

/// Report generator that coordinates different formatters
pub struct ReportGenerator {
    console_formatter: ConsoleFormatter,
    json_formatter: JsonFormatter,
    markdown_formatter: MarkdownFormatter,
    csv_formatter: CsvFormatter,
}

const NAME_WIDTH: usize = 28;

fn decision_color(decision: HiringDecision) -> Color {
    match decision {
        HiringDecision::Shortlist => Color::Green,
        HiringDecision::Potential => Color::Yellow,
        HiringDecision::Reject => Color::Red,
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn missing_summary(record: &ScreeningRecord) -> String {
    if record.missing_critical_skills.is_empty() {
        "-".to_string()
    } else {
        record.missing_critical_skills.join(", ")
    }
}

impl ConsoleFormatter {
    pub fn new(use_colors: bool, detailed: bool) -> Self {
        Self { use_colors, detailed }
    }

    fn colorize(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            text.color(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn format_header(&self, title: &str, level: u8) -> String {
        let (prefix, color) = match level {
            1 => ("█", Color::Blue),
            2 => ("▓", Color::Green),
            _ => ("▒", Color::Yellow),
        };

        if self.use_colors {
            format!("\n{} {}\n", prefix.color(color).bold(), title.color(color).bold())
        } else {
            format!("\n{} {}\n", prefix, title)
        }
    }

    fn format_decision(&self, decision: HiringDecision) -> String {
        let label = format!("{:<9}", decision.as_str());
        if self.use_colors {
            label.color(decision_color(decision)).bold().to_string()
        } else {
            label
        }
    }

    fn format_detail(&self, record: &ScreeningRecord) -> String {
        let mut output = String::new();
        output.push_str(&self.format_header(
            &format!(
                "{} (Score: {}) - {}",
                record.candidate_name, record.match_score, record.hiring_decision
            ),
            3,
        ));
        output.push_str(&format!("File: {}\n", record.filename));
        output.push_str(&format!("Summary: {}\n", record.summary));
        output.push_str(&format!("Cultural Fit Analysis: {}\n", record.cultural_fit_analysis));

        if !record.must_have_check.is_empty() {
            output.push_str("Must-have skills present:\n");
            for skill in &record.must_have_check {
                output.push_str(&format!("  ✓ {}\n", self.colorize(skill, Color::Green)));
            }
        }

        output.push_str("Missing Critical Skills:\n");
        if record.missing_critical_skills.is_empty() {
            output.push_str("  (none)\n");
        }
        for skill in &record.missing_critical_skills {
            output.push_str(&format!("  - {}\n", self.colorize(skill, Color::Red)));
        }

        output.push_str("Suggested Interview Questions (STAR Method Prep):\n");
        for question in &record.interview_questions {
            output.push_str(&format!("  - {}\n", question));
        }
        output
    }
}

impl OutputFormatter for ConsoleFormatter {
    fn format_report(&self, result: &BatchResult) -> Result<String> {
        let mut output = String::new();

        output.push_str(&self.format_header("📊 SCREENING RESULTS & SHORTLIST", 1));
        output.push_str(&format!(
            "Generated: {} | Model: {} | Job: {} | Processing time: {}ms\n",
            result.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
            result.model,
            result.job_source,
            result.processing_time_ms
        ));
        output.push_str(&format!(
            "Candidates: {} ranked of {} uploaded | {} {} | {} {} | {} {}\n",
            result.records.len(),
            result.total_documents,
            self.colorize("Shortlist", Color::Green),
            result.count_decision(HiringDecision::Shortlist),
            self.colorize("Potential", Color::Yellow),
            result.count_decision(HiringDecision::Potential),
            self.colorize("Reject", Color::Red),
            result.count_decision(HiringDecision::Reject),
        ));

        if result.cancelled {
            output.push_str(&self.colorize(
                &format!(
                    "⚠️  Batch cancelled: {} of {} documents processed\n",
                    result.processed_documents, result.total_documents
                ),
                Color::Yellow,
            ));
        }

        output.push_str(&self.format_header("Ranking", 2));
        if result.records.is_empty() {
            output.push_str("No candidates could be screened.\n");
        } else {
            output.push_str(&format!(
                "{:>3}  {:<width$}  {:>5}  {:<9}  {}\n",
                "#",
                "Candidate",
                "Score",
                "Decision",
                "Missing Critical Skills",
                width = NAME_WIDTH
            ));
            for (i, record) in result.records.iter().enumerate() {
                output.push_str(&format!(
                    "{:>3}  {:<width$}  {:>5}  {}  {}\n",
                    i + 1,
                    truncate(&record.candidate_name, NAME_WIDTH),
                    record.match_score,
                    self.format_decision(record.hiring_decision),
                    missing_summary(record),
                    width = NAME_WIDTH
                ));
            }
        }

        if !result.failures.is_empty() {
            output.push_str(&self.format_header("Errors", 2));
            for failure in &result.failures {
                output.push_str(&format!(
                    "{} Error processing {} ({}): {}\n",
                    self.colorize("✗", Color::Red),
                    failure.filename,
                    failure.stage,
                    failure.detail
                ));
            }
        }

        if self.detailed {
            output.push_str(&self.format_header("Detailed Screening Notes", 2));
            for record in result.records_in_upload_order() {
                output.push_str(&self.format_detail(record));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Console
    }
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_report(&self, result: &BatchResult) -> Result<String> {
        if self.pretty {
            Ok(serde_json::to_string_pretty(result)?)
        } else {
            Ok(serde_json::to_string(result)?)
        }
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Json
    }
}

impl MarkdownFormatter {
    pub fn new(include_metadata: bool) -> Self {
        Self { include_metadata }
    }

    fn escape_cell(text: &str) -> String {
        text.replace('|', "\\|").replace('\n', " ")
    }
}

impl OutputFormatter for MarkdownFormatter {
    fn format_report(&self, result: &BatchResult) -> Result<String> {
        let mut output = String::from("# Screening Results & Shortlist\n\n");

        if self.include_metadata {
            output.push_str(&format!(
                "- **Generated:** {}\n- **Model:** {}\n- **Job description:** {}\n- **Documents:** {} uploaded, {} ranked, {} failed\n\n",
                result.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
                result.model,
                result.job_source,
                result.total_documents,
                result.records.len(),
                result.failures.len()
            ));
        }

        output.push_str("| # | Candidate | Score | Decision | Missing Critical Skills |\n");
        output.push_str("|---|-----------|------:|----------|-------------------------|\n");
        for (i, record) in result.records.iter().enumerate() {
            output.push_str(&format!(
                "| {} | {} | {} | **{}** | {} |\n",
                i + 1,
                Self::escape_cell(&record.candidate_name),
                record.match_score,
                record.hiring_decision,
                Self::escape_cell(&missing_summary(record))
            ));
        }

        if !result.failures.is_empty() {
            output.push_str("\n## Errors\n\n");
            for failure in &result.failures {
                output.push_str(&format!(
                    "- `{}` ({}): {}\n",
                    failure.filename, failure.stage, failure.detail
                ));
            }
        }

        output.push_str("\n## Detailed Screening Notes\n");
        for record in result.records_in_upload_order() {
            output.push_str(&format!(
                "\n### {} (Score: {}) - {}\n\n",
                record.candidate_name, record.match_score, record.hiring_decision
            ));
            output.push_str(&format!("**Summary:** {}\n\n", record.summary));
            output.push_str(&format!("**Cultural Fit Analysis:** {}\n\n", record.cultural_fit_analysis));
            output.push_str("**Missing Critical Skills:**\n\n");
            if record.missing_critical_skills.is_empty() {
                output.push_str("- none\n");
            }
            for skill in &record.missing_critical_skills {
                output.push_str(&format!("- {}\n", skill));
            }
            output.push_str("\n**Suggested Interview Questions:**\n\n");
            for question in &record.interview_questions {
                output.push_str(&format!("1. {}\n", question));
            }
        }

        Ok(output)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Markdown
    }
}

impl OutputFormatter for CsvFormatter {
    fn format_report(&self, result: &BatchResult) -> Result<String> {
        to_csv_string(&result.records)
    }

    fn supports_format(&self) -> OutputFormat {
        OutputFormat::Csv
    }
}

impl ReportGenerator {
    pub fn new() -> Self {
        Self::with_options(true, false)
    }

    pub fn with_options(use_colors: bool, detailed: bool) -> Self {
        Self {
            console_formatter: ConsoleFormatter::new(use_colors, detailed),
            json_formatter: JsonFormatter::new(true),
            markdown_formatter: MarkdownFormatter::new(true),
            csv_formatter: CsvFormatter,
        }
    }

    pub fn generate_report(&self, result: &BatchResult, format: &OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Console => self.console_formatter.format_report(result),
            OutputFormat::Json => self.json_formatter.format_report(result),
            OutputFormat::Markdown => self.markdown_formatter.format_report(result),
            OutputFormat::Csv => self.csv_formatter.format_report(result),
        }
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new()
    }
}
