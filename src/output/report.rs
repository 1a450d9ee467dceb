//! Tabular screening report (CSV)

use crate::error::{Result, ScreenerError};
use crate::processing::schema::{HiringDecision, ScreeningRecord};
use log::info;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Column order of the exported report, matching the record fields.
pub const REPORT_COLUMNS: [&str; 9] = [
    "candidate_name",
    "match_score",
    "summary",
    "must_have_check",
    "missing_critical_skills",
    "cultural_fit_analysis",
    "interview_questions",
    "hiring_decision",
    "filename",
];

/// One CSV row; list fields are JSON-encoded inside their cell.
#[derive(Debug, Serialize, Deserialize)]
struct ReportRow {
    candidate_name: String,
    match_score: u8,
    summary: String,
    must_have_check: String,
    missing_critical_skills: String,
    cultural_fit_analysis: String,
    interview_questions: String,
    hiring_decision: HiringDecision,
    filename: String,
}

impl ReportRow {
    fn from_record(record: &ScreeningRecord) -> Result<Self> {
        Ok(Self {
            candidate_name: record.candidate_name.clone(),
            match_score: record.match_score,
            summary: record.summary.clone(),
            must_have_check: serde_json::to_string(&record.must_have_check)?,
            missing_critical_skills: serde_json::to_string(&record.missing_critical_skills)?,
            cultural_fit_analysis: record.cultural_fit_analysis.clone(),
            interview_questions: serde_json::to_string(&record.interview_questions)?,
            hiring_decision: record.hiring_decision,
            filename: record.filename.clone(),
        })
    }

    fn into_record(self) -> Result<ScreeningRecord> {
        Ok(ScreeningRecord {
            candidate_name: self.candidate_name,
            match_score: self.match_score,
            summary: self.summary,
            must_have_check: decode_list(&self.must_have_check)?,
            missing_critical_skills: decode_list(&self.missing_critical_skills)?,
            cultural_fit_analysis: self.cultural_fit_analysis,
            interview_questions: decode_list(&self.interview_questions)?,
            hiring_decision: self.hiring_decision,
            filename: self.filename,
        })
    }
}

fn decode_list(cell: &str) -> Result<Vec<String>> {
    if cell.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(cell)?)
}

/// Write records as CSV. The header row is always written.
pub fn write_csv<W: Write>(records: &[ScreeningRecord], writer: W) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv_writer.write_record(REPORT_COLUMNS)?;
    for record in records {
        csv_writer.serialize(ReportRow::from_record(record)?)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn to_csv_string(records: &[ScreeningRecord]) -> Result<String> {
    let mut buffer = Vec::new();
    write_csv(records, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| ScreenerError::OutputFormatting(format!("CSV output is not UTF-8: {}", e)))
}

/// Parse a report written by [`write_csv`].
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<ScreeningRecord>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();

    for row in csv_reader.deserialize::<ReportRow>() {
        records.push(row?.into_record()?);
    }
    Ok(records)
}

/// Save the report; a directory target gets a timestamped file name.
pub fn save_report(records: &[ScreeningRecord], target: &Path) -> Result<PathBuf> {
    let path = if target.is_dir() {
        target.join(suggest_filename(true))
    } else {
        target.to_path_buf()
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::File::create(&path)?;
    write_csv(records, file)?;
    info!("Wrote screening report for {} candidate(s) to {}", records.len(), path.display());
    Ok(path)
}

pub fn suggest_filename(timestamp: bool) -> String {
    if timestamp {
        format!("screening_report_{}.csv", chrono::Utc::now().format("%Y%m%d_%H%M%S"))
    } else {
        "screening_report.csv".to_string()
    }
}
