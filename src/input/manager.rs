//! Input manager for loading job descriptions and candidate uploads

use crate::error::{Result, ScreenerError};
use crate::input::file_detector::FileType;
use crate::input::text_extractor::{MarkdownExtractor, PdfExtractor, PlainTextExtractor, TextExtractor};
use crate::processing::document::{CandidateDocument, JobDescription};
use log::{debug, info};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Routes documents to the extractor for their file type.
///
/// Nothing is cached: each document is extracted once per batch by the caller.
#[derive(Debug, Default)]
pub struct InputManager;

impl InputManager {
    pub fn new() -> Self {
        Self
    }

    /// Extract the text of an uploaded document.
    pub fn extract_text(&self, document: &CandidateDocument) -> Result<String> {
        let text = match document.file_type() {
            FileType::Pdf => {
                info!("Extracting text from PDF: {}", document.name);
                PdfExtractor.extract(&document.name, &document.bytes)?
            }
            FileType::Text => {
                info!("Reading plain text file: {}", document.name);
                PlainTextExtractor.extract(&document.name, &document.bytes)?
            }
            FileType::Markdown => {
                info!("Processing markdown file: {}", document.name);
                MarkdownExtractor.extract(&document.name, &document.bytes)?
            }
            FileType::Unknown => {
                return Err(ScreenerError::UnsupportedFormat(format!(
                    "Unsupported file type for: {}",
                    document.name
                )));
            }
        };

        debug!("Extracted {} characters from {}", text.len(), document.name);
        Ok(text)
    }

    /// Load a job description file (PDF, TXT or MD).
    pub async fn load_job_description(&self, path: &Path) -> Result<JobDescription> {
        let document = self.read_document(path).await?;
        let text = self.extract_text(&document)?;
        JobDescription::new(text, path.display().to_string())
    }

    /// Read uploads from files and directories, preserving argument order.
    ///
    /// Directories contribute their supported files sorted by name.
    pub async fn load_candidates(&self, paths: &[PathBuf]) -> Result<Vec<CandidateDocument>> {
        let mut documents = Vec::new();

        for path in paths {
            if path.is_dir() {
                for file in self.list_directory(path).await? {
                    documents.push(self.read_document(&file).await?);
                }
            } else {
                documents.push(self.read_document(path).await?);
            }
        }

        if documents.is_empty() {
            return Err(ScreenerError::InvalidInput(
                "No candidate documents found".to_string(),
            ));
        }
        Ok(documents)
    }

    async fn read_document(&self, path: &Path) -> Result<CandidateDocument> {
        if !path.exists() {
            return Err(ScreenerError::InvalidInput(format!(
                "File does not exist: {}",
                path.display()
            )));
        }

        let bytes = fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(CandidateDocument::new(name, bytes))
    }

    async fn list_directory(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = fs::read_dir(dir).await?;
        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let supported = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| FileType::from_extension(ext) != FileType::Unknown)
                .unwrap_or(false);

            if supported && entry.file_type().await?.is_file() {
                files.push(path);
            }
        }

        files.sort();
        Ok(files)
    }
}
