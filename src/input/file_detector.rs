//! File type detection

use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FileType {
    Pdf,
    Text,
    Markdown,
    Unknown,
}

impl FileType {
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "pdf" => FileType::Pdf,
            "txt" => FileType::Text,
            "md" | "markdown" => FileType::Markdown,
            _ => FileType::Unknown,
        }
    }

    /// Detect from a display name or path; names without an extension are `Unknown`.
    pub fn from_name(name: &str) -> Self {
        Path::new(name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(FileType::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(FileType::from_name("alice.PDF"), FileType::Pdf);
        assert_eq!(FileType::from_name("jobs/backend.md"), FileType::Markdown);
        assert_eq!(FileType::from_name("notes.txt"), FileType::Text);
        assert_eq!(FileType::from_name("photo.png"), FileType::Unknown);
        assert_eq!(FileType::from_name("README"), FileType::Unknown);
    }
}
