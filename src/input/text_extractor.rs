//! Text extraction from uploaded documents

use crate::error::{Result, ScreenerError};
use log::warn;
use pulldown_cmark::{Event, Parser, Tag};
use std::panic::{self, AssertUnwindSafe};

/// PDF files may carry junk before the header; readers accept it within the first KiB.
const PDF_HEADER_WINDOW: usize = 1024;

pub trait TextExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<String>;
}

/// Extracts the native text layer of every page, in document order.
///
/// Scanned documents without a text layer produce empty text; there is no OCR pass.
pub struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<String> {
        if !has_pdf_header(bytes) {
            return Err(ScreenerError::PdfExtraction(format!(
                "'{}' is not a PDF document",
                name
            )));
        }

        // The PDF parser panics on some malformed inputs.
        let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
            pdf_extract::extract_text_from_mem(bytes)
        }))
        .map_err(|_| {
            ScreenerError::PdfExtraction(format!("PDF parser aborted while reading '{}'", name))
        })?;

        let text = extracted.map_err(|e| {
            ScreenerError::PdfExtraction(format!("Failed to extract text from PDF '{}': {}", name, e))
        })?;

        if text.trim().is_empty() {
            warn!("'{}' has no text layer (image-only scan?)", name);
        }
        Ok(text)
    }
}

fn has_pdf_header(bytes: &[u8]) -> bool {
    let window = &bytes[..bytes.len().min(PDF_HEADER_WINDOW)];
    window.windows(5).any(|w| w == b"%PDF-")
}

pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            ScreenerError::InvalidInput(format!("'{}' is not valid UTF-8 text", name))
        })
    }
}

pub struct MarkdownExtractor;

impl TextExtractor for MarkdownExtractor {
    fn extract(&self, name: &str, bytes: &[u8]) -> Result<String> {
        let markdown_content = PlainTextExtractor.extract(name, bytes)?;
        Ok(self.markdown_to_text(&markdown_content))
    }
}

impl MarkdownExtractor {
    fn markdown_to_text(&self, markdown: &str) -> String {
        let mut text = String::new();

        for event in Parser::new(markdown) {
            match event {
                Event::Text(t) | Event::Code(t) => text.push_str(&t),
                Event::SoftBreak | Event::HardBreak => text.push('\n'),
                Event::End(Tag::Paragraph)
                | Event::End(Tag::Heading(..))
                | Event::End(Tag::Item)
                | Event::End(Tag::CodeBlock(_)) => text.push('\n'),
                _ => {}
            }
        }

        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    /// A Helvetica PDF with one line of text per page.
    fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for line in lines {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Count" => kids.len() as i64,
            "Kids" => kids,
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn test_pdf_pages_are_read_in_order() {
        let bytes = pdf_with_pages(&["Ada Lovelace Python", "Kubernetes"]);
        let text = PdfExtractor.extract("ada.pdf", &bytes).unwrap();

        let first = text.find("Python").expect("page 1 text");
        let second = text.find("Kubernetes").expect("page 2 text");
        assert!(first < second);
        assert!(text.contains("Lovelace"));
    }

    #[test]
    fn test_non_pdf_bytes_are_rejected() {
        let err = PdfExtractor.extract("cv.pdf", b"just some text").unwrap_err();
        assert!(matches!(err, ScreenerError::PdfExtraction(_)));
        assert!(err.to_string().contains("cv.pdf"));
    }

    #[test]
    fn test_truncated_pdf_is_an_error_not_a_panic() {
        let err = PdfExtractor.extract("broken.pdf", b"%PDF-1.7\n1 0 obj\n<<").unwrap_err();
        assert!(matches!(err, ScreenerError::PdfExtraction(_)));
    }

    #[test]
    fn test_pdf_header_window() {
        assert!(has_pdf_header(b"%PDF-1.4 rest"));
        assert!(has_pdf_header(b"\x00\x00junk%PDF-1.4"));
        assert!(!has_pdf_header(b""));
        assert!(!has_pdf_header(b"PK\x03\x04"));
    }

    #[test]
    fn test_plain_text_requires_utf8() {
        assert_eq!(PlainTextExtractor.extract("a.txt", b"hello").unwrap(), "hello");
        assert!(PlainTextExtractor.extract("a.txt", &[0xff, 0xfe, 0x00]).is_err());
    }

    #[test]
    fn test_markdown_is_flattened() {
        let md = "# Backend Engineer\n\n**Must have:** Rust, *Tokio*\n\n- Postgres\n- `gRPC`\n";
        let text = MarkdownExtractor.extract("jd.md", md.as_bytes()).unwrap();

        assert!(text.contains("Backend Engineer"));
        assert!(text.contains("Must have: Rust, Tokio"));
        assert!(text.contains("Postgres"));
        assert!(text.contains("gRPC"));
        assert!(!text.contains("**"));
        assert!(!text.contains('#'));
    }
}
