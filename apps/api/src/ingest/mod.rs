//! Document text extraction: the thin collaborator that turns uploaded
//! binary documents into raw text for the extractor. Not part of the scoring
//! core.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("DOCX extraction failed: {0}")]
    Docx(String),

    #[error("Plain-text document is not valid UTF-8")]
    Utf8,

    #[error("No text content in document")]
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    /// Detects the format from the multipart content type, falling back to
    /// the file extension. `None` means the file should be skipped.
    pub fn detect(content_type: Option<&str>, file_name: &str) -> Option<Self> {
        match content_type {
            Some("application/pdf") => return Some(Self::Pdf),
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document") => {
                return Some(Self::Docx)
            }
            Some("text/plain") => return Some(Self::Text),
            _ => {}
        }
        let lower = file_name.to_lowercase();
        if lower.ends_with(".pdf") {
            Some(Self::Pdf)
        } else if lower.ends_with(".docx") {
            Some(Self::Docx)
        } else if lower.ends_with(".txt") {
            Some(Self::Text)
        } else {
            None
        }
    }
}

static BLANK_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// `bytes, format -> text`. Collapses runs of blank lines so the section
/// regexes downstream see consistent separators.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, IngestError> {
    let text = match format {
        DocumentFormat::Pdf => {
            pdf_extract::extract_text_from_mem(bytes).map_err(|e| IngestError::Pdf(e.to_string()))?
        }
        DocumentFormat::Docx => extract_text_from_docx(bytes)?,
        DocumentFormat::Text => {
            String::from_utf8(bytes.to_vec()).map_err(|_| IngestError::Utf8)?
        }
    };

    let text = BLANK_RUN_RE.replace_all(&text, "\n\n").trim().to_string();
    if text.is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(text)
}

fn extract_text_from_docx(bytes: &[u8]) -> Result<String, IngestError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| IngestError::Docx(e.to_string()))?;
    let mut text = String::new();
    for child in docx.document.children {
        if let docx_rs::DocumentChild::Paragraph(paragraph) = child {
            for para_child in paragraph.children {
                if let docx_rs::ParagraphChild::Run(run) = para_child {
                    for run_child in run.children {
                        if let docx_rs::RunChild::Text(t) = run_child {
                            text.push_str(&t.text);
                        }
                    }
                }
            }
            text.push('\n');
        }
    }
    Ok(text)
}
