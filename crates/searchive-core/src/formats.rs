//! Supported upload formats.
//!
//! Dispatch is by exact declared MIME type. Anything not listed here is
//! rejected at upload validation and has no text extractor.

use serde::{Deserialize, Serialize};

/// Format family used to route a document to an extraction adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    PlainText,
    Pdf,
    /// Word processing (DOC, DOCX).
    OfficeDocument,
    /// XLS, XLSX.
    Spreadsheet,
    /// PPT, PPTX.
    Presentation,
    /// Hangul Word Processor.
    Hwp,
}

pub const MIME_TEXT: &str = "text/plain";
pub const MIME_PDF: &str = "application/pdf";
pub const MIME_DOC: &str = "application/msword";
pub const MIME_DOCX: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const MIME_XLS: &str = "application/vnd.ms-excel";
pub const MIME_XLSX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";
pub const MIME_PPT: &str = "application/vnd.ms-powerpoint";
pub const MIME_PPTX: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation";
pub const MIME_HWP: &str = "application/x-hwp";
pub const MIME_HWP_HAANSOFT: &str = "application/haansofthwp";
pub const MIME_HWP_HANCOM: &str = "application/vnd.hancom.hwp";

/// Every accepted MIME type.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    MIME_PDF,
    MIME_TEXT,
    MIME_DOC,
    MIME_DOCX,
    MIME_XLS,
    MIME_XLSX,
    MIME_PPT,
    MIME_PPTX,
    MIME_HWP,
    MIME_HWP_HAANSOFT,
    MIME_HWP_HANCOM,
];

impl DocumentFormat {
    /// Resolve a declared MIME type. Parameters such as `; charset=utf-8`
    /// are ignored; the base type must match exactly.
    pub fn from_mime(mime_type: &str) -> Option<Self> {
        let base = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match base.as_str() {
            MIME_TEXT => Some(DocumentFormat::PlainText),
            MIME_PDF => Some(DocumentFormat::Pdf),
            MIME_DOC | MIME_DOCX => Some(DocumentFormat::OfficeDocument),
            MIME_XLS | MIME_XLSX => Some(DocumentFormat::Spreadsheet),
            MIME_PPT | MIME_PPTX => Some(DocumentFormat::Presentation),
            MIME_HWP | MIME_HWP_HAANSOFT | MIME_HWP_HANCOM => Some(DocumentFormat::Hwp),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::PlainText => "plain_text",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::OfficeDocument => "office_document",
            DocumentFormat::Spreadsheet => "spreadsheet",
            DocumentFormat::Presentation => "presentation",
            DocumentFormat::Hwp => "hwp",
        }
    }
}

/// True when `mime_type` is accepted for upload.
pub fn is_supported_mime(mime_type: &str) -> bool {
    DocumentFormat::from_mime(mime_type).is_some()
}

/// Lower-cased extension of `filename` including the dot, or empty.
pub fn file_extension(filename: &str) -> String {
    let name = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => name[idx..].to_ascii_lowercase(),
        _ => String::new(),
    }
}
