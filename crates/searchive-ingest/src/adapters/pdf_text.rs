//! PDF adapter using `pdftotext` (poppler-utils).
//!
//! Scanned PDFs without a text layer extract to (near) empty text; the
//! registry's minimum-length check turns that into a too-short failure.

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use searchive_core::{defaults, DocumentFormat, Error, ExtractionAdapter, Result};

use super::command::{run_with_timeout, tool_available, write_temp};

pub struct PdfTextAdapter {
    timeout: Duration,
}

impl Default for PdfTextAdapter {
    fn default() -> Self {
        Self::new(Duration::from_secs(defaults::EXTRACT_TIMEOUT_SECS))
    }
}

impl PdfTextAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

fn has_pdf_magic(data: &[u8]) -> bool {
    data.starts_with(b"%PDF")
}

#[async_trait]
impl ExtractionAdapter for PdfTextAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Pdf
    }

    async fn extract(&self, data: &[u8], _mime_type: &str, filename: &str) -> Result<String> {
        if !has_pdf_magic(data) {
            return Err(Error::Extraction(format!(
                "'{}' is not a valid PDF (missing %PDF header)",
                filename
            )));
        }

        let tmp = write_temp(data, ".pdf")?;
        debug!(filename, "Extracting with pdftotext");
        let stdout = run_with_timeout(
            Command::new("pdftotext")
                .arg("-enc")
                .arg("UTF-8")
                .arg(tmp.path())
                .arg("-"),
            self.timeout,
        )
        .await?;

        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    async fn health_check(&self) -> Result<bool> {
        // `pdftotext -v` exits 0 or 99 depending on the poppler version.
        Ok(tool_available("pdftotext", "-v", &[0, 99]).await)
    }

    fn name(&self) -> &str {
        "pdf_text"
    }
}
