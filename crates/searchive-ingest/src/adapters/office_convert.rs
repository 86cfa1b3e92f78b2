//! Office document adapter.
//!
//! OOXML word-processing and presentation files are converted with `pandoc`.
//! Legacy binary formats and spreadsheets go through LibreOffice
//! (`soffice --headless --convert-to`); PPT is first converted to PPTX and
//! then handed to pandoc.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::process::Command;
use tracing::debug;

use searchive_core::formats::{MIME_DOC, MIME_DOCX, MIME_PPT, MIME_PPTX, MIME_XLS, MIME_XLSX};
use searchive_core::{defaults, DocumentFormat, Error, ExtractionAdapter, Result};

use super::command::{run_with_timeout, tool_available, write_temp};

/// How one MIME type is turned into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    /// `pandoc -f <from> -t plain`.
    Pandoc { from: &'static str },
    /// `soffice --convert-to <filter>`, then read the `<ext>` output.
    Soffice {
        filter: &'static str,
        ext: &'static str,
    },
    /// `soffice --convert-to <ext>`, then pandoc on the result.
    SofficeThenPandoc { ext: &'static str },
}

impl Conversion {
    fn for_mime(mime_type: &str) -> Option<(Self, &'static str)> {
        let base = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match base.as_str() {
            MIME_DOCX => Some((Conversion::Pandoc { from: "docx" }, ".docx")),
            MIME_PPTX => Some((Conversion::Pandoc { from: "pptx" }, ".pptx")),
            MIME_DOC => Some((
                Conversion::Soffice {
                    filter: "txt:Text",
                    ext: "txt",
                },
                ".doc",
            )),
            MIME_XLS => Some((
                Conversion::Soffice {
                    filter: "csv",
                    ext: "csv",
                },
                ".xls",
            )),
            MIME_XLSX => Some((
                Conversion::Soffice {
                    filter: "csv",
                    ext: "csv",
                },
                ".xlsx",
            )),
            MIME_PPT => Some((Conversion::SofficeThenPandoc { ext: "pptx" }, ".ppt")),
            _ => None,
        }
    }
}

/// Converts one office format family. Register one instance per family.
pub struct OfficeConvertAdapter {
    format: DocumentFormat,
    timeout: Duration,
}

impl OfficeConvertAdapter {
    pub fn new(format: DocumentFormat) -> Self {
        Self {
            format,
            timeout: Duration::from_secs(defaults::EXTRACT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Adapters for documents, spreadsheets and presentations.
    pub fn all() -> Vec<Self> {
        vec![
            Self::new(DocumentFormat::OfficeDocument),
            Self::new(DocumentFormat::Spreadsheet),
            Self::new(DocumentFormat::Presentation),
        ]
    }

    async fn pandoc(&self, path: &Path, from: &str) -> Result<String> {
        let stdout = run_with_timeout(
            Command::new("pandoc")
                .arg("-f")
                .arg(from)
                .arg("-t")
                .arg("plain")
                .arg("--wrap=none")
                .arg(path),
            self.timeout,
        )
        .await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    /// Convert `input` into `outdir` and return the output file path.
    async fn soffice(
        &self,
        input: &Path,
        filter: &str,
        ext: &str,
        outdir: &Path,
    ) -> Result<PathBuf> {
        // A private profile lets conversions run concurrently.
        let profile = format!("-env:UserInstallation=file://{}/profile", outdir.display());
        run_with_timeout(
            Command::new("soffice")
                .arg(profile)
                .arg("--headless")
                .arg("--convert-to")
                .arg(filter)
                .arg("--outdir")
                .arg(outdir)
                .arg(input),
            self.timeout,
        )
        .await?;

        let stem = input
            .file_stem()
            .ok_or_else(|| Error::Extraction("temp file has no name".to_string()))?;
        let output = outdir.join(stem).with_extension(ext);
        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(Error::Extraction(format!(
                "soffice produced no .{} output",
                ext
            )));
        }
        Ok(output)
    }
}

#[async_trait]
impl ExtractionAdapter for OfficeConvertAdapter {
    fn format(&self) -> DocumentFormat {
        self.format
    }

    async fn extract(&self, data: &[u8], mime_type: &str, filename: &str) -> Result<String> {
        if data.is_empty() {
            return Err(Error::Extraction("Cannot convert empty document".to_string()));
        }
        let (conversion, suffix) = Conversion::for_mime(mime_type)
            .ok_or_else(|| Error::UnsupportedFormat(mime_type.to_string()))?;

        let input = write_temp(data, suffix)?;
        debug!(filename, ?conversion, "Converting office document");

        match conversion {
            Conversion::Pandoc { from } => self.pandoc(input.path(), from).await,
            Conversion::Soffice { filter, ext } => {
                let outdir = TempDir::new()
                    .map_err(|e| Error::Extraction(format!("Failed to create temp dir: {}", e)))?;
                let output = self.soffice(input.path(), filter, ext, outdir.path()).await?;
                let bytes = tokio::fs::read(&output).await?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Conversion::SofficeThenPandoc { ext } => {
                let outdir = TempDir::new()
                    .map_err(|e| Error::Extraction(format!("Failed to create temp dir: {}", e)))?;
                let output = self.soffice(input.path(), ext, ext, outdir.path()).await?;
                self.pandoc(&output, ext).await
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        let pandoc = tool_available("pandoc", "--version", &[0]).await;
        let soffice = tool_available("soffice", "--version", &[0]).await;
        Ok(pandoc && soffice)
    }

    fn name(&self) -> &str {
        match self.format {
            DocumentFormat::Spreadsheet => "office_convert:spreadsheet",
            DocumentFormat::Presentation => "office_convert:presentation",
            _ => "office_convert:document",
        }
    }
}
