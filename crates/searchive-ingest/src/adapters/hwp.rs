//! Hangul Word Processor adapter using `hwp5txt` (pyhwp).

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use searchive_core::{defaults, DocumentFormat, Error, ExtractionAdapter, Result};

use super::command::{run_with_timeout, tool_available, write_temp};

/// HWP 5.x documents are OLE compound files.
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

pub struct HwpAdapter {
    timeout: Duration,
}

impl Default for HwpAdapter {
    fn default() -> Self {
        Self::new(Duration::from_secs(defaults::EXTRACT_TIMEOUT_SECS))
    }
}

impl HwpAdapter {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl ExtractionAdapter for HwpAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::Hwp
    }

    async fn extract(&self, data: &[u8], _mime_type: &str, filename: &str) -> Result<String> {
        if !data.starts_with(OLE_MAGIC) {
            return Err(Error::Extraction(format!(
                "'{}' is not an HWP 5 document",
                filename
            )));
        }

        let tmp = write_temp(data, ".hwp")?;
        debug!(filename, "Extracting with hwp5txt");
        let stdout =
            run_with_timeout(Command::new("hwp5txt").arg(tmp.path()), self.timeout).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(tool_available("hwp5txt", "--version", &[0]).await)
    }

    fn name(&self) -> &str {
        "hwp5txt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejects_non_ole_bytes() {
        let err = HwpAdapter::default()
            .extract(b"plain bytes", "application/x-hwp", "doc.hwp")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_format() {
        assert_eq!(HwpAdapter::default().format(), DocumentFormat::Hwp);
    }
}
