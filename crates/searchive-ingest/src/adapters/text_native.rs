//! Plain-text adapter.

use async_trait::async_trait;

use searchive_core::{DocumentFormat, ExtractionAdapter, Result};

/// Reads bytes as UTF-8, replacing invalid sequences. A leading byte-order
/// mark is dropped.
pub struct TextNativeAdapter;

#[async_trait]
impl ExtractionAdapter for TextNativeAdapter {
    fn format(&self) -> DocumentFormat {
        DocumentFormat::PlainText
    }

    async fn extract(&self, data: &[u8], _mime_type: &str, _filename: &str) -> Result<String> {
        let text = String::from_utf8_lossy(data);
        Ok(text.trim_start_matches('\u{FEFF}').to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "text_native"
    }
}
