//! Text extraction gateway: a registry of adapters keyed by format family.
//!
//! The registry is the only [`TextExtractor`] the pipeline sees. It resolves
//! the declared MIME type, runs the matching adapter and turns every outcome
//! that is not usable text into an [`ExtractionFailure`].

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, warn};

use searchive_core::{
    defaults, DocumentFormat, ExtractionAdapter, ExtractionFailure, TextExtractor,
};

use crate::adapters::{HwpAdapter, OfficeConvertAdapter, PdfTextAdapter, TextNativeAdapter};

/// Registry mapping format families to their adapters.
pub struct ExtractionRegistry {
    adapters: HashMap<DocumentFormat, Arc<dyn ExtractionAdapter>>,
    min_chars: usize,
}

impl ExtractionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
            min_chars: defaults::MIN_TEXT_CHARS,
        }
    }

    /// Registry with an adapter for every supported format.
    pub fn with_default_adapters() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(TextNativeAdapter));
        registry.register(Arc::new(PdfTextAdapter::default()));
        for adapter in OfficeConvertAdapter::all() {
            registry.register(Arc::new(adapter));
        }
        registry.register(Arc::new(HwpAdapter::default()));
        registry
    }

    /// Minimum stripped character count for text to count as usable.
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars;
        self
    }

    /// Register an adapter. Replaces any existing adapter for the same format.
    pub fn register(&mut self, adapter: Arc<dyn ExtractionAdapter>) {
        self.adapters.insert(adapter.format(), adapter);
    }

    pub fn has_adapter(&self, format: DocumentFormat) -> bool {
        self.adapters.contains_key(&format)
    }

    pub fn available_formats(&self) -> Vec<DocumentFormat> {
        self.adapters.keys().copied().collect()
    }

    /// Run health checks on all registered adapters.
    pub async fn health_check_all(&self) -> HashMap<DocumentFormat, bool> {
        let mut results = HashMap::new();
        for (format, adapter) in &self.adapters {
            let healthy = adapter.health_check().await.unwrap_or(false);
            if !healthy {
                warn!(
                    subsystem = "ingest",
                    component = "extraction",
                    adapter = adapter.name(),
                    format = format.as_str(),
                    "Extraction tool unavailable; documents of this format will have no tags"
                );
            }
            results.insert(*format, healthy);
        }
        results
    }
}

impl Default for ExtractionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for ExtractionRegistry {
    async fn extract(
        &self,
        data: &[u8],
        mime_type: &str,
        filename: &str,
    ) -> std::result::Result<String, ExtractionFailure> {
        let adapter = DocumentFormat::from_mime(mime_type)
            .and_then(|format| self.adapters.get(&format))
            .ok_or_else(|| ExtractionFailure::UnsupportedFormat(mime_type.to_string()))?;

        let start = Instant::now();
        let text = adapter
            .extract(data, mime_type, filename)
            .await
            .map_err(|e| {
                warn!(
                    subsystem = "ingest",
                    component = "extraction",
                    adapter = adapter.name(),
                    mime_type,
                    filename,
                    error = %e,
                    "Text extraction failed"
                );
                ExtractionFailure::Failed {
                    reason: e.to_string(),
                }
            })?;

        let text = text.trim();
        let chars = text.chars().count();
        if chars < self.min_chars {
            warn!(
                subsystem = "ingest",
                component = "extraction",
                adapter = adapter.name(),
                filename,
                chars,
                "Extracted text too short"
            );
            return Err(ExtractionFailure::TooShort { chars });
        }

        debug!(
            adapter = adapter.name(),
            text_len = chars,
            duration_ms = start.elapsed().as_millis() as u64,
            "Text extracted"
        );
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use searchive_core::{Error, Result};

    struct FailingAdapter;

    #[async_trait]
    impl ExtractionAdapter for FailingAdapter {
        fn format(&self) -> DocumentFormat {
            DocumentFormat::Pdf
        }
        async fn extract(&self, _: &[u8], _: &str, _: &str) -> Result<String> {
            Err(Error::Extraction("corrupt xref table".to_string()))
        }
        async fn health_check(&self) -> Result<bool> {
            Ok(false)
        }
        fn name(&self) -> &str {
            "failing"
        }
    }

    fn text_registry() -> ExtractionRegistry {
        let mut registry = ExtractionRegistry::new();
        registry.register(Arc::new(TextNativeAdapter));
        registry
    }

    #[test]
    fn test_default_adapters_cover_every_format() {
        let registry = ExtractionRegistry::with_default_adapters();
        for format in [
            DocumentFormat::PlainText,
            DocumentFormat::Pdf,
            DocumentFormat::OfficeDocument,
            DocumentFormat::Spreadsheet,
            DocumentFormat::Presentation,
            DocumentFormat::Hwp,
        ] {
            assert!(registry.has_adapter(format), "{format:?} missing");
        }
    }

    #[tokio::test]
    async fn test_plain_text_extracted() {
        let text = text_registry()
            .extract(
                "안녕하세요. 이것은 테스트 문서입니다.".as_bytes(),
                "text/plain",
                "hello.txt",
            )
            .await
            .unwrap();
        assert_eq!(text, "안녕하세요. 이것은 테스트 문서입니다.");
    }

    #[tokio::test]
    async fn test_unsupported_mime() {
        let result = text_registry()
            .extract(b"\x89PNG....", "image/png", "a.png")
            .await;
        assert_eq!(
            result,
            Err(ExtractionFailure::UnsupportedFormat("image/png".to_string()))
        );
    }

    #[tokio::test]
    async fn test_supported_mime_without_adapter_is_unsupported() {
        let result = text_registry()
            .extract(b"%PDF-1.4", "application/pdf", "a.pdf")
            .await;
        assert!(matches!(result, Err(ExtractionFailure::UnsupportedFormat(_))));
    }

    #[tokio::test]
    async fn test_adapter_error_becomes_failure() {
        let mut registry = ExtractionRegistry::new();
        registry.register(Arc::new(FailingAdapter));
        let result = registry.extract(b"%PDF", "application/pdf", "a.pdf").await;
        match result {
            Err(ExtractionFailure::Failed { reason }) => assert!(reason.contains("corrupt")),
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_short_text_is_failure() {
        let result = text_registry()
            .extract(b"   short   ", "text/plain", "a.txt")
            .await;
        assert_eq!(result, Err(ExtractionFailure::TooShort { chars: 5 }));
    }

    #[tokio::test]
    async fn test_min_chars_counts_characters_not_bytes() {
        // Ten Hangul syllables are 30 bytes but exactly ten characters.
        let result = text_registry()
            .extract("가나다라마바사아자차".as_bytes(), "text/plain", "a.txt")
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_health_check_all() {
        let mut registry = text_registry();
        registry.register(Arc::new(FailingAdapter));
        let health = registry.health_check_all().await;
        assert_eq!(health.len(), 2);
        assert!(health[&DocumentFormat::PlainText]);
        assert!(!health[&DocumentFormat::Pdf]);
    }
}
