use crate::config::ExtractionConfig;
use crate::detector::FormatDetector;
use crate::error::ExtractionError;
use crate::extractors::{
    Extractor, GraphExtractor, MarkupExtractor, StructuredTextExtractor, TabularExtractor,
};
use crate::types::{ExtractionRequest, ExtractionResult, FormatTag};
use anyhow::Result;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

/// Metadata extraction façade.
///
/// Owns the detector and one extractor per format family. `extract` is
/// total: every `(file_name, content)` pair yields an `ExtractionResult`,
/// including when an extractor panics.
pub struct ExtractionRouter {
    detector: FormatDetector,
    extractors: BTreeMap<FormatTag, Box<dyn Extractor>>,
}

impl Default for ExtractionRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractionRouter {
    /// Router with the default extractor set and extension-only detection
    pub fn new() -> Self {
        Self::with_detector(FormatDetector::new())
            .with_extractor(Box::new(StructuredTextExtractor::new()))
            .with_extractor(Box::new(TabularExtractor::default()))
            .with_extractor(Box::new(GraphExtractor::new()))
            .with_extractor(Box::new(MarkupExtractor::default()))
    }

    /// Router built from a validated configuration
    pub fn from_config(config: &ExtractionConfig) -> Result<Self> {
        config.validate()?;
        let delimiter = config.tabular.delimiter_byte()?;
        Ok(
            Self::with_detector(FormatDetector::with_sniffing(config.detection.sniff_content))
                .with_extractor(Box::new(StructuredTextExtractor::new()))
                .with_extractor(Box::new(TabularExtractor::new(delimiter)))
                .with_extractor(Box::new(GraphExtractor::new()))
                .with_extractor(Box::new(MarkupExtractor::new(config.markup.mode))),
        )
    }

    /// Router with no extractors registered; every request is unsupported
    /// until `with_extractor` fills the table.
    pub fn with_detector(detector: FormatDetector) -> Self {
        Self {
            detector,
            extractors: BTreeMap::new(),
        }
    }

    /// Register (or replace) the extractor for its format tag
    pub fn with_extractor(mut self, extractor: Box<dyn Extractor>) -> Self {
        self.extractors.insert(extractor.format_tag(), extractor);
        self
    }

    pub fn detector(&self) -> &FormatDetector {
        &self.detector
    }

    /// Names of the registered extractors, in tag order
    pub fn extractor_names(&self) -> Vec<(FormatTag, &str)> {
        self.extractors
            .iter()
            .map(|(tag, extractor)| (*tag, extractor.name()))
            .collect()
    }

    pub fn extract_request(&self, request: ExtractionRequest<'_>) -> ExtractionResult {
        self.extract(request.file_name, request.content)
    }

    /// Detect the format of `file_name` / `content` and run its extractor
    pub fn extract(&self, file_name: &str, content: &[u8]) -> ExtractionResult {
        let start_time = Instant::now();
        let detection = self.detector.detect_with_content(file_name, content);

        let extractor = match self.extractors.get(&detection.tag) {
            Some(extractor) if detection.tag != FormatTag::Unsupported => extractor,
            _ => {
                tracing::warn!(file = file_name, extension = %detection.extension, "Unsupported file type");
                return ExtractionResult::failure(
                    FormatTag::Unsupported,
                    ExtractionError::UnsupportedFormat {
                        extension: detection.extension,
                    },
                );
            }
        };

        tracing::debug!(
            file = file_name,
            format = %detection.tag,
            extractor = extractor.name(),
            sniffed = detection.sniffed,
            bytes = content.len(),
            "Dispatching extraction"
        );

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            extractor.extract(content, &detection.extension)
        }));

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        match outcome {
            Ok(Ok(fields)) => {
                tracing::info!(
                    file = file_name,
                    format = %detection.tag,
                    keys = fields.len(),
                    elapsed_ms,
                    "Extraction succeeded"
                );
                ExtractionResult::success(detection.tag, fields)
            }
            Ok(Err(error)) => {
                tracing::warn!(
                    file = file_name,
                    format = %detection.tag,
                    error = %error,
                    elapsed_ms,
                    "Extraction failed"
                );
                ExtractionResult::failure(detection.tag, error)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(
                    file = file_name,
                    format = %detection.tag,
                    extractor = extractor.name(),
                    panic = %message,
                    elapsed_ms,
                    "Extractor panicked"
                );
                ExtractionResult::failure(
                    detection.tag,
                    ExtractionError::internal(detection.tag, message),
                )
            }
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "extractor panicked".to_string()
    }
}
