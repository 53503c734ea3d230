use metacat_core::{ExtractionResult, ProcessingStatus};
use serde::Serialize;
use serde_json::Value;

/// One line of multi-file output
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    pub file: String,
    pub status: ProcessingStatus,
    pub metadata: Value,
}

impl FileReport {
    pub fn new(file: impl Into<String>, result: &ExtractionResult) -> Self {
        Self {
            file: file.into(),
            status: ProcessingStatus::from_result(result),
            metadata: result.to_metadata(),
        }
    }
}

/// A single input prints its mapping as-is; several inputs print an array
/// of `FileReport`s.
pub fn render(reports: &[FileReport], compact: bool) -> serde_json::Result<String> {
    let value = match reports {
        [single] => single.metadata.clone(),
        many => serde_json::to_value(many)?,
    };
    if compact {
        serde_json::to_string(&value)
    } else {
        serde_json::to_string_pretty(&value)
    }
}
