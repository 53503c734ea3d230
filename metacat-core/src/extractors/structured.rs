//! JSON extractor
//!
//! Returns the parsed document verbatim under `extracted_data`. Object key
//! order is preserved (serde_json `preserve_order`).

use crate::error::{decode_utf8, ExtractionError};
use crate::extractors::Extractor;
use crate::types::{Fields, FormatTag};
use serde_json::Value;

pub struct StructuredTextExtractor;

impl Default for StructuredTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StructuredTextExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, content: &[u8]) -> Result<Fields, ExtractionError> {
        let text = decode_utf8(FormatTag::Json, content)?;
        let value: Value =
            serde_json::from_str(text).map_err(|e| ExtractionError::parse(FormatTag::Json, e))?;

        tracing::debug!(kind = json_kind(&value), "Parsed JSON document");

        let mut fields = Fields::new();
        fields.insert("file_type".to_string(), Value::from("JSON"));
        fields.insert("extracted_data".to_string(), value);
        Ok(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Extractor for StructuredTextExtractor {
    fn extract(&self, content: &[u8], _extension: &str) -> Result<Fields, ExtractionError> {
        self.parse(content)
    }

    fn format_tag(&self) -> FormatTag {
        FormatTag::Json
    }

    fn name(&self) -> &str {
        "StructuredTextExtractor"
    }

    fn supports_extension(&self, extension: &str) -> bool {
        extension == "json"
    }
}
