use crate::error::ExtractionError;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Ordered metadata mapping produced by an extractor.
///
/// Backed by `serde_json::Map` with `preserve_order`, so keys come out in
/// the order the extractor inserted them.
pub type Fields = Map<String, Value>;

// ===== FORMAT TAGS =====

/// Which extractor handled (or would have handled) a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatTag {
    Json,
    Tabular,
    Rdf,
    Markup,
    Unsupported,
}

impl FormatTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatTag::Json => "json",
            FormatTag::Tabular => "tabular",
            FormatTag::Rdf => "rdf",
            FormatTag::Markup => "markup",
            FormatTag::Unsupported => "unsupported",
        }
    }

    /// Label used as the prefix of failure messages for this format
    pub fn error_label(&self) -> &'static str {
        match self {
            FormatTag::Json => "JSON",
            FormatTag::Tabular => "Tabular",
            FormatTag::Rdf => "RDF",
            FormatTag::Markup => "XML",
            FormatTag::Unsupported => "Unsupported",
        }
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of format detection: the tag plus the extension the extractor
/// should be told about. For sniffed content this is the assumed extension,
/// not the one in the file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    pub tag: FormatTag,
    pub extension: String,
    pub sniffed: bool,
}

impl Detection {
    pub fn from_extension(tag: FormatTag, extension: impl Into<String>) -> Self {
        Self {
            tag,
            extension: extension.into(),
            sniffed: false,
        }
    }
}

// ===== REQUEST / RESULT =====

/// A single upload handed to the router. Borrowed for the duration of one
/// `extract` call and never retained.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionRequest<'a> {
    pub file_name: &'a str,
    pub content: &'a [u8],
}

impl<'a> ExtractionRequest<'a> {
    pub fn new(file_name: &'a str, content: &'a [u8]) -> Self {
        Self { file_name, content }
    }
}

/// Uniform extraction envelope returned by the router
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Success {
        format_tag: FormatTag,
        fields: Fields,
    },
    Failure {
        format_tag: FormatTag,
        error: ExtractionError,
    },
}

impl ExtractionResult {
    pub fn success(format_tag: FormatTag, fields: Fields) -> Self {
        ExtractionResult::Success { format_tag, fields }
    }

    pub fn failure(format_tag: FormatTag, error: ExtractionError) -> Self {
        ExtractionResult::Failure { format_tag, error }
    }

    pub fn format_tag(&self) -> FormatTag {
        match self {
            ExtractionResult::Success { format_tag, .. }
            | ExtractionResult::Failure { format_tag, .. } => *format_tag,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExtractionResult::Success { .. })
    }

    pub fn fields(&self) -> Option<&Fields> {
        match self {
            ExtractionResult::Success { fields, .. } => Some(fields),
            ExtractionResult::Failure { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&ExtractionError> {
        match self {
            ExtractionResult::Success { .. } => None,
            ExtractionResult::Failure { error, .. } => Some(error),
        }
    }

    /// Failure message, as it appears under the `error` key
    pub fn message(&self) -> Option<String> {
        self.error().map(|e| e.to_string())
    }

    /// The mapping a catalog stores verbatim:
    /// `{file_type, ...}` on success, `{error}` on failure.
    pub fn to_metadata(&self) -> Value {
        match self {
            ExtractionResult::Success { fields, .. } => Value::Object(fields.clone()),
            ExtractionResult::Failure { error, .. } => {
                let mut map = Map::new();
                map.insert("error".to_string(), Value::String(error.to_string()));
                Value::Object(map)
            }
        }
    }
}

impl Serialize for ExtractionResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ExtractionResult::Success { fields, .. } => fields.serialize(serializer),
            ExtractionResult::Failure { error, .. } => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("error", &error.to_string())?;
                map.end()
            }
        }
    }
}
