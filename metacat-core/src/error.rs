// Extraction error taxonomy
//
// Every extractor reports failure through this type instead of panicking.
// The Display strings are what ends up under the `error` key of a failed
// envelope, so they keep the per-format "<Label> Parsing Error: ..." prefix.

use crate::types::FormatTag;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("{} Parsing Error: content is not valid UTF-8: {message}", .format.error_label())]
    DecodeError { format: FormatTag, message: String },

    #[error("{} Parsing Error: {message}", .format.error_label())]
    ParseError { format: FormatTag, message: String },

    #[error("Internal extraction fault: {message}")]
    InternalFault { format: FormatTag, message: String },
}

/// Coarse classification of an [`ExtractionError`], useful for callers that
/// want to branch without matching on payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    UnsupportedFormat,
    Decode,
    Parse,
    Internal,
}

impl ExtractionError {
    pub fn decode(format: FormatTag, err: impl std::fmt::Display) -> Self {
        ExtractionError::DecodeError {
            format,
            message: err.to_string(),
        }
    }

    pub fn parse(format: FormatTag, err: impl std::fmt::Display) -> Self {
        ExtractionError::ParseError {
            format,
            message: err.to_string(),
        }
    }

    pub fn internal(format: FormatTag, message: impl Into<String>) -> Self {
        ExtractionError::InternalFault {
            format,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractionError::UnsupportedFormat { .. } => ErrorKind::UnsupportedFormat,
            ExtractionError::DecodeError { .. } => ErrorKind::Decode,
            ExtractionError::ParseError { .. } => ErrorKind::Parse,
            ExtractionError::InternalFault { .. } => ErrorKind::Internal,
        }
    }

    pub fn format(&self) -> FormatTag {
        match self {
            ExtractionError::UnsupportedFormat { .. } => FormatTag::Unsupported,
            ExtractionError::DecodeError { format, .. }
            | ExtractionError::ParseError { format, .. }
            | ExtractionError::InternalFault { format, .. } => *format,
        }
    }
}

/// Decode content as UTF-8 for a text-based format
pub(crate) fn decode_utf8(format: FormatTag, content: &[u8]) -> Result<&str, ExtractionError> {
    std::str::from_utf8(content).map_err(|e| ExtractionError::decode(format, e))
}
