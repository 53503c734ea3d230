// Extractor abstraction for metadata extraction
//
// This module defines the boundary between format handling (bytes -> Fields)
// and the router that owns detection and the result envelope. Each extractor
// turns one family of formats into an ordered metadata mapping and reports
// every domain failure as an ExtractionError value.

use crate::error::ExtractionError;
use crate::types::{Fields, FormatTag};

/// Extractor trait - converts buffered file content to metadata fields
///
/// Implementations must be pure: no I/O beyond reading `content`, no
/// shared mutable state. The router may call one extractor from several
/// threads at once.
pub trait Extractor: Send + Sync {
    /// Extract metadata from fully buffered content.
    ///
    /// `extension` is the lower-cased extension the router dispatched on
    /// (or the one assumed by the content sniffer). Extractors that serve
    /// several extensions use it to pick a branch.
    fn extract(&self, content: &[u8], extension: &str) -> Result<Fields, ExtractionError>;

    /// Tag this extractor is registered under
    fn format_tag(&self) -> FormatTag;

    /// Get extractor name for debugging/logging
    fn name(&self) -> &str;

    /// Check if extractor handles the given (lower-cased) extension
    fn supports_extension(&self, extension: &str) -> bool;
}
