// Metacat Core Library
//
// Metadata extraction for a data catalog: detects the format of an upload
// and dispatches it to a format-specific extractor.
// Main interface is ExtractionRouter::extract(file_name, bytes).

pub mod catalog;
pub mod config;
pub mod detector;
pub mod error;
pub mod extractors;
pub mod router;
pub mod storage;
pub mod types;

// Re-export main types and functions for easy use
pub use catalog::{DataSource, ProcessingStatus};
pub use config::{ExtractionConfig, MarkupMode};
pub use detector::FormatDetector;
pub use error::{ErrorKind, ExtractionError};
pub use extractors::Extractor;
pub use router::ExtractionRouter;
pub use storage::{calculate_content_hash, CatalogStorage, FileStorage, MemoryStorage};
pub use types::*;
