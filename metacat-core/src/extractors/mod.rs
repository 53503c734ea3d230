//! Metadata Extractors
//!
//! One extractor per format family. Each turns buffered bytes into an
//! ordered `Fields` mapping, or an `ExtractionError` naming the family.
//!
//! ## Architecture
//!
//! ```text
//! (file name, bytes)
//!     ↓
//! [FormatDetector]  extension table, optional content sniffing
//!     ↓ FormatTag
//! [Format-specific Extractor]
//!     ↓
//! ExtractionResult (success mapping | classified failure)
//! ```
//!
//! ## Available Extractors
//!
//! - `StructuredTextExtractor` - JSON documents
//! - `TabularExtractor` - CSV/TXT and Excel workbooks
//! - `GraphExtractor` - RDF/XML, Turtle, N-Triples
//! - `MarkupExtractor` - XML and its library dialects (MARC, METS, TEI, PBCore, MXF)

pub mod extractor;
pub mod graph;
pub mod markup;
pub mod structured;
pub mod tabular;

pub use extractor::Extractor;
pub use graph::GraphExtractor;
pub use markup::MarkupExtractor;
pub use structured::StructuredTextExtractor;
pub use tabular::TabularExtractor;
