// All extraction logic is in metacat-core
// This CLI acts as a thin wrapper around the core library

// CLI-specific modules
pub mod report;

// Re-export core types for convenience
pub use metacat_core::*;

pub use report::{render, FileReport};
