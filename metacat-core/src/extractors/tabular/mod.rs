//! Tabular extractor
//!
//! Summarises delimited text (csv, txt) and workbooks (xlsx, xls) as column
//! names and data-row counts.
//!
//! ```text
//! csv / txt  → delimited::summarize → {file_type: "Tabular/CSV", column_names, row_count}
//! xlsx / xls → workbook::summarize  → {file_type: "Excel", sheets: {name → {column_names, row_count}}}
//! ```
//!
//! Both branches normalise headers the same way: empty cells become
//! `Unnamed: <index>` and repeated names get `.1`, `.2`, … suffixes.

pub mod delimited;
pub mod workbook;

use crate::error::ExtractionError;
use crate::extractors::Extractor;
use crate::types::{Fields, FormatTag};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Column names and data-row count of one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSummary {
    pub column_names: Vec<String>,
    pub row_count: usize,
}

impl TableSummary {
    fn into_fields(self, fields: &mut Fields) {
        fields.insert("column_names".to_string(), json!(self.column_names));
        fields.insert("row_count".to_string(), json!(self.row_count));
    }

    fn to_value(&self) -> Value {
        json!({
            "column_names": self.column_names,
            "row_count": self.row_count,
        })
    }
}

pub struct TabularExtractor {
    delimiter: u8,
}

impl Default for TabularExtractor {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl TabularExtractor {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }

    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }
}

impl Extractor for TabularExtractor {
    fn extract(&self, content: &[u8], extension: &str) -> Result<Fields, ExtractionError> {
        let mut fields = Fields::new();
        match extension {
            "csv" | "txt" => {
                let summary = delimited::summarize(content, self.delimiter)?;
                tracing::debug!(
                    columns = summary.column_names.len(),
                    rows = summary.row_count,
                    "Parsed delimited text"
                );
                fields.insert("file_type".to_string(), Value::from("Tabular/CSV"));
                summary.into_fields(&mut fields);
            }
            "xlsx" | "xls" => {
                let sheets = workbook::summarize(content)?;
                tracing::debug!(sheets = sheets.len(), "Parsed workbook");
                let mut sheet_map = Fields::new();
                for (name, summary) in &sheets {
                    sheet_map.insert(name.clone(), summary.to_value());
                }
                fields.insert("file_type".to_string(), Value::from("Excel"));
                fields.insert("sheets".to_string(), Value::Object(sheet_map));
            }
            other => {
                // The router only dispatches table extensions here
                return Err(ExtractionError::parse(
                    FormatTag::Tabular,
                    format!("no tabular reader for extension .{}", other),
                ));
            }
        }
        Ok(fields)
    }

    fn format_tag(&self) -> FormatTag {
        FormatTag::Tabular
    }

    fn name(&self) -> &str {
        "TabularExtractor"
    }

    fn supports_extension(&self, extension: &str) -> bool {
        matches!(extension, "csv" | "txt" | "xlsx" | "xls")
    }
}

/// Name empty header cells `Unnamed: <i>` and de-duplicate repeats with a
/// numeric suffix, skipping suffixes that would collide with a later name.
pub(crate) fn normalize_headers<I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let named: Vec<String> = raw
        .into_iter()
        .enumerate()
        .map(|(i, name)| {
            if name.is_empty() {
                format!("Unnamed: {}", i)
            } else {
                name
            }
        })
        .collect();

    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(named.len());
    for name in named {
        let mut col = name;
        let mut cur_count = counts.get(&col).copied().unwrap_or(0);
        while cur_count > 0 {
            counts.insert(col.clone(), cur_count + 1);
            col = format!("{}.{}", col, cur_count);
            cur_count = counts.get(&col).copied().unwrap_or(0);
        }
        counts.insert(col.clone(), cur_count + 1);
        out.push(col);
    }
    out
}
