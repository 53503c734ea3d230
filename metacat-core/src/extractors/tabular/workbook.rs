use super::{normalize_headers, TableSummary};
use crate::error::ExtractionError;
use crate::types::FormatTag;
use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use std::io::Cursor;

/// Summarise every sheet of a workbook, in workbook order.
///
/// The container format (xlsx, xls, xlsb, ods) is detected from the bytes.
/// Any sheet that fails to load fails the whole workbook.
pub fn summarize(content: &[u8]) -> Result<Vec<(String, TableSummary)>, ExtractionError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(content.to_vec()))
        .map_err(|e| ExtractionError::parse(FormatTag::Tabular, e))?;

    let mut sheets = Vec::new();
    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| {
                ExtractionError::parse(FormatTag::Tabular, format!("sheet '{}': {}", name, e))
            })?;
        let summary = summarize_range(&range);
        tracing::debug!(
            sheet = %name,
            columns = summary.column_names.len(),
            rows = summary.row_count,
            "Parsed sheet"
        );
        sheets.push((name, summary));
    }
    Ok(sheets)
}

/// First row is the header; every later row inside the used range is data
fn summarize_range(range: &Range<Data>) -> TableSummary {
    let mut rows = range.rows();
    let column_names = match rows.next() {
        Some(header) => normalize_headers(header.iter().map(header_text)),
        None => Vec::new(),
    };
    TableSummary {
        column_names,
        row_count: rows.count(),
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
