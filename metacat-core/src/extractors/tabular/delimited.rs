use super::{normalize_headers, TableSummary};
use crate::error::{decode_utf8, ExtractionError};
use crate::types::FormatTag;
use csv::ReaderBuilder;

/// Summarise delimited text with a header row.
///
/// Rows shorter than the header are accepted (missing trailing values);
/// a row with more fields than the header is a structural error.
pub fn summarize(content: &[u8], delimiter: u8) -> Result<TableSummary, ExtractionError> {
    let text = decode_utf8(FormatTag::Tabular, content)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    // The csv reader accepts a quote left open at EOF as one long field
    if let Some(line) = unterminated_quote_line(text, delimiter) {
        return Err(ExtractionError::parse(
            FormatTag::Tabular,
            format!("EOF inside string starting at line {}", line),
        ));
    }

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| ExtractionError::parse(FormatTag::Tabular, e))?
        .clone();

    if headers.is_empty() {
        return Err(ExtractionError::parse(
            FormatTag::Tabular,
            "No columns to parse from file",
        ));
    }

    let expected = headers.len();
    let mut row_count = 0usize;

    for result in reader.records() {
        let record = result.map_err(|e| ExtractionError::parse(FormatTag::Tabular, e))?;

        if record.len() == 1 && record[0].is_empty() {
            continue;
        }

        if record.len() > expected {
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            return Err(ExtractionError::parse(
                FormatTag::Tabular,
                format!(
                    "Error tokenizing data: expected {} fields in line {}, saw {}",
                    expected,
                    line,
                    record.len()
                ),
            ));
        }

        row_count += 1;
    }

    Ok(TableSummary {
        column_names: normalize_headers(headers.iter().map(str::to_string)),
        row_count,
    })
}

/// Line (1-based) of a quoted field that is still open at end of input.
///
/// A quote only opens a field when it is the first byte of the field, and
/// `""` inside a quoted field is an escaped quote, matching the csv reader.
fn unterminated_quote_line(text: &str, delimiter: u8) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut line = 1usize;
    let mut opened_at = 0usize;
    let mut in_quotes = false;
    let mut at_field_start = true;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'\n' {
            line += 1;
        }
        if in_quotes {
            if b == b'"' {
                if bytes.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    in_quotes = false;
                }
            }
        } else if b == b'"' && at_field_start {
            in_quotes = true;
            opened_at = line;
            at_field_start = false;
        } else {
            at_field_start = b == delimiter || b == b'\n' || b == b'\r';
        }
        i += 1;
    }
    in_quotes.then_some(opened_at)
}
