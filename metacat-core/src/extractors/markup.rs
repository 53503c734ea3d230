//! Markup extractor
//!
//! One generic walk for every XML-shaped dialect (plain XML, MARCXML, METS,
//! TEI, PBCore, ...). The result is a flat sketch, not a schema decode:
//!
//! - `schema_type`: caller-supplied label (upper-cased extension)
//! - `<local-name>`: trimmed leading text of the first element with that
//!   local name that has any (namespace prefixes are dropped)
//! - `total_elements`: every element in the document, root included
//!
//! An element's text is the character data between its start tag and its
//! first child node. Comments and processing instructions are not counted
//! but do end that leading segment.
//!
//! UTF-16 input is accepted when it starts with a byte-order mark. General
//! entities declared in an internal DTD subset are expanded as text; markup
//! inside an entity value is not parsed and external DTDs are never fetched.

use crate::config::MarkupMode;
use crate::error::ExtractionError;
use crate::extractors::Extractor;
use crate::types::{Fields, FormatTag};
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `<!ENTITY name "value">` / `<!ENTITY name 'value'>` in an internal subset.
/// Parameter entities (`<!ENTITY % ...>`) and external ones do not match.
static ENTITY_DECL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!ENTITY\s+([A-Za-z_:][\w.:-]*)\s+(?:"([^"]*)"|'([^']*)')\s*>"#).unwrap()
});

pub struct MarkupExtractor {
    mode: MarkupMode,
}

impl Default for MarkupExtractor {
    fn default() -> Self {
        Self::new(MarkupMode::FirstOccurrence)
    }
}

/// An element whose start tag has been read but not its end tag
struct OpenElement {
    name: String,
    /// Leading text; `None` once a child node has started
    text: Option<String>,
}

/// Accumulates the summary while the walk runs
struct Summary {
    mode: MarkupMode,
    fields: Fields,
    total_elements: u64,
}

impl Summary {
    fn new(mode: MarkupMode, schema_type: &str) -> Self {
        let mut fields = Fields::new();
        fields.insert("schema_type".to_string(), Value::from(schema_type));
        Self {
            mode,
            fields,
            total_elements: 0,
        }
    }

    fn record(&mut self, name: &str, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        match self.mode {
            MarkupMode::FirstOccurrence => {
                if !self.fields.contains_key(name) {
                    self.fields.insert(name.to_string(), Value::from(text));
                }
            }
            MarkupMode::AllOccurrences => match self.fields.get_mut(name) {
                Some(Value::Array(values)) => values.push(Value::from(text)),
                // Only `schema_type` can already hold a non-array value
                Some(_) => {}
                None => {
                    self.fields
                        .insert(name.to_string(), Value::Array(vec![Value::from(text)]));
                }
            },
        }
    }

    /// The current leading-text segment of `element` is over
    fn close_leading(&mut self, element: &mut OpenElement) {
        if let Some(text) = element.text.take() {
            self.record(&element.name, &text);
        }
    }

    fn finish(mut self) -> Fields {
        self.fields
            .insert("total_elements".to_string(), Value::from(self.total_elements));
        self.fields
    }
}

/// UTF-8 bytes of the document: UTF-16 with a BOM is transcoded, a UTF-8
/// BOM is dropped, anything else is passed through untouched.
fn to_utf8(content: &[u8]) -> Result<Cow<'_, [u8]>, ExtractionError> {
    let (body, from_bytes): (&[u8], fn([u8; 2]) -> u16) = match content {
        [0xFF, 0xFE, rest @ ..] => (rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => (rest, u16::from_be_bytes),
        [0xEF, 0xBB, 0xBF, rest @ ..] => return Ok(Cow::Borrowed(rest)),
        _ => return Ok(Cow::Borrowed(content)),
    };
    if body.len() % 2 != 0 {
        return Err(ExtractionError::parse(
            FormatTag::Markup,
            "UTF-16 document has an odd number of bytes",
        ));
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| from_bytes([pair[0], pair[1]]))
        .collect();
    String::from_utf16(&units)
        .map(|text| Cow::Owned(text.into_bytes()))
        .map_err(|e| ExtractionError::parse(FormatTag::Markup, e))
}

fn fail(reader: &Reader<&[u8]>, message: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::parse(
        FormatTag::Markup,
        format!("{} (at byte {})", message, reader.buffer_position()),
    )
}

impl MarkupExtractor {
    pub fn new(mode: MarkupMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> MarkupMode {
        self.mode
    }

    /// Parse `content` as an XML document and summarise it
    pub fn parse(&self, content: &[u8], schema_type: &str) -> Result<Fields, ExtractionError> {
        let content = to_utf8(content)?;
        let mut reader = Reader::from_reader(content.as_ref());
        reader.check_end_names(true);
        let decoder = reader.decoder();

        let mut summary = Summary::new(self.mode, schema_type);
        let mut stack: Vec<OpenElement> = Vec::new();
        let mut entities: HashMap<String, String> = HashMap::new();
        let mut root_seen = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| fail(&reader, e))?;

            match event {
                Event::Start(ref e) | Event::Empty(ref e) => {
                    if stack.is_empty() && root_seen {
                        return Err(fail(
                            &reader,
                            "Extra content at the end of the document",
                        ));
                    }
                    root_seen = true;
                    summary.total_elements += 1;

                    if let Some(parent) = stack.last_mut() {
                        summary.close_leading(parent);
                    }

                    if matches!(event, Event::Start(_)) {
                        let name = decoder
                            .decode(e.local_name().as_ref())
                            .map_err(|err| fail(&reader, err))?
                            .into_owned();
                        stack.push(OpenElement {
                            name,
                            text: Some(String::new()),
                        });
                    }
                }
                Event::End(_) => {
                    if let Some(mut element) = stack.pop() {
                        summary.close_leading(&mut element);
                    }
                }
                Event::Text(e) => {
                    let text = e
                        .unescape_with(|name| entities.get(name).map(String::as_str))
                        .map_err(|err| fail(&reader, err))?;
                    match stack.last_mut() {
                        Some(element) => {
                            if let Some(buffer) = element.text.as_mut() {
                                buffer.push_str(&text);
                            }
                        }
                        None => {
                            if !text.trim().is_empty() {
                                return Err(fail(
                                    &reader,
                                    "Text content outside of the root element",
                                ));
                            }
                        }
                    }
                }
                Event::CData(e) => {
                    let raw = e.into_inner();
                    let text = decoder
                        .decode(&raw)
                        .map_err(|err| fail(&reader, err))?;
                    match stack.last_mut() {
                        Some(element) => {
                            if let Some(buffer) = element.text.as_mut() {
                                buffer.push_str(&text);
                            }
                        }
                        None => {
                            return Err(fail(
                                &reader,
                                "CDATA section outside of the root element",
                            ));
                        }
                    }
                }
                Event::Comment(_) | Event::PI(_) => {
                    if let Some(parent) = stack.last_mut() {
                        summary.close_leading(parent);
                    }
                }
                Event::DocType(e) => {
                    let doctype = decoder.decode(&e).map_err(|err| fail(&reader, err))?;
                    for caps in ENTITY_DECL_REGEX.captures_iter(&doctype) {
                        let raw = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
                        // Character and predefined references in the value are resolved once;
                        // a value that refers to other entities is kept verbatim
                        let value = unescape(raw).unwrap_or(Cow::Borrowed(raw));
                        entities
                            .entry(caps[1].to_string())
                            .or_insert_with(|| value.into_owned());
                    }
                }
                Event::Decl(_) => {}
                Event::Eof => {
                    if let Some(open) = stack.last() {
                        return Err(fail(
                            &reader,
                            format!("Premature end of data: element <{}> is not closed", open.name),
                        ));
                    }
                    if !root_seen {
                        return Err(fail(&reader, "Document is empty"));
                    }
                    break;
                }
            }
        }

        tracing::debug!(
            schema_type,
            elements = summary.total_elements,
            keys = summary.fields.len(),
            "Parsed markup document"
        );

        Ok(summary.finish())
    }
}

impl Extractor for MarkupExtractor {
    fn extract(&self, content: &[u8], extension: &str) -> Result<Fields, ExtractionError> {
        self.parse(content, &extension.to_uppercase())
    }

    fn format_tag(&self) -> FormatTag {
        FormatTag::Markup
    }

    fn name(&self) -> &str {
        "MarkupExtractor"
    }

    fn supports_extension(&self, extension: &str) -> bool {
        matches!(
            extension,
            "xml" | "marc" | "mets" | "tei" | "mxf" | "pbcore"
        )
    }
}
