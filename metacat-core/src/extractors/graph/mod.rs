//! RDF graph extractor
//!
//! Parses RDF/XML, Turtle or N-Triples and reports the number of distinct
//! triples plus the namespaces the document binds. The serialization is
//! sniffed from the content, with the extension as a tie-breaker:
//!
//! ```text
//! starts like an XML tag? ──yes──> [RDF/XML, Turtle]
//!          │no
//!     extension nt? ──yes──> [N-Triples, Turtle]
//!          │no
//!       [Turtle]               (Turtle also accepts N-Triples)
//! ```
//!
//! Candidates are tried in order; if none parses, the first candidate's
//! error is reported since it was the most likely serialization.
//!
//! Relative IRIs (`rdf:about="#x"`, `rdf:ID`, Turtle `<#me>` without
//! `@base`) resolve against [`DEFAULT_BASE_IRI`].

pub mod namespaces;

use crate::error::{decode_utf8, ExtractionError};
use crate::extractors::Extractor;
use crate::types::{Fields, FormatTag};
use oxiri::Iri;
use regex::Regex;
use rio_api::model::Triple;
use rio_api::parser::TriplesParser;
use rio_turtle::{NTriplesParser, TurtleParser};
use rio_xml::RdfXmlParser;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

/// Base for documents that use relative IRIs without declaring a base
pub const DEFAULT_BASE_IRI: &str = "http://metacat.invalid/document";

static XML_START_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*<(?:[?!]|[A-Za-z_][\w.-]*(?::[A-Za-z_][\w.-]*)?[\s/>])").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Serialization {
    RdfXml,
    Turtle,
    NTriples,
}

impl Serialization {
    pub fn as_str(&self) -> &'static str {
        match self {
            Serialization::RdfXml => "rdf/xml",
            Serialization::Turtle => "turtle",
            Serialization::NTriples => "n-triples",
        }
    }
}

impl fmt::Display for Serialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphSummary {
    pub serialization: Serialization,
    pub triples_count: usize,
    pub namespaces: Vec<String>,
}

pub struct GraphExtractor;

impl Default for GraphExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Serializations to try, most likely first
    pub fn candidates(text: &str, extension: &str) -> Vec<Serialization> {
        if XML_START_REGEX.is_match(text) {
            vec![Serialization::RdfXml, Serialization::Turtle]
        } else if extension == "nt" {
            vec![Serialization::NTriples, Serialization::Turtle]
        } else {
            vec![Serialization::Turtle]
        }
    }

    pub fn parse(&self, content: &[u8], extension: &str) -> Result<GraphSummary, ExtractionError> {
        let text = decode_utf8(FormatTag::Rdf, content)?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut first_error: Option<String> = None;
        for serialization in Self::candidates(text, extension) {
            match parse_graph(serialization, text) {
                Ok((triples_count, namespaces)) => {
                    tracing::debug!(
                        %serialization,
                        triples = triples_count,
                        namespaces = namespaces.len(),
                        "Parsed RDF graph"
                    );
                    return Ok(GraphSummary {
                        serialization,
                        triples_count,
                        namespaces,
                    });
                }
                Err(message) => {
                    tracing::debug!(%serialization, error = %message, "RDF serialization rejected");
                    first_error.get_or_insert(message);
                }
            }
        }

        Err(ExtractionError::parse(
            FormatTag::Rdf,
            first_error.unwrap_or_else(|| "no RDF serialization matched".to_string()),
        ))
    }
}

fn base_iri() -> Result<Iri<String>, String> {
    Iri::parse(DEFAULT_BASE_IRI.to_string()).map_err(|e| e.to_string())
}

/// Distinct triple count and bound namespaces for one serialization
fn parse_graph(serialization: Serialization, text: &str) -> Result<(usize, Vec<String>), String> {
    let input = text.as_bytes();
    match serialization {
        Serialization::RdfXml => {
            let mut parser = RdfXmlParser::new(input, Some(base_iri()?));
            let count = count_distinct(&mut parser).map_err(|e| e.to_string())?;
            Ok((count, namespaces::xml_namespaces(text)))
        }
        Serialization::Turtle => {
            let mut parser = TurtleParser::new(input, Some(base_iri()?));
            let count = count_distinct(&mut parser).map_err(|e| e.to_string())?;
            let bound: HashSet<&str> = parser.prefixes().values().map(String::as_str).collect();
            Ok((count, namespaces::turtle_namespaces(text, &bound)))
        }
        Serialization::NTriples => {
            let mut parser = NTriplesParser::new(input);
            let count = count_distinct(&mut parser).map_err(|e| e.to_string())?;
            Ok((count, Vec::new()))
        }
    }
}

/// Graph semantics: the same triple stated twice counts once
fn count_distinct<P: TriplesParser>(parser: &mut P) -> Result<usize, P::Error> {
    let mut seen: HashSet<String> = HashSet::new();
    parser.parse_all(&mut |triple: Triple<'_>| -> Result<(), P::Error> {
        seen.insert(triple.to_string());
        Ok(())
    })?;
    Ok(seen.len())
}

impl Extractor for GraphExtractor {
    fn extract(&self, content: &[u8], extension: &str) -> Result<Fields, ExtractionError> {
        let summary = self.parse(content, extension)?;
        let mut fields = Fields::new();
        fields.insert("file_type".to_string(), Value::from("RDF"));
        fields.insert("triples_count".to_string(), json!(summary.triples_count));
        fields.insert("namespaces".to_string(), json!(summary.namespaces));
        fields.insert(
            "serialization".to_string(),
            Value::from(summary.serialization.as_str()),
        );
        Ok(fields)
    }

    fn format_tag(&self) -> FormatTag {
        FormatTag::Rdf
    }

    fn name(&self) -> &str {
        "GraphExtractor"
    }

    fn supports_extension(&self, extension: &str) -> bool {
        matches!(extension, "rdf" | "ttl" | "nt")
    }
}
