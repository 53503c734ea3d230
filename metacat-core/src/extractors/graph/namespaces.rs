use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// `@prefix p: <iri> .` and SPARQL-style `PREFIX p: <iri>`, anywhere a
/// directive can start. Text matches only give the declaration order; the
/// parser's prefix map decides what is actually bound.
static PREFIX_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)(?:^|[\s.])(?:@prefix|(?i:prefix))\s+(?:[A-Za-z][\w.-]*)?:\s*<([^>]*)>")
        .unwrap()
});

/// Namespace IRIs bound by Turtle prefix directives, in declaration order.
///
/// `bound` holds the IRIs the Turtle parser ended up with; matches inside
/// comments or string literals are not in it and are dropped.
pub fn turtle_namespaces(text: &str, bound: &HashSet<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for caps in PREFIX_REGEX.captures_iter(text) {
        let iri = &caps[1];
        if bound.contains(iri) {
            push_unique(&mut out, iri);
        }
    }
    out
}

/// Namespace IRIs bound by `xmlns` / `xmlns:*` attributes, in document order
pub fn xml_namespaces(text: &str) -> Vec<String> {
    let mut reader = Reader::from_str(text);
    let mut out: Vec<String> = Vec::new();
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                for attr in e.attributes().flatten() {
                    let key = attr.key.as_ref();
                    if key == b"xmlns" || key.starts_with(b"xmlns:") {
                        if let Ok(value) = attr.decode_and_unescape_value(&reader) {
                            push_unique(&mut out, &value);
                        }
                    }
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            Ok(_) => {}
        }
    }
    out
}

fn push_unique(out: &mut Vec<String>, iri: &str) {
    if !out.iter().any(|known| known == iri) {
        out.push(iri.to_string());
    }
}
