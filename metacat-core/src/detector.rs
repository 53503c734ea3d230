use crate::types::{Detection, FormatTag};
use regex::Regex;
use std::sync::LazyLock;

/// Extension → format table. Detection is a lookup in this table only;
/// content sniffing is a separate, opt-in fallback.
pub const EXTENSION_TABLE: &[(&str, FormatTag)] = &[
    ("json", FormatTag::Json),
    ("csv", FormatTag::Tabular),
    ("txt", FormatTag::Tabular),
    ("xlsx", FormatTag::Tabular),
    ("xls", FormatTag::Tabular),
    ("rdf", FormatTag::Rdf),
    ("ttl", FormatTag::Rdf),
    ("nt", FormatTag::Rdf),
    ("xml", FormatTag::Markup),
    ("marc", FormatTag::Markup),
    ("mets", FormatTag::Markup),
    ("tei", FormatTag::Markup),
    ("mxf", FormatTag::Markup),
    ("pbcore", FormatTag::Markup),
];

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE2_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// How far into the content the sniffer looks for text markers
const SNIFF_WINDOW: usize = 4096;

static TURTLE_PREFIX_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*(@prefix|PREFIX)\s+[\w.-]*:\s*<").unwrap());

/// Maps file names (and, when enabled, content) to format tags
#[derive(Debug, Clone, Default)]
pub struct FormatDetector {
    sniff_content: bool,
}

impl FormatDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sniffing(sniff_content: bool) -> Self {
        Self { sniff_content }
    }

    /// Lower-cased substring after the last `.` of the final path component.
    /// Empty when there is no dot.
    pub fn extension(file_name: &str) -> String {
        let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
        match base.rfind('.') {
            Some(idx) => base[idx + 1..].to_lowercase(),
            None => String::new(),
        }
    }

    /// Extension-only lookup
    pub fn detect(&self, file_name: &str) -> FormatTag {
        Self::tag_for_extension(&Self::extension(file_name))
    }

    pub fn tag_for_extension(extension: &str) -> FormatTag {
        if extension.is_empty() {
            return FormatTag::Unsupported;
        }
        EXTENSION_TABLE
            .iter()
            .find(|(ext, _)| *ext == extension)
            .map(|(_, tag)| *tag)
            .unwrap_or(FormatTag::Unsupported)
    }

    /// Full detection used by the router: extension first, then the content
    /// sniffer if it is enabled and the extension was not recognised.
    pub fn detect_with_content(&self, file_name: &str, content: &[u8]) -> Detection {
        let extension = Self::extension(file_name);
        let tag = Self::tag_for_extension(&extension);
        if tag != FormatTag::Unsupported || !self.sniff_content {
            return Detection::from_extension(tag, extension);
        }

        match sniff(content) {
            Some((tag, assumed)) => {
                tracing::debug!(file_name, assumed, tag = %tag, "Format sniffed from content");
                Detection {
                    tag,
                    extension: assumed.to_string(),
                    sniffed: true,
                }
            }
            None => Detection::from_extension(FormatTag::Unsupported, extension),
        }
    }
}

/// Best-effort guess of format and assumed extension from leading bytes
fn sniff(content: &[u8]) -> Option<(FormatTag, &'static str)> {
    if content.starts_with(ZIP_MAGIC) {
        return Some((FormatTag::Tabular, "xlsx"));
    }
    if content.starts_with(OLE2_MAGIC) {
        return Some((FormatTag::Tabular, "xls"));
    }

    let window = &content[..content.len().min(SNIFF_WINDOW)];
    // The window may cut a multi-byte character; only the valid prefix matters
    let text = match std::str::from_utf8(window) {
        Ok(text) => text,
        Err(e) => std::str::from_utf8(&window[..e.valid_up_to()]).ok()?,
    };
    let text = text.trim_start_matches('\u{feff}');
    let trimmed = text.trim_start();

    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return Some((FormatTag::Json, "json"));
    }
    if TURTLE_PREFIX_REGEX.is_match(text) {
        return Some((FormatTag::Rdf, "ttl"));
    }
    if trimmed.starts_with('<') {
        if text.contains("rdf:RDF") {
            return Some((FormatTag::Rdf, "rdf"));
        }
        return Some((FormatTag::Markup, "xml"));
    }
    None
}
