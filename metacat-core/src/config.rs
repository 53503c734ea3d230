use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

// Default value functions for serde
fn default_delimiter() -> char {
    ','
}

/// Top-level extraction configuration, loaded from YAML.
///
/// Every section defaults, so an empty file (or no file) gives the
/// baseline behaviour: extension-only detection, comma-delimited text,
/// first-occurrence markup summaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default)]
    pub detection: DetectionConfig,
    #[serde(default)]
    pub tabular: TabularConfig,
    #[serde(default)]
    pub markup: MarkupConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Look at the bytes when the extension is not in the format table.
    /// Extension detection always runs first.
    #[serde(default)]
    pub sniff_content: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularConfig {
    /// Field delimiter for csv/txt content. Must be a single ASCII character.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for TabularConfig {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkupConfig {
    #[serde(default)]
    pub mode: MarkupMode,
}

/// How repeated element names are summarised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkupMode {
    /// `tag -> first non-empty text`; later occurrences are dropped
    #[default]
    FirstOccurrence,
    /// `tag -> [every non-empty text, in document order]`
    AllOccurrences,
}

impl TabularConfig {
    pub fn delimiter_byte(&self) -> Result<u8> {
        if self.delimiter.is_ascii() {
            Ok(self.delimiter as u8)
        } else {
            Err(anyhow!(
                "tabular.delimiter must be a single ASCII character, got {:?}",
                self.delimiter
            ))
        }
    }
}

impl ExtractionConfig {
    /// Load config from file path
    pub fn load_from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_yaml(&content).with_context(|| format!("Invalid config file {}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to an empty mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: ExtractionConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config with fallback to default
    pub fn load_with_fallback(path: Option<&str>) -> Self {
        match path {
            Some(p) => Self::load_from_file(p).unwrap_or_else(|e| {
                tracing::warn!(path = p, error = %e, "Failed to load config, using defaults");
                Self::default()
            }),
            None => Self::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.tabular.delimiter_byte()?;
        Ok(())
    }
}
