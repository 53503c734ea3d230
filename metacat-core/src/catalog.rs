use crate::router::ExtractionRouter;
use crate::storage::calculate_content_hash;
use crate::types::ExtractionResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Extraction state of a data source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    #[default]
    Pending,
    Success,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "PENDING",
            ProcessingStatus::Success => "SUCCESS",
            ProcessingStatus::Failed => "FAILED",
        }
    }

    /// Status follows the result variant. A success mapping that happens to
    /// contain an `error` key (an XML element named `error`) is still a success.
    pub fn from_result(result: &ExtractionResult) -> Self {
        if result.is_success() {
            ProcessingStatus::Success
        } else {
            ProcessingStatus::Failed
        }
    }
}

/// Catalog record created per upload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSource {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub file_name: String,
    pub status: ProcessingStatus,
    /// Result mapping stored verbatim; `None` until extraction ran
    #[serde(default)]
    pub processed_metadata: Option<Value>,
    #[serde(default)]
    pub content_sha256: Option<String>,
    pub upload_date: DateTime<Utc>,
}

impl DataSource {
    pub fn new(name: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            file_name: file_name.into(),
            status: ProcessingStatus::Pending,
            processed_metadata: None,
            content_sha256: None,
            upload_date: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Create a record and run extraction on `content` in one step
    pub fn ingest(
        name: impl Into<String>,
        file_name: impl Into<String>,
        content: &[u8],
        router: &ExtractionRouter,
    ) -> Self {
        let mut record = Self::new(name, file_name);
        let result = router.extract(&record.file_name, content);
        record.apply(&result, content);
        record
    }

    /// Record the outcome of an extraction run over `content`
    pub fn apply(&mut self, result: &ExtractionResult, content: &[u8]) {
        self.status = ProcessingStatus::from_result(result);
        self.processed_metadata = Some(result.to_metadata());
        self.content_sha256 = Some(calculate_content_hash(content));
        tracing::debug!(id = %self.id, status = self.status.as_str(), "Data source processed");
    }

    /// Message of a failed extraction, if any
    pub fn error_message(&self) -> Option<&str> {
        if self.status != ProcessingStatus::Failed {
            return None;
        }
        self.processed_metadata
            .as_ref()
            .and_then(|m| m.get("error"))
            .and_then(Value::as_str)
    }
}
