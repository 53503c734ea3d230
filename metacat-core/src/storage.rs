use crate::catalog::DataSource;
use anyhow::{anyhow, Context, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use uuid::Uuid;

/// Storage abstraction for catalog records
pub trait CatalogStorage: Send + Sync {
    fn get(&self, id: &Uuid) -> Result<Option<DataSource>>;

    /// Insert or overwrite the record with the same id
    fn store(&self, record: &DataSource) -> Result<()>;

    /// All records, newest upload first
    fn list(&self) -> Result<Vec<DataSource>>;

    /// Returns whether a record was removed
    fn delete(&self, id: &Uuid) -> Result<bool>;
}

fn newest_first(records: &mut [DataSource]) {
    records.sort_by(|a, b| b.upload_date.cmp(&a.upload_date).then(a.id.cmp(&b.id)));
}

/// File-based storage: one pretty-printed JSON document per record
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("data_sources")).with_context(|| {
            format!("Failed to create catalog directory {}", root.display())
        })?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, id: &Uuid) -> PathBuf {
        self.root.join("data_sources").join(format!("{}.json", id))
    }

    fn read_record(path: &Path) -> Result<DataSource> {
        let json_str = fs::read_to_string(path)?;
        serde_json::from_str(&json_str)
            .map_err(|e| anyhow!("Failed to deserialize data source {}: {}", path.display(), e))
    }
}

impl CatalogStorage for FileStorage {
    fn get(&self, id: &Uuid) -> Result<Option<DataSource>> {
        let path = self.record_path(id);
        if path.exists() {
            Ok(Some(Self::read_record(&path)?))
        } else {
            Ok(None)
        }
    }

    fn store(&self, record: &DataSource) -> Result<()> {
        let path = self.record_path(&record.id);
        let json_str = serde_json::to_string_pretty(record)
            .map_err(|e| anyhow!("Failed to serialize data source: {}", e))?;
        fs::write(&path, json_str)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::debug!(id = %record.id, path = %path.display(), "Stored data source");
        Ok(())
    }

    fn list(&self) -> Result<Vec<DataSource>> {
        let mut records = Vec::new();
        for entry in fs::read_dir(self.root.join("data_sources"))? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                records.push(Self::read_record(&path)?);
            }
        }
        newest_first(&mut records);
        Ok(records)
    }

    fn delete(&self, id: &Uuid) -> Result<bool> {
        let path = self.record_path(id);
        if path.exists() {
            fs::remove_file(&path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// In-process storage, for tests and embedding
#[derive(Default)]
pub struct MemoryStorage {
    records: RwLock<HashMap<Uuid, DataSource>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogStorage for MemoryStorage {
    fn get(&self, id: &Uuid) -> Result<Option<DataSource>> {
        let records = self.records.read().map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(records.get(id).cloned())
    }

    fn store(&self, record: &DataSource) -> Result<()> {
        let mut records = self.records.write().map_err(|_| anyhow!("catalog lock poisoned"))?;
        records.insert(record.id, record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<DataSource>> {
        let records = self.records.read().map_err(|_| anyhow!("catalog lock poisoned"))?;
        let mut out: Vec<DataSource> = records.values().cloned().collect();
        newest_first(&mut out);
        Ok(out)
    }

    fn delete(&self, id: &Uuid) -> Result<bool> {
        let mut records = self.records.write().map_err(|_| anyhow!("catalog lock poisoned"))?;
        Ok(records.remove(id).is_some())
    }
}

/// Hex SHA-256 of uploaded content
pub fn calculate_content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
