//! rule-storage-json
//!
//! File-backed JSON implementations of the transaction and rule stores.

use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use rule_core::{CoreError, RuleStore, TransactionPayload, TransactionStore};
use rule_domain::{AllocationRule, RawTransaction};
use tracing::{debug, info};
use uuid::Uuid;

const TRANSACTIONS_FILE: &str = "transactions.json";
const RULE_FILE: &str = "budget-rule.json";
const TMP_SUFFIX: &str = "tmp";

/// Locations of the JSON files under a data root.
#[derive(Debug, Clone)]
pub struct StoragePaths {
    pub root: PathBuf,
}

impl StoragePaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn transactions_file(&self) -> PathBuf {
        self.root.join(TRANSACTIONS_FILE)
    }

    pub fn rule_file(&self) -> PathBuf {
        self.root.join(RULE_FILE)
    }
}

/// Opens both stores under `paths.root`, creating the directory if needed.
pub fn open_stores(paths: &StoragePaths) -> Result<(JsonTransactionStore, JsonRuleStore), CoreError> {
    Ok((
        JsonTransactionStore::new(paths.transactions_file())?,
        JsonRuleStore::new(paths.rule_file())?,
    ))
}

/// Transactions persisted as a JSON array of raw store records.
#[derive(Debug)]
pub struct JsonTransactionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonTransactionStore {
    pub fn new(path: PathBuf) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn guard(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.lock
            .lock()
            .map_err(|_| CoreError::Storage("transaction store lock poisoned".into()))
    }

    fn read_records(&self) -> Result<Vec<RawTransaction>, CoreError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)?;
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
    }

    fn write_records(&self, records: &[RawTransaction]) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|err| CoreError::Serde(err.to_string()))?;
        replace_file(&self.path, &json)
    }
}

impl TransactionStore for JsonTransactionStore {
    fn list_transactions(&self) -> Result<Vec<RawTransaction>, CoreError> {
        let _guard = self.guard()?;
        let records = self.read_records()?;
        debug!(path = %self.path.display(), count = records.len(), "listed transactions");
        Ok(records)
    }

    fn create_transaction(&self, payload: &TransactionPayload) -> Result<(), CoreError> {
        let _guard = self.guard()?;
        let mut records = self.read_records()?;
        let id = Uuid::new_v4().to_string();
        records.push(payload.to_raw(&id));
        self.write_records(&records)?;
        info!(%id, "stored new transaction");
        Ok(())
    }

    fn update_transaction(&self, id: &str, patch: &TransactionPayload) -> Result<(), CoreError> {
        let _guard = self.guard()?;
        let mut records = self.read_records()?;
        let record = records
            .iter_mut()
            .find(|record| record.record_id().as_deref() == Some(id))
            .ok_or_else(|| CoreError::TransactionNotFound(id.to_string()))?;

        let mut updated = patch.to_raw(id);
        if record.id.is_none() {
            // keep the store's original `_id` key
            updated.id = None;
            updated.object_id = record.object_id.clone();
        }
        *record = updated;
        self.write_records(&records)?;
        info!(id, "updated transaction");
        Ok(())
    }

    fn delete_transaction(&self, id: &str) -> Result<(), CoreError> {
        let _guard = self.guard()?;
        let mut records = self.read_records()?;
        let before = records.len();
        records.retain(|record| record.record_id().as_deref() != Some(id));
        if records.len() == before {
            return Err(CoreError::TransactionNotFound(id.to_string()));
        }
        self.write_records(&records)?;
        info!(id, "deleted transaction");
        Ok(())
    }
}

/// The allocation rule persisted as a single JSON object.
#[derive(Debug, Clone)]
pub struct JsonRuleStore {
    path: PathBuf,
}

impl JsonRuleStore {
    pub fn new(path: PathBuf) -> Result<Self, CoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleStore for JsonRuleStore {
    /// Returns the stored rule, or the 50/30/20 default when none was saved.
    fn get_rule(&self) -> Result<AllocationRule, CoreError> {
        if !self.path.exists() {
            return Ok(AllocationRule::default());
        }
        let data = fs::read_to_string(&self.path)?;
        serde_json::from_str(&data).map_err(|err| CoreError::Serde(err.to_string()))
    }

    fn update_rule(&self, rule: &AllocationRule) -> Result<(), CoreError> {
        let json =
            serde_json::to_string_pretty(rule).map_err(|err| CoreError::Serde(err.to_string()))?;
        replace_file(&self.path, &json)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

/// Writes to a sibling tmp file, then renames it over `path`.
fn replace_file(path: &Path, data: &str) -> Result<(), CoreError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = tmp_path(path);
    let mut file = File::create(&tmp)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    fs::rename(&tmp, path)?;
    Ok(())
}
