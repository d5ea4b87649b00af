//! Ready-made record providers and plan stores.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::CachedPlanResult;
use crate::error::PlanError;
use crate::models::{Depot, OrderRecord, RiderProfile};
use crate::traits::{PlanStore, RecordProvider};

/// Records held in memory. Doubles as the CLI dataset file format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryRecords {
    #[serde(default)]
    pub depot: Option<Depot>,
    #[serde(default)]
    pub riders: Vec<RiderProfile>,
    #[serde(default)]
    pub orders: Vec<OrderRecord>,
}

impl InMemoryRecords {
    pub fn from_path(path: &Path) -> Result<Self, PlanError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl RecordProvider for InMemoryRecords {
    fn orders_for(&self, date: NaiveDate) -> Result<Vec<OrderRecord>, PlanError> {
        Ok(self
            .orders
            .iter()
            .filter(|order| order.delivery_date == date)
            .cloned()
            .collect())
    }

    fn riders_named(&self, names: &[String]) -> Result<Vec<RiderProfile>, PlanError> {
        Ok(self
            .riders
            .iter()
            .filter(|rider| names.contains(&rider.name))
            .cloned()
            .collect())
    }

    fn depot(&self) -> Result<Option<Depot>, PlanError> {
        Ok(self.depot.clone())
    }
}

/// Plan store living for the lifetime of the process.
#[derive(Debug, Default)]
pub struct InMemoryPlanStore {
    entries: Mutex<Vec<CachedPlanResult>>,
}

impl InMemoryPlanStore {
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlanStore for InMemoryPlanStore {
    fn insert(&self, entry: CachedPlanResult) -> Result<(), PlanError> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(entry);
        Ok(())
    }

    fn find_by_date_and_digest(
        &self,
        date: NaiveDate,
        digest: &str,
    ) -> Result<Option<serde_json::Value>, PlanError> {
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(find_entry(&entries, date, digest))
    }
}

/// Plan store persisted as a JSON array on disk.
///
/// Every insert rewrites the file through a temp file and rename. A missing
/// file reads as an empty store.
#[derive(Debug)]
pub struct JsonFilePlanStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFilePlanStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> Result<Vec<CachedPlanResult>, PlanError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = fs::read_to_string(&self.path)?;
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

impl PlanStore for JsonFilePlanStore {
    fn insert(&self, entry: CachedPlanResult) -> Result<(), PlanError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut entries = self.load()?;
        entries.push(entry);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp_path = self.path.with_extension("tmp");
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer(&mut writer, &entries)?;
        writer.flush()?;
        drop(writer);
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), entries = entries.len(), "persisted plan cache");
        Ok(())
    }

    fn find_by_date_and_digest(
        &self,
        date: NaiveDate,
        digest: &str,
    ) -> Result<Option<serde_json::Value>, PlanError> {
        Ok(find_entry(&self.load()?, date, digest))
    }
}

/// First entry wins when concurrent misses stored duplicates.
fn find_entry(
    entries: &[CachedPlanResult],
    date: NaiveDate,
    digest: &str,
) -> Option<serde_json::Value> {
    entries
        .iter()
        .find(|entry| entry.delivery_date == date && entry.fingerprint == digest)
        .map(|entry| entry.payload.clone())
}
