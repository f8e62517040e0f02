//! Persistent store for vehicle records and inspection history
//!
//! The in-memory collection is the single source of truth: mutations apply
//! immediately, subscribed observers are notified, and a full snapshot is
//! handed to the write-behind queue for durable storage. Durable state may
//! transiently lag memory; it never leads it.

pub mod kv;
pub mod write_behind;

pub use kv::{FileKvStore, MemoryKvStore};
pub use write_behind::WriteBehind;

use std::path::PathBuf;

use kizu_domain::{KeyValueStore, VehicleRecordRepository};
use kizu_types::{AnalysisResult, Stage, StoreError, VehicleRecord};

/// Key under which the full record collection is persisted
pub const VEHICLES_KEY: &str = "vehicles";

type Listener = Box<dyn Fn(&[VehicleRecord])>;

/// Store for the full collection of vehicle records
///
/// Records keep insertion order (oldest first), which is observable through
/// `all()` and the persisted layout.
pub struct VehicleStore {
    records: Vec<VehicleRecord>,
    writer: Option<WriteBehind>,
    listeners: Vec<(usize, Listener)>,
    next_listener_id: usize,
}

impl VehicleStore {
    /// Create or load a file-backed store
    pub fn open(store_dir: PathBuf) -> Result<Self, StoreError> {
        let kv = FileKvStore::open(store_dir)?;
        Ok(Self::with_kv(kv))
    }

    /// Create or load a store over any key-value backend
    ///
    /// Loading blocks until the stored collection is parsed. Absent,
    /// unreadable, or malformed data yields an empty collection with a
    /// warning; startup never fails on bad stored state.
    pub fn with_kv<K>(kv: K) -> Self
    where
        K: KeyValueStore + 'static,
    {
        let records = match kv.get(VEHICLES_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<VehicleRecord>>(&raw) {
                Ok(records) => records,
                Err(e) => {
                    tracing::warn!(error = %e, "stored vehicle data malformed, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "stored vehicle data unreadable, starting empty");
                Vec::new()
            }
        };

        Self {
            records,
            writer: Some(WriteBehind::spawn(kv, VEHICLES_KEY.to_string())),
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    /// Ephemeral store with no durable backend
    pub fn in_memory() -> Self {
        Self {
            records: Vec::new(),
            writer: None,
            listeners: Vec::new(),
            next_listener_id: 0,
        }
    }

    /// Register an observer called with the updated collection after every
    /// mutation; returns a handle for `unsubscribe`
    pub fn subscribe<F>(&mut self, listener: F) -> usize
    where
        F: Fn(&[VehicleRecord]) + 'static,
    {
        let id = self.next_listener_id;
        self.next_listener_id += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: usize) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Block until all submitted snapshots are durably written
    pub fn flush(&self) {
        if let Some(writer) = &self.writer {
            writer.flush();
        }
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Set or clear the report thumbnail for a record
    pub fn set_thumbnail(
        &mut self,
        id: &str,
        thumbnail_base64: Option<String>,
    ) -> Result<(), StoreError> {
        let record = self.find_mut(id)?;
        record.thumbnail_base64 = thumbnail_base64;
        self.after_mutation();
        Ok(())
    }

    fn find(&self, id: &str) -> Option<&VehicleRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn find_mut(&mut self, id: &str) -> Result<&mut VehicleRecord, StoreError> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    /// Notify observers, then hand a snapshot to the background writer.
    /// Observers always see the mutation before the durable write lands.
    fn after_mutation(&self) {
        for (_, listener) in &self.listeners {
            listener(&self.records);
        }

        if let Some(writer) = &self.writer {
            match serde_json::to_string_pretty(&self.records) {
                Ok(payload) => writer.submit(payload),
                Err(e) => tracing::warn!(error = %e, "failed to serialize vehicle records"),
            }
        }
    }
}

impl VehicleRecordRepository for VehicleStore {
    fn create(
        &mut self,
        make: &str,
        model: &str,
        registration_number: &str,
    ) -> Result<String, StoreError> {
        let record = VehicleRecord::new(
            make.to_string(),
            model.to_string(),
            registration_number.to_string(),
        );
        let id = record.id.clone();
        self.records.push(record);
        self.after_mutation();
        Ok(id)
    }

    fn set_photos(&mut self, id: &str, photos: Vec<String>) -> Result<(), StoreError> {
        let record = self.find_mut(id)?;
        record.photos = photos;
        record.refresh_status();
        self.after_mutation();
        Ok(())
    }

    fn record_analysis(
        &mut self,
        id: &str,
        results: Vec<AnalysisResult>,
    ) -> Result<u32, StoreError> {
        let record = self.find_mut(id)?;
        let stage_number = record.next_stage_number();
        let results = results.into_iter().map(AnalysisResult::normalized).collect();
        let stage = Stage::new(stage_number, record.photos.clone(), results);
        record.stages.push(stage);
        record.refresh_status();
        self.after_mutation();
        Ok(stage_number)
    }

    fn set_latest_comparison(&mut self, id: &str, comparison: &str) -> Result<(), StoreError> {
        let record = self.find_mut(id)?;
        // Zero stages: nothing to annotate
        if record.stages.is_empty() {
            return Ok(());
        }
        if let Some(stage) = record.stages.last_mut() {
            stage.comparison = Some(comparison.to_string());
        }
        self.after_mutation();
        Ok(())
    }

    fn get(&self, id: &str) -> Option<VehicleRecord> {
        self.find(id).cloned()
    }

    fn all(&self) -> Vec<VehicleRecord> {
        self.records.clone()
    }

    fn remove(&mut self, id: &str) -> Result<bool, StoreError> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = self.records.len() != before;
        if removed {
            self.after_mutation();
        }
        Ok(removed)
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        self.records.clear();
        self.after_mutation();
        Ok(())
    }
}
