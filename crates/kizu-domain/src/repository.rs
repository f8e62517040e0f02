//! Repository trait definitions for data persistence

use kizu_types::{AnalysisResult, StoreError, VehicleRecord};

/// Repository for vehicle records and their inspection history
///
/// All id-addressed mutators report `StoreError::NotFound` for an unknown id.
/// `remove` is idempotent and reports `Ok(false)` instead.
pub trait VehicleRecordRepository {
    /// Create a new record with empty photos and stages; returns its id
    fn create(
        &mut self,
        make: &str,
        model: &str,
        registration_number: &str,
    ) -> Result<String, StoreError>;

    /// Replace the working photo set and recompute status
    fn set_photos(&mut self, id: &str, photos: Vec<String>) -> Result<(), StoreError>;

    /// Append an inspection stage snapshotting the current photos;
    /// returns the new stage number
    fn record_analysis(
        &mut self,
        id: &str,
        results: Vec<AnalysisResult>,
    ) -> Result<u32, StoreError>;

    /// Set the comparison narrative on the latest stage only.
    /// A record with zero stages is left unchanged (documented no-op).
    fn set_latest_comparison(&mut self, id: &str, comparison: &str) -> Result<(), StoreError>;

    /// Look up a record by id
    fn get(&self, id: &str) -> Option<VehicleRecord>;

    /// All records, in insertion order (oldest first)
    fn all(&self) -> Vec<VehicleRecord>;

    /// Delete a record and all its stages; `Ok(false)` if the id is unknown
    fn remove(&mut self, id: &str) -> Result<bool, StoreError>;

    /// Empty the repository
    fn clear(&mut self) -> Result<(), StoreError>;
}

/// Durable key-value storage contract
///
/// The store persists the full record collection as a single keyed blob
/// through this interface.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}
