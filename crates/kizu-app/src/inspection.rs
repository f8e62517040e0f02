//! Inspection use case - analyze a vehicle's photo set and record a stage
//!
//! This service orchestrates the complete inspection workflow:
//! 1. Validate the record and its photo set
//! 2. Snapshot the previous stage's results
//! 3. Run the sequential per-slot analysis batch
//! 4. Append the new stage
//! 5. Diff against the previous stage and store the comparison narrative

use std::time::Duration;

use thiserror::Error;

use kizu_domain::{
    diff_results, render_diff_report, StageDiff, VehicleRecordRepository, FIRST_INSPECTION_NOTE,
};
use kizu_store::VehicleStore;
use kizu_types::{AnalysisResult, StoreError};
use kizu_vision::{
    analyze_photo_set, BatchOptions, ProgressCallback, VisionBackend, DEFAULT_ANALYSIS_DELAY,
};

/// Errors specific to the inspection service
#[derive(Debug, Error)]
pub enum InspectionError {
    #[error("Vehicle not found: {0}")]
    RecordNotFound(String),

    #[error("Vehicle has no photos to analyze")]
    NoPhotos,

    #[error("Store error: {0}")]
    Store(String),
}

impl From<StoreError> for InspectionError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => InspectionError::RecordNotFound(id),
            other => InspectionError::Store(other.to_string()),
        }
    }
}

impl From<InspectionError> for kizu_types::Error {
    fn from(err: InspectionError) -> Self {
        match err {
            InspectionError::RecordNotFound(id) => {
                kizu_types::Error::Store(StoreError::NotFound(id))
            }
            other => kizu_types::Error::AnalysisFailed(other.to_string()),
        }
    }
}

/// Options for an inspection run
#[derive(Debug, Clone)]
pub struct InspectionOptions {
    /// Pause between analysis calls
    pub delay: Duration,
}

impl Default for InspectionOptions {
    fn default() -> Self {
        Self {
            delay: DEFAULT_ANALYSIS_DELAY,
        }
    }
}

impl InspectionOptions {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Result of one inspection run
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectionOutcome {
    /// Number of the stage that was recorded
    pub stage_number: u32,

    /// Per-slot assessments, one per photo
    pub results: Vec<AnalysisResult>,

    /// Structured diff against the previous stage; None on the first stage
    pub diff: Option<StageDiff>,

    /// Narrative stored on the new stage
    pub comparison: String,

    pub succeeded: usize,
    pub failed: usize,
}

/// Main entry point: analyze a vehicle's current photo set
pub fn run_inspection(
    store: &mut VehicleStore,
    id: &str,
    backend: &dyn VisionBackend,
    options: &InspectionOptions,
    progress: Option<ProgressCallback>,
) -> Result<InspectionOutcome, InspectionError> {
    // Step 1: Validate record and photos
    let record = store
        .get(id)
        .ok_or_else(|| InspectionError::RecordNotFound(id.to_string()))?;
    if record.photos.is_empty() {
        return Err(InspectionError::NoPhotos);
    }

    // Step 2: Snapshot the previous results before anything is appended
    let previous = record.latest_stage().map(|s| s.results.clone());

    // Step 3: Sequential analysis, one photo per slot
    let batch_options = BatchOptions::default().with_delay(options.delay);
    let outcome = analyze_photo_set(backend, &record.photos, &batch_options, progress);

    // Step 4: Record the stage (snapshots the photo set)
    let stage_number = store.record_analysis(id, outcome.results.clone())?;

    // Step 5: Compare with the previous stage and store the narrative
    let (diff, comparison) = match previous {
        Some(prev) => {
            let diff = diff_results(&prev, &outcome.results);
            let comparison = render_diff_report(&diff);
            (Some(diff), comparison)
        }
        None => (None, FIRST_INSPECTION_NOTE.to_string()),
    };
    store.set_latest_comparison(id, &comparison)?;

    Ok(InspectionOutcome {
        stage_number,
        results: outcome.results,
        diff,
        comparison,
        succeeded: outcome.succeeded,
        failed: outcome.failed,
    })
}
