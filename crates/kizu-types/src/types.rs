//! Core types for vehicle damage inspection

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Deserializer, Serialize};

/// Deserialize null as default value
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::deserialize(deserializer).map(|opt| opt.unwrap_or_default())
}

/// Deserialize stage results from either a JSON array or a JSON-encoded
/// string (the legacy mobile app stored `results` double-encoded).
fn results_compat<'de, D>(deserializer: D) -> Result<Vec<AnalysisResult>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Inline(Vec<AnalysisResult>),
        Encoded(String),
    }

    match Repr::deserialize(deserializer)? {
        Repr::Inline(results) => Ok(results),
        Repr::Encoded(raw) => serde_json::from_str(&raw).map_err(serde::de::Error::custom),
    }
}

/// Canonical photo slots, in index order
///
/// Analysis results are index-aligned to this configuration: slot N of a
/// stage's `results` describes the photo taken for `CameraSlot::all()[N]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CameraSlot {
    Front,
    Rear,
    LeftSide,
    RightSide,
    InteriorFront,
    InteriorRear,
    Dashboard,
    Engine,
    Trunk,
}

impl CameraSlot {
    /// All slots in canonical index order
    pub fn all() -> [CameraSlot; 9] {
        [
            CameraSlot::Front,
            CameraSlot::Rear,
            CameraSlot::LeftSide,
            CameraSlot::RightSide,
            CameraSlot::InteriorFront,
            CameraSlot::InteriorRear,
            CameraSlot::Dashboard,
            CameraSlot::Engine,
            CameraSlot::Trunk,
        ]
    }

    /// Number of canonical slots
    pub const COUNT: usize = 9;

    /// Slot at the given index, if within the canonical configuration
    pub fn from_index(index: usize) -> Option<CameraSlot> {
        Self::all().get(index).copied()
    }

    /// Canonical index of this slot
    pub fn index(&self) -> usize {
        Self::all().iter().position(|s| s == self).unwrap_or(0)
    }

    /// Get display label
    pub fn label(&self) -> &'static str {
        match self {
            CameraSlot::Front => "Front",
            CameraSlot::Rear => "Rear",
            CameraSlot::LeftSide => "Left Side",
            CameraSlot::RightSide => "Right Side",
            CameraSlot::InteriorFront => "Interior Front",
            CameraSlot::InteriorRear => "Interior Rear",
            CameraSlot::Dashboard => "Dashboard",
            CameraSlot::Engine => "Engine",
            CameraSlot::Trunk => "Trunk",
        }
    }

    /// File stem used when scanning a photo directory for this slot
    pub fn file_stem(&self) -> &'static str {
        match self {
            CameraSlot::Front => "front",
            CameraSlot::Rear => "rear",
            CameraSlot::LeftSide => "left",
            CameraSlot::RightSide => "right",
            CameraSlot::InteriorFront => "interior-front",
            CameraSlot::InteriorRear => "interior-rear",
            CameraSlot::Dashboard => "dashboard",
            CameraSlot::Engine => "engine",
            CameraSlot::Trunk => "trunk",
        }
    }

    /// Display label for a result index, falling back to a numbered slot
    /// beyond the canonical configuration
    pub fn label_for_index(index: usize) -> String {
        Self::from_index(index)
            .map(|s| s.label().to_string())
            .unwrap_or_else(|| format!("Slot {}", index + 1))
    }

    /// Whether this slot photographs the vehicle exterior
    pub fn is_exterior(&self) -> bool {
        matches!(
            self,
            CameraSlot::Front | CameraSlot::Rear | CameraSlot::LeftSide | CameraSlot::RightSide
        )
    }
}

impl std::fmt::Display for CameraSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Damage severity classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    None,
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Vehicle record lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleStatus {
    /// No photos uploaded yet
    #[default]
    PendingPhotos,
    /// Photos uploaded, no analysis yet
    Completed,
    /// At least one inspection stage recorded
    Analyzed,
}

impl VehicleStatus {
    pub fn label(&self) -> &'static str {
        match self {
            VehicleStatus::PendingPhotos => "pending photos",
            VehicleStatus::Completed => "completed",
            VehicleStatus::Analyzed => "analyzed",
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Damage assessment for one photo, as produced by the vision backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Whether damage was found in the photo
    #[serde(default, deserialize_with = "null_to_default")]
    pub has_damage: bool,

    /// Short damage label (e.g., "Scratch", "Dent")
    #[serde(default, deserialize_with = "null_to_default")]
    pub damage_type: String,

    /// Damage severity
    #[serde(default, deserialize_with = "null_to_default")]
    pub severity: Severity,

    /// Assessment description
    #[serde(default, deserialize_with = "null_to_default")]
    pub description: String,

    /// Repair recommendations
    #[serde(default)]
    pub recommendations: Vec<String>,

    /// False when the photo failed angle/clarity verification; such results
    /// are excluded from damage statistics
    #[serde(default = "default_true", deserialize_with = "complete_or_default")]
    pub image_complete: bool,

    /// Why verification failed, when it did
    #[serde(default)]
    pub completeness_note: Option<String>,
}

fn default_true() -> bool {
    true
}

fn complete_or_default<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer).map(|opt| opt.unwrap_or(true))
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self {
            has_damage: false,
            damage_type: String::new(),
            severity: Severity::None,
            description: String::new(),
            recommendations: Vec::new(),
            image_complete: true,
            completeness_note: None,
        }
    }
}

impl AnalysisResult {
    /// Enforce the severity invariant: no damage means severity `none`
    pub fn normalized(mut self) -> Self {
        if !self.has_damage {
            self.severity = Severity::None;
        }
        self
    }

    /// Synthetic result substituted when a per-photo analysis call fails,
    /// so a batch always yields one entry per input photo
    pub fn analysis_failed(reason: impl Into<String>) -> Self {
        Self {
            damage_type: "Analysis Failed".to_string(),
            description: "The analysis service did not return a usable assessment.".to_string(),
            image_complete: false,
            completeness_note: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Whether this result participates in damage statistics
    pub fn counts_toward_stats(&self) -> bool {
        self.image_complete
    }
}

/// One complete inspection pass, frozen as a historical snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// 1-based stage number, strictly increasing per vehicle, never reused
    pub stage_number: u32,

    /// When the stage was recorded
    pub timestamp: DateTime<Utc>,

    /// Per-slot assessments, index-aligned to `CameraSlot::all()`
    #[serde(deserialize_with = "results_compat")]
    pub results: Vec<AnalysisResult>,

    /// Photo references used to produce `results`, frozen at creation
    #[serde(default)]
    pub photos: Vec<String>,

    /// Free-text comparison to the prior stage, set after the fact;
    /// mutable only while this is the latest stage
    #[serde(default)]
    pub comparison: Option<String>,
}

impl Stage {
    pub fn new(stage_number: u32, photos: Vec<String>, results: Vec<AnalysisResult>) -> Self {
        Self {
            stage_number,
            timestamp: Utc::now(),
            results,
            photos,
            comparison: None,
        }
    }

    /// Count of verified photos showing damage
    pub fn damage_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.counts_toward_stats() && r.has_damage)
            .count()
    }

    /// Count of verified photos showing no damage
    pub fn clean_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.counts_toward_stats() && !r.has_damage)
            .count()
    }

    /// Count of photos that failed verification
    pub fn unverified_count(&self) -> usize {
        self.results.iter().filter(|r| !r.counts_toward_stats()).count()
    }
}

/// Registered vehicle with its inspection history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleRecord {
    /// Unique identifier
    pub id: String,
    /// Manufacturer (e.g., "Toyota")
    pub make: String,
    /// Model name (e.g., "Camry")
    pub model: String,
    /// License registration number
    pub registration_number: String,
    /// Current working photo set, distinct from any stage's frozen snapshot
    #[serde(default)]
    pub photos: Vec<String>,
    /// Thumbnail of the first photo as base64 PNG, for report display
    #[serde(default)]
    pub thumbnail_base64: Option<String>,
    /// Lifecycle status, derived from photos/stages
    pub status: VehicleStatus,
    /// Inspection stages, append-only, oldest first
    #[serde(default)]
    pub stages: Vec<Stage>,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl VehicleRecord {
    pub fn new(make: String, model: String, registration_number: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            make,
            model,
            registration_number,
            photos: Vec::new(),
            thumbnail_base64: None,
            status: VehicleStatus::PendingPhotos,
            stages: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Recompute status from photos/stages; keeps the invariant
    /// `status == Analyzed` iff at least one stage exists
    pub fn refresh_status(&mut self) {
        self.status = if !self.stages.is_empty() {
            VehicleStatus::Analyzed
        } else if !self.photos.is_empty() {
            VehicleStatus::Completed
        } else {
            VehicleStatus::PendingPhotos
        };
    }

    /// Stage number for the next inspection pass
    pub fn next_stage_number(&self) -> u32 {
        self.stages.last().map(|s| s.stage_number + 1).unwrap_or(1)
    }

    /// Most recently recorded stage
    pub fn latest_stage(&self) -> Option<&Stage> {
        self.stages.last()
    }

    /// Stage before the latest, if any
    pub fn previous_stage(&self) -> Option<&Stage> {
        let n = self.stages.len();
        if n >= 2 {
            self.stages.get(n - 2)
        } else {
            None
        }
    }

    /// Find a stage by its number
    pub fn stage(&self, stage_number: u32) -> Option<&Stage> {
        self.stages.iter().find(|s| s.stage_number == stage_number)
    }

    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.make, self.model, self.registration_number)
    }
}
