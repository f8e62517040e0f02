//! Field-level comparison between two inspection stages

use serde::{Deserialize, Serialize};

use kizu_types::{AnalysisResult, CameraSlot, Stage};

/// Summary emitted when any slot changed between stages
pub const SUMMARY_CHANGED: &str = "Differences detected between reports.";

/// Summary emitted when nothing changed
pub const SUMMARY_UNCHANGED: &str = "No significant structural differences.";

/// Comparison narrative for the very first stage of a vehicle
pub const FIRST_INSPECTION_NOTE: &str = "First inspection recorded. No prior history to compare.";

/// What happened to a slot or one of its fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Changed,
}

/// One detected change at a slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldChange {
    pub kind: ChangeKind,
    /// Display name of the compared field; `Record` for added/removed slots
    pub field: String,
    #[serde(default)]
    pub old_value: Option<String>,
    #[serde(default)]
    pub new_value: Option<String>,
}

impl FieldChange {
    fn added() -> Self {
        Self {
            kind: ChangeKind::Added,
            field: "Record".to_string(),
            old_value: None,
            new_value: None,
        }
    }

    fn removed() -> Self {
        Self {
            kind: ChangeKind::Removed,
            field: "Record".to_string(),
            old_value: None,
            new_value: None,
        }
    }

    fn changed(field: &str, old_value: String, new_value: String) -> Self {
        Self {
            kind: ChangeKind::Changed,
            field: field.to_string(),
            old_value: Some(old_value),
            new_value: Some(new_value),
        }
    }
}

/// Changes detected at one photo slot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AngleDiff {
    pub label: String,
    pub index: usize,
    pub has_changes: bool,
    pub changes: Vec<FieldChange>,
}

/// Structured diff between two stages' result arrays
///
/// Only slots with detected changes appear in `angles`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageDiff {
    pub summary: String,
    pub overall_confirm: bool,
    pub angles: Vec<AngleDiff>,
}

fn slot_label(index: usize) -> String {
    CameraSlot::label_for_index(index)
}

fn yes_no(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

/// Compare two result arrays slot by slot.
///
/// Slots beyond either array's bounds count as absent. Present-in-both slots
/// are compared on exactly four fields (severity, damage type, description,
/// damage presence) with strict inequality.
pub fn diff_results(previous: &[AnalysisResult], current: &[AnalysisResult]) -> StageDiff {
    let mut angles = Vec::new();
    let len = previous.len().max(current.len());

    for index in 0..len {
        let mut changes = Vec::new();

        match (previous.get(index), current.get(index)) {
            (None, Some(_)) => changes.push(FieldChange::added()),
            (Some(_), None) => changes.push(FieldChange::removed()),
            (Some(prev), Some(curr)) => {
                if prev.severity != curr.severity {
                    changes.push(FieldChange::changed(
                        "Severity",
                        prev.severity.label().to_string(),
                        curr.severity.label().to_string(),
                    ));
                }
                if prev.damage_type != curr.damage_type {
                    changes.push(FieldChange::changed(
                        "Damage Type",
                        prev.damage_type.clone(),
                        curr.damage_type.clone(),
                    ));
                }
                if prev.description != curr.description {
                    changes.push(FieldChange::changed(
                        "Description",
                        prev.description.clone(),
                        curr.description.clone(),
                    ));
                }
                if prev.has_damage != curr.has_damage {
                    changes.push(FieldChange::changed(
                        "Has Damage",
                        yes_no(prev.has_damage),
                        yes_no(curr.has_damage),
                    ));
                }
            }
            (None, None) => {}
        }

        if !changes.is_empty() {
            angles.push(AngleDiff {
                label: slot_label(index),
                index,
                has_changes: true,
                changes,
            });
        }
    }

    let overall_confirm = !angles.is_empty();
    StageDiff {
        summary: if overall_confirm {
            SUMMARY_CHANGED.to_string()
        } else {
            SUMMARY_UNCHANGED.to_string()
        },
        overall_confirm,
        angles,
    }
}

/// Compare two stages' result arrays
pub fn diff_stages(previous: &Stage, current: &Stage) -> StageDiff {
    diff_results(&previous.results, &current.results)
}

/// Render a diff as the free-text comparison narrative stored on a stage
pub fn render_diff_report(diff: &StageDiff) -> String {
    let mut report = String::new();
    report.push_str("INSPECTION COMPARISON\n");
    report.push_str("=====================\n\n");

    for angle in &diff.angles {
        report.push_str(&format!("--- {} ---\n", angle.label));
        for change in &angle.changes {
            match change.kind {
                ChangeKind::Added => report.push_str("  Newly recorded in this inspection\n"),
                ChangeKind::Removed => report.push_str("  No longer recorded in this inspection\n"),
                ChangeKind::Changed => report.push_str(&format!(
                    "  {}: {} -> {}\n",
                    change.field,
                    change.old_value.as_deref().unwrap_or("-"),
                    change.new_value.as_deref().unwrap_or("-"),
                )),
            }
        }
        report.push('\n');
    }

    report.push_str(&diff.summary);
    report.push('\n');
    report
}
