//! Domain services and repository traits for kizu-checker

pub mod repository;
pub mod service;

pub use repository::{KeyValueStore, VehicleRecordRepository};
pub use service::quality::{
    QualityBreakdown, QualityScorer, ACCEPT_THRESHOLD, SUBCHECK_BUDGET, SUBCHECK_PASS,
};
pub use service::stage_differ::{
    diff_results, diff_stages, render_diff_report, AngleDiff, ChangeKind, FieldChange, StageDiff,
    FIRST_INSPECTION_NOTE, SUMMARY_CHANGED, SUMMARY_UNCHANGED,
};
