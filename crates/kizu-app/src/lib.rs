//! Application service layer - configuration, photo intake, inspection use case

pub mod config;
pub mod inspection;
pub mod photos;
pub mod repository;

pub use config::Config;
pub use inspection::{run_inspection, InspectionError, InspectionOptions, InspectionOutcome};
