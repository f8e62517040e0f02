//! Store openers wired to configuration

use std::path::PathBuf;

use kizu_store::VehicleStore;
use kizu_types::Result;

use crate::config::Config;

/// Open the file-backed vehicle store at the configured directory
pub fn open_vehicle_store(config: &Config) -> Result<VehicleStore> {
    let store_dir = config.store_dir()?;
    VehicleStore::open(store_dir).map_err(Into::into)
}

/// Open the vehicle store at a custom directory
pub fn open_vehicle_store_at(store_dir: PathBuf) -> Result<VehicleStore> {
    VehicleStore::open(store_dir).map_err(Into::into)
}
