//! CLI command implementations.

pub mod check;
pub mod extract;
pub mod fmt;
pub mod history;
pub mod init;
pub mod resolve;
pub mod show;

use std::path::Path;

use calassoc::CalibrationStore;

/// Load an existing cache, failing with a hint when there is none.
pub(crate) fn load_existing(cache: &Path) -> Result<CalibrationStore, Box<dyn std::error::Error>> {
    if !cache.exists() {
        return Err(format!(
            "Calibration cache not found: {}\nRun 'calassoc --cache {} init' or 'calassoc resolve' first.",
            cache.display(),
            cache.display()
        )
        .into());
    }
    Ok(CalibrationStore::load(cache)?)
}
