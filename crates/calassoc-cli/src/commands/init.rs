//! Init command - create an empty calibration cache.

use std::path::PathBuf;

use calassoc::CalibrationStore;
use colored::Colorize;

pub fn run(cache: PathBuf, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    if cache.exists() && !force {
        return Err(format!(
            "Cache already exists: {} (use --force to overwrite)",
            cache.display()
        )
        .into());
    }

    CalibrationStore::new().save(&cache)?;
    println!(
        "{} {}",
        "Created".green().bold(),
        cache.display().to_string().white()
    );
    Ok(())
}
