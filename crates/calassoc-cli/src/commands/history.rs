//! History command - list saved versions of a cache.

use std::path::PathBuf;

use calassoc::CalibrationStore;
use colored::Colorize;

pub fn run(cache: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let history = CalibrationStore::list_history(&cache)?;

    if history.is_empty() {
        println!("{}", "No previous versions saved.".yellow());
        return Ok(());
    }

    for (index, path) in history.iter().enumerate() {
        println!("  {} {}", index.to_string().cyan(), path.display());
    }
    Ok(())
}
