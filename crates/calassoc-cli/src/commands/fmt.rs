//! Fmt command - rewrite a hand-edited cache in canonical form.

use std::fs;
use std::path::PathBuf;

use colored::Colorize;

use super::load_existing;

pub fn run(cache: PathBuf, check: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_existing(&cache)?;
    let canonical = store.to_json_string()?;
    let current = fs::read_to_string(&cache)?;

    if current == canonical {
        println!("{} {}", "Unchanged".green(), cache.display());
        return Ok(());
    }

    if check {
        return Err(format!("{} is not in canonical form", cache.display()).into());
    }

    store.save_with_history(&cache)?;
    println!("{} {}", "Reformatted".cyan().bold(), cache.display());
    Ok(())
}
