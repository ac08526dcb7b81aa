//! Extract command - list calibration groups of one type.

use std::path::PathBuf;

use colored::Colorize;

use super::load_existing;

pub fn run(
    cache: PathBuf,
    cal_type: String,
    references: Vec<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_existing(&cache)?;

    let groups = if references.is_empty() {
        store.extract_all(&cal_type)
    } else {
        store.extract(&cal_type, &references)
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&groups)?);
        return Ok(());
    }

    if groups.is_empty() {
        println!("{}", format!("No {} calibrations found.", cal_type).yellow());
        return Ok(());
    }

    for (label, files) in &groups {
        println!("{}", label.cyan().bold());
        for file in files {
            match store.checksum(file) {
                Some(checksum) => println!("  {} {}", file, checksum.dimmed()),
                None => println!("  {}", file),
            }
        }
    }

    Ok(())
}
