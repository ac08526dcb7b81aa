//! Show command - summarize a calibration cache.

use std::path::PathBuf;

use colored::Colorize;

use super::load_existing;

pub fn run(cache: PathBuf, json_output: bool) -> Result<(), Box<dyn std::error::Error>> {
    let store = load_existing(&cache)?;
    let summary = store.summary();
    let missing = store.missing();

    if json_output {
        let status = serde_json::json!({
            "cache": cache.display().to_string(),
            "digest": store.digest()?,
            "summary": summary,
            "missing": missing
                .iter()
                .map(|(file, cal_type)| serde_json::json!({"file": file, "cal_type": cal_type}))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!(
        "{} {}",
        "Calibration cache".cyan().bold(),
        cache.display().to_string().white()
    );
    println!("  {}", store.digest()?.dimmed());
    println!();

    println!("Files:        {}", summary.files.to_string().white());
    println!("Groups:       {}", summary.groups.to_string().white());
    println!("Checksums:    {}", summary.checksums.to_string().white());
    println!("Associations: {}", summary.associations.to_string().green());
    for (cal_type, count) in &summary.by_type {
        println!("  {:<12}{}", cal_type, count);
    }
    println!();

    if missing.is_empty() {
        println!("{}", "Every lookup found a calibration.".green());
    } else {
        println!(
            "{} {}",
            "Awaiting manual entry:".yellow().bold(),
            missing.len()
        );
        for (file, cal_type) in &missing {
            println!("  {} {}", file.white(), cal_type.yellow());
        }
    }

    Ok(())
}
