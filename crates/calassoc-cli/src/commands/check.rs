//! Check command - validate a cache and report problems.

use std::path::PathBuf;

use calassoc::StoreIssue;
use colored::Colorize;

use super::load_existing;

pub fn run(cache: PathBuf, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Shape errors surface here as MalformedStore
    let store = load_existing(&cache)?;
    let issues = store.validate();

    let (errors, notices): (Vec<&StoreIssue>, Vec<&StoreIssue>) =
        issues.iter().partition(|issue| issue.is_error());

    for issue in &errors {
        println!("  {} {}", "error:".red().bold(), issue);
    }
    for issue in &notices {
        match issue {
            StoreIssue::AwaitingEntry { .. } => println!("  {} {}", "todo:".yellow().bold(), issue),
            _ if verbose => println!("  {} {}", "note:".blue(), issue),
            _ => {}
        }
    }

    if !errors.is_empty() {
        return Err(format!(
            "{} has {} problem(s) that will stop resolution",
            cache.display(),
            errors.len()
        )
        .into());
    }

    let awaiting = notices
        .iter()
        .filter(|issue| matches!(issue, StoreIssue::AwaitingEntry { .. }))
        .count();
    if awaiting > 0 {
        println!(
            "{} {} ({} association(s) awaiting manual entry)",
            "OK".green().bold(),
            cache.display(),
            awaiting.to_string().yellow()
        );
    } else {
        println!("{} {}", "OK".green().bold(), cache.display());
    }
    Ok(())
}
