//! Resolve command - extend a cache from a table of lookup results.

use std::path::PathBuf;

use calassoc::{CacheConfig, CalibrationCache, LookupTable, ResolverConfig};
use colored::Colorize;

use crate::cli::GraphChoice;

pub struct ResolveArgs {
    pub files: Vec<String>,
    pub graph: GraphChoice,
    pub table: PathBuf,
    pub obs_type: String,
    pub refresh_missing: bool,
    pub keep_history: bool,
}

pub fn run(cache: PathBuf, args: ResolveArgs) -> Result<(), Box<dyn std::error::Error>> {
    let graph = args.graph.load()?;
    let table = LookupTable::load(&args.table)?;
    tracing::debug!(
        graph = %args.graph,
        table = %args.table.display(),
        files = args.files.len(),
        "resolving from lookup table"
    );

    let config = CacheConfig::at(&cache)
        .with_history(args.keep_history)
        .with_resolver(ResolverConfig {
            refresh_missing: args.refresh_missing,
            ..ResolverConfig::default()
        });
    let mut session = CalibrationCache::open(config)?;

    let report = session
        .look_up_cals(&args.files, &args.obs_type, &graph, table)
        .map_err(|e| e.to_string())?;

    println!(
        "{} {} file(s) against {}",
        "Resolved".cyan().bold(),
        args.files.len().to_string().white().bold(),
        args.graph
    );
    println!("  Lookups:  {}", report.lookups.to_string().white());
    println!("  Cached:   {}", report.already_associated.to_string().white());

    if report.not_found.is_empty() {
        println!("  {}", "All calibrations found.".green());
    } else {
        println!(
            "  {} {}",
            "Not found:".yellow().bold(),
            report.not_found.len()
        );
        for (file, cal_type) in &report.not_found {
            println!("    {} {}", file, cal_type.yellow());
        }
        println!(
            "Fill in the null entries in {} and run again.",
            cache.display().to_string().cyan()
        );
    }

    Ok(())
}
