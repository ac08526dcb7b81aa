//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use calassoc::{CalError, DependencyGraph};

/// calassoc: calibration association caches for data reduction
#[derive(Parser)]
#[command(name = "calassoc")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Calibration cache file
    #[arg(
        short,
        long,
        global = true,
        default_value = "calibrations.json",
        env = "CALASSOC_CACHE"
    )]
    pub cache: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an empty cache file
    Init {
        /// Overwrite an existing cache
        #[arg(long)]
        force: bool,
    },

    /// Validate a cache and report problems
    Check,

    /// Show a summary of the cache
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List calibration groups of one type
    Extract {
        /// Calibration type (e.g., "bias", "flat", "arc")
        #[arg(value_name = "CAL_TYPE")]
        cal_type: String,

        /// Only groups used by these files (repeatable)
        #[arg(short, long = "reference", value_name = "FILE")]
        references: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve calibrations for files from a table of lookup results
    Resolve {
        /// Files to resolve
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Dependency graph: a preset name (gemini, gmos-spec) or a JSON file
        #[arg(short, long, default_value = "gmos-spec")]
        graph: GraphChoice,

        /// JSON table of lookup results ({file: {cal_type: [[name, checksum], ...]}})
        #[arg(short, long, value_name = "TABLE")]
        table: PathBuf,

        /// Observation type of the files
        #[arg(short, long, default_value = "target")]
        obs_type: String,

        /// Look up again pairs previously recorded as not found
        #[arg(long)]
        refresh_missing: bool,

        /// Don't keep a copy of the previous cache
        #[arg(long)]
        no_history: bool,
    },

    /// Rewrite the cache in canonical form (sorted keys, 4-space indent)
    Fmt {
        /// Only report whether the file is already canonical
        #[arg(long)]
        check: bool,
    },

    /// List saved previous versions of the cache
    History,
}

/// Where the dependency graph comes from.
#[derive(Clone, Debug)]
pub enum GraphChoice {
    /// One of the built-in graphs
    Preset(String),
    /// A JSON file of `obs_type: [cal_type, ...]`
    File(PathBuf),
}

impl GraphChoice {
    pub fn load(&self) -> Result<DependencyGraph, CalError> {
        match self {
            GraphChoice::Preset(name) => DependencyGraph::preset(name),
            GraphChoice::File(path) => DependencyGraph::load(path),
        }
    }
}

impl std::str::FromStr for GraphChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.ends_with(".json") {
            Ok(GraphChoice::File(PathBuf::from(s)))
        } else if calassoc::graph::PRESETS.contains(&s) {
            Ok(GraphChoice::Preset(s.to_string()))
        } else {
            Err(format!(
                "Unknown graph: {}. Use: {} or a .json file.",
                s,
                calassoc::graph::PRESETS.join(", ")
            ))
        }
    }
}

impl std::fmt::Display for GraphChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphChoice::Preset(name) => write!(f, "{}", name),
            GraphChoice::File(path) => write!(f, "{}", path.display()),
        }
    }
}
