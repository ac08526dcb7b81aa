//! calassoc: calibration association and dependency resolution for
//! telescope data reduction pipelines.
//!
//! Reducing a science exposure needs calibration exposures (biases, flats,
//! arcs), and those calibrations need calibrations of their own. Given a
//! dependency graph between observation types and a lookup that finds
//! candidate files, calassoc walks the full set of calibration files each
//! file depends on and records it in a JSON cache that users can inspect
//! and correct by hand between runs.
//!
//! # Core Principles
//!
//! - **Stable labels**: the same set of calibration files always ends up
//!   under the same group label, whatever order lookups return them in
//! - **Incremental**: pairs already in the cache are never looked up again,
//!   so manual edits survive re-runs
//! - **Explicit gaps**: a lookup that found nothing is recorded as `null`
//!   for a human to fill in, distinct from "not looked up yet"
//!
//! # Example
//!
//! ```no_run
//! use calassoc::{CalibrationStore, DependencyGraph, LookupTable, Resolver};
//!
//! let mut store = CalibrationStore::init(Some("calibrations.json")).unwrap();
//! let graph = DependencyGraph::gmos_spectroscopy();
//! let table = LookupTable::load("matches.json").unwrap();
//!
//! let mut resolver = Resolver::new(&graph, table);
//! resolver.resolve(&mut store, "S20120827S0066.fits", "target").unwrap();
//!
//! store.save("calibrations.json").unwrap();
//! println!("Biases: {:?}", store.extract_all("bias"));
//! ```

pub mod error;
pub mod graph;
pub mod label;
pub mod lookup;
pub mod persistence;
pub mod resolver;
pub mod store;

mod query;
mod recorder;
mod session;

pub use error::{CalError, ResolveError, Result};
pub use graph::DependencyGraph;
pub use lookup::{CalibrationLookup, LookupTable};
pub use query::StoreSummary;
pub use recorder::parse_matches;
pub use resolver::{resolve, ResolveReport, Resolver, ResolverConfig};
pub use session::{CacheConfig, CalibrationCache};
pub use store::{Association, CalibrationStore, Match, StoreIssue};
