//! A calibration store bound to its cache file.

use std::path::{Path, PathBuf};

use crate::error::{ResolveError, Result};
use crate::graph::DependencyGraph;
use crate::lookup::CalibrationLookup;
use crate::resolver::{ResolveReport, Resolver, ResolverConfig};
use crate::store::CalibrationStore;

/// Configuration for a [`CalibrationCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// JSON cache to load from and save to (None = in memory only).
    pub path: Option<PathBuf>,
    /// Keep timestamped copies of previous versions when saving.
    pub keep_history: bool,
    /// Resolution settings.
    pub resolver: ResolverConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            path: None,
            keep_history: true,
            resolver: ResolverConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Configuration for a cache file at `path`.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn with_history(mut self, keep_history: bool) -> Self {
        self.keep_history = keep_history;
        self
    }

    pub fn with_resolver(mut self, resolver: ResolverConfig) -> Self {
        self.resolver = resolver;
        self
    }
}

/// The main entry point: look up calibrations for files, persisting the
/// associations between runs.
///
/// # Example
///
/// ```no_run
/// use calassoc::{CacheConfig, CalibrationCache, DependencyGraph, Match};
///
/// let mut cache = CalibrationCache::open(CacheConfig::at("calibrations.json")).unwrap();
/// let graph = DependencyGraph::gmos_spectroscopy();
///
/// let lookup = |file: &str, cal_type: &str| -> Result<Vec<Match>, std::io::Error> {
///     // Query an archive or scan headers here
///     Ok(Vec::new())
/// };
///
/// let report = cache
///     .look_up_cals(["S20120827S0066.fits"], "target", &graph, lookup)
///     .unwrap();
/// println!("Lookups: {}", report.lookups);
/// ```
#[derive(Debug, Clone)]
pub struct CalibrationCache {
    config: CacheConfig,
    store: CalibrationStore,
}

impl CalibrationCache {
    /// Open the configured cache, starting empty if it does not exist yet.
    pub fn open(config: CacheConfig) -> Result<Self> {
        let store = CalibrationStore::init(config.path.as_deref())?;
        Ok(Self { config, store })
    }

    /// Wrap an existing store.
    pub fn with_store(config: CacheConfig, store: CalibrationStore) -> Self {
        Self { config, store }
    }

    pub fn store(&self) -> &CalibrationStore {
        &self.store
    }

    /// Mutable access, e.g. to fill in placeholders by hand.
    pub fn store_mut(&mut self) -> &mut CalibrationStore {
        &mut self.store
    }

    pub fn path(&self) -> Option<&Path> {
        self.config.path.as_deref()
    }

    pub fn into_store(self) -> CalibrationStore {
        self.store
    }

    /// Resolve calibrations for every file in `files`, then save.
    ///
    /// The store is saved only when resolution succeeds; after a lookup
    /// failure the cache file keeps its previous contents while the
    /// in-memory store keeps what was recorded before the failure.
    pub fn look_up_cals<I, S, L>(
        &mut self,
        files: I,
        obs_type: &str,
        graph: &DependencyGraph,
        lookup: L,
    ) -> std::result::Result<ResolveReport, ResolveError<L::Error>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        L: CalibrationLookup,
    {
        let mut resolver = Resolver::new(graph, lookup).with_config(self.config.resolver.clone());
        resolver.resolve_all(&mut self.store, files, obs_type)?;
        let report = resolver.into_report();

        tracing::info!(
            lookups = report.lookups,
            cached = report.already_associated,
            not_found = report.not_found.len(),
            "calibration lookup complete"
        );

        self.save()?;
        Ok(report)
    }

    /// Write the store to the configured path, if any.
    pub fn save(&self) -> Result<()> {
        match &self.config.path {
            Some(path) if self.config.keep_history => self.store.save_with_history(path),
            Some(path) => self.store.save(path),
            None => Ok(()),
        }
    }
}
