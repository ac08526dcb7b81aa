//! Recursive resolution of a file's calibration dependencies.

use indexmap::IndexSet;
use tracing::{debug, warn};

use crate::error::{CalError, ResolveError};
use crate::graph::DependencyGraph;
use crate::lookup::CalibrationLookup;
use crate::store::{Association, CalibrationStore};

/// Configuration for a resolution pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Also resolve the calibrations of each calibration file found.
    pub follow_dependencies: bool,
    /// Look up again pairs previously recorded as having no match.
    pub refresh_missing: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            follow_dependencies: true,
            refresh_missing: false,
        }
    }
}

/// What a resolver did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Number of calls made to the lookup.
    pub lookups: usize,
    /// Pairs skipped because the store already had an association.
    pub already_associated: usize,
    /// (file, calibration type) pairs whose lookup found nothing, in visit order.
    pub not_found: Vec<(String, String)>,
}

/// Walks the dependency graph for files, filling a [`CalibrationStore`].
///
/// Each (file, calibration type) pair is visited at most once per resolver,
/// which bounds the walk even when the graph has cycles. Pairs whose walk
/// failed are forgotten, so a later call retries them. The lookup is only
/// called for pairs without an existing association, so a cache loaded from
/// a previous run (including hand edits) is extended rather than redone.
///
/// # Example
///
/// ```
/// use calassoc::{CalibrationStore, DependencyGraph, Match, Resolver};
///
/// let graph = DependencyGraph::new()
///     .with("target", ["flat", "bias"])
///     .with("flat", ["bias"]);
///
/// let lookup = |_file: &str, cal_type: &str| -> Result<Vec<Match>, String> {
///     Ok(vec![Match::new(format!("{}1", cal_type), None)])
/// };
///
/// let mut store = CalibrationStore::new();
/// let mut resolver = Resolver::new(&graph, lookup);
/// resolver.resolve(&mut store, "sci1", "target").unwrap();
///
/// assert_eq!(resolver.report().lookups, 3);
/// assert_eq!(store.calibrations["bias1_bias"], ["bias1"]);
/// ```
pub struct Resolver<'g, L> {
    graph: &'g DependencyGraph,
    lookup: L,
    config: ResolverConfig,
    visited: IndexSet<(String, String)>,
    report: ResolveReport,
}

impl<'g, L: CalibrationLookup> Resolver<'g, L> {
    /// Create a resolver with default configuration.
    pub fn new(graph: &'g DependencyGraph, lookup: L) -> Self {
        Self {
            graph,
            lookup,
            config: ResolverConfig::default(),
            visited: IndexSet::new(),
            report: ResolveReport::default(),
        }
    }

    /// Use a custom configuration.
    pub fn with_config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Resolve the calibrations `file` needs as an `obs_type` observation,
    /// recursively.
    ///
    /// Lookup errors abort the walk and are returned unchanged as
    /// [`ResolveError::Lookup`]; whatever was recorded before the failure
    /// stays in the store.
    pub fn resolve(
        &mut self,
        store: &mut CalibrationStore,
        file: &str,
        obs_type: &str,
    ) -> Result<(), ResolveError<L::Error>> {
        debug!(file, obs_type, "resolving calibrations");
        self.walk(store, file, obs_type)
    }

    /// Resolve several files of the same observation type.
    pub fn resolve_all<I, S>(
        &mut self,
        store: &mut CalibrationStore,
        files: I,
        obs_type: &str,
    ) -> Result<(), ResolveError<L::Error>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for file in files {
            self.resolve(store, file.as_ref(), obs_type)?;
        }
        Ok(())
    }

    /// Progress so far.
    pub fn report(&self) -> &ResolveReport {
        &self.report
    }

    /// Pairs visited so far, in visit order.
    pub fn visited(&self) -> impl Iterator<Item = (&str, &str)> {
        self.visited.iter().map(|(f, c)| (f.as_str(), c.as_str()))
    }

    /// Finish, returning the report.
    pub fn into_report(self) -> ResolveReport {
        self.report
    }

    /// Finish, returning the lookup.
    pub fn into_lookup(self) -> L {
        self.lookup
    }

    fn walk(
        &mut self,
        store: &mut CalibrationStore,
        file: &str,
        obs_type: &str,
    ) -> Result<(), ResolveError<L::Error>> {
        let graph = self.graph;

        for cal_type in graph.requirements(obs_type) {
            let key = (file.to_string(), cal_type.clone());
            if !self.visited.insert(key.clone()) {
                continue;
            }

            // A pair whose closure failed must be walked again on the next call
            if let Err(err) = self.visit(store, file, cal_type) {
                self.visited.shift_remove(&key);
                return Err(err);
            }
        }

        Ok(())
    }

    fn visit(
        &mut self,
        store: &mut CalibrationStore,
        file: &str,
        cal_type: &str,
    ) -> Result<(), ResolveError<L::Error>> {
        let needs_lookup = match store.association(file, cal_type) {
            None => true,
            Some(Association::Missing) => self.config.refresh_missing,
            Some(Association::Group(_)) => false,
        };

        if needs_lookup {
            debug!(file, cal_type, "looking up calibration");
            let matches = self
                .lookup
                .look_up(file, cal_type)
                .map_err(ResolveError::Lookup)?;
            self.report.lookups += 1;

            if store.record(file, cal_type, &matches).is_missing() {
                warn!(
                    file,
                    cal_type, "no calibration found; fill in the association manually"
                );
                self.report
                    .not_found
                    .push((file.to_string(), cal_type.to_string()));
            }
        } else {
            self.report.already_associated += 1;
        }

        if !self.config.follow_dependencies {
            return Ok(());
        }

        let Some(Association::Group(label)) = store.association(file, cal_type).cloned() else {
            return Ok(());
        };

        let members = store
            .group(&label)
            .ok_or_else(|| CalError::DanglingLabel {
                file: file.to_string(),
                cal_type: cal_type.to_string(),
                label: label.clone(),
            })?
            .to_vec();

        for member in &members {
            self.walk(store, member, cal_type)?;
        }

        Ok(())
    }
}

/// Resolve one file with a fresh [`Resolver`], returning its report.
pub fn resolve<L: CalibrationLookup>(
    file: &str,
    obs_type: &str,
    graph: &DependencyGraph,
    lookup: L,
    store: &mut CalibrationStore,
) -> Result<ResolveReport, ResolveError<L::Error>> {
    let mut resolver = Resolver::new(graph, lookup);
    resolver.resolve(store, file, obs_type)?;
    Ok(resolver.into_report())
}
