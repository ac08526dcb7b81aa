//! Dependency graphs between observation types and calibration types.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CalError, Result};

/// Which calibration types each observation type needs, in lookup order.
///
/// Calibration files are observations too, so a calibration type usually
/// appears both as a requirement and as a key with its own requirements
/// (a flat needs a bias). Types that are not keys need nothing.
///
/// # Example
///
/// ```
/// use calassoc::DependencyGraph;
///
/// let graph = DependencyGraph::new()
///     .with("target", ["flat", "bias"])
///     .with("flat", ["bias"]);
///
/// assert_eq!(graph.requirements("target"), ["flat", "bias"]);
/// assert!(graph.requirements("bias").is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    deps: BTreeMap<String, Vec<String>>,
}

/// Names accepted by [`DependencyGraph::preset`].
pub const PRESETS: &[&str] = &["gemini", "gmos-spec"];

impl DependencyGraph {
    /// Create a graph with no dependencies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the calibration types `obs_type` requires.
    pub fn with<I, S>(mut self, obs_type: impl Into<String>, cal_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(obs_type, cal_types);
        self
    }

    /// Declare (or replace) the calibration types `obs_type` requires.
    pub fn insert<I, S>(&mut self, obs_type: impl Into<String>, cal_types: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deps
            .insert(obs_type.into(), cal_types.into_iter().map(Into::into).collect());
    }

    /// Calibration types needed by `obs_type`; empty if it is not declared.
    pub fn requirements(&self, obs_type: &str) -> &[String] {
        self.deps.get(obs_type).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Observation types with declared requirements.
    pub fn observation_types(&self) -> impl Iterator<Item = &str> {
        self.deps.keys().map(String::as_str)
    }

    /// Default Gemini dependencies: a target with nothing declared yet.
    pub fn gemini() -> Self {
        Self::new().with("target", Vec::<String>::new())
    }

    /// Calibration dependencies for GMOS spectroscopy.
    pub fn gmos_spectroscopy() -> Self {
        Self::new()
            .with("target", ["specphot", "flat", "arc", "bias"])
            .with("specphot", ["flat", "arc", "bias"])
            .with("flat", ["arc", "bias"])
            .with("arc", ["bias"])
            .with("bias", Vec::<String>::new())
    }

    /// Look up a built-in graph by name (see [`PRESETS`]).
    pub fn preset(name: &str) -> Result<Self> {
        match name {
            "gemini" => Ok(Self::gemini()),
            "gmos-spec" | "gmos_spectroscopy" => Ok(Self::gmos_spectroscopy()),
            other => Err(CalError::UnknownPreset(other.to_string())),
        }
    }

    /// Load a graph from a JSON object of `obs_type: [cal_type, ...]`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CalError::io(path, e))?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl<K, V, S> FromIterator<(K, V)> for DependencyGraph
where
    K: Into<String>,
    V: IntoIterator<Item = S>,
    S: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut graph = Self::new();
        for (obs_type, cal_types) in iter {
            graph.insert(obs_type, cal_types);
        }
        graph
    }
}
