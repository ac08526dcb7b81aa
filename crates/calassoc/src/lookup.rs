//! Calibration lookups - the caller-supplied side of resolution.
//!
//! Deciding which calibration files suit a given file depends on the
//! instrument and observatory (headers, archive queries, local rules), so the
//! resolver delegates it entirely to a [`CalibrationLookup`].

use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::error::{CalError, Result};
use crate::recorder::parse_matches;
use crate::store::Match;

/// Finds candidate calibration files of one type for one file.
///
/// Returning an empty list means "nothing suitable"; returning an error means
/// the lookup itself failed. The two are recorded differently.
pub trait CalibrationLookup {
    /// Error raised when the lookup cannot be performed.
    type Error;

    /// Candidate files of type `cal_type` for `file`, with optional checksums.
    fn look_up(&mut self, file: &str, cal_type: &str) -> std::result::Result<Vec<Match>, Self::Error>;
}

impl<F, E> CalibrationLookup for F
where
    F: FnMut(&str, &str) -> std::result::Result<Vec<Match>, E>,
{
    type Error = E;

    fn look_up(&mut self, file: &str, cal_type: &str) -> std::result::Result<Vec<Match>, E> {
        self(file, cal_type)
    }
}

/// A fixed table of lookup answers.
///
/// Loaded from JSON of the form:
///
/// ```json
/// {
///     "sci1.fits": {
///         "flat": [["flat1.fits", "b3c1..."]],
///         "bias": [["bias1.fits", null], ["bias2.fits", null]]
///     }
/// }
/// ```
///
/// Pairs absent from the table have no matches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LookupTable {
    entries: BTreeMap<String, BTreeMap<String, Vec<Match>>>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) the answer for one (file, calibration type) pair.
    pub fn insert(&mut self, file: impl Into<String>, cal_type: impl Into<String>, matches: Vec<Match>) {
        self.entries
            .entry(file.into())
            .or_default()
            .insert(cal_type.into(), matches);
    }

    /// Builder form of [`insert`](LookupTable::insert).
    pub fn with(mut self, file: impl Into<String>, cal_type: impl Into<String>, matches: Vec<Match>) -> Self {
        self.insert(file, cal_type, matches);
        self
    }

    /// The stored answer, or an empty slice.
    pub fn get(&self, file: &str, cal_type: &str) -> &[Match] {
        self.entries
            .get(file)
            .and_then(|cals| cals.get(cal_type))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Build a table from parsed JSON.
    pub fn from_json_value(value: &Value) -> Result<Self> {
        let files = value.as_object().ok_or_else(|| {
            CalError::InvalidMatchShape("lookup table must map files to calibration types".to_string())
        })?;

        let mut table = Self::new();
        for (file, cals) in files {
            let cals = cals.as_object().ok_or_else(|| {
                CalError::InvalidMatchShape(format!("entry for '{}' must map calibration types to matches", file))
            })?;
            for (cal_type, matches) in cals {
                table.insert(file.as_str(), cal_type.as_str(), parse_matches(matches)?);
            }
        }
        Ok(table)
    }

    /// Load a table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| CalError::io(path, e))?;
        let value: Value = serde_json::from_str(&text)?;
        Self::from_json_value(&value)
    }
}

impl CalibrationLookup for LookupTable {
    type Error = Infallible;

    fn look_up(&mut self, file: &str, cal_type: &str) -> std::result::Result<Vec<Match>, Infallible> {
        Ok(self.get(file, cal_type).to_vec())
    }
}
