//! Recording lookup results in the calibration store.

use serde_json::Value;

use crate::error::{CalError, Result};
use crate::label::LabelDeriver;
use crate::store::{Association, CalibrationStore, Match};

impl CalibrationStore {
    /// Record the calibration files matching `file` for one calibration type.
    ///
    /// Matches are sorted by name before use, so the same set of files
    /// presented in any order ends up under one group label. A label already
    /// holding a different file list is never overwritten; a numeric suffix
    /// is appended instead. Non-empty checksums are only added for files that
    /// have no entry yet, which preserves values corrected by hand.
    ///
    /// Any existing association for (`file`, `cal_type`) is overwritten. The
    /// resolver only calls this for pairs with no association; direct
    /// callers wanting to keep manual edits must check
    /// [`association`](CalibrationStore::association) first.
    ///
    /// An empty `matches` records [`Association::Missing`] as a placeholder
    /// for the user to fill in.
    pub fn record(&mut self, file: &str, cal_type: &str, matches: &[Match]) -> Association {
        let cals = self.associations.entry(file.to_string()).or_default();

        if matches.is_empty() {
            cals.insert(cal_type.to_string(), Association::Missing);
            return Association::Missing;
        }

        let mut matches = matches.to_vec();
        matches.sort();

        let names: Vec<String> = matches.iter().map(|m| m.name.clone()).collect();

        let deriver = LabelDeriver::new(&names[0], cal_type);
        let mut n = 0;
        let mut label = deriver.candidate(n);
        while self
            .calibrations
            .get(&label)
            .is_some_and(|existing| *existing != names)
        {
            n += 1;
            label = deriver.candidate(n);
        }

        if !self.calibrations.contains_key(&label) {
            tracing::debug!(label = %label, files = names.len(), "new calibration group");
            self.calibrations.insert(label.clone(), names);
        }

        for m in &matches {
            if let Some(checksum) = m.checksum.as_ref().filter(|c| !c.is_empty()) {
                self.checksums
                    .entry(m.name.clone())
                    .or_insert_with(|| Some(checksum.clone()));
            }
        }

        let assoc = Association::Group(label);
        self.associations
            .entry(file.to_string())
            .or_default()
            .insert(cal_type.to_string(), assoc.clone());
        assoc
    }

    /// Like [`record`](CalibrationStore::record), for matches that arrive as
    /// untyped JSON (`[[name, checksum-or-null], ...]`).
    pub fn record_json(&mut self, file: &str, cal_type: &str, matches: &Value) -> Result<Association> {
        let matches = parse_matches(matches)?;
        Ok(self.record(file, cal_type, &matches))
    }
}

/// Convert a JSON list of `[name, checksum-or-null]` pairs into matches.
pub fn parse_matches(value: &Value) -> Result<Vec<Match>> {
    let items = value
        .as_array()
        .ok_or_else(|| CalError::InvalidMatchShape(format!("expected a list, got {}", value)))?;

    items
        .iter()
        .map(|item| match item.as_array().map(Vec::as_slice) {
            Some([Value::String(name), Value::String(checksum)]) => {
                Ok(Match::new(name.as_str(), Some(checksum.as_str())))
            }
            Some([Value::String(name), Value::Null]) => Ok(Match::new(name.as_str(), None)),
            _ => Err(CalError::InvalidMatchShape(format!(
                "expected a [filename, checksum] pair, got {}",
                item
            ))),
        })
        .collect()
}
