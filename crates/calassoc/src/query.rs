//! Read-only views over the calibration store.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::store::{Association, CalibrationStore};

/// Counts describing a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StoreSummary {
    /// Files with at least one association.
    pub files: usize,
    /// Associations pointing at a calibration group.
    pub associations: usize,
    /// Placeholders left by lookups that found nothing.
    pub missing: usize,
    /// Calibration groups.
    pub groups: usize,
    /// Recorded checksums (including cleared ones).
    pub checksums: usize,
    /// Associations per calibration type.
    pub by_type: BTreeMap<String, usize>,
}

impl CalibrationStore {
    /// The association for one (file, calibration type) pair, if looked up.
    pub fn association(&self, file: &str, cal_type: &str) -> Option<&Association> {
        self.associations.get(file)?.get(cal_type)
    }

    /// Constituent files of a calibration group.
    pub fn group(&self, label: &str) -> Option<&[String]> {
        self.calibrations.get(label).map(Vec::as_slice)
    }

    /// The recorded checksum for a file, if any.
    pub fn checksum(&self, file: &str) -> Option<&str> {
        self.checksums.get(file)?.as_deref()
    }

    /// (file, calibration type) pairs awaiting a manual entry.
    pub fn missing(&self) -> Vec<(&str, &str)> {
        self.associations
            .iter()
            .flat_map(|(file, cals)| {
                cals.iter()
                    .filter(|(_, assoc)| assoc.is_missing())
                    .map(move |(cal_type, _)| (file.as_str(), cal_type.as_str()))
            })
            .collect()
    }

    /// All calibration groups of type `cal_type` used by any file.
    pub fn extract_all(&self, cal_type: &str) -> BTreeMap<String, Vec<String>> {
        self.collect_groups(cal_type, |_| true)
    }

    /// Calibration groups of type `cal_type` used by the `references` files.
    ///
    /// Each group appears once, however many of the files share it.
    ///
    /// ```
    /// use calassoc::{CalibrationStore, Match};
    ///
    /// let mut store = CalibrationStore::new();
    /// store.record("sci1", "bias", &[Match::new("bias1", None)]);
    /// store.record("sci2", "bias", &[Match::new("bias1", None)]);
    /// store.record("sci3", "bias", &[Match::new("bias2", None)]);
    ///
    /// let biases = store.extract("bias", ["sci1", "sci2"]);
    /// assert_eq!(biases.keys().collect::<Vec<_>>(), ["bias1_bias"]);
    /// ```
    pub fn extract<I, S>(&self, cal_type: &str, references: I) -> BTreeMap<String, Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let references: BTreeSet<String> = references
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        self.collect_groups(cal_type, |file| references.contains(file))
    }

    /// Summary counts.
    pub fn summary(&self) -> StoreSummary {
        let mut summary = StoreSummary {
            files: self.associations.len(),
            groups: self.calibrations.len(),
            checksums: self.checksums.len(),
            ..StoreSummary::default()
        };

        for (cal_type, assoc) in self.associations.values().flatten() {
            match assoc {
                Association::Missing => summary.missing += 1,
                Association::Group(_) => {
                    summary.associations += 1;
                    *summary.by_type.entry(cal_type.clone()).or_default() += 1;
                }
            }
        }

        summary
    }

    fn collect_groups(
        &self,
        cal_type: &str,
        include: impl Fn(&str) -> bool,
    ) -> BTreeMap<String, Vec<String>> {
        self.associations
            .iter()
            .filter(|(file, _)| include(file))
            .filter_map(|(_, cals)| cals.get(cal_type)?.label())
            .filter_map(|label| {
                let files = self.calibrations.get(label)?;
                Some((label.to_string(), files.clone()))
            })
            .collect()
    }
}
