//! The calibration store - associations, calibration groups and checksums.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::error::{CalError, Result};

/// Top-level key for file -> (calibration type -> group label).
pub const K_ASSOCIATIONS: &str = "associations";
/// Top-level key for group label -> constituent files.
pub const K_CALIBRATIONS: &str = "calibrations";
/// Top-level key for file -> checksum.
pub const K_CHECKSUMS: &str = "checksums";

/// The recorded outcome of looking up one calibration type for one file.
///
/// A calibration type with no entry at all has never been looked up.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Association {
    /// The lookup ran and found nothing; a human should fill this in.
    /// Persisted as `null`.
    Missing,
    /// The file uses the calibration group with this label.
    Group(String),
}

impl Association {
    /// The group label, unless this is a placeholder.
    pub fn label(&self) -> Option<&str> {
        match self {
            Association::Missing => None,
            Association::Group(label) => Some(label),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Association::Missing)
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Association::Missing => write!(f, "(none found)"),
            Association::Group(label) => write!(f, "{}", label),
        }
    }
}

impl Serialize for Association {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.label().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Association {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(label) => Association::Group(label),
            None => Association::Missing,
        })
    }
}

/// One candidate calibration file returned by a lookup.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Match {
    /// File identifier of the calibration file.
    pub name: String,
    /// Checksum reported by the lookup, if any.
    pub checksum: Option<String>,
}

impl Match {
    pub fn new(name: impl Into<String>, checksum: Option<&str>) -> Self {
        Self {
            name: name.into(),
            checksum: checksum.map(str::to_string),
        }
    }
}

impl<N: Into<String>> From<(N, Option<&str>)> for Match {
    fn from((name, checksum): (N, Option<&str>)) -> Self {
        Match::new(name, checksum)
    }
}

/// Persistent record of which calibration files each file depends on.
///
/// The store is meant to be saved as a hand-editable JSON cache and reloaded
/// on the next run, so all three maps are sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationStore {
    /// File -> (calibration type -> association).
    pub associations: BTreeMap<String, BTreeMap<String, Association>>,

    /// Group label -> constituent files, in sorted order.
    pub calibrations: BTreeMap<String, Vec<String>>,

    /// Calibration file -> checksum reported when it was first recorded.
    pub checksums: BTreeMap<String, Option<String>>,
}

/// A consistency problem found by [`CalibrationStore::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreIssue {
    /// An association names a label with no `calibrations` entry.
    DanglingLabel {
        file: String,
        cal_type: String,
        label: String,
    },
    /// A calibration group lists no files.
    EmptyGroup { label: String },
    /// A lookup found nothing and the placeholder has not been filled in.
    AwaitingEntry { file: String, cal_type: String },
    /// A calibration group that no association refers to.
    UnreferencedGroup { label: String },
}

impl StoreIssue {
    /// Whether the issue would break resolution or extraction.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            StoreIssue::DanglingLabel { .. } | StoreIssue::EmptyGroup { .. }
        )
    }
}

impl fmt::Display for StoreIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreIssue::DanglingLabel {
                file,
                cal_type,
                label,
            } => write!(
                f,
                "{}: {} group '{}' is not listed under {}",
                file, cal_type, label, K_CALIBRATIONS
            ),
            StoreIssue::EmptyGroup { label } => write!(f, "group '{}' has no files", label),
            StoreIssue::AwaitingEntry { file, cal_type } => {
                write!(f, "{}: no {} found, fill in manually", file, cal_type)
            }
            StoreIssue::UnreferencedGroup { label } => {
                write!(f, "group '{}' is not used by any file", label)
            }
        }
    }
}

impl CalibrationStore {
    /// Create the canonical empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether nothing has been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.associations.is_empty() && self.calibrations.is_empty() && self.checksums.is_empty()
    }

    /// Parse and shape-check a serialized snapshot.
    ///
    /// `snapshot` names where the text came from and is reported in
    /// [`CalError::MalformedStore`].
    pub fn from_json_str(text: &str, snapshot: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| CalError::malformed(snapshot, format!("invalid JSON: {}", e)))?;
        Self::from_json_value(value, snapshot)
    }

    /// Shape-check an already parsed snapshot and convert it.
    pub fn from_json_value(value: Value, snapshot: &str) -> Result<Self> {
        check_shape(&value).map_err(|reason| CalError::malformed(snapshot, reason))?;
        serde_json::from_value(value).map_err(|e| CalError::malformed(snapshot, e.to_string()))
    }

    /// The canonical serialized form: sorted keys, 4-space indentation.
    pub fn to_json_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Content digest of the canonical form, as `sha256:<hex>`.
    pub fn digest(&self) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(self.to_json_string()?.as_bytes());
        Ok(format!("sha256:{:x}", hasher.finalize()))
    }

    /// Check the cross-references between the three maps.
    pub fn validate(&self) -> Vec<StoreIssue> {
        let mut issues = Vec::new();

        for (file, cals) in &self.associations {
            for (cal_type, assoc) in cals {
                match assoc {
                    Association::Missing => issues.push(StoreIssue::AwaitingEntry {
                        file: file.clone(),
                        cal_type: cal_type.clone(),
                    }),
                    Association::Group(label) if !self.calibrations.contains_key(label) => {
                        issues.push(StoreIssue::DanglingLabel {
                            file: file.clone(),
                            cal_type: cal_type.clone(),
                            label: label.clone(),
                        })
                    }
                    Association::Group(_) => {}
                }
            }
        }

        for (label, files) in &self.calibrations {
            if files.is_empty() {
                issues.push(StoreIssue::EmptyGroup {
                    label: label.clone(),
                });
            }
            let referenced = self
                .associations
                .values()
                .flat_map(|cals| cals.values())
                .any(|assoc| assoc.label() == Some(label.as_str()));
            if !referenced {
                issues.push(StoreIssue::UnreferencedGroup {
                    label: label.clone(),
                });
            }
        }

        issues
    }
}

/// Verify that a snapshot nests the way lookups expect.
fn check_shape(value: &Value) -> std::result::Result<(), String> {
    let top = value
        .as_object()
        .ok_or_else(|| "top level is not a mapping".to_string())?;

    let mut keys: Vec<&str> = top.keys().map(String::as_str).collect();
    keys.sort_unstable();
    if keys != [K_ASSOCIATIONS, K_CALIBRATIONS, K_CHECKSUMS] {
        return Err(format!(
            "expected exactly the keys {}, {}, {}; found {:?}",
            K_ASSOCIATIONS, K_CALIBRATIONS, K_CHECKSUMS, keys
        ));
    }

    let section = |key: &str| {
        top[key]
            .as_object()
            .ok_or_else(|| format!("'{}' is not a mapping", key))
    };

    for (file, cals) in section(K_ASSOCIATIONS)? {
        let cals = cals
            .as_object()
            .ok_or_else(|| format!("{}['{}'] is not a mapping", K_ASSOCIATIONS, file))?;
        for (cal_type, label) in cals {
            if !(label.is_string() || label.is_null()) {
                return Err(format!(
                    "{}['{}']['{}'] is neither a label nor null",
                    K_ASSOCIATIONS, file, cal_type
                ));
            }
        }
    }

    for (label, files) in section(K_CALIBRATIONS)? {
        let files = files
            .as_array()
            .ok_or_else(|| format!("{}['{}'] is not a list", K_CALIBRATIONS, label))?;
        if !files.iter().all(Value::is_string) {
            return Err(format!(
                "{}['{}'] contains a non-string entry",
                K_CALIBRATIONS, label
            ));
        }
    }

    for (file, checksum) in section(K_CHECKSUMS)? {
        if !(checksum.is_string() || checksum.is_null()) {
            return Err(format!(
                "{}['{}'] is neither a string nor null",
                K_CHECKSUMS, file
            ));
        }
    }

    Ok(())
}
