//! Group label derivation.
//!
//! A calibration group is named after the first of its (sorted) constituent
//! files, with the calibration type appended before the extension, so that
//! the label doubles as the name of the processed calibration file:
//!
//! ```text
//! S20120827S0066.fits + bias  ->  S20120827S0066_bias.fits
//! S20120827S0066.fits + bias  ->  S20120827S0066_bias_1.fits   (second, different group)
//! ```

/// Split a file identifier into its stem and extension (including the dot).
///
/// Only the final path component is split, and a leading dot does not start
/// an extension.
///
/// ```
/// use calassoc::label::split_ext;
///
/// assert_eq!(split_ext("raw/S001.fits"), ("raw/S001", ".fits"));
/// assert_eq!(split_ext("bias1"), ("bias1", ""));
/// assert_eq!(split_ext("dir.d/.hidden"), ("dir.d/.hidden", ""));
/// ```
pub fn split_ext(name: &str) -> (&str, &str) {
    let file_start = name.rfind('/').map(|i| i + 1).unwrap_or(0);
    match name[file_start..].rfind('.') {
        Some(dot) if dot > 0 => name.split_at(file_start + dot),
        _ => (name, ""),
    }
}

/// Append an extension produced by [`split_ext`] back onto a stem.
pub fn add_ext(stem: &str, ext: &str) -> String {
    format!("{}{}", stem, ext)
}

/// Derives candidate labels for one sorted group of files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelDeriver {
    base: String,
    ext: String,
}

impl LabelDeriver {
    /// Start from the first (lowest-sorted) constituent file.
    pub fn new(first_file: &str, cal_type: &str) -> Self {
        let (stem, ext) = split_ext(first_file);
        Self {
            base: format!("{}_{}", stem, cal_type),
            ext: ext.to_string(),
        }
    }

    /// The label with disambiguation counter `n`; `0` means no suffix.
    pub fn candidate(&self, n: usize) -> String {
        if n == 0 {
            add_ext(&self.base, &self.ext)
        } else {
            add_ext(&format!("{}_{}", self.base, n), &self.ext)
        }
    }
}
