//! Private utility module
use std::path::Path;

/// Convert a raw volume value to the scale defined
/// by the given scale slope and intercept parameters.
/// A slope of zero, or a non-finite one, means no scaling.
pub fn raw_to_value(value: f64, slope: f64, intercept: f64) -> f64 {
    if slope != 0. && slope.is_finite() {
        value * slope + intercept
    } else {
        value
    }
}

/// Check if a file path has the extension ".gz".
pub fn is_gz_file<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .file_name()
        .map(|a| a.to_string_lossy().ends_with(".gz"))
        .unwrap_or(false)
}
