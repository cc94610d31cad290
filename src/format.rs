//! Classification of input files by name.
//!
//! The tools decide how to treat a file (NIfTI volume, CIFTI matrix or
//! plain text table) from its extension alone, before opening it.

use std::path::Path;

/// Intermediate extensions which mark a `.nii` file as a CIFTI-2 matrix.
pub const CIFTI_EXTENSIONS: &[&str] = &[
    "dconn",
    "dtseries",
    "pconn",
    "ptseries",
    "dscalar",
    "dlabel",
    "pdconn",
    "dpconn",
    "pconnseries",
    "pconnscalar",
    "dfan",
    "dfibersamp",
    "dfansamp",
];

/// The image families understood by the tools.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ImageFormat {
    /// Volumetric NIfTI-1/NIfTI-2 (`.nii`, `.nii.gz`)
    Nifti,
    /// CIFTI-2 matrix (`.<kind>.nii`)
    Cifti,
}

impl ImageFormat {
    /// Classify a file name, returning `None` for non-image files.
    pub fn detect<P: AsRef<Path>>(path: P) -> Option<ImageFormat> {
        let name = path.as_ref().file_name()?.to_string_lossy().into_owned();
        if cifti_suffix(&name).is_some() {
            Some(ImageFormat::Cifti)
        } else if nifti_suffix(&name).is_some() {
            Some(ImageFormat::Nifti)
        } else {
            None
        }
    }

    /// Human-readable name, as used in diagnostics.
    pub fn name(self) -> &'static str {
        match self {
            ImageFormat::Nifti => "nifti",
            ImageFormat::Cifti => "cifti",
        }
    }

    /// The format selected by the `--cifti` flag.
    pub fn from_cifti_flag(cifti: bool) -> ImageFormat {
        if cifti {
            ImageFormat::Cifti
        } else {
            ImageFormat::Nifti
        }
    }
}

/// The CIFTI suffix (e.g. `.dtseries.nii`) of a file name, if any.
pub fn cifti_suffix(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(".nii")?;
    let dot = stem.rfind('.')?;
    if CIFTI_EXTENSIONS.contains(&&stem[dot + 1..]) {
        Some(&name[dot..])
    } else {
        None
    }
}

/// The NIfTI suffix (`.nii` or `.nii.gz`) of a file name, if any.
pub fn nifti_suffix(name: &str) -> Option<&str> {
    [".nii.gz", ".nii"]
        .iter()
        .find(|ext| name.ends_with(*ext))
        .map(|ext| &name[name.len() - ext.len()..])
}

/// Remove a trailing suffix from a path-like string, if present.
pub fn strip_suffix<'a>(name: &'a str, suffix: Option<&str>) -> &'a str {
    match suffix {
        Some(s) => &name[..name.len() - s.len()],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_formats() {
        assert_eq!(ImageFormat::detect("sub-01.nii.gz"), Some(ImageFormat::Nifti));
        assert_eq!(ImageFormat::detect("/data/sub-01.nii"), Some(ImageFormat::Nifti));
        assert_eq!(
            ImageFormat::detect("sub-01.dtseries.nii"),
            Some(ImageFormat::Cifti)
        );
        assert_eq!(ImageFormat::detect("maps.dscalar.nii"), Some(ImageFormat::Cifti));
        assert_eq!(ImageFormat::detect("design.txt"), None);
        assert_eq!(ImageFormat::detect("design.mat"), None);
        // a compressed CIFTI name is not CIFTI
        assert_eq!(
            ImageFormat::detect("sub-01.dtseries.nii.gz"),
            Some(ImageFormat::Nifti)
        );
        // unknown intermediate extensions are plain NIfTI
        assert_eq!(ImageFormat::detect("sub-01.bold.nii"), Some(ImageFormat::Nifti));
    }

    #[test]
    fn suffixes() {
        assert_eq!(cifti_suffix("a.b.dtseries.nii"), Some(".dtseries.nii"));
        assert_eq!(cifti_suffix("dtseries.nii"), None);
        assert_eq!(nifti_suffix("a.nii.gz"), Some(".nii.gz"));
        assert_eq!(strip_suffix("out.nii.gz", nifti_suffix("out.nii.gz")), "out");
        assert_eq!(strip_suffix("out", nifti_suffix("out")), "out");
    }
}
