//! General linear model regression and motion censoring for fMRI data.
//!
//! This crate backs two command line tools:
//!
//! - `glm` regresses a design against NIfTI-1/NIfTI-2 volumes or CIFTI-2
//!   matrices. A text table design gives a temporal regression (one map
//!   per design column), an image design gives a spatial regression (one
//!   time course per design map).
//! - `motion-fd` turns six-column motion traces into framewise
//!   displacement values and censor vectors or matrices.
//!
//! The library includes the small amount of NIfTI and CIFTI support they
//! need: single-file images of either header version, loaded fully into
//! memory as `f64` arrays, and float32 output.
//!
//! # Example
//!
//! ```no_run
//! use fmri_glm::{Design, GlmJob, ImageFormat, DesignScaling};
//! use std::path::PathBuf;
//!
//! # fn run() -> fmri_glm::Result<()> {
//! let job = GlmJob {
//!     input: PathBuf::from("sub-01_bold.nii.gz"),
//!     design: Design::from_path("timecourses.txt"),
//!     mask: Some(PathBuf::from("brain_mask.nii.gz")),
//!     out: PathBuf::from("maps"),
//!     design_scaling: DesignScaling::Center,
//!     format: ImageFormat::Nifti,
//! };
//! let written = job.run()?;
//! println!("{}", written.display());
//! # Ok(())
//! # }
//! ```
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

#[macro_use]
extern crate quick_error;
#[macro_use]
extern crate num_derive;

pub mod affine;
pub mod cifti;
pub mod error;
pub mod extension;
pub mod format;
pub mod glm;
pub mod header;
pub mod motion;
pub mod object;
pub mod regression;
pub mod space;
pub mod table;
pub mod typedef;
mod util;
pub mod writer;

pub use error::{GlmError, Result};
pub use extension::{Extender, Extension, ExtensionSequence};
pub use format::ImageFormat;
pub use glm::{fit, DesignScaling, FitOptions};
pub use header::{NiftiHeader, NiftiVersion};
pub use motion::{CensorFormat, MotionJob, MotionSource};
pub use object::NiftiImage;
pub use regression::{Design, GlmJob, GridMask, RegressionMode};
pub use typedef::{Intent, NiftiType, Unit, XForm};
pub use writer::WriterOptions;
