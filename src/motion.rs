//! Framewise displacement and censoring of head motion traces.
//!
//! Motion correction tools report six rigid-body parameters per frame:
//! three translations in millimeters and three rotations in radians. The
//! framewise displacement of a frame is the sum of the absolute changes
//! of all six parameters since the previous frame, after converting the
//! rotations to millimeters of arc on a sphere of the given radius.

use crate::error::{GlmError, Result};
use crate::table::{read_table, write_column, write_table, NumberFormat};
use log::info;
use ndarray::{s, Array1, Array2, ArrayBase, Axis, Data, Ix2};
use std::path::PathBuf;

/// Default head radius, in millimeters.
pub const DEFAULT_RADIUS: f64 = 50.;
/// Default displacement above which a frame is censored, in millimeters.
pub const DEFAULT_THRESHOLD: f64 = 0.9;

/// Column order turning rotations-first rows into translations-first rows.
const ROTATIONS_FIRST: [usize; 6] = [3, 4, 5, 0, 1, 2];

/// The software that produced a motion trace, which decides its column order.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum MotionSource {
    /// Translations first: `x y z pitch roll yaw`.
    Spm,
    /// Rotations first.
    Fsl,
    /// Rotations first, like FSL.
    Afni,
}

impl MotionSource {
    /// Whether rows of this source list the rotations before the translations.
    pub fn rotations_first(self) -> bool {
        match self {
            MotionSource::Spm => false,
            MotionSource::Fsl | MotionSource::Afni => true,
        }
    }
}

/// Layout of the censor output.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum CensorFormat {
    /// One value per frame: 1 to keep the frame, 0 to censor it.
    Vector,
    /// One indicator column per censored frame, ready to append to a design.
    Matrix,
}

/// Bring a motion table to translations-first order with rotations in
/// millimeters.
pub fn normalize_parameters<S>(
    params: &ArrayBase<S, Ix2>,
    source: MotionSource,
    radius: f64,
) -> Array2<f64>
where
    S: Data<Elem = f64>,
{
    let mut p = if source.rotations_first() {
        params.select(Axis(1), &ROTATIONS_FIRST)
    } else {
        params.to_owned()
    };
    p.slice_mut(s![.., 3..6]).mapv_inplace(|r| r * radius);
    p
}

/// Framewise displacement of every frame; the first frame has none.
pub fn framewise_displacement<S>(params: &ArrayBase<S, Ix2>) -> Array1<f64>
where
    S: Data<Elem = f64>,
{
    let mut fd = Array1::zeros(params.nrows());
    for i in 1..params.nrows() {
        let delta = &params.row(i) - &params.row(i - 1);
        fd[i] = delta.mapv(f64::abs).sum();
    }
    fd
}

/// Frames whose displacement reaches the threshold.
pub fn outliers(fd: &Array1<f64>, threshold: f64) -> Vec<usize> {
    fd.iter()
        .enumerate()
        .filter(|(_, v)| **v >= threshold)
        .map(|(i, _)| i)
        .collect()
}

/// Censor vector: 1 for frames below the threshold, 0 for the others.
pub fn censor_vector(fd: &Array1<f64>, threshold: f64) -> Array1<f64> {
    fd.mapv(|v| if v < threshold { 1. } else { 0. })
}

/// Censor matrix: frames × outliers, with a single 1 per column marking
/// the censored frame.
pub fn censor_matrix(fd: &Array1<f64>, threshold: f64) -> Array2<f64> {
    let frames = outliers(fd, threshold);
    let mut m = Array2::zeros((fd.len(), frames.len()));
    for (column, frame) in frames.into_iter().enumerate() {
        m[[frame, column]] = 1.;
    }
    m
}

/// A complete motion post-processing run, as configured on the command line.
#[derive(Debug, PartialEq, Clone)]
pub struct MotionJob {
    /// Origin of the motion table.
    pub source: MotionSource,
    /// Six-column motion table.
    pub input: PathBuf,
    /// Layout of the censor output.
    pub censor_format: CensorFormat,
    /// Where the censor vector or matrix is written.
    pub censor_output: PathBuf,
    /// Where the displacement values are written.
    pub fd_output: PathBuf,
    /// Displacement at or above which a frame is censored.
    pub threshold: f64,
    /// Head radius used to convert rotations.
    pub radius: f64,
}

impl MotionJob {
    /// Read the motion table, then write displacements and censor values.
    /// Returns the number of censored frames.
    pub fn run(&self) -> Result<usize> {
        let params = read_table(&self.input)?;
        if params.ncols() != 6 || params.nrows() == 0 {
            return Err(GlmError::MotionColumns(self.input.clone(), params.ncols()));
        }
        info!(
            "loaded {} motion frames from {}",
            params.nrows(),
            self.input.display()
        );

        let params = normalize_parameters(&params, self.source, self.radius);
        let fd = framewise_displacement(&params);
        let censored = outliers(&fd, self.threshold).len();

        match self.censor_format {
            CensorFormat::Vector => write_column(
                &self.censor_output,
                &censor_vector(&fd, self.threshold).to_vec(),
                NumberFormat::Integer,
            )?,
            CensorFormat::Matrix => write_table(
                &self.censor_output,
                &censor_matrix(&fd, self.threshold),
                NumberFormat::Integer,
            )?,
        }
        write_column(&self.fd_output, &fd.to_vec(), NumberFormat::Fixed(6))?;
        info!(
            "{} of {} frames censored at threshold {}",
            censored,
            fd.len(),
            self.threshold
        );
        Ok(censored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{arr1, arr2};

    #[test]
    fn rotations_first_sources_are_reordered() {
        let fsl = arr2(&[[0.01, 0.02, 0.03, 1., 2., 3.]]);
        let p = normalize_parameters(&fsl, MotionSource::Fsl, 50.);
        assert_abs_diff_eq!(p, arr2(&[[1., 2., 3., 0.5, 1., 1.5]]), epsilon = 1e-12);
        let p = normalize_parameters(&fsl, MotionSource::Afni, 50.);
        assert_abs_diff_eq!(p, arr2(&[[1., 2., 3., 0.5, 1., 1.5]]), epsilon = 1e-12);

        let spm = arr2(&[[1., 2., 3., 0.01, 0.02, 0.03]]);
        let p = normalize_parameters(&spm, MotionSource::Spm, 10.);
        assert_abs_diff_eq!(p, arr2(&[[1., 2., 3., 0.1, 0.2, 0.3]]), epsilon = 1e-12);
    }

    #[test]
    fn displacement_sums_absolute_differences() {
        let p = arr2(&[
            [0., 0., 0., 0., 0., 0.],
            [0.1, -0.2, 0., 0., 0., 0.3],
            [0.1, -0.2, 0., 0., 0., 0.3],
            [0., 0., 0., 0., 0., 0.],
        ]);
        let fd = framewise_displacement(&p);
        assert_abs_diff_eq!(fd, arr1(&[0., 0.6, 0., 0.6]), epsilon = 1e-12);
        assert_eq!(framewise_displacement(&arr2(&[[1., 2., 3., 4., 5., 6.]])), arr1(&[0.]));
    }

    #[test]
    fn threshold_is_exclusive() {
        let fd = arr1(&[0., 0.5, 0.9, 1.2, 0.1]);
        assert_eq!(censor_vector(&fd, 0.9), arr1(&[1., 1., 0., 0., 1.]));
        assert_eq!(outliers(&fd, 0.9), vec![2, 3]);
    }

    #[test]
    fn matrix_has_one_column_per_outlier() {
        let fd = arr1(&[0., 2., 0.1, 3.]);
        let m = censor_matrix(&fd, 0.9);
        assert_eq!(
            m,
            arr2(&[[0., 0.], [1., 0.], [0., 0.], [0., 1.]])
        );
        assert_eq!(censor_matrix(&arr1(&[0., 0.1]), 0.9).dim(), (2, 0));
    }
}
