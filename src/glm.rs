//! Ordinary least squares through the Moore-Penrose pseudo-inverse.
//!
//! Matrices follow the regression convention: rows are regression samples,
//! columns are observations (for the response `Y`) or explanatory
//! variables (for the design `H`). The estimated coefficients
//! `B = pinv(H) · Y` have one row per explanatory variable and one column
//! per observation.

use crate::error::{GlmError, Result};
use log::warn;
use nalgebra::DMatrix;
use ndarray::{Array2, ArrayBase, Axis, Data, Ix2};

/// Relative cutoff below which singular values are treated as zero.
pub const PINV_RCOND: f64 = 1e-15;

/// How the design matrix columns are prepared before fitting.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum DesignScaling {
    /// Subtract the column means.
    Center,
    /// Subtract the column means and divide by the population standard deviation.
    ZScore,
}

impl Default for DesignScaling {
    fn default() -> Self {
        DesignScaling::Center
    }
}

/// Options of a regression fit.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct FitOptions {
    /// Subtract the column means of the response.
    pub center_response: bool,
    /// Preparation of the design columns.
    pub design_scaling: DesignScaling,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            center_response: true,
            design_scaling: DesignScaling::Center,
        }
    }
}

/// Subtract from each column its mean.
pub fn center_columns<S>(m: &ArrayBase<S, Ix2>) -> Array2<f64>
where
    S: Data<Elem = f64>,
{
    match m.mean_axis(Axis(0)) {
        Some(means) => m - &means,
        None => m.to_owned(),
    }
}

/// Standardize each column to zero mean and unit variance.
///
/// Columns without variance cannot be scaled; they are only centered.
pub fn zscore_columns<S>(m: &ArrayBase<S, Ix2>) -> Array2<f64>
where
    S: Data<Elem = f64>,
{
    let mut centered = center_columns(m);
    for (j, mut column) in centered.axis_iter_mut(Axis(1)).enumerate() {
        let sd = column.std(0.);
        if sd > 0. && sd.is_finite() {
            column /= sd;
        } else {
            warn!("design column {} has zero variance and is only centered", j);
        }
    }
    centered
}

/// Moore-Penrose pseudo-inverse of a matrix, computed from its singular
/// value decomposition. Singular values below `PINV_RCOND` times the
/// largest one are discarded, so rank-deficient matrices are accepted.
pub fn pinv<S>(m: &ArrayBase<S, Ix2>) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
{
    let (rows, cols) = m.dim();
    if rows == 0 || cols == 0 {
        return Ok(Array2::zeros((cols, rows)));
    }
    let matrix = DMatrix::from_fn(rows, cols, |i, j| m[[i, j]]);
    let svd = matrix.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(GlmError::Decomposition),
    };
    let singular = svd.singular_values;
    let cutoff = PINV_RCOND * singular.iter().cloned().fold(0., f64::max);

    // pinv = V · S⁺ · Uᵀ
    let mut inverse = DMatrix::<f64>::zeros(cols, rows);
    for (k, s) in singular.iter().enumerate() {
        if *s <= cutoff {
            continue;
        }
        let v = v_t.row(k).transpose();
        let ut = u.column(k).transpose();
        inverse += (v * ut) / *s;
    }

    Ok(Array2::from_shape_fn((cols, rows), |(i, j)| inverse[(i, j)]))
}

/// Fit the design `h` to the response `y`, returning the coefficient
/// matrix (explanatory variables × observations).
pub fn fit<S, T>(y: &ArrayBase<S, Ix2>, h: &ArrayBase<T, Ix2>, options: FitOptions) -> Result<Array2<f64>>
where
    S: Data<Elem = f64>,
    T: Data<Elem = f64>,
{
    if y.nrows() != h.nrows() {
        return Err(GlmError::RowMismatch(y.nrows(), h.nrows()));
    }
    let y = if options.center_response {
        center_columns(y)
    } else {
        y.to_owned()
    };
    let h = match options.design_scaling {
        DesignScaling::Center => center_columns(h),
        DesignScaling::ZScore => zscore_columns(h),
    };
    Ok(pinv(&h)?.dot(&y))
}
