//! Voxel-to-world affine transformations.
//!
//! NIfTI headers may define the transformation in two ways: an explicit
//! 3x4 matrix (`sform`) or a quaternion plus voxel sizes and an offset
//! (`qform`). The functions here convert between the two so that an affine
//! can be read from any header and written back into both fields.

use nalgebra::{Matrix3, Matrix4, Quaternion, RowVector4, SymmetricEigen, Vector3};

/// 3x3 linear part of an affine.
pub type Affine3 = Matrix3<f64>;
/// Full 4x4 homogeneous affine.
pub type Affine4 = Matrix4<f64>;

/// The quaternion representation of an affine, as stored in a NIfTI header.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QformParams {
    /// `quatern_b`, `quatern_c`, `quatern_d`
    pub bcd: Vector3<f64>,
    /// `quatern_x`, `quatern_y`, `quatern_z`
    pub offset: Vector3<f64>,
    /// Positive voxel sizes, `pixdim[1..4]`
    pub zooms: Vector3<f64>,
    /// `pixdim[0]`: -1 when the third axis is flipped, 1 otherwise
    pub qfac: f64,
}

/// Separate a 4x4 affine into its 3x3 affine and translation components.
pub fn get_affine_and_translation(affine: &Affine4) -> (Affine3, Vector3<f64>) {
    let translation = Vector3::new(affine[(0, 3)], affine[(1, 3)], affine[(2, 3)]);
    let affine = affine.fixed_view::<3, 3>(0, 0).into_owned();
    (affine, translation)
}

/// Build a 4x4 affine from a 3x3 linear part and a translation.
pub fn from_affine_and_translation(linear: &Affine3, translation: &Vector3<f64>) -> Affine4 {
    let mut affine = Affine4::identity();
    affine.fixed_view_mut::<3, 3>(0, 0).copy_from(linear);
    affine.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
    affine
}

/// Get affine implied by given shape and zooms.
///
/// We get the translations from the center of the image (implied by `shape`).
#[rustfmt::skip]
pub fn shape_zoom_affine(shape: &[usize], spacing: &[f64]) -> Affine4 {
    let dim = |i: usize| shape.get(i).copied().unwrap_or(1) as f64;
    let zoom = |i: usize| spacing.get(i).copied().unwrap_or(1.0);
    let origin = Vector3::new(
        (dim(0) - 1.0) / 2.0,
        (dim(1) - 1.0) / 2.0,
        (dim(2) - 1.0) / 2.0,
    );
    let spacing = [-zoom(0), zoom(1), zoom(2)];
    Affine4::new(
        spacing[0], 0.0, 0.0, -origin[0] * spacing[0],
        0.0, spacing[1], 0.0, -origin[1] * spacing[1],
        0.0, 0.0, spacing[2], -origin[2] * spacing[2],
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Compute unit quaternion from last 3 values.
///
/// Assumes `w` is positive. Values of `1 - (x*x + y*y + z*z)` which are
/// slightly negative because of rounding are clamped to zero, which
/// corresponds to a 180 degree rotation.
pub fn fill_positive(xyz: Vector3<f64>) -> Quaternion<f64> {
    let w2 = 1.0 - xyz.dot(&xyz);
    let w = if w2 < 0.0 { 0.0 } else { w2.sqrt() };
    Quaternion::new(w, xyz.x, xyz.y, xyz.z)
}

/// Calculate quaternion corresponding to given rotation matrix.
///
/// Constructs the quaternion from the eigenvector of the largest eigenvalue
/// of a symmetric matrix `k` built from `affine`, which is robust to small
/// numerical errors in the rotation. The sign of a quaternion is arbitrary;
/// the one with positive `w` (`q[0]`) is returned.
///
/// Bar-Itzhack, Itzhack Y. "New method for extracting the quaternion from a rotation
/// matrix", AIAA Journal of Guidance, Control and Dynamics 23(6):1085-1087, 2000
#[rustfmt::skip]
pub fn affine_to_quaternion(affine: &Affine3) -> RowVector4<f64> {
    // qyx refers to the contribution of the y input vector component to the x output vector
    // component. qyx is therefore the same as M[0, 1].
    let qxx = affine[(0, 0)];
    let qyx = affine[(0, 1)];
    let qzx = affine[(0, 2)];
    let qxy = affine[(1, 0)];
    let qyy = affine[(1, 1)];
    let qzy = affine[(1, 2)];
    let qxz = affine[(2, 0)];
    let qyz = affine[(2, 1)];
    let qzz = affine[(2, 2)];

    // Fill only lower half of symmetric matrix
    let k = Affine4::new(
        qxx - qyy - qzz, 0.0,             0.0,             0.0,
        qyx + qxy,       qyy - qxx - qzz, 0.0,             0.0,
        qzx + qxz,       qzy + qyz,       qzz - qxx - qyy, 0.0,
        qyz - qzy,       qzx - qxz,       qxy - qyx,       qxx + qyy + qzz,
    ) / 3.0;

    let SymmetricEigen { eigenvalues: values, eigenvectors: vectors } = k.symmetric_eigen();

    // Select largest eigenvector, reorder to w,x,y,z quaternion
    let max_idx = values.imax();
    let max_vector = vectors.column(max_idx);
    let quaternion = RowVector4::new(max_vector[3], max_vector[0], max_vector[1], max_vector[2]);

    // Prefer quaternion with positive `w`.
    if quaternion[0] < 0.0 {
        quaternion * -1.0
    } else {
        quaternion
    }
}

/// Calculate rotation matrix corresponding to quaternion.
///
/// Rotation matrix applies to column vectors, and is applied to the left of coordinate vectors.
/// The algorithm here allows non-unit quaternions.
///
/// Algorithm from https://en.wikipedia.org/wiki/Rotation_matrix#Quaternion
#[rustfmt::skip]
pub fn quaternion_to_affine(q: Quaternion<f64>) -> Affine3 {
    let nq = q.w * q.w + q.i * q.i + q.j * q.j + q.k * q.k;
    if nq < ::std::f64::EPSILON {
        return Affine3::identity();
    }
    let s = 2.0 / nq;
    let x = q.i * s;
    let y = q.j * s;
    let z = q.k * s;
    let wx = q.w * x;
    let wy = q.w * y;
    let wz = q.w * z;
    let xx = q.i * x;
    let xy = q.i * y;
    let xz = q.i * z;
    let yy = q.j * y;
    let yz = q.j * z;
    let zz = q.k * z;
    Affine3::new(
        1.0 - (yy + zz), xy - wz, xz + wy,
        xy + wz, 1.0 - (xx + zz), yz - wx,
        xz - wy, yz + wx, 1.0 - (xx + yy),
    )
}

/// Affine described by the quaternion fields of a header.
pub fn qform_to_affine(params: &QformParams) -> Affine4 {
    let rotation = quaternion_to_affine(fill_positive(params.bcd));
    let qfac = if params.qfac < 0.0 { -1.0 } else { 1.0 };
    let zooms = Vector3::new(params.zooms.x, params.zooms.y, params.zooms.z * qfac);
    let linear = rotation * Affine3::from_diagonal(&zooms);
    from_affine_and_translation(&linear, &params.offset)
}

/// Decompose an affine into the quaternion fields of a header.
///
/// Shears cannot be represented by a quaternion; the rotation is replaced
/// by its nearest orthonormal matrix.
pub fn affine_to_qform(affine: &Affine4) -> QformParams {
    let (linear, offset) = get_affine_and_translation(affine);
    let mut zooms = Vector3::from_fn(|i, _| linear.column(i).norm());
    let mut rotation = linear;
    for (i, zoom) in zooms.iter().enumerate() {
        if *zoom > 0.0 {
            rotation.column_mut(i).unscale_mut(*zoom);
        }
    }
    let mut qfac = 1.0;
    if rotation.determinant() < 0.0 {
        qfac = -1.0;
        rotation.column_mut(2).neg_mut();
    }
    let svd = rotation.svd(true, true);
    if let (Some(u), Some(v_t)) = (svd.u, svd.v_t) {
        rotation = u * v_t;
    }
    let q = affine_to_quaternion(&rotation);
    zooms.iter_mut().for_each(|z| *z = z.abs());
    QformParams {
        bcd: Vector3::new(q[1], q[2], q[3]),
        offset,
        zooms,
        qfac,
    }
}
