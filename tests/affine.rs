mod util;

use approx::assert_abs_diff_eq;
use fmri_glm::affine::{
    affine_to_qform, affine_to_quaternion, get_affine_and_translation, qform_to_affine,
    quaternion_to_affine, shape_zoom_affine, Affine4,
};
use fmri_glm::{NiftiHeader, XForm};
use nalgebra::{Quaternion, Vector4};
use util::test_affine;

#[test]
fn sform_takes_precedence() {
    let mut header = NiftiHeader::default();
    header.sform_code = 1;
    header.srow_x = [2.4, 0.0, 0.0, -114.766396];
    header.srow_y = [0.1, 2.4, 0.0, -97.420204];
    header.srow_z = [0.4, 0.4, 2.4, -89.12282];

    // ignored while the sform is valid
    header.qform_code = 1;
    header.pixdim = [-1.0, 0.9375, 0.9375, 3.0, 0.0, 0.0, 0.0, 0.0];
    header.quatern_c = 1.0;
    header.quatern_x = 59.0;

    #[rustfmt::skip]
    let real_affine = Affine4::new(
        2.4, 0.0, 0.0, -114.766396,
        0.1, 2.4, 0.0, -97.420204,
        0.4, 0.4, 2.4, -89.12282,
        0.0, 0.0, 0.0, 1.0
    );
    assert_eq!(header.affine(), real_affine);
}

#[test]
fn qform_is_used_without_sform() {
    let mut header = NiftiHeader::default();
    header.qform_code = 1;
    header.pixdim = [-1.0, 0.9375, 0.9375, 3.0, 0.0, 0.0, 0.0, 0.0];
    header.quatern_c = 1.0;
    header.quatern_x = 59.557503;
    header.quatern_y = 73.172;
    header.quatern_z = 43.4291;

    #[rustfmt::skip]
    let real_affine = Affine4::new(
        -0.9375, 0.0,    0.0, 59.557503,
        0.0,     0.9375, 0.0, 73.172,
        0.0,     0.0,    3.0, 43.4291,
        0.0,     0.0,    0.0, 1.0
    );
    assert_abs_diff_eq!(header.affine(), real_affine, epsilon = 1e-12);
}

#[test]
fn zooms_are_used_without_transforms() {
    let mut header = NiftiHeader::default();
    header.set_shape(&[100, 100, 100]).unwrap();
    header.pixdim = [-1.0, 0.9, 0.9, 3.0, 0.0, 0.0, 0.0, 0.0];

    #[rustfmt::skip]
    let real_affine = Affine4::new(
        -0.9, 0.0, 0.0,   44.55,
        0.0,  0.9, 0.0,  -44.55,
        0.0,  0.0, 3.0, -148.5,
        0.0, 0.0, 0.0, 1.0
    );
    assert_abs_diff_eq!(header.affine(), real_affine, epsilon = 1e-10);
    assert_abs_diff_eq!(
        shape_zoom_affine(&[100, 100, 100], &[0.9, 0.9, 3.0]),
        real_affine,
        epsilon = 1e-10
    );
}

#[test]
fn qform_round_trip_of_flipped_affine() {
    let affine = test_affine();
    let params = affine_to_qform(&affine);
    assert_eq!(params.qfac, -1.0);
    assert_abs_diff_eq!(params.zooms.x, 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(qform_to_affine(&params), affine, epsilon = 1e-10);
}

#[test]
fn quaternion_conversions_agree() {
    // 90 degrees around z
    let half = std::f64::consts::FRAC_1_SQRT_2;
    let q = Quaternion::new(half, 0.0, 0.0, half);
    let rotation = quaternion_to_affine(q);
    assert_abs_diff_eq!(rotation[(0, 1)], -1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(rotation[(1, 0)], 1.0, epsilon = 1e-12);

    let back = affine_to_quaternion(&rotation);
    assert_abs_diff_eq!(back[0].abs(), half, epsilon = 1e-12);
    assert_abs_diff_eq!(back[3].abs(), half, epsilon = 1e-12);
}

#[test]
fn set_affine_writes_both_forms() {
    let mut header = NiftiHeader::default();
    let affine = Affine4::from_diagonal(&Vector4::new(2.0, 2.0, 2.0, 1.0));
    header.set_affine(&affine, XForm::AlignedAnat);
    assert_eq!(header.affine(), affine);
    assert_eq!(header.sform().unwrap(), XForm::AlignedAnat);
    assert_eq!(header.qform().unwrap(), XForm::AlignedAnat);

    // dropping the sform falls back to the equivalent qform
    header.sform_code = 0;
    assert_abs_diff_eq!(header.affine(), affine, epsilon = 1e-12);

    let (linear, translation) = get_affine_and_translation(&affine);
    assert_eq!(linear[(1, 1)], 2.0);
    assert_eq!(translation.norm(), 0.0);
}
