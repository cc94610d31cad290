#[macro_use]
extern crate pretty_assertions;

mod util;

use fmri_glm::cifti;
use fmri_glm::{GlmError, Intent, NiftiImage, NiftiVersion};
use ndarray::arr2;
use std::fs;
use tempfile::tempdir;
use util::{dtseries_xml, fortran_array, test_affine, write_cifti, write_volume};

#[test]
fn compressed_and_plain_load_identically() {
    let dir = tempdir().unwrap();
    let data = fortran_array(&[3, 2, 2, 4], (0..48).map(|v| f64::from(v) * 0.5).collect());
    let plain = dir.path().join("bold.nii");
    let packed = dir.path().join("bold.nii.gz");
    write_volume(&plain, &data, &test_affine());
    write_volume(&packed, &data, &test_affine());

    let a = NiftiImage::from_file(&plain).unwrap();
    let b = NiftiImage::from_file(&packed).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.shape(), &[3, 2, 2, 4]);
    assert_eq!(a.data(), &data);
    assert_eq!(a.affine(), test_affine());
    assert!(a.extensions().is_empty());
}

#[test]
fn scaling_is_applied_on_load() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("scaled.nii");
    write_volume(&path, &fortran_array(&[2, 2], vec![0., 1., 2., 3.]), &test_affine());

    // scl_slope and scl_inter of a little endian NIfTI-1 header
    let mut bytes = fs::read(&path).unwrap();
    bytes[112..116].copy_from_slice(&2f32.to_le_bytes());
    bytes[116..120].copy_from_slice(&(-1f32).to_le_bytes());
    fs::write(&path, &bytes).unwrap();

    let image = NiftiImage::from_file(&path).unwrap();
    assert_eq!(image.data(), &fortran_array(&[2, 2], vec![-1., 1., 3., 5.]));
}

#[test]
fn truncated_data_is_an_error() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("short.nii");
    write_volume(&path, &fortran_array(&[4, 4, 4], vec![1.; 64]), &test_affine());
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() - 10]).unwrap();

    match NiftiImage::from_file(&path) {
        Err(GlmError::Io(_)) => {}
        other => panic!("unexpected result {:?}", other.map(|i| i.shape().to_vec())),
    }
}

#[test]
fn cifti_matrix_and_document_are_loaded() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("sub.dtseries.nii");
    let matrix = arr2(&[[1., 2., 3., 4., 5.], [6., 7., 8., 9., 10.], [11., 12., 13., 14., 15.]]);
    let xml = dtseries_xml(3, 5);
    write_cifti(&path, &matrix, &xml, Intent::ConnDenseSeries);

    let image = NiftiImage::from_file(&path).unwrap();
    assert_eq!(image.header().version, NiftiVersion::Nifti2);
    assert_eq!(image.header().intent().unwrap(), Intent::ConnDenseSeries);
    assert_eq!(image.shape(), &[1, 1, 1, 1, 3, 5]);
    assert_eq!(cifti::matrix(&image).unwrap(), matrix);
    assert_eq!(cifti::xml(&image).unwrap(), xml);
    assert_eq!(image.header().vox_offset as usize % 16, 0);
}

#[test]
fn volumes_have_no_cifti_document() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vol.nii");
    write_volume(&path, &fortran_array(&[2, 2, 2], vec![1.; 8]), &test_affine());
    let image = NiftiImage::from_file(&path).unwrap();
    assert!(cifti::xml(&image).is_err());
    assert!(cifti::matrix(&image).is_err());
}
