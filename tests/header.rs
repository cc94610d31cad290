#[macro_use]
extern crate pretty_assertions;

mod util;

use approx::assert_abs_diff_eq;
use fmri_glm::{GlmError, Intent, NiftiHeader, NiftiType, NiftiVersion, Unit, XForm};
use std::fs;
use tempfile::tempdir;
use util::{fortran_array, test_affine, write_volume};

#[test]
fn nifti1_header_is_preserved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vol.nii");
    let mut reference = NiftiHeader::default();
    reference.set_affine(&test_affine(), XForm::Mni152);
    reference.set_xyzt_units(Unit::Mm, Unit::Sec);
    reference.set_intent(Intent::Estimate, "beta");
    reference.set_description_str("written by a test").unwrap();
    reference.pixdim[4] = 0.72;

    let data = fortran_array(&[3, 4, 5], (0..60).map(f64::from).collect());
    fmri_glm::WriterOptions::new(&path)
        .reference_header(&reference)
        .write_nifti(&data)
        .unwrap();

    let header = NiftiHeader::from_file(&path).unwrap();
    assert_eq!(header.version, NiftiVersion::Nifti1);
    assert_eq!(header.dim, [3, 3, 4, 5, 1, 1, 1, 1]);
    assert_eq!(header.data_type().unwrap(), NiftiType::Float32);
    assert_eq!(header.bitpix, 32);
    assert_eq!(header.vox_offset, 352);
    assert_eq!(header.sform().unwrap(), XForm::Mni152);
    assert_eq!(header.qform().unwrap(), XForm::Mni152);
    assert_eq!(header.xyzt_units().unwrap(), (Unit::Mm, Unit::Sec));
    assert_eq!(header.intent().unwrap(), Intent::Estimate);
    assert_eq!(&header.intent_name[..5], b"beta\0");
    assert_eq!(header.description(), "written by a test");
    assert_abs_diff_eq!(header.pixdim[4], 0.72, epsilon = 1e-6);
    assert_abs_diff_eq!(header.affine(), test_affine(), epsilon = 1e-6);
}

#[test]
fn nifti2_header_is_preserved() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("matrix.nii");
    let mut reference = NiftiHeader {
        version: NiftiVersion::Nifti2,
        ..NiftiHeader::default()
    };
    reference.set_intent(Intent::ConnDenseSeries, "ConnDenseSeries");
    reference.set_description_str("wide").unwrap();
    reference.cal_max = 1e10;

    let shape = [1, 1, 1, 1, 2, 40000];
    let data = fortran_array(&shape, vec![0.5; 80000]);
    fmri_glm::WriterOptions::new(&path)
        .reference_header(&reference)
        .write_nifti(&data)
        .unwrap();

    let expected = NiftiHeader {
        dim: [6, 1, 1, 1, 1, 2, 40000, 1],
        datatype: NiftiType::Float32 as i16,
        bitpix: 32,
        vox_offset: 544,
        scl_slope: 1.,
        scl_inter: 0.,
        ..reference
    };
    assert_eq!(NiftiHeader::from_file(&path).unwrap(), expected);
}

#[test]
fn compressed_header() {
    let dir = tempdir().unwrap();
    let plain = dir.path().join("vol.nii");
    let packed = dir.path().join("vol.nii.gz");
    let data = fortran_array(&[2, 2, 2], vec![1.; 8]);
    write_volume(&plain, &data, &test_affine());
    write_volume(&packed, &data, &test_affine());

    assert_ne!(fs::read(&plain).unwrap(), fs::read(&packed).unwrap());
    assert_eq!(
        NiftiHeader::from_file(&plain).unwrap(),
        NiftiHeader::from_file(&packed).unwrap()
    );
}

#[test]
fn header_only_magic_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("vol.nii");
    write_volume(&path, &fortran_array(&[2, 2, 2], vec![1.; 8]), &test_affine());

    let mut bytes = fs::read(&path).unwrap();
    bytes[344..348].copy_from_slice(b"ni1\0");
    fs::write(&path, &bytes).unwrap();
    match NiftiHeader::from_file(&path) {
        Err(GlmError::NoVolumeData) => {}
        other => panic!("unexpected result {:?}", other),
    }

    bytes[344..348].copy_from_slice(b"xyz\0");
    fs::write(&path, &bytes).unwrap();
    assert!(NiftiHeader::from_file(&path).is_err());
}

#[test]
fn unknown_header_size_is_rejected() {
    let bytes = [0u8; 400];
    match NiftiHeader::from_reader(&bytes[..]) {
        Err(GlmError::InvalidFormat) => {}
        other => panic!("unexpected result {:?}", other),
    }
}
