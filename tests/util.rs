//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use fmri_glm::affine::Affine4;
use fmri_glm::{Extension, ExtensionSequence, Intent, NiftiHeader, NiftiVersion, WriterOptions, XForm};
use ndarray::{Array2, ArrayD, IxDyn, ShapeBuilder};
use std::fs;
use std::path::Path;

/// A 2 mm isotropic affine with a non-trivial origin.
#[rustfmt::skip]
pub fn test_affine() -> Affine4 {
    Affine4::new(
        -2.0, 0.0, 0.0,  90.0,
         0.0, 2.0, 0.0, -126.0,
         0.0, 0.0, 2.0, -72.0,
         0.0, 0.0, 0.0,   1.0,
    )
}

/// Build an array from values laid out with the first axis varying fastest.
pub fn fortran_array(shape: &[usize], values: Vec<f64>) -> ArrayD<f64> {
    ArrayD::from_shape_vec(IxDyn(shape).f(), values).unwrap()
}

/// Write a NIfTI-1 volume with the given affine.
pub fn write_volume(path: &Path, data: &ArrayD<f64>, affine: &Affine4) {
    let mut header = NiftiHeader::default();
    header.set_affine(affine, XForm::ScannerAnat);
    WriterOptions::new(path)
        .reference_header(&header)
        .write_nifti(data)
        .unwrap();
}

/// A brain models map over `n` surface vertices of the left cortex.
pub fn brain_models_map(n: usize) -> String {
    let indices: Vec<String> = (0..n).map(|i| i.to_string()).collect();
    format!(
        "<MatrixIndicesMap AppliesToMatrixDimension=\"1\" \
         IndicesMapToDataType=\"CIFTI_INDEX_TYPE_BRAIN_MODELS\">\n\
         <BrainModel IndexOffset=\"0\" IndexCount=\"{n}\" ModelType=\"CIFTI_MODEL_TYPE_SURFACE\" \
         BrainStructure=\"CIFTI_STRUCTURE_CORTEX_LEFT\" SurfaceNumberOfVertices=\"{n}\">\n\
         <VertexIndices>{}</VertexIndices>\n</BrainModel>\n</MatrixIndicesMap>",
        indices.join(" "),
        n = n
    )
}

/// A dense series document with `samples` time points over `grid` vertices.
pub fn dtseries_xml(samples: usize, grid: usize) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<CIFTI Version=\"2\">\n<Matrix>\n\
         <MatrixIndicesMap AppliesToMatrixDimension=\"0\" \
         IndicesMapToDataType=\"CIFTI_INDEX_TYPE_SERIES\" NumberOfSeriesPoints=\"{}\" \
         SeriesExponent=\"0\" SeriesStart=\"0\" SeriesStep=\"0.72\" SeriesUnit=\"SECOND\"/>\n\
         {}\n</Matrix>\n</CIFTI>\n",
        samples,
        brain_models_map(grid)
    )
}

/// Write a CIFTI-2 matrix (rows × columns) with the given document.
pub fn write_cifti(path: &Path, matrix: &Array2<f64>, xml: &str, intent: Intent) {
    let mut header = NiftiHeader {
        version: NiftiVersion::Nifti2,
        ..NiftiHeader::default()
    };
    header.set_intent(intent, "");
    let (rows, cols) = matrix.dim();
    let data = fortran_array(
        &[1, 1, 1, 1, rows, cols],
        matrix.t().iter().cloned().collect(),
    );
    WriterOptions::new(path)
        .reference_header(&header)
        .with_extensions(ExtensionSequence::new(vec![Extension::cifti(xml)]))
        .write_nifti(&data)
        .unwrap();
}

/// Write a text file.
pub fn write_text(path: &Path, contents: &str) {
    fs::write(path, contents).unwrap();
}

/// Names of the files in a directory, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
