//! CIFTI-2 matrices stored in NIfTI-2 files.
//!
//! A CIFTI-2 file is a NIfTI-2 image whose data occupies dimensions 5 and 6
//! (`dim[5]` rows, `dim[6]` columns) and whose meaning is described by an
//! XML document in an extension with code 32. Each matrix dimension is
//! described by a `MatrixIndicesMap` element. Only locating and copying
//! these maps is supported; their content is passed through verbatim.

use crate::error::{GlmError, Result};
use crate::extension::{Extension, ExtensionSequence};
use crate::header::{NiftiHeader, NiftiVersion};
use crate::object::{fortran_order_vec, NiftiImage};
use crate::typedef::Intent;
use crate::writer::WriterOptions;
use ndarray::{Array2, ArrayD, IxDyn, ShapeBuilder};
use std::path::Path;

const MAP_OPEN: &str = "<MatrixIndicesMap";
const MAP_CLOSE: &str = "</MatrixIndicesMap>";

/// The matrix held by a CIFTI image: `dim[5]` rows by `dim[6]` columns.
pub fn matrix(image: &NiftiImage) -> Result<Array2<f64>> {
    let (rows, cols) = matrix_shape(image.header())?;
    Array2::from_shape_vec((rows, cols).f(), fortran_order_vec(image.data()))
        .map_err(|_| GlmError::InvalidFormat)
}

/// Rows and columns of a CIFTI matrix, checking that the first four
/// dimensions are unused.
pub fn matrix_shape(header: &NiftiHeader) -> Result<(usize, usize)> {
    let shape = header.shape()?;
    if shape.len() < 5 {
        return Err(GlmError::InconsistentDim(0, shape.len() as i64));
    }
    if let Some(i) = shape[..4].iter().position(|d| *d != 1) {
        return Err(GlmError::InconsistentDim(i as u8 + 1, shape[i] as i64));
    }
    let rows = shape[4];
    let cols = shape.get(5).copied().unwrap_or(1);
    Ok((rows, cols))
}

/// The CIFTI-2 XML document of an image.
pub fn xml(image: &NiftiImage) -> Result<String> {
    image
        .extensions()
        .cifti_xml()
        .ok_or(GlmError::MissingCiftiMetadata("CIFTI-2 extension"))
}

/// Find the `MatrixIndicesMap` element applying to the given matrix
/// dimension. Maps shared by several dimensions (as in dense connectivity
/// files) match any of them.
pub fn index_map(xml: &str, dimension: usize) -> Option<&str> {
    let wanted = dimension.to_string();
    let mut from = 0;
    while let Some(offset) = xml[from..].find(MAP_OPEN) {
        let start = from + offset;
        let tag_end = start + xml[start..].find('>')?;
        let opening = &xml[start..tag_end];
        let end = if opening.ends_with('/') {
            tag_end + 1
        } else {
            start + xml[start..].find(MAP_CLOSE)? + MAP_CLOSE.len()
        };
        let applies = attribute(opening, "AppliesToMatrixDimension")
            .map(|v| v.split(',').any(|d| d.trim() == wanted))
            .unwrap_or(false);
        if applies {
            return Some(&xml[start..end]);
        }
        from = end;
    }
    None
}

/// Value of an attribute inside an opening tag.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    attribute_span(tag, name).map(|(start, end)| &tag[start..end])
}

/// Byte range of an attribute's value inside an opening tag. The name must
/// follow whitespace, so it cannot match inside another name or value.
fn attribute_span(tag: &str, name: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(offset) = tag[from..].find(name) {
        let begin = from + offset;
        let after = begin + name.len();
        from = after;
        if !tag[..begin].ends_with(char::is_whitespace) {
            continue;
        }
        let rest = tag[after..].trim_start();
        if let Some(rest) = rest.strip_prefix('=') {
            let rest = rest.trim_start();
            let quote = match rest.chars().next() {
                Some(q @ '"') | Some(q @ '\'') => q,
                _ => continue,
            };
            let start = tag.len() - rest.len() + 1;
            return tag[start..].find(quote).map(|end| (start, start + end));
        }
    }
    None
}

/// Collapse whitespace so that equivalent XML fragments compare equal.
pub fn normalize_whitespace(fragment: &str) -> String {
    fragment.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Build the XML document of a dense scalar file with `n_maps` unnamed
/// scalar maps along the rows and the given map along the columns.
pub fn dense_scalar_xml(n_maps: usize, grid_map: &str) -> String {
    // the copied map may have applied to several dimensions of its source
    let grid_map = match attribute_span(grid_map, "AppliesToMatrixDimension") {
        Some((start, end)) if grid_map[start..end].trim() != "1" => {
            format!("{}1{}", &grid_map[..start], &grid_map[end..])
        }
        _ => grid_map.to_string(),
    };
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<CIFTI Version=\"2\">\n<Matrix>\n",
    );
    xml.push_str(
        "<MatrixIndicesMap AppliesToMatrixDimension=\"0\" \
         IndicesMapToDataType=\"CIFTI_INDEX_TYPE_SCALARS\">\n",
    );
    for _ in 0..n_maps {
        xml.push_str("<NamedMap><MapName></MapName></NamedMap>\n");
    }
    xml.push_str(MAP_CLOSE);
    xml.push('\n');
    xml.push_str(&grid_map);
    xml.push('\n');
    xml.push_str("</Matrix>\n</CIFTI>\n");
    xml
}

/// Write a matrix as a CIFTI-2 file with the given XML document and intent.
pub fn write_matrix<P: AsRef<Path>>(
    path: P,
    data: &Array2<f64>,
    xml: &str,
    intent: Intent,
    intent_name: &str,
) -> Result<()> {
    let mut header = NiftiHeader {
        version: NiftiVersion::Nifti2,
        ..NiftiHeader::default()
    };
    header.set_intent(intent, intent_name);

    let (rows, cols) = data.dim();
    let shape = [1, 1, 1, 1, rows, cols];
    let volume = ArrayD::from_shape_vec(IxDyn(&shape).f(), fortran_order_vec(data))
        .map_err(|_| GlmError::InvalidFormat)?;

    WriterOptions::new(path)
        .reference_header(&header)
        .with_extensions(ExtensionSequence::new(vec![Extension::cifti(xml)]))
        .write_nifti(&volume)
}

/// Write a components × grid matrix as a dense scalar (`.dscalar.nii`) file,
/// copying the grid description of a reference CIFTI document.
pub fn write_dense_scalar<P: AsRef<Path>>(
    path: P,
    data: &Array2<f64>,
    reference_xml: &str,
) -> Result<()> {
    let grid_map =
        index_map(reference_xml, 1).ok_or(GlmError::MissingCiftiMetadata("grid index map"))?;
    let xml = dense_scalar_xml(data.nrows(), grid_map);
    write_matrix(path, data, &xml, Intent::ConnDenseScalar, "ConnDenseScalar")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DTSERIES: &str = r#"<CIFTI Version="2"><Matrix>
<MatrixIndicesMap AppliesToMatrixDimension="0" IndicesMapToDataType="CIFTI_INDEX_TYPE_SERIES"
  NumberOfSeriesPoints="3" SeriesExponent="0" SeriesStart="0" SeriesStep="0.72" SeriesUnit="SECOND"/>
<MatrixIndicesMap AppliesToMatrixDimension='1' IndicesMapToDataType="CIFTI_INDEX_TYPE_BRAIN_MODELS">
<BrainModel IndexOffset="0" IndexCount="4" ModelType="CIFTI_MODEL_TYPE_SURFACE"
  BrainStructure="CIFTI_STRUCTURE_CORTEX_LEFT" SurfaceNumberOfVertices="4">
<VertexIndices>0 1 2 3</VertexIndices>
</BrainModel>
</MatrixIndicesMap>
</Matrix></CIFTI>"#;

    #[test]
    fn finds_attribute_values() {
        let tag = r#"<MatrixIndicesMap AppliesToMatrixDimension = "0,1" Other='x'"#;
        assert_eq!(attribute(tag, "AppliesToMatrixDimension"), Some("0,1"));
        assert_eq!(attribute(tag, "Other"), Some("x"));
        assert_eq!(attribute(tag, "Missing"), None);
    }

    #[test]
    fn attribute_names_are_not_matched_inside_values() {
        let tag = r#"<MatrixIndicesMap Note="AppliesToMatrixDimension='0'" AppliesToMatrixDimension="1""#;
        assert_eq!(attribute(tag, "AppliesToMatrixDimension"), Some("1"));
        let tag = r#"<MatrixIndicesMap XAppliesToMatrixDimension="0""#;
        assert_eq!(attribute(tag, "AppliesToMatrixDimension"), None);
    }

    #[test]
    fn locates_grid_map() {
        let map = index_map(DTSERIES, 1).unwrap();
        assert!(map.starts_with("<MatrixIndicesMap AppliesToMatrixDimension='1'"));
        assert!(map.ends_with(MAP_CLOSE));
        assert!(map.contains("<VertexIndices>0 1 2 3</VertexIndices>"));
        assert!(index_map(DTSERIES, 2).is_none());
    }

    #[test]
    fn self_closing_map_ends_at_its_tag() {
        let map = index_map(DTSERIES, 0).unwrap();
        assert!(map.contains("CIFTI_INDEX_TYPE_SERIES"));
        assert!(map.ends_with("/>"));
        assert!(!map.contains("BRAIN_MODELS"));
    }

    #[test]
    fn shared_maps_are_reassigned() {
        let map = r#"<MatrixIndicesMap AppliesToMatrixDimension="0,1" IndicesMapToDataType="CIFTI_INDEX_TYPE_BRAIN_MODELS"></MatrixIndicesMap>"#;
        let xml = dense_scalar_xml(1, map);
        assert!(xml.contains(r#"<MatrixIndicesMap AppliesToMatrixDimension="1" IndicesMapToDataType="CIFTI_INDEX_TYPE_BRAIN_MODELS">"#));

        // only the attribute value is rewritten
        let map = r#"<MatrixIndicesMap Note="0" AppliesToMatrixDimension="0" IndicesMapToDataType="CIFTI_INDEX_TYPE_BRAIN_MODELS"></MatrixIndicesMap>"#;
        let xml = dense_scalar_xml(1, map);
        assert!(xml.contains(r#"<MatrixIndicesMap Note="0" AppliesToMatrixDimension="1" "#));
    }

    #[test]
    fn dense_scalar_document() {
        let map = index_map(DTSERIES, 1).unwrap();
        let xml = dense_scalar_xml(2, map);
        assert_eq!(xml.matches("<NamedMap>").count(), 2);
        assert!(xml.contains("CIFTI_INDEX_TYPE_SCALARS"));
        let grid = index_map(&xml, 1).unwrap();
        assert_eq!(normalize_whitespace(grid), normalize_whitespace(map));
    }
}
