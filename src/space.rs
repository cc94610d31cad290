//! Comparison of the geometric space occupied by two images.

use crate::cifti;
use crate::error::Result;
use crate::object::NiftiImage;

/// Whether two volumetric images are defined on the same voxel grid.
///
/// The affines must be identical, the numbers of dimensions may differ by
/// at most one (a 3-D mask against a 4-D series), and the spatial axes
/// shared by both images must have the same lengths.
pub fn nifti_same_space(a: &NiftiImage, b: &NiftiImage) -> bool {
    if a.affine() != b.affine() {
        return false;
    }
    let (sa, sb) = (a.shape(), b.shape());
    if (sa.len() as isize - sb.len() as isize).abs() > 1 {
        return false;
    }
    let n = sa.len().min(sb.len()).min(3);
    sa[..n] == sb[..n]
}

/// Whether two CIFTI images share the same brainordinate grid.
///
/// The grid lengths must match. When both documents describe their grid,
/// the descriptions must be identical up to whitespace.
pub fn cifti_same_space(a: &NiftiImage, b: &NiftiImage) -> Result<bool> {
    let (_, cols_a) = cifti::matrix_shape(a.header())?;
    let (_, cols_b) = cifti::matrix_shape(b.header())?;
    if cols_a != cols_b {
        return Ok(false);
    }
    let (xml_a, xml_b) = (a.extensions().cifti_xml(), b.extensions().cifti_xml());
    let maps = (
        xml_a.as_deref().and_then(|x| cifti::index_map(x, 1)),
        xml_b.as_deref().and_then(|x| cifti::index_map(x, 1)),
    );
    Ok(match maps {
        (Some(ma), Some(mb)) => {
            cifti::normalize_whitespace(ma) == cifti::normalize_whitespace(mb)
        }
        _ => true,
    })
}
