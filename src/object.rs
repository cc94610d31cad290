//! Module for handling and retrieving complete NIfTI images.
//!
//! An image is the header, the extension sequence and the data array,
//! loaded fully into memory. Voxel values are converted to `f64` and scaled
//! on load, so downstream code never deals with on-disk data types.
//!
//! #### Note on memory order
//!
//! NIfTI data is stored on disk in column major order (also called Fortran
//! order), and the arrays produced here keep that memory order. Use
//! [`fortran_order_vec`] to flatten an array with the first axis varying
//! fastest, whatever its memory layout.

use crate::error::{GlmError, Result};
use crate::extension::{Extender, ExtensionSequence};
use crate::affine::Affine4;
use crate::header::NiftiHeader;
use crate::util::{is_gz_file, raw_to_value};
use byteordered::ByteOrdered;
use flate2::bufread::GzDecoder;
use log::debug;
use ndarray::{ArrayBase, ArrayD, Data, Dimension, IxDyn, ShapeBuilder};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Data type for a NIfTI image that is fully contained in memory.
#[derive(Debug, PartialEq, Clone)]
pub struct NiftiImage {
    header: NiftiHeader,
    extensions: ExtensionSequence,
    data: ArrayD<f64>,
}

impl NiftiImage {
    /// Assemble an image from its parts.
    pub fn new(header: NiftiHeader, extensions: ExtensionSequence, data: ArrayD<f64>) -> Self {
        NiftiImage {
            header,
            extensions,
            data,
        }
    }

    /// Retrieve the full contents of a single-file NIfTI-1 or NIfTI-2 image.
    /// If the file's name ends with ".gz", the file is decoded as a Gzip stream.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<NiftiImage> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(&path)?);
        let image = if gz {
            NiftiImage::from_reader(GzDecoder::new(file))?
        } else {
            NiftiImage::from_reader(file)?
        };
        debug!(
            "loaded {} with shape {:?}",
            path.as_ref().display(),
            image.data.shape()
        );
        Ok(image)
    }

    /// Retrieve an image from a stream of data, positioned at the start of
    /// the header.
    ///
    /// # Errors
    ///
    /// - `GlmError::NoVolumeData` if the source only contains (or claims to contain)
    /// a header.
    /// - `GlmError::UnsupportedDataType` if the voxels are not real scalars.
    pub fn from_reader<R: Read>(mut source: R) -> Result<NiftiImage> {
        let header = NiftiHeader::from_reader(&mut source)?;
        let mut consumed = header.version.header_size();

        let extensions = match Extender::from_reader_optional(&mut source)? {
            Some(extender) => {
                consumed += 4;
                let len = (header.vox_offset.max(0) as usize).saturating_sub(consumed);
                let mut ordered = ByteOrdered::runtime(&mut source, header.endianness);
                let extensions = ExtensionSequence::from_reader(extender, &mut ordered, len)?;
                consumed += extensions.bytes_len();
                extensions
            }
            None => ExtensionSequence::default(),
        };

        // skip any padding between the extensions and the data
        let gap = (header.vox_offset.max(0) as usize).saturating_sub(consumed);
        let skipped = io::copy(&mut (&mut source).take(gap as u64), &mut io::sink())?;
        if skipped != gap as u64 {
            return Err(GlmError::NoVolumeData);
        }

        let data = read_data(&mut source, &header)?;
        Ok(NiftiImage {
            header,
            extensions,
            data,
        })
    }

    /// Obtain a reference to the NIfTI header.
    pub fn header(&self) -> &NiftiHeader {
        &self.header
    }

    /// Obtain a reference to the image's extensions.
    pub fn extensions(&self) -> &ExtensionSequence {
        &self.extensions
    }

    /// Obtain a reference to the scaled voxel data.
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    /// The image's voxel-to-world affine.
    pub fn affine(&self) -> Affine4 {
        self.header.affine()
    }

    /// The shape of the data array.
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }
}

fn read_data<R: Read>(source: &mut R, header: &NiftiHeader) -> Result<ArrayD<f64>> {
    let datatype = header.data_type()?;
    if !datatype.is_real_scalar() {
        return Err(GlmError::UnsupportedDataType(datatype));
    }
    let shape = header.shape()?;
    let nbytes = header.data_len()?;
    // the claimed size is not trusted for the allocation
    let mut raw_data = Vec::new();
    let read = (&mut *source).take(nbytes as u64).read_to_end(&mut raw_data)?;
    if read != nbytes {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }

    let count = nbytes / datatype.size_of();
    let mut raw = ByteOrdered::runtime(&raw_data[..], header.endianness);
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        let v = datatype.read_f64(&mut raw)?;
        values.push(raw_to_value(v, header.scl_slope, header.scl_inter));
    }

    ArrayD::from_shape_vec(IxDyn(&shape).f(), values).map_err(|_| GlmError::InvalidFormat)
}

/// Flatten an array so that its first axis varies fastest.
pub fn fortran_order_vec<S, D>(array: &ArrayBase<S, D>) -> Vec<f64>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    array.t().iter().cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::fortran_order_vec;
    use ndarray::{arr2, Array, IxDyn, ShapeBuilder};

    #[test]
    fn fortran_order_flattening() {
        let c = arr2(&[[1., 2., 3.], [4., 5., 6.]]);
        assert_eq!(fortran_order_vec(&c), vec![1., 4., 2., 5., 3., 6.]);

        let f = Array::from_shape_vec(IxDyn(&[2, 3]).f(), vec![1., 4., 2., 5., 3., 6.]).unwrap();
        assert_eq!(f, c.into_dyn());
        assert_eq!(fortran_order_vec(&f), vec![1., 4., 2., 5., 3., 6.]);
    }
}
