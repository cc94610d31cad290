//! This module contains the coded types defined by the NIfTI standards
//! which this crate needs to interpret. Primitive integer values can be
//! converted to these types with `FromPrimitive` and back with `as`.

use crate::error::{GlmError, Result};
use byteordered::{ByteOrdered, Endianness};
use std::io::Read;

/// Data type for representing a NIfTI value type in a volume.
/// Methods for reading values of that type from a source are also included.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum NiftiType {
    /// unsigned char.
    // NIFTI_TYPE_UINT8           2
    Uint8 = 2,
    /// signed short.
    // NIFTI_TYPE_INT16           4
    Int16 = 4,
    /// signed int.
    // NIFTI_TYPE_INT32           8
    Int32 = 8,
    /// 32 bit float.
    // NIFTI_TYPE_FLOAT32        16
    Float32 = 16,
    /// 64 bit complex = 2 32 bit floats.
    // NIFTI_TYPE_COMPLEX64      32
    Complex64 = 32,
    /// 64 bit float = double.
    // NIFTI_TYPE_FLOAT64        64
    Float64 = 64,
    /// 3 8 bit bytes.
    // NIFTI_TYPE_RGB24         128
    Rgb24 = 128,
    /// signed char.
    // NIFTI_TYPE_INT8          256
    Int8 = 256,
    /// unsigned short.
    // NIFTI_TYPE_UINT16        512
    Uint16 = 512,
    /// unsigned int.
    // NIFTI_TYPE_UINT32        768
    Uint32 = 768,
    /// signed long long.
    // NIFTI_TYPE_INT64        1024
    Int64 = 1024,
    /// unsigned long long.
    // NIFTI_TYPE_UINT64       1280
    Uint64 = 1280,
    /// 128 bit float = long double.
    // NIFTI_TYPE_FLOAT128     1536
    Float128 = 1536,
    /// 128 bit complex = 2 64 bit floats.
    // NIFTI_TYPE_COMPLEX128   1792
    Complex128 = 1792,
    /// 256 bit complex = 2 128 bit floats
    // NIFTI_TYPE_COMPLEX256   2048
    Complex256 = 2048,
    /// 4 8 bit bytes.
    // NIFTI_TYPE_RGBA32       2304
    Rgba32 = 2304,
}

impl NiftiType {
    /// Retrieve the size of an element of this data type, in bytes.
    pub fn size_of(self) -> usize {
        use NiftiType::*;
        match self {
            Int8 | Uint8 => 1,
            Int16 | Uint16 => 2,
            Rgb24 => 3,
            Int32 | Uint32 | Float32 | Rgba32 => 4,
            Int64 | Uint64 | Float64 | Complex64 => 8,
            Float128 | Complex128 => 16,
            Complex256 => 32,
        }
    }

    /// Whether values of this type can be read as a single real number.
    pub fn is_real_scalar(self) -> bool {
        use NiftiType::*;
        match self {
            Int8 | Uint8 | Int16 | Uint16 | Int32 | Uint32 | Int64 | Uint64 | Float32
            | Float64 => true,
            Rgb24 | Rgba32 | Complex64 | Complex128 | Complex256 | Float128 => false,
        }
    }

    /// Read a single raw value of this type from a source and widen it to
    /// `f64`. No scaling is applied.
    pub fn read_f64<S>(self, source: &mut ByteOrdered<S, Endianness>) -> Result<f64>
    where
        S: Read,
    {
        let value = match self {
            NiftiType::Uint8 => f64::from(source.read_u8()?),
            NiftiType::Int8 => f64::from(source.read_i8()?),
            NiftiType::Uint16 => f64::from(source.read_u16()?),
            NiftiType::Int16 => f64::from(source.read_i16()?),
            NiftiType::Uint32 => f64::from(source.read_u32()?),
            NiftiType::Int32 => f64::from(source.read_i32()?),
            NiftiType::Uint64 => source.read_u64()? as f64,
            NiftiType::Int64 => source.read_i64()? as f64,
            NiftiType::Float32 => f64::from(source.read_f32()?),
            NiftiType::Float64 => source.read_f64()?,
            t => return Err(GlmError::UnsupportedDataType(t)),
        };
        Ok(value)
    }
}

/// An enum type which represents a unit type.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum Unit {
    /// NIFTI code for unspecified units.
    Unknown = 0,
    /* Space codes are multiples of 1. */
    /// NIFTI code for meters.
    Meter = 1,
    /// NIFTI code for millimeters.
    Mm = 2,
    /// NIFTI code for micrometers.
    Micron = 3,
    /* Time codes are multiples of 8. */
    /// NIFTI code for seconds.
    Sec = 8,
    /// NIFTI code for milliseconds.
    Msec = 16,
    /// NIFTI code for microseconds.
    Usec = 24,
    /* These units are for spectral data: */
    /// NIFTI code for Hertz.
    Hz = 32,
    /// NIFTI code for ppm.
    Ppm = 40,
    /// NIFTI code for radians per second.
    Rads = 48,
}

/// Intent codes relevant to regression outputs and CIFTI-2 matrices.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum Intent {
    /// default: no intention is indicated in the header.
    None = 0,
    /// The value at each voxel is an estimate of some parameter.
    Estimate = 1001,
    /// The value at each location is from a time series.
    TimeSeries = 2001,
    /// Dense connectivity (`.dconn.nii`).
    ConnDense = 3001,
    /// Dense data series (`.dtseries.nii`).
    ConnDenseSeries = 3002,
    /// Parcellated connectivity (`.pconn.nii`).
    ConnParcels = 3003,
    /// Parcellated data series (`.ptseries.nii`).
    ConnParcelSeries = 3004,
    /// Dense trajectory (`.dtraj.nii`).
    ConnDenseTrajectory = 3005,
    /// Dense scalar maps (`.dscalar.nii`).
    ConnDenseScalar = 3006,
    /// Dense label maps (`.dlabel.nii`).
    ConnDenseLabel = 3007,
    /// Parcellated scalar maps (`.pscalar.nii`).
    ConnParcelScalar = 3008,
    /// Parcellated-dense connectivity (`.pdconn.nii`).
    ConnParcelDense = 3009,
    /// Dense-parcellated connectivity (`.dpconn.nii`).
    ConnDenseParcel = 3010,
}

/// An enum type for representing a NIFTI XForm.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, FromPrimitive)]
pub enum XForm {
    /// Arbitrary coordinates (Method 1).
    Unknown = 0,
    /// Scanner-based anatomical coordinates
    ScannerAnat = 1,
    /// Coordinates aligned to another file's,
    /// or to anatomical "truth".
    AlignedAnat = 2,
    /// Coordinates aligned to Talairach-Tournoux
    /// Atlas; (0,0,0)=AC, etc.
    Talairach = 3,
    /// MNI 152 normalized coordinates.
    Mni152 = 4,
}
