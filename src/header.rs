//! This module defines the `NiftiHeader` struct, which is used
//! to provide important information about NIfTI-1 and NIfTI-2 volumes.
//!
//! Both standards share the same fields; NIfTI-2 widens them to 64-bit
//! integers and doubles. The header type here always holds the wide
//! representation and remembers which version it came from.

use crate::affine::{affine_to_qform, qform_to_affine, shape_zoom_affine, Affine4, QformParams};
use crate::error::{GlmError, Result};
use crate::typedef::*;
use crate::util::is_gz_file;
use byteordered::{ByteOrdered, Endianness};
use flate2::bufread::GzDecoder;
use nalgebra::Vector3;
use num_traits::FromPrimitive;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Magic code for full NIFTI-1 files (extention ".nii[.gz]").
pub const MAGIC_CODE_NIP1: &[u8; 4] = b"n+1\0";
/// Magic code for NIFTI-1 header files (extention ".hdr[.gz]").
pub const MAGIC_CODE_NI1: &[u8; 4] = b"ni1\0";
/// Magic code for full NIFTI-2 files.
pub const MAGIC_CODE_NIP2: &[u8; 8] = b"n+2\0\r\n\x1a\n";
/// Magic code for NIFTI-2 header files.
pub const MAGIC_CODE_NI2: &[u8; 8] = b"ni2\0\r\n\x1a\n";

/// Size of a NIfTI-1 header, in bytes.
pub const NIFTI1_HEADER_SIZE: i32 = 348;
/// Size of a NIfTI-2 header, in bytes.
pub const NIFTI2_HEADER_SIZE: i32 = 540;

/// The version of the standard a header is encoded with.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum NiftiVersion {
    /// 348-byte header, 16-bit dimensions
    Nifti1,
    /// 540-byte header, 64-bit dimensions
    Nifti2,
}

impl NiftiVersion {
    /// Size of the header in bytes, not including the extender.
    pub fn header_size(self) -> usize {
        match self {
            NiftiVersion::Nifti1 => NIFTI1_HEADER_SIZE as usize,
            NiftiVersion::Nifti2 => NIFTI2_HEADER_SIZE as usize,
        }
    }
}

/// The NIfTI header data type.
/// All fields are public and named after the fields of the NIfTI header structure.
/// Fields which are unused since NIfTI-1 are not kept.
#[derive(Debug, Clone, PartialEq)]
pub struct NiftiHeader {
    /// Encoding version
    pub version: NiftiVersion,
    /// MRI slice ordering
    pub dim_info: u8,
    /// Data array dimensions
    pub dim: [i64; 8],
    /// 1st intent parameter
    pub intent_p1: f64,
    /// 2nd intent parameter
    pub intent_p2: f64,
    /// 3rd intent parameter
    pub intent_p3: f64,
    /// NIFTI_INTENT_* code
    pub intent_code: i32,
    /// Defines the data type!
    pub datatype: i16,
    /// Number of bits per voxel
    pub bitpix: i16,
    /// First slice index
    pub slice_start: i64,
    /// Grid spacings
    pub pixdim: [f64; 8],
    /// Offset into .nii file to reach the volume
    pub vox_offset: i64,
    /// Data scaling: slope
    pub scl_slope: f64,
    /// Data scaling: offset
    pub scl_inter: f64,
    /// Last slice index
    pub slice_end: i64,
    /// Slice timing order
    pub slice_code: u8,
    /// Units of pixdim[1..4]
    pub xyzt_units: u8,
    /// Max display intensity
    pub cal_max: f64,
    /// Min display intensity
    pub cal_min: f64,
    /// Time for 1 slice
    pub slice_duration: f64,
    /// Time axis shift
    pub toffset: f64,
    /// Any text you like
    pub descrip: Vec<u8>,
    /// Auxiliary filename
    pub aux_file: [u8; 24],
    /// NIFTI_XFORM_* code
    pub qform_code: i16,
    /// NIFTI_XFORM_* code
    pub sform_code: i16,
    /// Quaternion b param
    pub quatern_b: f64,
    /// Quaternion c param
    pub quatern_c: f64,
    /// Quaternion d param
    pub quatern_d: f64,
    /// Quaternion x shift
    pub quatern_x: f64,
    /// Quaternion y shift
    pub quatern_y: f64,
    /// Quaternion z shift
    pub quatern_z: f64,
    /// 1st row affine transform
    pub srow_x: [f64; 4],
    /// 2nd row affine transform
    pub srow_y: [f64; 4],
    /// 3rd row affine transform
    pub srow_z: [f64; 4],
    /// 'name' or meaning of data
    pub intent_name: [u8; 16],
    /// Original data Endianness
    pub endianness: Endianness,
}

impl Default for NiftiHeader {
    fn default() -> NiftiHeader {
        NiftiHeader {
            version: NiftiVersion::Nifti1,
            dim_info: 0,
            dim: [1, 0, 0, 0, 0, 0, 0, 0],
            intent_p1: 0.,
            intent_p2: 0.,
            intent_p3: 0.,
            intent_code: 0,
            datatype: 0,
            bitpix: 0,
            slice_start: 0,
            pixdim: [1.; 8],
            vox_offset: 352,
            scl_slope: 0.,
            scl_inter: 0.,
            slice_end: 0,
            slice_code: 0,
            xyzt_units: 0,
            cal_max: 0.,
            cal_min: 0.,
            slice_duration: 0.,
            toffset: 0.,
            descrip: vec![0; 80],
            aux_file: [0; 24],
            qform_code: 0,
            sform_code: 0,
            quatern_b: 0.,
            quatern_c: 0.,
            quatern_d: 0.,
            quatern_x: 0.,
            quatern_y: 0.,
            quatern_z: 0.,
            srow_x: [0.; 4],
            srow_y: [0.; 4],
            srow_z: [0.; 4],
            intent_name: [0; 16],
            endianness: Endianness::Little,
        }
    }
}

impl NiftiHeader {
    /// Retrieve a NIfTI header from a file in the file system.
    /// If the file's name ends with ".gz", the file is assumed to need GZip decoding.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<NiftiHeader> {
        let gz = is_gz_file(&path);
        let file = BufReader::new(File::open(path)?);
        if gz {
            NiftiHeader::from_reader(GzDecoder::new(file))
        } else {
            NiftiHeader::from_reader(file)
        }
    }

    /// Read a NIfTI-1 or NIfTI-2 header from the given byte stream.
    /// It is assumed that the input is currently at the start of the
    /// header. The version and byte order are detected from `sizeof_hdr`.
    pub fn from_reader<S: Read>(mut input: S) -> Result<NiftiHeader> {
        let mut sizeof_hdr = [0u8; 4];
        input.read_exact(&mut sizeof_hdr)?;
        let (version, endianness) = detect_version(sizeof_hdr)?;
        let input = ByteOrdered::runtime(input, endianness);
        match version {
            NiftiVersion::Nifti1 => parse_header_1(input, endianness),
            NiftiVersion::Nifti2 => parse_header_2(input, endianness),
        }
    }

    /// Get the data type as a validated enum.
    pub fn data_type(&self) -> Result<NiftiType> {
        FromPrimitive::from_i16(self.datatype)
            .ok_or(GlmError::InvalidCode("datatype", i64::from(self.datatype)))
    }

    /// Get the spatial units type as a validated unit enum.
    pub fn xyzt_to_space(&self) -> Result<Unit> {
        let space_code = self.xyzt_units & 0o0007;
        FromPrimitive::from_u8(space_code)
            .ok_or(GlmError::InvalidCode("xyzt units (space)", i64::from(space_code)))
    }

    /// Get the time units type as a validated unit enum.
    pub fn xyzt_to_time(&self) -> Result<Unit> {
        let time_code = self.xyzt_units & 0o0070;
        FromPrimitive::from_u8(time_code)
            .ok_or(GlmError::InvalidCode("xyzt units (time)", i64::from(time_code)))
    }

    /// Get the xyzt units type as a validated pair of space and time unit enum.
    pub fn xyzt_units(&self) -> Result<(Unit, Unit)> {
        Ok((self.xyzt_to_space()?, self.xyzt_to_time()?))
    }

    /// Set the spatial and temporal units.
    pub fn set_xyzt_units(&mut self, space: Unit, time: Unit) {
        self.xyzt_units = (space as u8 & 0o0007) | (time as u8 & 0o0070);
    }

    /// Get the intent as a validated enum.
    pub fn intent(&self) -> Result<Intent> {
        FromPrimitive::from_i32(self.intent_code)
            .ok_or(GlmError::InvalidCode("intent", i64::from(self.intent_code)))
    }

    /// Set the intent code and name. Names longer than 15 bytes are truncated.
    pub fn set_intent(&mut self, intent: Intent, name: &str) {
        self.intent_code = intent as i32;
        self.intent_name = [0; 16];
        let len = name.len().min(15);
        self.intent_name[..len].copy_from_slice(&name.as_bytes()[..len]);
    }

    /// Get the qform coordinate mapping method as a validated enum.
    pub fn qform(&self) -> Result<XForm> {
        FromPrimitive::from_i16(self.qform_code)
            .ok_or(GlmError::InvalidCode("qform", i64::from(self.qform_code)))
    }

    /// Get the sform coordinate mapping method as a validated enum.
    pub fn sform(&self) -> Result<XForm> {
        FromPrimitive::from_i16(self.sform_code)
            .ok_or(GlmError::InvalidCode("sform", i64::from(self.sform_code)))
    }

    /// The validated shape of the data array: `dim[1..=dim[0]]`.
    pub fn shape(&self) -> Result<Vec<usize>> {
        let ndim = self.dim[0];
        if ndim < 1 || ndim > 7 {
            return Err(GlmError::InconsistentDim(0, ndim));
        }
        self.dim[1..=ndim as usize]
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                if d < 1 {
                    Err(GlmError::InconsistentDim(i as u8 + 1, d))
                } else {
                    Ok(d as usize)
                }
            })
            .collect()
    }

    /// Set `dim` from a concrete array shape.
    pub fn set_shape(&mut self, shape: &[usize]) -> Result<()> {
        if shape.is_empty() || shape.len() > 7 {
            return Err(GlmError::InconsistentDim(0, shape.len() as i64));
        }
        let mut dim = [1; 8];
        dim[0] = shape.len() as i64;
        for (i, s) in shape.iter().enumerate() {
            dim[i + 1] = *s as i64;
        }
        self.dim = dim;
        Ok(())
    }

    /// Number of bytes used by the data array.
    pub fn data_len(&self) -> Result<usize> {
        let size = self.data_type()?.size_of();
        self.shape()?
            .iter()
            .try_fold(size, |acc, d| acc.checked_mul(*d))
            .ok_or(GlmError::InconsistentDim(0, self.dim[0]))
    }

    /// Retrieve the voxel-to-world affine, following the same precedence as
    /// common neuroimaging tools: sform, then qform, then a centered affine
    /// built from the voxel sizes.
    pub fn affine(&self) -> Affine4 {
        if self.sform_code > 0 {
            let mut affine = Affine4::identity();
            for (r, row) in [self.srow_x, self.srow_y, self.srow_z].iter().enumerate() {
                for (c, v) in row.iter().enumerate() {
                    affine[(r, c)] = *v;
                }
            }
            affine
        } else if self.qform_code > 0 {
            qform_to_affine(&self.qform_params())
        } else {
            let shape: Vec<usize> = self.dim[1..4].iter().map(|d| (*d).max(1) as usize).collect();
            shape_zoom_affine(&shape, &self.pixdim[1..4])
        }
    }

    /// Store the affine in both the sform and the qform fields,
    /// with the given coordinate codes.
    pub fn set_affine(&mut self, affine: &Affine4, code: XForm) {
        for c in 0..4 {
            self.srow_x[c] = affine[(0, c)];
            self.srow_y[c] = affine[(1, c)];
            self.srow_z[c] = affine[(2, c)];
        }
        let params = affine_to_qform(affine);
        self.quatern_b = params.bcd.x;
        self.quatern_c = params.bcd.y;
        self.quatern_d = params.bcd.z;
        self.quatern_x = params.offset.x;
        self.quatern_y = params.offset.y;
        self.quatern_z = params.offset.z;
        self.pixdim[0] = params.qfac;
        self.pixdim[1] = params.zooms.x;
        self.pixdim[2] = params.zooms.y;
        self.pixdim[3] = params.zooms.z;
        self.sform_code = code as i16;
        self.qform_code = code as i16;
    }

    fn qform_params(&self) -> QformParams {
        QformParams {
            bcd: Vector3::new(self.quatern_b, self.quatern_c, self.quatern_d),
            offset: Vector3::new(self.quatern_x, self.quatern_y, self.quatern_z),
            zooms: Vector3::new(self.pixdim[1], self.pixdim[2], self.pixdim[3]),
            qfac: self.pixdim[0],
        }
    }

    /// The `descrip` field up to its first null byte.
    pub fn description(&self) -> String {
        let end = self.descrip.iter().position(|b| *b == 0).unwrap_or(self.descrip.len());
        String::from_utf8_lossy(&self.descrip[..end]).into_owned()
    }

    /// Safely set the `descrip` field using a buffer.
    pub fn set_description(&mut self, description: &[u8]) -> Result<()> {
        let len = description.len();
        if len > 80 {
            return Err(GlmError::IncorrectDescriptionLength(len));
        }
        let mut descrip = vec![0; 80];
        descrip[..len].copy_from_slice(description);
        self.descrip = descrip;
        Ok(())
    }

    /// Safely set the `descrip` field using a &str.
    pub fn set_description_str(&mut self, description: &str) -> Result<()> {
        self.set_description(description.as_bytes())
    }
}

fn detect_version(sizeof_hdr: [u8; 4]) -> Result<(NiftiVersion, Endianness)> {
    let le = i32::from_le_bytes(sizeof_hdr);
    let be = i32::from_be_bytes(sizeof_hdr);
    match (le, be) {
        (NIFTI1_HEADER_SIZE, _) => Ok((NiftiVersion::Nifti1, Endianness::Little)),
        (NIFTI2_HEADER_SIZE, _) => Ok((NiftiVersion::Nifti2, Endianness::Little)),
        (_, NIFTI1_HEADER_SIZE) => Ok((NiftiVersion::Nifti1, Endianness::Big)),
        (_, NIFTI2_HEADER_SIZE) => Ok((NiftiVersion::Nifti2, Endianness::Big)),
        _ => Err(GlmError::InvalidFormat),
    }
}

fn parse_header_1<S: Read>(
    mut input: ByteOrdered<S, Endianness>,
    endianness: Endianness,
) -> Result<NiftiHeader> {
    let mut h = NiftiHeader {
        version: NiftiVersion::Nifti1,
        endianness,
        ..NiftiHeader::default()
    };

    // data_type, db_name, extents, session_error, regular
    let mut unused = [0u8; 35];
    input.read_exact(&mut unused)?;
    h.dim_info = input.read_u8()?;
    for v in &mut h.dim {
        *v = i64::from(input.read_i16()?);
    }
    h.intent_p1 = f64::from(input.read_f32()?);
    h.intent_p2 = f64::from(input.read_f32()?);
    h.intent_p3 = f64::from(input.read_f32()?);
    h.intent_code = i32::from(input.read_i16()?);
    h.datatype = input.read_i16()?;
    h.bitpix = input.read_i16()?;
    h.slice_start = i64::from(input.read_i16()?);
    for v in &mut h.pixdim {
        *v = f64::from(input.read_f32()?);
    }
    h.vox_offset = input.read_f32()? as i64;
    h.scl_slope = f64::from(input.read_f32()?);
    h.scl_inter = f64::from(input.read_f32()?);
    h.slice_end = i64::from(input.read_i16()?);
    h.slice_code = input.read_u8()?;
    h.xyzt_units = input.read_u8()?;
    h.cal_max = f64::from(input.read_f32()?);
    h.cal_min = f64::from(input.read_f32()?);
    h.slice_duration = f64::from(input.read_f32()?);
    h.toffset = f64::from(input.read_f32()?);
    // glmax, glmin
    let _ = input.read_i32()?;
    let _ = input.read_i32()?;

    input.read_exact(h.descrip.as_mut_slice())?;
    input.read_exact(&mut h.aux_file)?;
    h.qform_code = input.read_i16()?;
    h.sform_code = input.read_i16()?;
    h.quatern_b = f64::from(input.read_f32()?);
    h.quatern_c = f64::from(input.read_f32()?);
    h.quatern_d = f64::from(input.read_f32()?);
    h.quatern_x = f64::from(input.read_f32()?);
    h.quatern_y = f64::from(input.read_f32()?);
    h.quatern_z = f64::from(input.read_f32()?);
    for row in [&mut h.srow_x, &mut h.srow_y, &mut h.srow_z].iter_mut() {
        for v in row.iter_mut() {
            *v = f64::from(input.read_f32()?);
        }
    }
    input.read_exact(&mut h.intent_name)?;
    let mut magic = [0u8; 4];
    input.read_exact(&mut magic)?;

    if &magic == MAGIC_CODE_NI1 {
        Err(GlmError::NoVolumeData)
    } else if &magic != MAGIC_CODE_NIP1 {
        Err(GlmError::InvalidFormat)
    } else {
        Ok(h)
    }
}

fn parse_header_2<S: Read>(
    mut input: ByteOrdered<S, Endianness>,
    endianness: Endianness,
) -> Result<NiftiHeader> {
    let mut h = NiftiHeader {
        version: NiftiVersion::Nifti2,
        endianness,
        vox_offset: 544,
        ..NiftiHeader::default()
    };

    let mut magic = [0u8; 8];
    input.read_exact(&mut magic)?;
    if &magic == MAGIC_CODE_NI2 {
        return Err(GlmError::NoVolumeData);
    } else if &magic != MAGIC_CODE_NIP2 {
        return Err(GlmError::InvalidFormat);
    }

    h.datatype = input.read_i16()?;
    h.bitpix = input.read_i16()?;
    for v in &mut h.dim {
        *v = input.read_i64()?;
    }
    h.intent_p1 = input.read_f64()?;
    h.intent_p2 = input.read_f64()?;
    h.intent_p3 = input.read_f64()?;
    for v in &mut h.pixdim {
        *v = input.read_f64()?;
    }
    h.vox_offset = input.read_i64()?;
    h.scl_slope = input.read_f64()?;
    h.scl_inter = input.read_f64()?;
    h.cal_max = input.read_f64()?;
    h.cal_min = input.read_f64()?;
    h.slice_duration = input.read_f64()?;
    h.toffset = input.read_f64()?;
    h.slice_start = input.read_i64()?;
    h.slice_end = input.read_i64()?;
    input.read_exact(h.descrip.as_mut_slice())?;
    input.read_exact(&mut h.aux_file)?;
    h.qform_code = input.read_i32()? as i16;
    h.sform_code = input.read_i32()? as i16;
    h.quatern_b = input.read_f64()?;
    h.quatern_c = input.read_f64()?;
    h.quatern_d = input.read_f64()?;
    h.quatern_x = input.read_f64()?;
    h.quatern_y = input.read_f64()?;
    h.quatern_z = input.read_f64()?;
    for row in [&mut h.srow_x, &mut h.srow_y, &mut h.srow_z].iter_mut() {
        for v in row.iter_mut() {
            *v = input.read_f64()?;
        }
    }
    h.slice_code = input.read_i32()? as u8;
    h.xyzt_units = input.read_i32()? as u8;
    h.intent_code = input.read_i32()?;
    input.read_exact(&mut h.intent_name)?;
    h.dim_info = input.read_u8()?;
    let mut unused_str = [0u8; 15];
    input.read_exact(&mut unused_str)?;

    Ok(h)
}
