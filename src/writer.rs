//! Utility functions to write NIfTI images.
//!
//! Images are always written as single-file, little endian, 32-bit float
//! volumes. The header version (NIfTI-1 or NIfTI-2) is taken from the
//! reference header, which is how CIFTI-2 matrices end up in NIfTI-2 files.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteordered::{ByteOrdered, Endian};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::info;
use ndarray::{ArrayBase, Data, Dimension};

use crate::error::{GlmError, Result};
use crate::extension::ExtensionSequence;
use crate::header::{NiftiHeader, NiftiVersion, MAGIC_CODE_NIP1, MAGIC_CODE_NIP2};
use crate::typedef::NiftiType;
use crate::util::is_gz_file;

/// Options and flags which can be used to configure how a NIfTI image is written.
#[derive(Debug, Clone, PartialEq)]
pub struct WriterOptions<'a> {
    /// Where to write the output image.
    path: PathBuf,
    /// Header used to fill most of the output header's fields.
    header_reference: Option<&'a NiftiHeader>,
    /// Extensions written between the header and the data.
    extensions: ExtensionSequence,
}

impl<'a> WriterOptions<'a> {
    /// Creates a blank new set of options ready for configuration.
    pub fn new<P>(path: P) -> WriterOptions<'a>
    where
        P: AsRef<Path>,
    {
        WriterOptions {
            path: path.as_ref().to_owned(),
            header_reference: None,
            extensions: ExtensionSequence::default(),
        }
    }

    /// Sets a reference header. Its fields are copied into the output
    /// header, except `dim`, `datatype`, `bitpix`, `vox_offset` and the
    /// scaling parameters, which depend only on the written data.
    pub fn reference_header(mut self, header: &'a NiftiHeader) -> Self {
        self.header_reference = Some(header);
        self
    }

    /// Sets the extensions written after the header.
    pub fn with_extensions(mut self, extensions: ExtensionSequence) -> Self {
        self.extensions = extensions;
        self
    }

    /// Write a nifti file (.nii or .nii.gz).
    pub fn write_nifti<S, D>(&self, data: &ArrayBase<S, D>) -> Result<()>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let header = self.prepare_header(data.shape())?;

        let f = File::create(&self.path)?;
        let writer = BufWriter::new(f);
        if is_gz_file(&self.path) {
            let mut e = ByteOrdered::le(GzEncoder::new(writer, Compression::default()));
            write_header(&mut e, &header)?;
            self.extensions.write(&mut e)?;
            write_data(&mut e, data)?;
            e.into_inner().finish()?.flush()?;
        } else {
            let mut w = ByteOrdered::le(writer);
            write_header(&mut w, &header)?;
            self.extensions.write(&mut w)?;
            write_data(&mut w, data)?;
            w.into_inner().flush()?;
        }
        info!("wrote {}", self.path.display());
        Ok(())
    }

    fn prepare_header(&self, shape: &[usize]) -> Result<NiftiHeader> {
        let reference = match self.header_reference {
            Some(r) => r.clone(),
            None => NiftiHeader::default(),
        };
        let mut header = NiftiHeader {
            datatype: NiftiType::Float32 as i16,
            bitpix: 32,
            scl_slope: 1.,
            scl_inter: 0.,
            endianness: byteordered::Endianness::Little,
            // All other fields are copied from reference header
            ..reference
        };
        header.set_shape(shape)?;
        if header.version == NiftiVersion::Nifti1 {
            if let Some(d) = header.dim.iter().find(|d| **d > i64::from(i16::MAX)) {
                return Err(GlmError::InconsistentDim(0, *d));
            }
        }
        header.vox_offset =
            (header.version.header_size() + 4 + self.extensions.bytes_len()) as i64;
        Ok(header)
    }
}

fn write_header<W, E>(writer: &mut ByteOrdered<W, E>, header: &NiftiHeader) -> Result<()>
where
    W: Write,
    E: Endian,
{
    match header.version {
        NiftiVersion::Nifti1 => write_header_1(writer, header),
        NiftiVersion::Nifti2 => write_header_2(writer, header),
    }
}

fn write_header_1<W, E>(writer: &mut ByteOrdered<W, E>, header: &NiftiHeader) -> Result<()>
where
    W: Write,
    E: Endian,
{
    writer.write_i32(NiftiVersion::Nifti1.header_size() as i32)?;
    // data_type, db_name, extents, session_error
    writer.write_all(&[0u8; 34])?;
    writer.write_u8(b'r')?;
    writer.write_u8(header.dim_info)?;
    for s in &header.dim {
        writer.write_i16(*s as i16)?;
    }
    writer.write_f32(header.intent_p1 as f32)?;
    writer.write_f32(header.intent_p2 as f32)?;
    writer.write_f32(header.intent_p3 as f32)?;
    writer.write_i16(header.intent_code as i16)?;
    writer.write_i16(header.datatype)?;
    writer.write_i16(header.bitpix)?;
    writer.write_i16(header.slice_start as i16)?;
    for f in &header.pixdim {
        writer.write_f32(*f as f32)?;
    }
    writer.write_f32(header.vox_offset as f32)?;
    writer.write_f32(header.scl_slope as f32)?;
    writer.write_f32(header.scl_inter as f32)?;
    writer.write_i16(header.slice_end as i16)?;
    writer.write_u8(header.slice_code)?;
    writer.write_u8(header.xyzt_units)?;
    writer.write_f32(header.cal_max as f32)?;
    writer.write_f32(header.cal_min as f32)?;
    writer.write_f32(header.slice_duration as f32)?;
    writer.write_f32(header.toffset as f32)?;
    // glmax, glmin
    writer.write_i32(0)?;
    writer.write_i32(0)?;

    writer.write_all(&header.descrip)?;
    writer.write_all(&header.aux_file)?;
    writer.write_i16(header.qform_code)?;
    writer.write_i16(header.sform_code)?;
    for f in &[
        header.quatern_b,
        header.quatern_c,
        header.quatern_d,
        header.quatern_x,
        header.quatern_y,
        header.quatern_z,
    ] {
        writer.write_f32(*f as f32)?;
    }
    for f in header.srow_x.iter().chain(&header.srow_y).chain(&header.srow_z) {
        writer.write_f32(*f as f32)?;
    }
    writer.write_all(&header.intent_name)?;
    writer.write_all(MAGIC_CODE_NIP1)?;
    Ok(())
}

fn write_header_2<W, E>(writer: &mut ByteOrdered<W, E>, header: &NiftiHeader) -> Result<()>
where
    W: Write,
    E: Endian,
{
    writer.write_i32(NiftiVersion::Nifti2.header_size() as i32)?;
    writer.write_all(MAGIC_CODE_NIP2)?;
    writer.write_i16(header.datatype)?;
    writer.write_i16(header.bitpix)?;
    for s in &header.dim {
        writer.write_i64(*s)?;
    }
    writer.write_f64(header.intent_p1)?;
    writer.write_f64(header.intent_p2)?;
    writer.write_f64(header.intent_p3)?;
    for f in &header.pixdim {
        writer.write_f64(*f)?;
    }
    writer.write_i64(header.vox_offset)?;
    writer.write_f64(header.scl_slope)?;
    writer.write_f64(header.scl_inter)?;
    writer.write_f64(header.cal_max)?;
    writer.write_f64(header.cal_min)?;
    writer.write_f64(header.slice_duration)?;
    writer.write_f64(header.toffset)?;
    writer.write_i64(header.slice_start)?;
    writer.write_i64(header.slice_end)?;
    writer.write_all(&header.descrip)?;
    writer.write_all(&header.aux_file)?;
    writer.write_i32(i32::from(header.qform_code))?;
    writer.write_i32(i32::from(header.sform_code))?;
    for f in &[
        header.quatern_b,
        header.quatern_c,
        header.quatern_d,
        header.quatern_x,
        header.quatern_y,
        header.quatern_z,
    ] {
        writer.write_f64(*f)?;
    }
    for f in header.srow_x.iter().chain(&header.srow_y).chain(&header.srow_z) {
        writer.write_f64(*f)?;
    }
    writer.write_i32(i32::from(header.slice_code))?;
    writer.write_i32(i32::from(header.xyzt_units))?;
    writer.write_i32(header.intent_code)?;
    writer.write_all(&header.intent_name)?;
    writer.write_u8(header.dim_info)?;
    writer.write_all(&[0u8; 15])?;
    Ok(())
}

fn write_data<S, D, W, E>(writer: &mut ByteOrdered<W, E>, data: &ArrayBase<S, D>) -> Result<()>
where
    S: Data<Elem = f64>,
    D: Dimension,
    W: Write,
    E: Endian,
{
    // Reversing the axes makes the logical iteration order match the
    // column major layout of the file.
    for v in data.t().iter() {
        writer.write_f32(*v as f32)?;
    }
    Ok(())
}
