//! This module contains definitions for the extension and related types.
//! Extensions are optional data frames sitting between the header and the
//! voxel data. When present, an extender frame of 4 bytes follows the
//! header, with the first byte set to something other than 0.
//!
//! CIFTI-2 files keep their XML document in an extension with code 32.

use crate::error::{GlmError, Result};
use byteordered::{ByteOrdered, Endian};
use std::io::{ErrorKind as IoErrorKind, Read, Write};

/// Extension code of the CIFTI-2 XML document.
pub const CIFTI_EXTENSION_CODE: i32 = 32;

/// Data type for the extender code.
#[derive(Debug, Default, PartialEq, Clone, Copy)]
pub struct Extender([u8; 4]);

impl Extender {
    /// Fetch the extender code from the given source, while
    /// being possible to not be available.
    /// Returns `None` if the source reaches EoF prematurely.
    /// Any other I/O error is delegated to a `GlmError`.
    pub fn from_reader_optional<S: Read>(mut source: S) -> Result<Option<Self>> {
        let mut extension = [0u8; 4];
        match source.read_exact(&mut extension) {
            Ok(()) => Ok(Some(extension.into())),
            Err(ref e) if e.kind() == IoErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(GlmError::from(e)),
        }
    }

    /// Whether extensions should exist upon this extender code.
    pub fn has_extensions(&self) -> bool {
        self.0[0] != 0
    }

    /// Get the extender's bytes
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl From<[u8; 4]> for Extender {
    fn from(extender: [u8; 4]) -> Self {
        Extender(extender)
    }
}

/// Data type for the raw contents of an extension.
/// Users of this type have to reinterpret the data
/// to suit their needs.
#[derive(Debug, PartialEq, Clone)]
pub struct Extension {
    esize: i32,
    ecode: i32,
    edata: Vec<u8>,
}

impl Extension {
    /// Create an extension from its code and data. The data is padded with
    /// zeros so that the full extension size is a multiple of 16 bytes.
    pub fn new(ecode: i32, mut edata: Vec<u8>) -> Self {
        let padded = (edata.len() + 8 + 15) / 16 * 16;
        edata.resize(padded - 8, 0);
        Extension {
            esize: padded as i32,
            ecode,
            edata,
        }
    }

    /// Create a CIFTI-2 extension holding the given XML document.
    pub fn cifti(xml: &str) -> Self {
        Extension::new(CIFTI_EXTENSION_CODE, xml.as_bytes().to_vec())
    }

    /// Obtain the claimed extension raw size (`esize` field).
    pub fn size(&self) -> i32 {
        self.esize
    }

    /// Obtain the extension's code (`ecode` field).
    pub fn code(&self) -> i32 {
        self.ecode
    }

    /// Obtain the extension's data (`edata` field).
    pub fn data(&self) -> &[u8] {
        &self.edata
    }

    /// The extension's data as text, without trailing padding.
    pub fn text(&self) -> String {
        let end = self
            .edata
            .iter()
            .rposition(|b| *b != 0)
            .map(|i| i + 1)
            .unwrap_or(0);
        String::from_utf8_lossy(&self.edata[..end]).into_owned()
    }
}

/// Data type for aggregating the extender code and
/// all extensions.
#[derive(Debug, Default, PartialEq, Clone)]
pub struct ExtensionSequence {
    extender: Extender,
    extensions: Vec<Extension>,
}

impl<'a> IntoIterator for &'a ExtensionSequence {
    type Item = &'a Extension;
    type IntoIter = ::std::slice::Iter<'a, Extension>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl ExtensionSequence {
    /// Create a new extension sequence. The extender flag is set
    /// whenever there is at least one extension.
    pub fn new(extensions: Vec<Extension>) -> Self {
        let extender = if extensions.is_empty() {
            Extender::default()
        } else {
            Extender::from([1, 0, 0, 0])
        };
        ExtensionSequence {
            extender,
            extensions,
        }
    }

    /// Read a sequence of extensions from a source, up until `len` bytes.
    pub fn from_reader<S, E>(
        extender: Extender,
        source: &mut ByteOrdered<S, E>,
        len: usize,
    ) -> Result<Self>
    where
        S: Read,
        E: Endian,
    {
        let mut extensions = Vec::new();
        if extender.has_extensions() {
            let mut offset = 0;
            while offset + 8 <= len {
                let esize = source.read_i32()?;
                let ecode = source.read_i32()?;
                if esize < 8 || offset + esize as usize > len {
                    return Err(GlmError::InvalidExtensionSize(esize));
                }
                let mut edata = Vec::new();
                let wanted = esize as usize - 8;
                if (&mut *source).take(wanted as u64).read_to_end(&mut edata)? != wanted {
                    return Err(GlmError::InvalidExtensionSize(esize));
                }
                extensions.push(Extension {
                    esize,
                    ecode,
                    edata,
                });
                offset += esize as usize;
            }
        }

        Ok(ExtensionSequence {
            extender,
            extensions,
        })
    }

    /// Write the extender code followed by every extension.
    pub fn write<W, E>(&self, sink: &mut ByteOrdered<W, E>) -> Result<()>
    where
        W: Write,
        E: Endian,
    {
        sink.write_all(self.extender.as_bytes())?;
        for extension in &self.extensions {
            sink.write_i32(extension.esize)?;
            sink.write_i32(extension.ecode)?;
            sink.write_all(&extension.edata)?;
        }
        Ok(())
    }

    /// Obtain an iterator to the extensions.
    pub fn iter(&self) -> ::std::slice::Iter<Extension> {
        self.extensions.iter()
    }

    /// Whether the sequence of extensions is empty.
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Obtain the number of extensions available.
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Get the extender code from this extension sequence.
    pub fn extender(&self) -> Extender {
        self.extender
    }

    /// Number of bytes taken by the extensions, not counting the extender.
    pub fn bytes_len(&self) -> usize {
        self.extensions.iter().map(|e| e.esize as usize).sum()
    }

    /// The CIFTI-2 XML document, if present.
    pub fn cifti_xml(&self) -> Option<String> {
        self.extensions
            .iter()
            .find(|e| e.ecode == CIFTI_EXTENSION_CODE)
            .map(Extension::text)
    }
}
