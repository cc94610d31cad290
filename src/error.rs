//! Types for error handling go here.

use crate::typedef::NiftiType;
use std::io::Error as IOError;
use std::path::PathBuf;

quick_error! {
    /// Error type for all error variants originated by this crate.
    #[derive(Debug)]
    pub enum GlmError {
        /// Invalid NIfTI file
        InvalidFormat {
            display("Invalid NIfTI file")
        }
        /// An invalid header field value was found.
        InvalidCode(typename: &'static str, code: i64) {
            display("invalid code `{}` for header field {}", code, typename)
        }
        /// Inconsistent or unsupported volume dimensions.
        InconsistentDim(index: u8, value: i64) {
            display("Inconsistent value `{}` in header field dim[{}]", value, index)
        }
        /// The header describes a file pair, which is not supported.
        NoVolumeData {
            display("No volume data available in single-file NIfTI")
        }
        /// The volume's data type cannot be converted to floating point values.
        UnsupportedDataType(t: NiftiType) {
            display("Data type {:?} is not supported", t)
        }
        /// Description length must be lower than or equal to 80 bytes
        IncorrectDescriptionLength(len: usize) {
            display("Description length ({} bytes) is greater than 80 bytes.", len)
        }
        /// An extension frame claims an impossible size.
        InvalidExtensionSize(esize: i32) {
            display("Invalid extension size {}", esize)
        }
        /// A CIFTI file has no CIFTI-2 XML extension, or the XML lacks a required element.
        MissingCiftiMetadata(what: &'static str) {
            display("CIFTI metadata is missing: {}", what)
        }
        /// A required input file does not exist.
        MissingFile(role: &'static str, path: PathBuf) {
            display("{} file does not exist: {}", role, path.display())
        }
        /// The file name does not match the format requested on the command line.
        FormatMismatch(role: &'static str, path: PathBuf, expected: &'static str) {
            display("Expecting {} image for {}: {}", expected, role, path.display())
        }
        /// Two images do not occupy the same geometric space.
        NotSameSpace(role: &'static str, path: PathBuf) {
            display("Input and {} are not in the same space: {}", role, path.display())
        }
        /// The mask cannot be applied to the data.
        MaskShape(mask: Vec<usize>, data: Vec<usize>) {
            display("Mask of shape {:?} cannot index data of shape {:?}", mask, data)
        }
        /// The mask does not select any grid location.
        EmptyMask {
            display("Mask does not include any location")
        }
        /// The response and design matrices disagree on the number of samples.
        RowMismatch(response: usize, design: usize) {
            display("Shape mismatch: response has {} rows but design has {}", response, design)
        }
        /// The singular value decomposition did not produce its factors.
        Decomposition {
            display("Singular value decomposition failed")
        }
        /// A numeric text table could not be parsed.
        InvalidTable(path: PathBuf, line: usize, reason: String) {
            display("{}:{}: {}", path.display(), line, reason)
        }
        /// The motion parameter table is not a six-column table.
        MotionColumns(path: PathBuf, found: usize) {
            display("File: {}, expected 6 columns but found {}", path.display(), found)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            source(err)
            display("{}", err)
        }
    }
}

/// Alias type for results originated from this crate.
pub type Result<T> = ::std::result::Result<T, GlmError>;
