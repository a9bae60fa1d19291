//! On-disk byte formats for collection files
//!
//! - `vector_file`: raw f32 matrix with header and CRC32 trailer
//! - `catalog_file`: MessagePack-encoded item records
//!
//! Both formats start with a 4-byte magic and a u32 LE version so a file
//! written by a different producer is rejected before any decoding.

pub mod catalog_file;
pub mod vector_file;

pub use catalog_file::{
    decode_catalog_file, write_catalog_file, CatalogFile, CatalogFileRef, CATALOG_FILE_MAGIC,
    CATALOG_FILE_VERSION,
};
pub use vector_file::{
    decode_vector_file, write_vector_file, VectorFile, VECTOR_FILE_HEADER_SIZE,
    VECTOR_FILE_MAGIC, VECTOR_FILE_VERSION,
};

use thiserror::Error;

/// Errors decoding a collection file
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    /// Magic bytes do not match
    #[error("bad magic: expected {expected:?}, found {found:?}")]
    BadMagic {
        /// Expected magic
        expected: [u8; 4],
        /// Magic found in the file
        found: [u8; 4],
    },

    /// Version not understood by this build
    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    /// File is shorter or longer than its header claims
    #[error("length mismatch: header implies {expected} bytes, file has {actual}")]
    LengthMismatch {
        /// Length implied by the header
        expected: u64,
        /// Actual length
        actual: u64,
    },

    /// Stored checksum does not match the contents
    #[error("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    ChecksumMismatch {
        /// Checksum in the trailer
        stored: u32,
        /// Checksum of the contents
        computed: u32,
    },

    /// Payload could not be decoded
    #[error("decode failed: {0}")]
    Decode(String),
}

/// Split a 4-byte magic + u32 LE version prefix off `bytes`
pub(crate) fn check_prefix<'a>(
    bytes: &'a [u8],
    magic: &[u8; 4],
    version: u32,
) -> Result<&'a [u8], FormatError> {
    use byteorder::{ByteOrder, LittleEndian};

    if bytes.len() < 8 {
        return Err(FormatError::LengthMismatch {
            expected: 8,
            actual: bytes.len() as u64,
        });
    }
    let mut found = [0u8; 4];
    found.copy_from_slice(&bytes[..4]);
    if &found != magic {
        return Err(FormatError::BadMagic {
            expected: *magic,
            found,
        });
    }
    let file_version = LittleEndian::read_u32(&bytes[4..8]);
    if file_version != version {
        return Err(FormatError::UnsupportedVersion(file_version));
    }
    Ok(&bytes[8..])
}
