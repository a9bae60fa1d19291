//! Vector file format
//!
//! ```text
//! magic("XMVI", 4) + version(4) + dimension(4) + count(8)
//! + count * dimension * f32 LE
//! + crc32(4) over every preceding byte
//! ```
//!
//! Vectors are written in ordinal order, so row `i` of the matrix is the
//! vector with ordinal `i`.

use std::io::{self, Write};

use byteorder::{ByteOrder, LittleEndian, WriteBytesExt};

use super::{check_prefix, FormatError};

/// Magic bytes for vector files
pub const VECTOR_FILE_MAGIC: &[u8; 4] = b"XMVI";

/// Current vector file version
pub const VECTOR_FILE_VERSION: u32 = 1;

/// Bytes before the first vector
pub const VECTOR_FILE_HEADER_SIZE: usize = 20;

const TRAILER_SIZE: usize = 4;

/// Decoded vector file
#[derive(Debug, Clone, PartialEq)]
pub struct VectorFile {
    /// Components per vector
    pub dimension: usize,
    /// Number of vectors
    pub count: usize,
    /// Row-major `count * dimension` matrix
    pub data: Vec<f32>,
}

/// Writer adapter feeding every byte through a CRC32 hasher
struct CrcWriter<'a, W: Write> {
    inner: &'a mut W,
    hasher: crc32fast::Hasher,
}

impl<W: Write> Write for CrcWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.hasher.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Stream a vector file to `writer`
///
/// `data.len()` must be a multiple of `dimension`.
pub fn write_vector_file<W: Write>(
    writer: &mut W,
    dimension: usize,
    data: &[f32],
) -> io::Result<()> {
    if dimension == 0 || data.len() % dimension != 0 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!(
                "{} floats do not form rows of dimension {}",
                data.len(),
                dimension
            ),
        ));
    }
    let dim = u32::try_from(dimension).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("dimension {dimension} exceeds u32"),
        )
    })?;
    let count = (data.len() / dimension) as u64;

    let mut crc = CrcWriter {
        inner: writer,
        hasher: crc32fast::Hasher::new(),
    };
    crc.write_all(VECTOR_FILE_MAGIC)?;
    crc.write_u32::<LittleEndian>(VECTOR_FILE_VERSION)?;
    crc.write_u32::<LittleEndian>(dim)?;
    crc.write_u64::<LittleEndian>(count)?;

    let mut row = vec![0u8; dimension * 4];
    for chunk in data.chunks_exact(dimension) {
        LittleEndian::write_f32_into(chunk, &mut row);
        crc.write_all(&row)?;
    }

    let checksum = crc.hasher.finalize();
    crc.inner.write_u32::<LittleEndian>(checksum)
}

/// Decode a complete vector file
pub fn decode_vector_file(bytes: &[u8]) -> Result<VectorFile, FormatError> {
    if bytes.len() < VECTOR_FILE_HEADER_SIZE + TRAILER_SIZE {
        return Err(FormatError::LengthMismatch {
            expected: (VECTOR_FILE_HEADER_SIZE + TRAILER_SIZE) as u64,
            actual: bytes.len() as u64,
        });
    }
    let rest = check_prefix(bytes, VECTOR_FILE_MAGIC, VECTOR_FILE_VERSION)?;
    let dimension = LittleEndian::read_u32(&rest[0..4]) as u64;
    let count = LittleEndian::read_u64(&rest[4..12]);

    let expected = count
        .checked_mul(dimension)
        .and_then(|floats| floats.checked_mul(4))
        .and_then(|payload| payload.checked_add((VECTOR_FILE_HEADER_SIZE + TRAILER_SIZE) as u64))
        .ok_or_else(|| {
            FormatError::Decode(format!(
                "header overflows: count {count}, dimension {dimension}"
            ))
        })?;
    if expected != bytes.len() as u64 {
        return Err(FormatError::LengthMismatch {
            expected,
            actual: bytes.len() as u64,
        });
    }
    if dimension == 0 {
        return Err(FormatError::Decode("dimension is zero".to_string()));
    }

    let body_end = bytes.len() - TRAILER_SIZE;
    let stored = LittleEndian::read_u32(&bytes[body_end..]);
    let computed = crc32fast::hash(&bytes[..body_end]);
    if stored != computed {
        return Err(FormatError::ChecksumMismatch { stored, computed });
    }

    let payload = &bytes[VECTOR_FILE_HEADER_SIZE..body_end];
    let mut data = vec![0f32; payload.len() / 4];
    LittleEndian::read_f32_into(payload, &mut data);

    Ok(VectorFile {
        dimension: dimension as usize,
        count: count as usize,
        data,
    })
}
