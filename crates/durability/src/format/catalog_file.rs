//! Metadata (catalog) file format
//!
//! ```text
//! magic("XMMD", 4) + version(4) + MessagePack body
//! ```
//!
//! The body is a `CatalogFile` encoded with named fields so records stay
//! readable by tools that only know the field names.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use xmodal_core::ItemRecord;

use super::{check_prefix, FormatError};

/// Magic bytes for metadata files
pub const CATALOG_FILE_MAGIC: &[u8; 4] = b"XMMD";

/// Current metadata file version
pub const CATALOG_FILE_VERSION: u32 = 1;

/// Decoded metadata file
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CatalogFile {
    /// Version of the record layout
    pub format_version: u32,
    /// Dimension of the paired vector file
    pub dimension: usize,
    /// Number of records, checked against `records.len()`
    pub total_items: usize,
    /// When the pair was written
    pub last_updated: DateTime<Utc>,
    /// Records in ordinal order
    pub records: Vec<ItemRecord>,
}

/// Borrowed view used when writing
#[derive(Debug, Serialize)]
pub struct CatalogFileRef<'a> {
    /// Version of the record layout
    pub format_version: u32,
    /// Dimension of the paired vector file
    pub dimension: usize,
    /// Number of records
    pub total_items: usize,
    /// When the pair was written
    pub last_updated: DateTime<Utc>,
    /// Records in ordinal order
    pub records: &'a [ItemRecord],
}

impl<'a> CatalogFileRef<'a> {
    /// View over `records` stamped with `last_updated`
    pub fn new(dimension: usize, records: &'a [ItemRecord], last_updated: DateTime<Utc>) -> Self {
        CatalogFileRef {
            format_version: CATALOG_FILE_VERSION,
            dimension,
            total_items: records.len(),
            last_updated,
            records,
        }
    }
}

/// Stream a metadata file to `writer`
pub fn write_catalog_file<W: Write>(writer: &mut W, file: &CatalogFileRef<'_>) -> io::Result<()> {
    writer.write_all(CATALOG_FILE_MAGIC)?;
    writer.write_u32::<LittleEndian>(CATALOG_FILE_VERSION)?;
    rmp_serde::encode::write_named(writer, file)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))
}

/// Decode a complete metadata file
pub fn decode_catalog_file(bytes: &[u8]) -> Result<CatalogFile, FormatError> {
    let body = check_prefix(bytes, CATALOG_FILE_MAGIC, CATALOG_FILE_VERSION)?;
    let file: CatalogFile =
        rmp_serde::from_slice(body).map_err(|e| FormatError::Decode(e.to_string()))?;
    if file.format_version != CATALOG_FILE_VERSION {
        return Err(FormatError::UnsupportedVersion(file.format_version));
    }
    if file.total_items != file.records.len() {
        return Err(FormatError::Decode(format!(
            "total_items is {} but {} records are present",
            file.total_items,
            file.records.len()
        )));
    }
    Ok(file)
}
