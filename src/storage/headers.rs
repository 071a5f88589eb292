//! # Matrix File Headers
//!
//! Fixed-layout structures at the start of every matrix file, parsed with
//! zerocopy directly from mapped bytes.
//!
//! ## Dense File
//!
//! ```text
//! Offset  Size          Field
//! 0       4             magic (0x00ABCCBA)
//! 4       4             minValue (f32)
//! 8       4             maxValue (f32)
//! 12      4             numRows (u32)
//! 16      12 × numRows  row table: [rowId i32][offset u64]
//! ..      4             numCols (u32)
//! ..      4 × numCols   column ids (i32)
//! ..                    row bodies at the recorded offsets
//! ```
//!
//! ## Sparse File
//!
//! Identical up to the end of the row table (magic 0x00ABCDEF); there is no
//! column section because sparse rows carry their own column ids.
//!
//! All fields are little-endian. Offsets are absolute file positions.

use std::path::Path;

use eyre::{bail, Result};
use zerocopy::little_endian::{F32, I32, U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::config::{MATRIX_HEADER_SIZE, ROW_TABLE_ENTRY_SIZE};
use crate::encoding::ValueConf;
use crate::error::MatrixError;
use crate::{ColId, RowId};

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct MatrixFileHeader {
    magic: U32,
    min_value: F32,
    max_value: F32,
    num_rows: U32,
}

const _: () = assert!(std::mem::size_of::<MatrixFileHeader>() == MATRIX_HEADER_SIZE);

impl MatrixFileHeader {
    pub fn new(magic: u32, vconf: &ValueConf, num_rows: u32) -> Self {
        Self {
            magic: U32::new(magic),
            min_value: F32::new(vconf.min()),
            max_value: F32::new(vconf.max()),
            num_rows: U32::new(num_rows),
        }
    }

    /// Parses the fixed header and checks the magic number.
    pub fn parse<'a>(bytes: &'a [u8], expected_magic: u32, path: &Path) -> Result<&'a Self> {
        if bytes.len() < MATRIX_HEADER_SIZE {
            bail!(MatrixError::invalid_format(
                path,
                format!(
                    "file has {} bytes, smaller than the {} byte header",
                    bytes.len(),
                    MATRIX_HEADER_SIZE
                )
            ));
        }

        let header = Self::ref_from_bytes(&bytes[..MATRIX_HEADER_SIZE])
            .map_err(|e| eyre::eyre!("failed to parse MatrixFileHeader: {:?}", e))?;

        if header.magic() != expected_magic {
            bail!(MatrixError::invalid_format(
                path,
                format!(
                    "invalid file header 0x{:08X} (expected 0x{:08X})",
                    header.magic(),
                    expected_magic
                )
            ));
        }

        Ok(header)
    }

    pub fn value_conf(&self) -> Result<ValueConf> {
        ValueConf::new(self.min_value(), self.max_value())
    }

    /// Byte length of the fixed header plus the row table.
    pub fn row_table_end(&self) -> u64 {
        MATRIX_HEADER_SIZE as u64 + self.num_rows() as u64 * ROW_TABLE_ENTRY_SIZE as u64
    }

    zerocopy_accessors! {
        magic: u32,
        min_value: f32,
        max_value: f32,
        num_rows: u32,
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout, Unaligned)]
pub struct RowTableEntry {
    row_id: I32,
    offset: U64,
}

const _: () = assert!(std::mem::size_of::<RowTableEntry>() == ROW_TABLE_ENTRY_SIZE);

impl RowTableEntry {
    pub fn new(row_id: RowId, offset: u64) -> Self {
        Self {
            row_id: I32::new(row_id),
            offset: U64::new(offset),
        }
    }

    zerocopy_accessors! {
        row_id: i32,
        offset: u64,
    }
}

/// Views `bytes` as a packed row table of exactly `count` entries.
pub fn parse_row_table<'a>(bytes: &'a [u8], count: usize, path: &Path) -> Result<&'a [RowTableEntry]> {
    let len = count * ROW_TABLE_ENTRY_SIZE;
    if bytes.len() < len {
        bail!(MatrixError::invalid_format(
            path,
            format!(
                "row table of {} entries needs {} bytes, found {}",
                count,
                len,
                bytes.len()
            )
        ));
    }
    <[RowTableEntry]>::ref_from_bytes(&bytes[..len])
        .map_err(|e| eyre::eyre!("failed to parse row table: {:?}", e))
}

/// Parses the dense column section: `[numCols u32][colIds i32 × numCols]`.
pub fn parse_col_ids(bytes: &[u8], path: &Path) -> Result<Vec<ColId>> {
    if bytes.len() < 4 {
        bail!(MatrixError::invalid_format(path, "missing column count"));
    }
    let count = U32::read_from_bytes(&bytes[..4])
        .map_err(|e| eyre::eyre!("failed to parse column count: {:?}", e))?
        .get() as usize;

    let len = 4 * count;
    let body = &bytes[4..];
    if body.len() < len {
        bail!(MatrixError::invalid_format(
            path,
            format!(
                "column list of {} ids needs {} bytes, found {}",
                count,
                len,
                body.len()
            )
        ));
    }
    let ids = <[I32]>::ref_from_bytes(&body[..len])
        .map_err(|e| eyre::eyre!("failed to parse column ids: {:?}", e))?;

    Ok(ids.iter().map(|id| id.get()).collect())
}

/// Byte length of a dense column section holding `count` ids.
pub fn col_section_len(count: usize) -> u64 {
    4 + 4 * count as u64
}
