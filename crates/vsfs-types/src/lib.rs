#![forbid(unsafe_code)]
//! Shared types for the VSFS consistency checker.
//!
//! VSFS is a fixed-geometry, single-image file system: one 64-block image
//! with a superblock, one inode bitmap block, one data bitmap block, and a
//! contiguous inode table. The constants below are the only geometry profile
//! this tool understands; the superblock validator compares every persisted
//! field against them.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const VSFS_MAGIC: u16 = 0xD34D;
pub const VSFS_BLOCK_SIZE: u32 = 4096;
pub const VSFS_TOTAL_BLOCKS: u32 = 64;
pub const VSFS_INODE_BITMAP_BLOCK: u32 = 1;
pub const VSFS_DATA_BITMAP_BLOCK: u32 = 2;
pub const VSFS_INODE_TABLE_START: u32 = 3;
pub const VSFS_DATA_BLOCK_START: u32 = 8;
pub const VSFS_INODE_SIZE: u32 = 256;
pub const VSFS_INODE_COUNT: u32 = 80;

/// Direct block pointers per inode.
pub const VSFS_DIRECT_POINTERS: usize = 12;

/// Entries in one indirect block (`block_size / 4`).
pub const VSFS_INDIRECT_ENTRIES: usize = (VSFS_BLOCK_SIZE as usize) / 4;

/// Block number within the image, in `[0, VSFS_TOTAL_BLOCKS)` when valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockNumber(pub u32);

/// Index into the inode table, in `[0, VSFS_INODE_COUNT)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InodeIndex(pub u32);

impl BlockNumber {
    /// Byte offset of the start of this block.
    #[must_use]
    pub fn byte_offset(self) -> u64 {
        u64::from(self.0) * u64::from(VSFS_BLOCK_SIZE)
    }
}

impl fmt::Display for BlockNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for InodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("insufficient data: need {needed} bytes at offset {offset}, got {actual}")]
    InsufficientData {
        needed: usize,
        offset: usize,
        actual: usize,
    },
    #[error("invalid field: {field} ({reason})")]
    InvalidField {
        field: &'static str,
        reason: &'static str,
    },
}

/// Borrow `len` bytes at `offset`, or fail with the shortfall.
pub fn ensure_slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8], ParseError> {
    let Some(end) = offset.checked_add(len) else {
        return Err(ParseError::InvalidField {
            field: "offset",
            reason: "overflow",
        });
    };

    if end > data.len() {
        return Err(ParseError::InsufficientData {
            needed: len,
            offset,
            actual: data.len().saturating_sub(offset),
        });
    }

    Ok(&data[offset..end])
}

#[inline]
pub fn read_le_u16(data: &[u8], offset: usize) -> Result<u16, ParseError> {
    let bytes = ensure_slice(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

#[inline]
pub fn read_le_u32(data: &[u8], offset: usize) -> Result<u32, ParseError> {
    let bytes = ensure_slice(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

#[inline]
pub fn write_le_u16(data: &mut [u8], offset: usize, value: u16) {
    data[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

#[inline]
pub fn write_le_u32(data: &mut [u8], offset: usize, value: u32) {
    data[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
