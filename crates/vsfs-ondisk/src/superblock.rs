use serde::{Deserialize, Serialize};
use vsfs_types::{ParseError, read_le_u16, read_le_u32, write_le_u16, write_le_u32};

// Field offsets within block 0. The original on-disk layout aligns the
// first u32 to offset 4, leaving two padding bytes after the u16 magic;
// those bytes and everything from offset 36 on are opaque and preserved.
const OFF_MAGIC: usize = 0;
const OFF_BLOCK_SIZE: usize = 4;
const OFF_TOTAL_BLOCKS: usize = 8;
const OFF_INODE_BITMAP_BLOCK: usize = 12;
const OFF_DATA_BITMAP_BLOCK: usize = 16;
const OFF_INODE_TABLE_START: usize = 20;
const OFF_DATA_BLOCK_START: usize = 24;
const OFF_INODE_SIZE: usize = 28;
const OFF_INODE_COUNT: usize = 32;

/// Superblock fields as persisted in block 0.
///
/// Loaded once per run; only the repair engine mutates it, and it is
/// persisted at most once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Superblock {
    pub magic: u16,
    pub block_size: u32,
    pub total_blocks: u32,
    pub inode_bitmap_block: u32,
    pub data_bitmap_block: u32,
    pub inode_table_start: u32,
    pub data_block_start: u32,
    pub inode_size: u32,
    pub inode_count: u32,
}

impl Superblock {
    /// Parse the superblock from a full block-0 buffer.
    pub fn parse(block: &[u8]) -> Result<Self, ParseError> {
        Ok(Self {
            magic: read_le_u16(block, OFF_MAGIC)?,
            block_size: read_le_u32(block, OFF_BLOCK_SIZE)?,
            total_blocks: read_le_u32(block, OFF_TOTAL_BLOCKS)?,
            inode_bitmap_block: read_le_u32(block, OFF_INODE_BITMAP_BLOCK)?,
            data_bitmap_block: read_le_u32(block, OFF_DATA_BITMAP_BLOCK)?,
            inode_table_start: read_le_u32(block, OFF_INODE_TABLE_START)?,
            data_block_start: read_le_u32(block, OFF_DATA_BLOCK_START)?,
            inode_size: read_le_u32(block, OFF_INODE_SIZE)?,
            inode_count: read_le_u32(block, OFF_INODE_COUNT)?,
        })
    }

    /// Write the field bytes into `block`, leaving padding and reserved
    /// bytes exactly as the caller loaded them.
    ///
    /// `block` must be at least 36 bytes (in practice the full 4096-byte
    /// block-0 buffer).
    pub fn encode_into(&self, block: &mut [u8]) {
        write_le_u16(block, OFF_MAGIC, self.magic);
        write_le_u32(block, OFF_BLOCK_SIZE, self.block_size);
        write_le_u32(block, OFF_TOTAL_BLOCKS, self.total_blocks);
        write_le_u32(block, OFF_INODE_BITMAP_BLOCK, self.inode_bitmap_block);
        write_le_u32(block, OFF_DATA_BITMAP_BLOCK, self.data_bitmap_block);
        write_le_u32(block, OFF_INODE_TABLE_START, self.inode_table_start);
        write_le_u32(block, OFF_DATA_BLOCK_START, self.data_block_start);
        write_le_u32(block, OFF_INODE_SIZE, self.inode_size);
        write_le_u32(block, OFF_INODE_COUNT, self.inode_count);
    }
}
