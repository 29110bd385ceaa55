use vsfs_block::{ByteDevice, read_block, write_block};
use vsfs_error::{FsckError, Result};
use vsfs_ondisk::{Bitmap, Inode, Superblock, encode_indirect_block, parse_indirect_block};
use vsfs_types::{BlockNumber, VSFS_BLOCK_SIZE, VSFS_INODE_COUNT, VSFS_INODE_SIZE};

/// All persisted metadata for one check/repair run.
///
/// Owned for the duration of a single run and discarded at its end; nothing
/// survives across runs. Loading performs no validation — a corrupt image
/// loads cleanly into a corrupt model, and the checkers do the judging.
///
/// The raw superblock block and inode-table bytes are retained so that
/// alignment padding and reserved regions are written back verbatim.
pub struct FsckContext<'d> {
    device: &'d dyn ByteDevice,
    pub superblock: Superblock,
    pub inode_bitmap: Bitmap,
    pub data_bitmap: Bitmap,
    pub inodes: Vec<Inode>,
    sb_block: Vec<u8>,
    table_bytes: Vec<u8>,
}

fn corruption(block: u32, err: vsfs_types::ParseError) -> FsckError {
    FsckError::Corruption {
        block,
        detail: err.to_string(),
    }
}

impl<'d> FsckContext<'d> {
    /// Load the superblock, both bitmaps, and the full inode table.
    ///
    /// The bitmap blocks and the table start come from the loaded — possibly
    /// corrupt — superblock, as the on-disk format dictates; record sizes
    /// and counts are the fixed geometry constants. A bitmap block index
    /// pointing outside the image is a fatal I/O error, not a finding.
    pub fn load(device: &'d dyn ByteDevice) -> Result<Self> {
        let sb_block = read_block(device, BlockNumber(0))?;
        let superblock = Superblock::parse(&sb_block).map_err(|e| corruption(0, e))?;

        let inode_bitmap = Bitmap::new(read_block(device, BlockNumber(superblock.inode_bitmap_block))?);
        let data_bitmap = Bitmap::new(read_block(device, BlockNumber(superblock.data_bitmap_block))?);

        let table_len = (VSFS_INODE_COUNT * VSFS_INODE_SIZE) as usize;
        let table_offset = BlockNumber(superblock.inode_table_start).byte_offset();
        let mut table_bytes = vec![0u8; table_len];
        device.read_exact_at(table_offset, &mut table_bytes)?;

        let mut inodes = Vec::with_capacity(VSFS_INODE_COUNT as usize);
        for idx in 0..VSFS_INODE_COUNT as usize {
            let record = &table_bytes[idx * VSFS_INODE_SIZE as usize..(idx + 1) * VSFS_INODE_SIZE as usize];
            inodes.push(Inode::parse(record).map_err(|e| corruption(superblock.inode_table_start, e))?);
        }

        Ok(Self {
            device,
            superblock,
            inode_bitmap,
            data_bitmap,
            inodes,
            sb_block,
            table_bytes,
        })
    }

    /// Read and decode the indirect block at `block`.
    ///
    /// Callers must have range-checked `block` first; the bad-block rule is
    /// that an out-of-range indirect pointer's contents are never read.
    pub fn read_indirect(&self, block: u32) -> Result<Vec<u32>> {
        let bytes = read_block(self.device, BlockNumber(block))?;
        parse_indirect_block(&bytes).map_err(|e| corruption(block, e))
    }

    /// Write indirect entries back to `block`.
    pub fn write_indirect(&self, block: u32, entries: &[u32]) -> Result<()> {
        let mut bytes = vec![0u8; VSFS_BLOCK_SIZE as usize];
        encode_indirect_block(entries, &mut bytes);
        write_block(self.device, BlockNumber(block), &bytes)
    }

    /// Persist the superblock, both bitmaps, and the full inode table, in
    /// that order, as independent writes.
    ///
    /// There is no atomicity across the three writes: a failure in between
    /// leaves the image partially repaired and possibly still inconsistent.
    /// The re-check pass after repair is what surfaces such a state.
    pub fn persist(&mut self) -> Result<()> {
        self.superblock.encode_into(&mut self.sb_block);
        write_block(self.device, BlockNumber(0), &self.sb_block)?;

        write_block(
            self.device,
            BlockNumber(self.superblock.inode_bitmap_block),
            self.inode_bitmap.as_bytes(),
        )?;
        write_block(
            self.device,
            BlockNumber(self.superblock.data_bitmap_block),
            self.data_bitmap.as_bytes(),
        )?;

        for (idx, inode) in self.inodes.iter().enumerate() {
            let record =
                &mut self.table_bytes[idx * VSFS_INODE_SIZE as usize..(idx + 1) * VSFS_INODE_SIZE as usize];
            inode.encode_into(record);
        }
        let table_offset = BlockNumber(self.superblock.inode_table_start).byte_offset();
        self.device.write_all_at(table_offset, &self.table_bytes)
    }
}
