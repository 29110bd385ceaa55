use serde::{Deserialize, Serialize};
use vsfs_types::{ParseError, VSFS_DIRECT_POINTERS, read_le_u32, write_le_u32};

// Field offsets within a 256-byte inode record. All fields are u32;
// bytes 100..256 are reserved and preserved verbatim on encode.
const OFF_MODE: usize = 0;
const OFF_UID: usize = 4;
const OFF_GID: usize = 8;
const OFF_SIZE: usize = 12;
const OFF_ATIME: usize = 16;
const OFF_CTIME: usize = 20;
const OFF_MTIME: usize = 24;
const OFF_DTIME: usize = 28;
const OFF_NLINK: usize = 32;
const OFF_BLOCKS: usize = 36;
const OFF_DIRECT: usize = 40;
const OFF_INDIRECT: usize = 88;
const OFF_DOUBLE_INDIRECT: usize = 92;
const OFF_TRIPLE_INDIRECT: usize = 96;

/// One fixed-size inode record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inode {
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub size: u32,
    pub atime: u32,
    pub ctime: u32,
    pub mtime: u32,
    pub dtime: u32,
    pub nlink: u32,
    pub blocks: u32,
    pub direct: [u32; VSFS_DIRECT_POINTERS],
    pub indirect: u32,
    pub double_indirect: u32,
    pub triple_indirect: u32,
}

impl Inode {
    /// Parse one record from a 256-byte slice.
    pub fn parse(record: &[u8]) -> Result<Self, ParseError> {
        let mut direct = [0u32; VSFS_DIRECT_POINTERS];
        for (slot, ptr) in direct.iter_mut().enumerate() {
            *ptr = read_le_u32(record, OFF_DIRECT + slot * 4)?;
        }
        Ok(Self {
            mode: read_le_u32(record, OFF_MODE)?,
            uid: read_le_u32(record, OFF_UID)?,
            gid: read_le_u32(record, OFF_GID)?,
            size: read_le_u32(record, OFF_SIZE)?,
            atime: read_le_u32(record, OFF_ATIME)?,
            ctime: read_le_u32(record, OFF_CTIME)?,
            mtime: read_le_u32(record, OFF_MTIME)?,
            dtime: read_le_u32(record, OFF_DTIME)?,
            nlink: read_le_u32(record, OFF_NLINK)?,
            blocks: read_le_u32(record, OFF_BLOCKS)?,
            direct,
            indirect: read_le_u32(record, OFF_INDIRECT)?,
            double_indirect: read_le_u32(record, OFF_DOUBLE_INDIRECT)?,
            triple_indirect: read_le_u32(record, OFF_TRIPLE_INDIRECT)?,
        })
    }

    /// Write the field bytes into `record`, leaving bytes 100..256 as the
    /// caller loaded them.
    pub fn encode_into(&self, record: &mut [u8]) {
        write_le_u32(record, OFF_MODE, self.mode);
        write_le_u32(record, OFF_UID, self.uid);
        write_le_u32(record, OFF_GID, self.gid);
        write_le_u32(record, OFF_SIZE, self.size);
        write_le_u32(record, OFF_ATIME, self.atime);
        write_le_u32(record, OFF_CTIME, self.ctime);
        write_le_u32(record, OFF_MTIME, self.mtime);
        write_le_u32(record, OFF_DTIME, self.dtime);
        write_le_u32(record, OFF_NLINK, self.nlink);
        write_le_u32(record, OFF_BLOCKS, self.blocks);
        for (slot, ptr) in self.direct.iter().enumerate() {
            write_le_u32(record, OFF_DIRECT + slot * 4, *ptr);
        }
        write_le_u32(record, OFF_INDIRECT, self.indirect);
        write_le_u32(record, OFF_DOUBLE_INDIRECT, self.double_indirect);
        write_le_u32(record, OFF_TRIPLE_INDIRECT, self.triple_indirect);
    }

    /// A live inode: positive link count and no deletion time.
    ///
    /// Invalid inodes are treated as free regardless of whatever stale
    /// pointer contents they still carry.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.nlink > 0 && self.dtime == 0
    }
}

impl Default for Inode {
    fn default() -> Self {
        Self {
            mode: 0,
            uid: 0,
            gid: 0,
            size: 0,
            atime: 0,
            ctime: 0,
            mtime: 0,
            dtime: 0,
            nlink: 0,
            blocks: 0,
            direct: [0; VSFS_DIRECT_POINTERS],
            indirect: 0,
            double_indirect: 0,
            triple_indirect: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vsfs_types::VSFS_INODE_SIZE;

    #[test]
    fn parse_encode_round_trip() {
        let mut record = vec![0u8; VSFS_INODE_SIZE as usize];
        let mut inode = Inode {
            mode: 0o100644,
            uid: 1000,
            gid: 1000,
            size: 8192,
            nlink: 1,
            blocks: 2,
            ..Inode::default()
        };
        inode.direct[0] = 9;
        inode.direct[11] = 63;
        inode.indirect = 10;

        inode.encode_into(&mut record);
        let parsed = Inode::parse(&record).unwrap();
        assert_eq!(parsed, inode);
    }

    #[test]
    fn encode_leaves_reserved_tail_untouched() {
        let mut record = vec![0u8; VSFS_INODE_SIZE as usize];
        record[100] = 0xDE;
        record[255] = 0xAD;
        Inode::default().encode_into(&mut record);
        assert_eq!(record[100], 0xDE);
        assert_eq!(record[255], 0xAD);
    }

    #[test]
    fn validity_needs_links_and_no_dtime() {
        let mut inode = Inode {
            nlink: 1,
            ..Inode::default()
        };
        assert!(inode.is_valid());

        inode.dtime = 1_600_000_000;
        assert!(!inode.is_valid());

        inode.dtime = 0;
        inode.nlink = 0;
        assert!(!inode.is_valid());
    }
}
