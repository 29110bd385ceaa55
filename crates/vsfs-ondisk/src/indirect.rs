use vsfs_types::{ParseError, VSFS_INDIRECT_ENTRIES, read_le_u32, write_le_u32};

/// Parse an indirect block: 1024 little-endian u32 block-number entries.
pub fn parse_indirect_block(block: &[u8]) -> Result<Vec<u32>, ParseError> {
    let mut entries = Vec::with_capacity(VSFS_INDIRECT_ENTRIES);
    for idx in 0..VSFS_INDIRECT_ENTRIES {
        entries.push(read_le_u32(block, idx * 4)?);
    }
    Ok(entries)
}

/// Encode indirect entries back over `block`.
///
/// `entries` must hold exactly [`VSFS_INDIRECT_ENTRIES`] values, as
/// produced by [`parse_indirect_block`].
pub fn encode_indirect_block(entries: &[u32], block: &mut [u8]) {
    debug_assert_eq!(entries.len(), VSFS_INDIRECT_ENTRIES);
    for (idx, entry) in entries.iter().enumerate() {
        write_le_u32(block, idx * 4, *entry);
    }
}
