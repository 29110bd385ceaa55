use crate::context::FsckContext;
use std::collections::BTreeMap;
use vsfs_error::Result;
use vsfs_types::{InodeIndex, VSFS_TOTAL_BLOCKS};

/// Block reference graph: per block, whether any valid inode references it
/// and which inode got there first.
///
/// Derived fresh each pass from the valid inodes' direct pointers and one
/// level of indirection; never persisted. Scan order fixes the first owner:
/// ascending inode index, direct pointers before the indirect pointer, then
/// indirect entries in block order. Later references to an already-owned
/// block are ignored here — the duplicate detector recomputes ownership
/// lists independently instead of reusing this winner-take-all result.
#[derive(Debug, Clone)]
pub struct RefGraph {
    first_owner: Vec<Option<InodeIndex>>,
}

impl RefGraph {
    /// Walk every valid inode's pointers and record first owners.
    ///
    /// Pointers outside `[data_block_start, total_blocks)` are skipped, not
    /// recorded; flagging them is the bad-block detector's job. The lower
    /// bound comes from the loaded superblock, the upper bound is the fixed
    /// geometry constant. An out-of-range indirect pointer's contents are
    /// never read, so the walk cannot touch bytes outside the image.
    pub fn build(ctx: &FsckContext<'_>) -> Result<Self> {
        let mut graph = Self {
            first_owner: vec![None; VSFS_TOTAL_BLOCKS as usize],
        };
        let range_start = ctx.superblock.data_block_start;

        for (idx, inode) in ctx.inodes.iter().enumerate() {
            if !inode.is_valid() {
                continue;
            }
            let owner = InodeIndex(idx as u32);

            for &ptr in &inode.direct {
                if ptr != 0 {
                    graph.mark(ptr, owner, range_start);
                }
            }

            if inode.indirect != 0 {
                graph.mark(inode.indirect, owner, range_start);
                if (range_start..VSFS_TOTAL_BLOCKS).contains(&inode.indirect) {
                    for entry in ctx.read_indirect(inode.indirect)? {
                        if entry != 0 {
                            graph.mark(entry, owner, range_start);
                        }
                    }
                }
            }
            // Double and triple indirect pointers are never traversed;
            // blocks reachable only through them stay unreferenced.
        }

        Ok(graph)
    }

    fn mark(&mut self, block: u32, owner: InodeIndex, range_start: u32) {
        if block < range_start || block >= VSFS_TOTAL_BLOCKS {
            return;
        }
        let slot = &mut self.first_owner[block as usize];
        if slot.is_none() {
            *slot = Some(owner);
        }
    }

    #[must_use]
    pub fn referenced(&self, block: u32) -> bool {
        self.owner(block).is_some()
    }

    #[must_use]
    pub fn owner(&self, block: u32) -> Option<InodeIndex> {
        self.first_owner
            .get(block as usize)
            .copied()
            .flatten()
    }
}

/// Ordered per-block owner lists for duplicate detection.
///
/// Every reference is kept, duplicates included, in scan order. The range
/// check while accumulating is upper-bound-only (`block < total_blocks`,
/// no lower bound) — a deliberate replication of the original checker's
/// asymmetry with the bad-block range rule.
#[derive(Debug, Clone, Default)]
pub struct OwnerLists {
    lists: BTreeMap<u32, Vec<InodeIndex>>,
}

impl OwnerLists {
    /// Re-walk every valid inode's pointers, accumulating all owners.
    pub fn collect(ctx: &FsckContext<'_>) -> Result<Self> {
        let mut owners = Self::default();

        for (idx, inode) in ctx.inodes.iter().enumerate() {
            if !inode.is_valid() {
                continue;
            }
            let owner = InodeIndex(idx as u32);

            for &ptr in &inode.direct {
                if ptr != 0 && ptr < VSFS_TOTAL_BLOCKS {
                    owners.push(ptr, owner);
                }
            }

            // The indirect pointer itself counts as a reference; its
            // contents are read only when the pointer stays inside the
            // image.
            if inode.indirect != 0 && inode.indirect < VSFS_TOTAL_BLOCKS {
                owners.push(inode.indirect, owner);
                for entry in ctx.read_indirect(inode.indirect)? {
                    if entry != 0 && entry < VSFS_TOTAL_BLOCKS {
                        owners.push(entry, owner);
                    }
                }
            }
        }

        Ok(owners)
    }

    fn push(&mut self, block: u32, owner: InodeIndex) {
        self.lists.entry(block).or_default().push(owner);
    }

    /// Owners recorded for `block`, in scan order.
    #[must_use]
    pub fn owners(&self, block: u32) -> &[InodeIndex] {
        self.lists.get(&block).map_or(&[], Vec::as_slice)
    }
}
