use crate::context::FsckContext;
use crate::graph::{OwnerLists, RefGraph};
use crate::report::{CheckReport, Inconsistency};
use tracing::debug;
use vsfs_error::Result;
use vsfs_ondisk::Superblock;
use vsfs_types::{
    BlockNumber, InodeIndex, VSFS_BLOCK_SIZE, VSFS_DATA_BITMAP_BLOCK, VSFS_DATA_BLOCK_START,
    VSFS_INODE_BITMAP_BLOCK, VSFS_INODE_COUNT, VSFS_INODE_SIZE, VSFS_INODE_TABLE_START,
    VSFS_MAGIC, VSFS_TOTAL_BLOCKS,
};

/// Expected value for each superblock geometry field, by field name.
///
/// `inode_count` is special-cased in [`check_superblock`]: 0 is accepted on
/// read as "not yet initialized".
pub(crate) const SUPERBLOCK_EXPECTED: [(&str, u32); 8] = [
    ("block_size", VSFS_BLOCK_SIZE),
    ("total_blocks", VSFS_TOTAL_BLOCKS),
    ("inode_bitmap_block", VSFS_INODE_BITMAP_BLOCK),
    ("data_bitmap_block", VSFS_DATA_BITMAP_BLOCK),
    ("inode_table_start", VSFS_INODE_TABLE_START),
    ("data_block_start", VSFS_DATA_BLOCK_START),
    ("inode_size", VSFS_INODE_SIZE),
    ("inode_count", VSFS_INODE_COUNT),
];

pub(crate) fn superblock_field(sb: &Superblock, field: &'static str) -> u32 {
    match field {
        "block_size" => sb.block_size,
        "total_blocks" => sb.total_blocks,
        "inode_bitmap_block" => sb.inode_bitmap_block,
        "data_bitmap_block" => sb.data_bitmap_block,
        "inode_table_start" => sb.inode_table_start,
        "data_block_start" => sb.data_block_start,
        "inode_size" => sb.inode_size,
        "inode_count" => sb.inode_count,
        _ => unreachable!("unknown superblock field {field}"),
    }
}

/// Compare all nine geometry fields against the fixed profile.
///
/// Checks never short-circuit: each mismatched field is one independent
/// finding. `inode_count` has the two-valued acceptance set {80, 0}; every
/// other field accepts exactly one value.
#[must_use]
pub fn check_superblock(sb: &Superblock) -> Vec<Inconsistency> {
    let mut findings = Vec::new();

    if sb.magic != VSFS_MAGIC {
        findings.push(Inconsistency::SuperblockField {
            field: "magic",
            expected: u32::from(VSFS_MAGIC),
            actual: u32::from(sb.magic),
        });
    }

    for (field, expected) in SUPERBLOCK_EXPECTED {
        let actual = superblock_field(sb, field);
        if field == "inode_count" && actual == 0 {
            continue;
        }
        if actual != expected {
            findings.push(Inconsistency::SuperblockField {
                field,
                expected,
                actual,
            });
        }
    }

    findings
}

/// Compare every inode bitmap bit against the validity predicate.
#[must_use]
pub fn check_inode_bitmap(ctx: &FsckContext<'_>) -> Vec<Inconsistency> {
    let mut findings = Vec::new();
    for idx in 0..VSFS_INODE_COUNT {
        let marked = ctx.inode_bitmap.get(idx);
        let valid = ctx.inodes[idx as usize].is_valid();
        if marked && !valid {
            findings.push(Inconsistency::InodeMarkedButInvalid {
                inode: InodeIndex(idx),
            });
        } else if !marked && valid {
            findings.push(Inconsistency::InodeValidButUnmarked {
                inode: InodeIndex(idx),
            });
        }
    }
    findings
}

/// Compare every data bitmap bit against the reference graph.
#[must_use]
pub fn check_data_bitmap(ctx: &FsckContext<'_>, graph: &RefGraph) -> Vec<Inconsistency> {
    let mut findings = Vec::new();
    for block in ctx.superblock.data_block_start..VSFS_TOTAL_BLOCKS {
        let marked = ctx.data_bitmap.get(block - ctx.superblock.data_block_start);
        match (marked, graph.owner(block)) {
            (true, None) => findings.push(Inconsistency::BlockMarkedButUnreferenced {
                block: BlockNumber(block),
            }),
            (false, Some(owner)) => findings.push(Inconsistency::BlockReferencedButUnmarked {
                block: BlockNumber(block),
                inode: owner,
            }),
            _ => {}
        }
    }
    findings
}

/// Report every block referenced by more than one inode, naming all owners
/// in scan order.
///
/// Re-walks the pointers independently of the first-owner graph; repair
/// does not resolve duplicates, so these findings survive a repair cycle.
pub fn check_duplicate_blocks(ctx: &FsckContext<'_>) -> Result<Vec<Inconsistency>> {
    let owners = OwnerLists::collect(ctx)?;
    let mut findings = Vec::new();
    for block in ctx.superblock.data_block_start..VSFS_TOTAL_BLOCKS {
        let list = owners.owners(block);
        if list.len() > 1 {
            findings.push(Inconsistency::DuplicateReferences {
                block: BlockNumber(block),
                owners: list.to_vec(),
            });
        }
    }
    Ok(findings)
}

/// Flag every non-zero pointer outside `[data_block_start, total_blocks)`.
///
/// The indirect pointer is checked before its contents; if it is itself out
/// of range its block is never read.
pub fn check_bad_blocks(ctx: &FsckContext<'_>) -> Result<Vec<Inconsistency>> {
    let mut findings = Vec::new();
    let in_range =
        |block: u32| (ctx.superblock.data_block_start..VSFS_TOTAL_BLOCKS).contains(&block);

    for (idx, inode) in ctx.inodes.iter().enumerate() {
        if !inode.is_valid() {
            continue;
        }
        let owner = InodeIndex(idx as u32);

        for (slot, &ptr) in inode.direct.iter().enumerate() {
            if ptr != 0 && !in_range(ptr) {
                findings.push(Inconsistency::BadDirectPointer {
                    inode: owner,
                    slot,
                    value: ptr,
                });
            }
        }

        if inode.indirect != 0 {
            if !in_range(inode.indirect) {
                findings.push(Inconsistency::BadIndirectPointer {
                    inode: owner,
                    value: inode.indirect,
                });
            } else {
                for (entry, &value) in ctx.read_indirect(inode.indirect)?.iter().enumerate() {
                    if value != 0 && !in_range(value) {
                        findings.push(Inconsistency::BadIndirectEntry {
                            inode: owner,
                            entry,
                            value,
                        });
                    }
                }
            }
        }
    }

    Ok(findings)
}

/// One full verification pass: all five checkers, in order, against a fresh
/// reference graph.
pub fn run_checks(ctx: &FsckContext<'_>) -> Result<CheckReport> {
    let graph = RefGraph::build(ctx)?;

    let mut findings = check_superblock(&ctx.superblock);
    findings.extend(check_inode_bitmap(ctx));
    findings.extend(check_data_bitmap(ctx, &graph));
    findings.extend(check_duplicate_blocks(ctx)?);
    findings.extend(check_bad_blocks(ctx)?);

    let report = CheckReport { findings };
    debug!(total_errors = report.total_errors(), "verification pass complete");
    Ok(report)
}
