use serde::Serialize;
use std::fmt;
use vsfs_types::{BlockNumber, InodeIndex};

/// The five independent check categories, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Superblock,
    InodeBitmap,
    DataBitmap,
    DuplicateBlocks,
    BadBlocks,
}

impl CheckCategory {
    pub const ALL: [Self; 5] = [
        Self::Superblock,
        Self::InodeBitmap,
        Self::DataBitmap,
        Self::DuplicateBlocks,
        Self::BadBlocks,
    ];

    /// Human-readable label used in the summary report.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Superblock => "Superblock",
            Self::InodeBitmap => "Inode bitmap",
            Self::DataBitmap => "Data bitmap",
            Self::DuplicateBlocks => "Duplicate blocks",
            Self::BadBlocks => "Bad blocks",
        }
    }
}

impl fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One named, located mismatch between persisted metadata and derived
/// ground truth.
///
/// Inconsistencies are counted and reported, never coalesced, and never
/// abort the run; they are the repair engine's input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Inconsistency {
    /// A superblock geometry field differs from its expected constant.
    SuperblockField {
        field: &'static str,
        expected: u32,
        actual: u32,
    },
    /// Inode bitmap bit set for an inode that is not valid.
    InodeMarkedButInvalid { inode: InodeIndex },
    /// Valid inode whose bitmap bit is clear.
    InodeValidButUnmarked { inode: InodeIndex },
    /// Data bitmap bit set for a block no valid inode references.
    BlockMarkedButUnreferenced { block: BlockNumber },
    /// Referenced block whose data bitmap bit is clear; names the first
    /// owner in scan order.
    BlockReferencedButUnmarked {
        block: BlockNumber,
        inode: InodeIndex,
    },
    /// Block referenced more than once; owners in scan order, duplicates
    /// included.
    DuplicateReferences {
        block: BlockNumber,
        owners: Vec<InodeIndex>,
    },
    /// Direct pointer outside the data-block range.
    BadDirectPointer {
        inode: InodeIndex,
        slot: usize,
        value: u32,
    },
    /// Indirect pointer outside the data-block range; its contents were
    /// never read.
    BadIndirectPointer { inode: InodeIndex, value: u32 },
    /// Indirect block entry outside the data-block range.
    BadIndirectEntry {
        inode: InodeIndex,
        entry: usize,
        value: u32,
    },
}

impl Inconsistency {
    #[must_use]
    pub fn category(&self) -> CheckCategory {
        match self {
            Self::SuperblockField { .. } => CheckCategory::Superblock,
            Self::InodeMarkedButInvalid { .. } | Self::InodeValidButUnmarked { .. } => {
                CheckCategory::InodeBitmap
            }
            Self::BlockMarkedButUnreferenced { .. } | Self::BlockReferencedButUnmarked { .. } => {
                CheckCategory::DataBitmap
            }
            Self::DuplicateReferences { .. } => CheckCategory::DuplicateBlocks,
            Self::BadDirectPointer { .. }
            | Self::BadIndirectPointer { .. }
            | Self::BadIndirectEntry { .. } => CheckCategory::BadBlocks,
        }
    }
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SuperblockField {
                field,
                expected,
                actual,
            } => write!(
                f,
                "superblock {field} is {actual} (0x{actual:x}), expected {expected} (0x{expected:x})"
            ),
            Self::InodeMarkedButInvalid { inode } => {
                write!(f, "inode {inode} is marked used in bitmap but is not valid")
            }
            Self::InodeValidButUnmarked { inode } => {
                write!(f, "inode {inode} is valid but not marked used in bitmap")
            }
            Self::BlockMarkedButUnreferenced { block } => write!(
                f,
                "block {block} is marked used in data bitmap but not referenced by any inode"
            ),
            Self::BlockReferencedButUnmarked { block, inode } => write!(
                f,
                "block {block} is referenced by inode {inode} but not marked used in data bitmap"
            ),
            Self::DuplicateReferences { block, owners } => {
                write!(f, "block {block} is referenced by multiple inodes:")?;
                for owner in owners {
                    write!(f, " {owner}")?;
                }
                Ok(())
            }
            Self::BadDirectPointer { inode, slot, value } => write!(
                f,
                "inode {inode} direct block {slot} has invalid block number {value}"
            ),
            Self::BadIndirectPointer { inode, value } => {
                write!(f, "inode {inode} has invalid indirect block number {value}")
            }
            Self::BadIndirectEntry {
                inode,
                entry,
                value,
            } => write!(
                f,
                "inode {inode} indirect entry {entry} has invalid block number {value}"
            ),
        }
    }
}

/// Findings of one full verification pass over all five checkers.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub findings: Vec<Inconsistency>,
}

impl CheckReport {
    /// Total error count: every finding counts exactly once.
    #[must_use]
    pub fn total_errors(&self) -> usize {
        self.findings.len()
    }

    /// Number of findings in `category`.
    #[must_use]
    pub fn count(&self, category: CheckCategory) -> usize {
        self.findings
            .iter()
            .filter(|finding| finding.category() == category)
            .count()
    }

    /// Whether `category` found nothing.
    #[must_use]
    pub fn passed(&self, category: CheckCategory) -> bool {
        self.count(category) == 0
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}
