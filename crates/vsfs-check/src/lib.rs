#![forbid(unsafe_code)]
//! Consistency checking and repair for VSFS images.
//!
//! One run owns a [`FsckContext`] loaded from the image, derives a block
//! reference graph from the valid inodes' pointers, and evaluates five
//! independent validators against it:
//!
//! 1. superblock geometry fields,
//! 2. inode bitmap vs inode validity,
//! 3. data bitmap vs block reachability,
//! 4. duplicate block references,
//! 5. out-of-range ("bad") block pointers.
//!
//! Inconsistencies are values, not errors: each one is counted and reported,
//! and the set of them is the repair engine's input. If any were found, the
//! [`driver`](run) repairs, reloads the context from the now-repaired image,
//! and runs all five checks again from scratch. Only I/O failures abort.
//!
//! Scope note: only direct and single-indirect pointers are traversed.
//! Blocks reachable solely through double/triple indirection are treated as
//! unreferenced by every checker. This is a documented limitation of the
//! on-disk profile, not something the repair engine should "fix".

mod checks;
mod context;
mod driver;
mod graph;
mod repair;
mod report;

pub use checks::{
    check_bad_blocks, check_data_bitmap, check_duplicate_blocks, check_inode_bitmap,
    check_superblock, run_checks,
};
pub use context::FsckContext;
pub use driver::{FsckOutcome, RepairOutcome, run};
pub use graph::{OwnerLists, RefGraph};
pub use repair::repair;
pub use report::{CheckCategory, CheckReport, Inconsistency};
