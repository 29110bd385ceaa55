#![forbid(unsafe_code)]
//! Error types for the VSFS consistency checker.
//!
//! Two-layer error model:
//!
//! | Layer | Type | Crate | Purpose |
//! |-------|------|-------|---------|
//! | Parsing | `ParseError` | `vsfs-types` | On-disk format violations detected during byte parsing |
//! | Runtime | `FsckError` | `vsfs-error` (this crate) | Fatal failures surfaced to the CLI |
//!
//! `vsfs-error` is intentionally independent of `vsfs-types` to keep the
//! dependency graph acyclic; `vsfs-check` converts a `ParseError` into
//! [`FsckError::Corruption`] at the call site, where the block number of
//! the structure being decoded is known.
//!
//! Structural inconsistencies found by the checkers are NOT errors in this
//! sense. They are collected as findings, counted, and handed to the repair
//! engine; only I/O failures and unparseable metadata abort a run.

use thiserror::Error;

pub type Result<T, E = FsckError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum FsckError {
    /// Operating system I/O error (wraps `std::io::Error`).
    ///
    /// Aborts the run immediately; a positioned read/write that fails is
    /// never retried or partially recovered.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A read or write landed outside the backing image.
    #[error("out-of-bounds access at byte offset {offset} (len {len}, image is {image_len} bytes)")]
    OutOfBounds { offset: u64, len: usize, image_len: u64 },

    /// On-disk metadata could not be parsed at a known block.
    ///
    /// Carries the `Display` form of the underlying
    /// `vsfs-types::ParseError` as its detail.
    #[error("corrupt metadata at block {block}: {detail}")]
    Corruption { block: u32, detail: String },
}
