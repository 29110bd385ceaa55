#![forbid(unsafe_code)]
//! Byte-exact parsing and encoding of VSFS on-disk structures.
//!
//! Pure functions over byte slices; no I/O happens here. A corrupt image
//! parses cleanly into a corrupt model — validation is the checkers' job,
//! not the parser's. Encoding writes only the defined field bytes into the
//! caller's buffer, so alignment padding and reserved regions round-trip
//! verbatim through a load/repair/persist cycle.

mod bitmap;
mod indirect;
mod inode;
mod superblock;

pub use bitmap::Bitmap;
pub use indirect::{encode_indirect_block, parse_indirect_block};
pub use inode::Inode;
pub use superblock::Superblock;
