#![forbid(unsafe_code)]
//! Positioned I/O over a VSFS image.
//!
//! Provides the `ByteDevice` trait (pread/pwrite semantics), a file-backed
//! implementation over `std::os::unix::fs::FileExt`, and an in-memory
//! implementation for fixtures and tests. There is no buffering or caching
//! layer: the checker is single-threaded, makes one pass (two after a
//! repair), and every access is an explicit absolute-offset operation.

use std::cell::RefCell;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;
use vsfs_error::{FsckError, Result};
use vsfs_types::{BlockNumber, VSFS_BLOCK_SIZE};

/// Byte-addressed device for fixed-offset I/O (pread/pwrite semantics).
pub trait ByteDevice {
    /// Total length in bytes.
    fn len_bytes(&self) -> u64;

    /// Read exactly `buf.len()` bytes from `offset` into `buf`.
    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()>;

    /// Write all bytes in `buf` to `offset`.
    fn write_all_at(&self, offset: u64, buf: &[u8]) -> Result<()>;
}

fn check_bounds(offset: u64, len: usize, image_len: u64) -> Result<()> {
    let end = u64::try_from(len)
        .ok()
        .and_then(|len| offset.checked_add(len))
        .ok_or(FsckError::OutOfBounds {
            offset,
            len,
            image_len,
        })?;
    if end > image_len {
        return Err(FsckError::OutOfBounds {
            offset,
            len,
            image_len,
        });
    }
    Ok(())
}

/// File-backed byte device using `pread`/`pwrite` style I/O.
///
/// `std::os::unix::fs::FileExt` carries no shared seek position, so every
/// access names its absolute offset explicitly.
#[derive(Debug)]
pub struct FileByteDevice {
    file: File,
    len: u64,
}

impl FileByteDevice {
    /// Open `path` read-write.
    pub fn open_rw(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())?;
        let len = file.metadata()?.len();
        Ok(Self { file, len })
    }
}

impl ByteDevice for FileByteDevice {
    fn len_bytes(&self) -> u64 {
        self.len
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_bounds(offset, buf.len(), self.len)?;
        self.file.read_exact_at(buf, offset)?;
        Ok(())
    }

    fn write_all_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        check_bounds(offset, buf.len(), self.len)?;
        self.file.write_all_at(buf, offset)?;
        Ok(())
    }
}

/// In-memory byte device backed by a `Vec<u8>`.
///
/// Used by tests and fixture builders; honors the same bounds rules as the
/// file-backed device. Interior mutability keeps the `ByteDevice` write
/// path `&self`, matching pwrite on a shared file handle.
#[derive(Debug)]
pub struct MemByteDevice {
    bytes: RefCell<Vec<u8>>,
}

impl MemByteDevice {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes: RefCell::new(bytes),
        }
    }

    /// Zero-filled device of `len` bytes.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self::new(vec![0u8; len])
    }

    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.bytes.into_inner()
    }
}

impl ByteDevice for MemByteDevice {
    fn len_bytes(&self) -> u64 {
        self.bytes.borrow().len() as u64
    }

    fn read_exact_at(&self, offset: u64, buf: &mut [u8]) -> Result<()> {
        check_bounds(offset, buf.len(), self.len_bytes())?;
        let bytes = self.bytes.borrow();
        let start = usize::try_from(offset).map_err(|_| FsckError::OutOfBounds {
            offset,
            len: buf.len(),
            image_len: self.len_bytes(),
        })?;
        buf.copy_from_slice(&bytes[start..start + buf.len()]);
        Ok(())
    }

    fn write_all_at(&self, offset: u64, buf: &[u8]) -> Result<()> {
        check_bounds(offset, buf.len(), self.len_bytes())?;
        let mut bytes = self.bytes.borrow_mut();
        let start = usize::try_from(offset).map_err(|_| FsckError::OutOfBounds {
            offset,
            len: buf.len(),
            image_len: bytes.len() as u64,
        })?;
        bytes[start..start + buf.len()].copy_from_slice(buf);
        Ok(())
    }
}

/// Read one whole 4096-byte block.
pub fn read_block(device: &dyn ByteDevice, block: BlockNumber) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; VSFS_BLOCK_SIZE as usize];
    device.read_exact_at(block.byte_offset(), &mut buf)?;
    Ok(buf)
}

/// Write one whole 4096-byte block.
pub fn write_block(device: &dyn ByteDevice, block: BlockNumber, data: &[u8]) -> Result<()> {
    debug_assert_eq!(data.len(), VSFS_BLOCK_SIZE as usize);
    device.write_all_at(block.byte_offset(), data)
}
