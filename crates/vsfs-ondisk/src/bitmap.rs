use serde::{Deserialize, Serialize};

/// Allocation bitmap stored as one full block; bit `i` means slot `i` is
/// allocated. LSB-first within each byte, ascending byte index.
///
/// Two instances exist per image: the inode bitmap (slot `i` is inode `i`)
/// and the data bitmap (slot `i` is block `data_block_start + i`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap {
    bytes: Vec<u8>,
}

impl Bitmap {
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Get bit `idx`; out-of-range reads as clear.
    #[must_use]
    pub fn get(&self, idx: u32) -> bool {
        let byte_idx = (idx / 8) as usize;
        let bit_idx = idx % 8;
        if byte_idx >= self.bytes.len() {
            return false;
        }
        (self.bytes[byte_idx] >> bit_idx) & 1 == 1
    }

    /// Set bit `idx`.
    pub fn set(&mut self, idx: u32) {
        let byte_idx = (idx / 8) as usize;
        let bit_idx = idx % 8;
        if byte_idx < self.bytes.len() {
            self.bytes[byte_idx] |= 1 << bit_idx;
        }
    }

    /// Clear bit `idx`.
    pub fn clear(&mut self, idx: u32) {
        let byte_idx = (idx / 8) as usize;
        let bit_idx = idx % 8;
        if byte_idx < self.bytes.len() {
            self.bytes[byte_idx] &= !(1 << bit_idx);
        }
    }

    /// Set or clear bit `idx`, returning whether the stored value changed.
    pub fn assign(&mut self, idx: u32, value: bool) -> bool {
        let previous = self.get(idx);
        if value {
            self.set(idx);
        } else {
            self.clear(idx);
        }
        previous != value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lsb_first_bit_order() {
        let bitmap = Bitmap::new(vec![0b0000_0101, 0b1000_0000]);
        assert!(bitmap.get(0));
        assert!(!bitmap.get(1));
        assert!(bitmap.get(2));
        assert!(bitmap.get(15));
        assert!(!bitmap.get(14));
    }

    #[test]
    fn set_clear_assign() {
        let mut bitmap = Bitmap::new(vec![0u8; 2]);
        bitmap.set(9);
        assert!(bitmap.get(9));
        bitmap.clear(9);
        assert!(!bitmap.get(9));

        assert!(bitmap.assign(3, true));
        assert!(!bitmap.assign(3, true));
        assert!(bitmap.assign(3, false));
    }

    #[test]
    fn out_of_range_is_clear_and_ignored() {
        let mut bitmap = Bitmap::new(vec![0u8; 1]);
        assert!(!bitmap.get(64));
        bitmap.set(64);
        assert_eq!(bitmap.as_bytes(), &[0u8]);
    }
}
