//! Packed bit masks for manifest tags
//!
//! A tag's mask holds one bit per manifest entry. Serialized masks pack the
//! bits most-significant-first, so bit 7 of byte 0 belongs to entry 0. The
//! in-memory form is array-backed, which keeps insertion and removal at an
//! arbitrary index linear in the mask length while preserving the order of
//! all other bits.

use crate::error::{ManifestError, Result};

/// Ordered sequence of booleans with a byte-packed wire form
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PackedBitMask {
    bits: Vec<bool>,
}

impl PackedBitMask {
    /// Create an empty mask
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mask of `len` bits, all set to `value`
    pub fn filled(len: usize, value: bool) -> Self {
        Self {
            bits: vec![value; len],
        }
    }

    /// Decode a mask of exactly `entry_count` bits
    ///
    /// The entry count comes from the manifest header rather than the byte
    /// length because the final byte may be partially used. A short input is
    /// reported against the `mask` section, at the offset within `bytes`
    /// where it ran out.
    pub fn from_bytes(bytes: &[u8], entry_count: usize) -> Result<Self> {
        let needed = Self::byte_len(entry_count);
        if bytes.len() < needed {
            return Err(ManifestError::truncated(
                "mask",
                bytes.len() as u64,
                format!("tag mask needs {needed} bytes, got {}", bytes.len()),
            ));
        }

        let bits = (0..entry_count)
            .map(|index| bytes[index / 8] & (0x80 >> (index % 8)) != 0)
            .collect();
        Ok(Self { bits })
    }

    /// Number of bytes needed to store `entry_count` bits
    pub fn byte_len(entry_count: usize) -> usize {
        entry_count.div_ceil(8)
    }

    /// Pack the mask into `ceil(len / 8)` bytes, MSB first
    ///
    /// Unused low-order positions of the final byte are zero.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = vec![0u8; Self::byte_len(self.bits.len())];
        for (index, _) in self.bits.iter().enumerate().filter(|(_, set)| **set) {
            bytes[index / 8] |= 0x80 >> (index % 8);
        }
        bytes
    }

    /// Append a bit
    pub fn push(&mut self, value: bool) {
        self.bits.push(value);
    }

    /// Insert a bit at `index`, shifting later bits right
    ///
    /// # Panics
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, value: bool) {
        self.bits.insert(index, value);
    }

    /// Remove and return the bit at `index`, shifting later bits left
    ///
    /// # Panics
    /// Panics if `index >= len`.
    pub fn remove(&mut self, index: usize) -> bool {
        self.bits.remove(index)
    }

    /// Remove all bits
    pub fn clear(&mut self) {
        self.bits.clear();
    }

    /// Get the bit at `index`, or `None` past the end
    pub fn get(&self, index: usize) -> Option<bool> {
        self.bits.get(index).copied()
    }

    /// Set the bit at `index`; returns false if `index` is out of range
    pub fn set(&mut self, index: usize, value: bool) -> bool {
        match self.bits.get_mut(index) {
            Some(bit) => {
                *bit = value;
                true
            }
            None => false,
        }
    }

    /// Number of bits
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Check if the mask has no bits
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|bit| **bit).count()
    }

    /// Iterate over the bits in entry order
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        self.bits.iter().copied()
    }
}

impl FromIterator<bool> for PackedBitMask {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        Self {
            bits: iter.into_iter().collect(),
        }
    }
}
