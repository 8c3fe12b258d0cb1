//! Fixed-size byte encoding for values kept in store blocks.
//!
//! Store blocks are raw chunk memory. An [`Element`] knows its encoded
//! size and how to move itself in and out of a slot's bytes. Encoding is
//! little-endian so a block dump reads the same on every host.

use regrid_core::Node;

/// A value that can live in an [`AttributeStore`](crate::AttributeStore) slot.
pub trait Element: Copy {
    /// Encoded size in bytes. At most
    /// [`MAX_ELEMENT_SIZE`](regrid_core::limits::MAX_ELEMENT_SIZE).
    const SIZE: usize;

    /// Decode from exactly `SIZE` bytes.
    fn read(bytes: &[u8]) -> Self;

    /// Encode into exactly `SIZE` bytes.
    fn write(&self, bytes: &mut [u8]);
}

/// Read a little-endian `u16` at byte `at`.
pub fn read_u16(bytes: &[u8], at: usize) -> u16 {
    let mut buf = [0u8; 2];
    buf.copy_from_slice(&bytes[at..at + 2]);
    u16::from_le_bytes(buf)
}

/// Read a little-endian `u32` at byte `at`.
pub fn read_u32(bytes: &[u8], at: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[at..at + 4]);
    u32::from_le_bytes(buf)
}

/// Read a little-endian `f64` at byte `at`.
pub fn read_f64(bytes: &[u8], at: usize) -> f64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[at..at + 8]);
    f64::from_le_bytes(buf)
}

/// Write a little-endian `u16` at byte `at`.
pub fn write_u16(bytes: &mut [u8], at: usize, value: u16) {
    bytes[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

/// Write a little-endian `u32` at byte `at`.
pub fn write_u32(bytes: &mut [u8], at: usize, value: u32) {
    bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

/// Write a little-endian `f64` at byte `at`.
pub fn write_f64(bytes: &mut [u8], at: usize, value: f64) {
    bytes[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

impl Element for f64 {
    const SIZE: usize = 8;

    fn read(bytes: &[u8]) -> Self {
        read_f64(bytes, 0)
    }

    fn write(&self, bytes: &mut [u8]) {
        write_f64(bytes, 0, *self);
    }
}

impl Element for u32 {
    const SIZE: usize = 4;

    fn read(bytes: &[u8]) -> Self {
        read_u32(bytes, 0)
    }

    fn write(&self, bytes: &mut [u8]) {
        write_u32(bytes, 0, *self);
    }
}

impl Element for [f64; 3] {
    const SIZE: usize = 24;

    fn read(bytes: &[u8]) -> Self {
        [read_f64(bytes, 0), read_f64(bytes, 8), read_f64(bytes, 16)]
    }

    fn write(&self, bytes: &mut [u8]) {
        for (i, v) in self.iter().enumerate() {
            write_f64(bytes, i * 8, *v);
        }
    }
}

impl Element for Node {
    const SIZE: usize = 8;

    fn read(bytes: &[u8]) -> Self {
        Node::new(read_u16(bytes, 0), read_u16(bytes, 2), read_u32(bytes, 4))
    }

    fn write(&self, bytes: &mut [u8]) {
        write_u16(bytes, 0, self.block);
        write_u16(bytes, 2, self.slot);
        write_u32(bytes, 4, self.generation);
    }
}
