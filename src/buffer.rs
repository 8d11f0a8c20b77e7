//! Fixed-size transmit buffer.

use as_slice::AsSlice;

/// Transmit buffer of `N` bytes.
///
/// Filled once through `&mut`, then shared as `&'static` with the DMA
/// controller. Word alignment lets the same buffer back 16- and 32-bit
/// transfers.
#[repr(C, align(4))]
pub struct TxBuffer<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> TxBuffer<N> {
    /// Zeroed buffer, usable in `static` initializers.
    pub const fn new() -> Self {
        Self { bytes: [0; N] }
    }

    /// Sets every byte of the buffer to `sentinel`.
    pub fn fill(&mut self, sentinel: u8) {
        for byte in self.bytes.iter_mut() {
            *byte = sentinel;
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// `true` when every byte equals `sentinel`.
    pub fn is_filled_with(&self, sentinel: u8) -> bool {
        self.bytes.iter().all(|&b| b == sentinel)
    }
}

impl<const N: usize> Default for TxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> AsSlice for TxBuffer<N> {
    type Element = u8;

    fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}
