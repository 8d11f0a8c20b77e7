//! `unsafe` traits for buffers a DMA channel may read from.
//!
//! A circular transfer re-reads its source for as long as the channel is
//! enabled, which is not bounded by anything the compiler can see. The
//! traits here ensure the buffer's address and length cannot change under
//! the controller. The `'static` requirement on top of that is enforced by
//! [`CircularTransfer`](crate::dma::CircularTransfer).

use as_slice::AsSlice;
use core::{mem, ops::Deref};
use stable_deref_trait::StableDeref;

/// A handle to memory a channel streams out of.
///
/// # Safety
///
/// Implementors guarantee that the memory the handle points to:
///
/// - stays at the same address and keeps its length for as long as the
///   handle exists, even when the handle itself is moved
/// - can be read by the controller over its whole length
///
/// Both must hold for every call to `dma_read_buffer`.
pub unsafe trait DmaReadBuffer {
    type Target: ?Sized;

    /// Start of the memory and its size in bytes.
    fn dma_read_buffer(&self) -> (*const Self::Target, usize);

    /// Start address of the buffer, as programmed into the controller.
    fn dma_address(&self) -> usize {
        let (ptr, _) = self.dma_read_buffer();
        ptr as *const u8 as usize
    }
}

/// Element types a DMA channel may move.
///
/// # Safety
///
/// Types that implement this trait must be plain integers without padding,
/// so that a byte-wise read by the controller observes exactly the value.
pub unsafe trait DmaTarget {}

unsafe impl DmaTarget for u8 {}
unsafe impl DmaTarget for u16 {}
unsafe impl DmaTarget for u32 {}

unsafe impl DmaTarget for i8 {}
unsafe impl DmaTarget for i16 {}
unsafe impl DmaTarget for i32 {}

// Any stable pointer to a slice of plain integers qualifies, which covers
// `&'static TxBuffer<N>` as well as `&'static [u8]`. `StableDeref`
// provides the fixed address.
unsafe impl<B, E> DmaReadBuffer for B
where
    B: Deref + StableDeref,
    B::Target: AsSlice<Element = E>,
    E: DmaTarget,
{
    type Target = [E];

    fn dma_read_buffer(&self) -> (*const Self::Target, usize) {
        let elements = self.as_slice();
        (elements as *const [E], mem::size_of_val(elements))
    }
}
