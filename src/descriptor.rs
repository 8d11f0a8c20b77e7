//! DMA transfer descriptors.
//!
//! A [`TransferDescriptor`] is a plain description of a transfer. It is
//! checked and encoded into register values by
//! [`ChipFamily::program`](crate::chip::ChipFamily::program) and never
//! touched by the firmware after that.

use bitflags::bitflags;

use crate::traits::DmaReadBuffer;

/// Width of one transfer unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataWidth {
    Bits8,
    Bits16,
    Bits32,
}

impl DataWidth {
    /// Unit size in bytes.
    pub const fn bytes(self) -> usize {
        match self {
            DataWidth::Bits8 => 1,
            DataWidth::Bits16 => 2,
            DataWidth::Bits32 => 4,
        }
    }

    /// Encoding used by the PSIZE/MSIZE fields.
    pub(crate) const fn size_bits(self) -> u32 {
        match self {
            DataWidth::Bits8 => 0b00,
            DataWidth::Bits16 => 0b01,
            DataWidth::Bits32 => 0b10,
        }
    }
}

bitflags! {
    /// Transfer behavior flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TransferFlags: u32 {
        /// Advance the source pointer after each unit
        const SRC_INC = 1 << 0;
        /// Advance the destination pointer after each unit
        const DST_INC = 1 << 1;
        /// Rewind to the start when the count is reached
        const CIRCULAR = 1 << 2;
        /// Interrupt on transfer complete
        const COMPLETE_IE = 1 << 3;
        /// Interrupt on half transfer
        const HALF_COMPLETE_IE = 1 << 4;
        /// Interrupt on transfer error
        const ERROR_IE = 1 << 5;
    }
}

/// Peripheral that raises the transfer requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RequestSource {
    Usart1Tx,
    Usart1Rx,
    Usart2Tx,
    Usart2Rx,
    Usart3Tx,
    Usart3Rx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferDescriptor {
    pub src: usize,
    pub src_width: DataWidth,
    pub dst: usize,
    pub dst_width: DataWidth,
    /// Number of units, in source width
    pub count: u32,
    pub flags: TransferFlags,
    pub request: RequestSource,
}

impl TransferDescriptor {
    /// Byte-wide transfer that streams `buffer` into a peripheral data
    /// register, restarting at the end and interrupting once per pass.
    pub fn memory_to_peripheral<B>(buffer: &B, register: usize, request: RequestSource) -> Self
    where
        B: DmaReadBuffer,
    {
        let (_, len) = buffer.dma_read_buffer();

        Self {
            src: buffer.dma_address(),
            src_width: DataWidth::Bits8,
            dst: register,
            dst_width: DataWidth::Bits8,
            count: len as u32,
            flags: TransferFlags::SRC_INC | TransferFlags::CIRCULAR | TransferFlags::COMPLETE_IE,
            request,
        }
    }

    #[must_use]
    pub fn with_flags(mut self, flags: TransferFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_circular(&self) -> bool {
        self.flags.contains(TransferFlags::CIRCULAR)
    }
}
