//! Chip-family knowledge: which DMA paths exist, how requests are routed
//! to them and how a descriptor maps onto channel registers.
//!
//! Only channel-based controllers (STM32F1 and STM32F3) are supported. The
//! F2/F4 controllers use streams with per-stream request multiplexing and
//! are rejected with [`ConfigError::UnsupportedFamily`].

use bitflags::bitflags;

use crate::descriptor::{TransferDescriptor, TransferFlags};
use crate::error::ConfigError;

/// Channel configuration register (CCRx) bits.
pub mod ccr {
    pub const EN: u32 = 1 << 0;
    pub const TCIE: u32 = 1 << 1;
    pub const HTIE: u32 = 1 << 2;
    pub const TEIE: u32 = 1 << 3;
    /// Read from memory (memory to peripheral)
    pub const DIR: u32 = 1 << 4;
    pub const CIRC: u32 = 1 << 5;
    pub const PINC: u32 = 1 << 6;
    pub const MINC: u32 = 1 << 7;
    pub const PSIZE_SHIFT: u32 = 8;
    pub const MSIZE_SHIFT: u32 = 10;
}

/// Start of the peripheral address space.
const PERIPH_START: usize = 0x4000_0000;
/// End (exclusive) of the peripheral address space.
const PERIPH_END: usize = 0x6000_0000;

/// Largest value the 16-bit count register holds.
const MAX_COUNT: u32 = 0xFFFF;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipFamily {
    Stm32F1,
    Stm32F2,
    Stm32F3,
    Stm32F4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Controller {
    Dma1,
    Dma2,
}

impl Controller {
    /// Number of channels on the controller.
    pub const fn channels(self) -> u8 {
        match self {
            Controller::Dma1 => 7,
            Controller::Dma2 => 5,
        }
    }

    pub const fn has_channel(self, channel: Channel) -> bool {
        channel.0 >= 1 && channel.0 <= self.channels()
    }
}

/// One-based DMA channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Channel(u8);

impl Channel {
    pub const CH1: Channel = Channel(1);
    pub const CH2: Channel = Channel(2);
    pub const CH3: Channel = Channel(3);
    pub const CH4: Channel = Channel(4);
    pub const CH5: Channel = Channel(5);
    pub const CH6: Channel = Channel(6);
    pub const CH7: Channel = Channel(7);

    /// Highest channel number any controller has.
    pub const MAX: u8 = 7;

    /// `None` unless `1 <= number <= MAX`. Whether the channel exists on a
    /// particular controller is checked when it is programmed.
    pub const fn new(number: u8) -> Option<Self> {
        if number >= 1 && number <= Self::MAX {
            Some(Channel(number))
        } else {
            None
        }
    }

    pub const fn number(self) -> u8 {
        self.0
    }

    /// Offset of this channel's 4-bit group in ISR/IFCR.
    pub const fn flag_shift(self) -> u32 {
        4 * (self.0 as u32 - 1)
    }
}

bitflags! {
    /// Per-channel interrupt status, decoded from the controller's ISR.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelStatus: u8 {
        const GLOBAL = 1 << 0;
        const TRANSFER_COMPLETE = 1 << 1;
        const HALF_TRANSFER = 1 << 2;
        const TRANSFER_ERROR = 1 << 3;
    }
}

impl ChannelStatus {
    /// Extracts `channel`'s flags from a raw ISR value.
    pub fn from_isr(isr: u32, channel: Channel) -> Self {
        Self::from_bits_truncate(((isr >> channel.flag_shift()) & 0xF) as u8)
    }

    pub fn is_error(self) -> bool {
        self.contains(ChannelStatus::TRANSFER_ERROR)
    }
}

/// Register values for one channel, ready to be written.
///
/// `ccr` never has [`ccr::EN`] set; enabling is a separate step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelProgram {
    pub ccr: u32,
    pub cpar: usize,
    pub cmar: usize,
    pub cndtr: u32,
}

/// Controller and channel a request source is hard-wired to.
pub const fn route(request: crate::descriptor::RequestSource) -> (Controller, Channel) {
    use crate::descriptor::RequestSource::*;

    match request {
        Usart3Tx => (Controller::Dma1, Channel::CH2),
        Usart3Rx => (Controller::Dma1, Channel::CH3),
        Usart1Tx => (Controller::Dma1, Channel::CH4),
        Usart1Rx => (Controller::Dma1, Channel::CH5),
        Usart2Rx => (Controller::Dma1, Channel::CH6),
        Usart2Tx => (Controller::Dma1, Channel::CH7),
    }
}

fn is_peripheral(addr: usize) -> bool {
    (PERIPH_START..PERIPH_END).contains(&addr)
}

impl ChipFamily {
    /// `true` for families whose DMA paths are channels.
    pub const fn has_channels(self) -> bool {
        matches!(self, ChipFamily::Stm32F1 | ChipFamily::Stm32F3)
    }

    /// Validates `desc` for `channel` and encodes it.
    pub fn program(
        self,
        controller: Controller,
        channel: Channel,
        desc: &TransferDescriptor,
    ) -> Result<ChannelProgram, ConfigError> {
        if !self.has_channels() {
            return Err(ConfigError::UnsupportedFamily);
        }
        if !controller.has_channel(channel) {
            return Err(ConfigError::InvalidChannel);
        }
        if route(desc.request) != (controller, channel) {
            return Err(ConfigError::RequestNotRoutable);
        }
        if desc.count == 0 || desc.count > MAX_COUNT {
            return Err(ConfigError::InvalidTransferCount);
        }
        if desc.src % desc.src_width.bytes() != 0 || desc.dst % desc.dst_width.bytes() != 0 {
            return Err(ConfigError::Misaligned);
        }

        let flags = desc.flags;
        let mut ccr = 0;
        if flags.contains(TransferFlags::CIRCULAR) {
            ccr |= ccr::CIRC;
        }
        if flags.contains(TransferFlags::COMPLETE_IE) {
            ccr |= ccr::TCIE;
        }
        if flags.contains(TransferFlags::HALF_COMPLETE_IE) {
            ccr |= ccr::HTIE;
        }
        if flags.contains(TransferFlags::ERROR_IE) {
            ccr |= ccr::TEIE;
        }

        let src_inc = flags.contains(TransferFlags::SRC_INC);
        let dst_inc = flags.contains(TransferFlags::DST_INC);

        let program = match (is_peripheral(desc.src), is_peripheral(desc.dst)) {
            // memory -> peripheral
            (false, true) => {
                ccr |= ccr::DIR;
                ccr |= desc.src_width.size_bits() << ccr::MSIZE_SHIFT;
                ccr |= desc.dst_width.size_bits() << ccr::PSIZE_SHIFT;
                if src_inc {
                    ccr |= ccr::MINC;
                }
                if dst_inc {
                    ccr |= ccr::PINC;
                }
                ChannelProgram {
                    ccr,
                    cpar: desc.dst,
                    cmar: desc.src,
                    cndtr: desc.count,
                }
            }
            // peripheral -> memory
            (true, false) => {
                ccr |= desc.src_width.size_bits() << ccr::PSIZE_SHIFT;
                ccr |= desc.dst_width.size_bits() << ccr::MSIZE_SHIFT;
                if src_inc {
                    ccr |= ccr::PINC;
                }
                if dst_inc {
                    ccr |= ccr::MINC;
                }
                ChannelProgram {
                    ccr,
                    cpar: desc.src,
                    cmar: desc.dst,
                    cndtr: desc.count,
                }
            }
            _ => return Err(ConfigError::InvalidDirection),
        };

        Ok(program)
    }
}
