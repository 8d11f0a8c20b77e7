//! STM32F3DISCOVERY (STM32F303VC) support.
//!
//! - USART1 TX on PA9 (AF7), fed by DMA1 channel 4
//! - heartbeat LED on PE9 (LD3)
//! - throughput probe on PA4

use core::convert::Infallible;

use cortex_m::{asm, peripheral::NVIC};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

pub use stm32f3::stm32f303 as pac;

use crate::chip::{Channel, ChannelProgram, ChipFamily, Controller};
use crate::config::SYSCLK_HZ;
use crate::dma::DmaEngine;
use crate::error::{ConfigError, Fault};
use crate::serial::{brr_for, Brr, SerialTx};

pub const FAMILY: ChipFamily = ChipFamily::Stm32F3;

// Stream-based families need different request and channel identifiers.
const _: () = assert!(FAMILY.has_channels(), "unsupported stm32 series");

/// Peripherals handed out by [`Board::bring_up`].
pub struct Board {
    pub dma1: Dma1,
    pub usart1: Usart1,
    pub led: Pe9,
    pub probe: Pa4,
    pub delay: CycleDelay,
}

impl Board {
    /// First startup phase: clocks, flash wait states and pin muxing.
    ///
    /// Must run before anything else touches a peripheral; the bench
    /// context is constructed afterwards from the returned parts. Returns
    /// `None` if the peripherals were already taken.
    pub fn bring_up() -> Option<Self> {
        let dp = pac::Peripherals::take()?;

        // 8 MHz from the ST-LINK MCO (bypass) x9 = 72 MHz, APB1 at 36 MHz
        dp.FLASH
            .acr
            .modify(|_, w| w.latency().ws2().prftbe().set_bit());
        dp.RCC
            .cr
            .modify(|_, w| w.hsebyp().set_bit().hseon().set_bit());
        while dp.RCC.cr.read().hserdy().bit_is_clear() {}

        dp.RCC.cfgr.modify(|_, w| {
            w.pllmul().mul9();
            // HSE through PREDIV, which is /1 after reset
            w.pllsrc().set_bit();
            w.ppre1().div2()
        });
        dp.RCC.cr.modify(|_, w| w.pllon().set_bit());
        while dp.RCC.cr.read().pllrdy().bit_is_clear() {}

        dp.RCC.cfgr.modify(|_, w| w.sw().pll());
        while !dp.RCC.cfgr.read().sws().is_pll() {}

        dp.RCC
            .ahbenr
            .modify(|_, w| w.iopaen().enabled().iopeen().enabled());

        // PA4 and PE9 push-pull outputs, PA9 alternate function 7
        dp.GPIOA
            .moder
            .modify(|_, w| w.moder4().output().moder9().alternate());
        dp.GPIOA.ospeedr.modify(|_, w| w.ospeedr9().high_speed());
        dp.GPIOA.afrh.modify(|_, w| w.afrh9().af7());
        dp.GPIOE.moder.modify(|_, w| w.moder9().output());

        Some(Board {
            dma1: Dma1 { regs: dp.DMA1 },
            usart1: Usart1 {
                regs: dp.USART1,
                pclk: SYSCLK_HZ,
            },
            led: Pe9 { _private: () },
            probe: Pa4 { _private: () },
            delay: CycleDelay::new(SYSCLK_HZ),
        })
    }
}

// =============================================================================
// DMA1
// =============================================================================

/// Thin wrapper around the DMA1 peripheral.
pub struct Dma1 {
    regs: pac::DMA1,
}

macro_rules! with_channel {
    ($regs:expr, $channel:expr, |$ch:ident| $body:block) => {
        match $channel.number() {
            1 => { let $ch = &$regs.ch1; $body }
            2 => { let $ch = &$regs.ch2; $body }
            3 => { let $ch = &$regs.ch3; $body }
            4 => { let $ch = &$regs.ch4; $body }
            5 => { let $ch = &$regs.ch5; $body }
            6 => { let $ch = &$regs.ch6; $body }
            7 => { let $ch = &$regs.ch7; $body }
            _ => {}
        }
    };
}

fn dma1_interrupt(channel: Channel) -> Option<pac::Interrupt> {
    match channel.number() {
        1 => Some(pac::Interrupt::DMA1_CH1),
        2 => Some(pac::Interrupt::DMA1_CH2),
        3 => Some(pac::Interrupt::DMA1_CH3),
        4 => Some(pac::Interrupt::DMA1_CH4),
        5 => Some(pac::Interrupt::DMA1_CH5),
        6 => Some(pac::Interrupt::DMA1_CH6),
        7 => Some(pac::Interrupt::DMA1_CH7),
        _ => None,
    }
}

impl DmaEngine for Dma1 {
    fn family(&self) -> ChipFamily {
        FAMILY
    }

    fn controller(&self) -> Controller {
        Controller::Dma1
    }

    fn init(&mut self) {
        let regs = unsafe { &*pac::RCC::ptr() };
        regs.ahbenr.modify(|_, w| w.dma1en().enabled());
    }

    fn write_channel(&mut self, channel: Channel, program: &ChannelProgram) {
        with_channel!(self.regs, channel, |ch| {
            ch.cr.reset();
            ch.par.write(|w| w.pa().bits(program.cpar as u32));
            ch.mar.write(|w| w.ma().bits(program.cmar as u32));
            ch.ndtr.write(|w| w.ndt().bits(program.cndtr as u16));
            ch.cr.write(|w| unsafe { w.bits(program.ccr) });
        });
    }

    fn attach_interrupt(&mut self, channel: Channel) {
        if let Some(irq) = dma1_interrupt(channel) {
            unsafe { NVIC::unmask(irq) };
        }
    }

    fn enable(&mut self, channel: Channel) {
        clear_flags(&self.regs, channel);

        with_channel!(self.regs, channel, |ch| {
            ch.cr.modify(|_, w| w.en().enabled());
        });
    }

    fn disable(&mut self, channel: Channel) {
        with_channel!(self.regs, channel, |ch| {
            ch.cr.modify(|_, w| w.en().disabled());
        });
    }

    fn isr(&self) -> u32 {
        self.regs.isr.read().bits()
    }
}

/// Clears every interrupt flag of `channel`.
fn clear_flags(regs: &pac::dma1::RegisterBlock, channel: Channel) {
    regs.ifcr.write(|w| match channel.number() {
        1 => w.cgif1().set_bit(),
        2 => w.cgif2().set_bit(),
        3 => w.cgif3().set_bit(),
        4 => w.cgif4().set_bit(),
        5 => w.cgif5().set_bit(),
        6 => w.cgif6().set_bit(),
        7 => w.cgif7().set_bit(),
        _ => w,
    });
}

/// Reads DMA1's ISR and clears `channel`'s flags. For use in the channel's
/// interrupt handler, which does not own the controller.
pub fn take_dma1_status(channel: Channel) -> u32 {
    let dma1 = unsafe { &*pac::DMA1::ptr() };
    let isr = dma1.isr.read().bits();
    clear_flags(dma1, channel);
    isr
}

// =============================================================================
// USART1
// =============================================================================

pub struct Usart1 {
    regs: pac::USART1,
    pclk: u32,
}

impl SerialTx for Usart1 {
    fn open(&mut self, baud: u32) -> Result<Brr, ConfigError> {
        let brr = brr_for(self.pclk, baud)?;

        let rcc_regs = unsafe { &*pac::RCC::ptr() };
        rcc_regs.apb2enr.modify(|_, w| w.usart1en().enabled());

        self.regs.cr1.reset();
        // computed divider, including the OVER8 fraction shift
        self.regs
            .brr
            .write(|w| unsafe { w.bits(u32::from(brr.value)) });
        self.regs.cr1.write(|w| {
            w.over8().bit(brr.over8);
            w.te().enabled();
            w.ue().enabled()
        });

        Ok(brr)
    }

    fn write_buf(&mut self, buf: &[u8]) -> Result<usize, Fault> {
        for &byte in buf {
            while self.regs.isr.read().txe().bit_is_clear() {}
            self.regs
                .tdr
                .write(|w| unsafe { w.tdr().bits(u16::from(byte)) });
        }
        Ok(buf.len())
    }

    fn tx_data_register(&self) -> usize {
        &self.regs.tdr as *const _ as usize
    }

    fn enable_dma_tx_request(&mut self) {
        self.regs.cr3.modify(|_, w| w.dmat().enabled());
    }
}

// =============================================================================
// GPIO and delay
// =============================================================================

macro_rules! output_pin {
    ($Pin:ident, $GPIO:ident, $bs:ident, $br:ident) => {
        pub struct $Pin {
            _private: (),
        }

        impl ErrorType for $Pin {
            type Error = Infallible;
        }

        impl OutputPin for $Pin {
            fn set_low(&mut self) -> Result<(), Infallible> {
                // BSRR is write-only and atomic, no read-modify-write needed
                unsafe { (*pac::$GPIO::ptr()).bsrr.write(|w| w.$br().set_bit()) };
                Ok(())
            }

            fn set_high(&mut self) -> Result<(), Infallible> {
                unsafe { (*pac::$GPIO::ptr()).bsrr.write(|w| w.$bs().set_bit()) };
                Ok(())
            }
        }
    };
}

output_pin!(Pa4, GPIOA, bs4, br4);
output_pin!(Pe9, GPIOE, bs9, br9);

/// Busy-wait delay counted in core cycles.
pub struct CycleDelay {
    cycles_per_us: u32,
}

impl CycleDelay {
    pub fn new(sysclk_hz: u32) -> Self {
        Self {
            cycles_per_us: sysclk_hz / 1_000_000,
        }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = (u64::from(ns) * u64::from(self.cycles_per_us) + 999) / 1000;
        asm::delay(cycles.min(u64::from(u32::MAX)) as u32);
    }
}
