//! Serial transmit throughput benches for STM32.
//!
//! Two firmware images share this crate:
//!
//! - `busy-poll`: blocking writes of a fixed buffer, flipping a probe pin
//!   after every buffer ([`busy_poll`]).
//! - `usart-dma`: a DMA channel streams the same buffer into USART1 in
//!   circular mode and a heartbeat pin follows the completion interrupts
//!   ([`dma_tx`]).
//!
//! Everything except [`board`] is hardware independent and tested on the
//! host against mock peripherals.
//!
//! # Features
//!
//! - `stm32f303`: STM32F3DISCOVERY board support, runtime and semihosting.
//!   Required by the firmware binaries.
//! - `defmt`: `defmt::Format` for the public types.

#![no_std]

#[cfg(all(target_arch = "arm", target_os = "none", not(feature = "stm32f303")))]
compile_error!("unsupported stm32 series: enable the `stm32f303` feature");

#[cfg(test)]
extern crate std;

pub mod buffer;
pub mod busy_poll;
pub mod chip;
pub mod config;
pub mod descriptor;
pub mod dma;
pub mod dma_tx;
pub mod error;
pub mod heartbeat;
pub mod serial;
pub mod signal;
pub mod throughput;
mod traits;

#[cfg(feature = "stm32f303")]
pub mod board;

#[cfg(test)]
mod test_utils;

pub use buffer::TxBuffer;
pub use busy_poll::BusyPollBench;
pub use config::BenchConfig;
pub use dma::{CircularTransfer, DmaEngine};
pub use dma_tx::{DmaBench, DmaParts};
pub use error::{ConfigError, Error, Fault, Result};
pub use serial::SerialTx;
pub use signal::{CompletionSignal, Notifier, SignalMode, Watcher};
pub use traits::{DmaReadBuffer, DmaTarget};
