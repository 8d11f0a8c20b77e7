//! Compile-time bench configuration.

use crate::signal::SignalMode;

/// Number of bytes sent per buffer.
pub const BUF_SIZE: usize = 1000;

/// Serial line rate. Deliberately above any standard rate.
pub const BAUD: u32 = 8_500_000;

/// Byte the transmit buffer is filled with.
pub const SENTINEL: u8 = b'x';

/// How long the DMA bench sleeps between completion checks.
pub const POLL_INTERVAL_MS: u32 = 100;

/// Core clock after bring-up.
pub const SYSCLK_HZ: u32 = 72_000_000;

/// Runtime view of the constants above.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BenchConfig {
    /// Serial line rate in bits per second
    pub baud: u32,
    /// Fill byte for the transmit buffer
    pub sentinel: u8,
    /// Sleep between completion checks (DMA bench only)
    pub poll_interval_ms: u32,
    /// How completion passes map to heartbeat toggles (DMA bench only)
    pub signal_mode: SignalMode,
}

impl BenchConfig {
    /// Configuration built from the crate constants.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            baud: BAUD,
            sentinel: SENTINEL,
            poll_interval_ms: POLL_INTERVAL_MS,
            signal_mode: SignalMode::Counting,
        }
    }

    #[must_use]
    pub const fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    #[must_use]
    pub const fn with_sentinel(mut self, sentinel: u8) -> Self {
        self.sentinel = sentinel;
        self
    }

    #[must_use]
    pub const fn with_poll_interval_ms(mut self, ms: u32) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    #[must_use]
    pub const fn with_signal_mode(mut self, mode: SignalMode) -> Self {
        self.signal_mode = mode;
        self
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self::new()
    }
}
