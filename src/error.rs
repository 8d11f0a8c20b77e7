//! Error types.
//!
//! - [`ConfigError`]: setup-time failures. These are fatal, the firmware
//!   halts before entering its steady-state loop.
//! - [`Fault`]: steady-state failures. Nothing is retried, the loop stops
//!   and hands the fault back to the caller.
//!
//! [`Error`] wraps both and is what the benches return.

use embedded_hal::digital::ErrorKind;

use crate::chip::ChannelStatus;

/// Configuration errors, raised before any transfer is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The chip family has DMA streams rather than channels
    UnsupportedFamily,
    /// Channel number does not exist on the controller
    InvalidChannel,
    /// The request source is not wired to the chosen channel
    RequestNotRoutable,
    /// Transfer count is zero or does not fit the count register
    InvalidTransferCount,
    /// Exactly one endpoint must be a peripheral register
    InvalidDirection,
    /// An endpoint address is not aligned to its transfer width
    Misaligned,
    /// The baud rate cannot be generated from the peripheral clock
    BaudUnreachable,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::UnsupportedFamily => "unsupported stm32 series",
            ConfigError::InvalidChannel => "invalid DMA channel",
            ConfigError::RequestNotRoutable => "request source not routable to channel",
            ConfigError::InvalidTransferCount => "invalid transfer count",
            ConfigError::InvalidDirection => "transfer needs exactly one peripheral endpoint",
            ConfigError::Misaligned => "address not aligned to transfer width",
            ConfigError::BaudUnreachable => "baud rate unreachable",
        }
    }
}

/// Steady-state faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The serial port reported an error
    Serial,
    /// Driving an output pin failed
    Pin(ErrorKind),
    /// The serial port accepted fewer bytes than requested
    ShortWrite {
        /// Bytes accepted
        written: usize,
        /// Bytes requested
        expected: usize,
    },
    /// The DMA controller flagged a transfer error
    TransferError(ChannelStatus),
}

impl core::fmt::Display for Fault {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Fault::Serial => f.write_str("serial write failed"),
            Fault::Pin(kind) => write!(f, "output pin error: {}", kind),
            Fault::ShortWrite { written, expected } => {
                write!(f, "short write: {} of {} bytes", written, expected)
            }
            Fault::TransferError(status) => {
                write!(f, "DMA transfer error (status {:#06b})", status.bits())
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Fault {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Fault::Serial => defmt::write!(f, "serial write failed"),
            Fault::Pin(_) => defmt::write!(f, "output pin error"),
            Fault::ShortWrite { written, expected } => {
                defmt::write!(f, "short write: {} of {} bytes", written, expected)
            }
            Fault::TransferError(status) => {
                defmt::write!(f, "DMA transfer error (status {=u8:b})", status.bits())
            }
        }
    }
}

/// Unified error type returned by the benches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Setup was rejected
    Config(ConfigError),
    /// Steady state stopped
    Fault(Fault),
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<Fault> for Error {
    fn from(e: Fault) -> Self {
        Error::Fault(e)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "configuration error: {}", e),
            Error::Fault(e) => write!(f, "fault: {}", e),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Error {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Error::Config(e) => defmt::write!(f, "configuration error: {}", e),
            Error::Fault(e) => defmt::write!(f, "fault: {}", e),
        }
    }
}

/// Result type alias using the crate [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Maps an `embedded-hal` pin error onto a [`Fault`].
pub(crate) fn pin_fault<E: embedded_hal::digital::Error>(e: E) -> Fault {
    Fault::Pin(e.kind())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_error() {
        let e: Error = ConfigError::RequestNotRoutable.into();
        assert_eq!(e, Error::Config(ConfigError::RequestNotRoutable));
    }

    #[test]
    fn fault_converts_into_error() {
        let e: Error = Fault::Serial.into();
        assert_eq!(e, Error::Fault(Fault::Serial));
    }

    #[test]
    fn as_str_names_the_family_error() {
        assert_eq!(
            ConfigError::UnsupportedFamily.as_str(),
            "unsupported stm32 series"
        );
    }
}
