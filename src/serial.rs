//! Serial transmit seam and baud rate register math.

use crate::error::{ConfigError, Fault};

/// Smallest USARTDIV the baud generator accepts.
const MIN_DIV: u32 = 16;

/// Baud rate register setting for a given clock and rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Brr {
    /// Value for the BRR register
    pub value: u16,
    /// `true` when CR1.OVER8 must be set
    pub over8: bool,
    /// Rate the line will actually run at
    pub actual_baud: u32,
}

impl Brr {
    /// Deviation from `requested`, in parts per thousand.
    pub fn error_permille(&self, requested: u32) -> u32 {
        let diff = (i64::from(self.actual_baud) - i64::from(requested)).unsigned_abs();
        (diff * 1000 / u64::from(requested.max(1))) as u32
    }
}

/// Computes the BRR setting for `baud` from the USART kernel clock `pclk`.
///
/// 16x oversampling is used whenever the divider allows it. Rates above
/// `pclk / 16` fall back to 8x oversampling, where the divider can only
/// take even values; the resulting line rate is reported in
/// [`Brr::actual_baud`]. Rates above `pclk / 8` are unreachable.
pub fn brr_for(pclk: u32, baud: u32) -> Result<Brr, ConfigError> {
    if baud == 0 {
        return Err(ConfigError::BaudUnreachable);
    }

    let div = (pclk + baud / 2) / baud;
    if div >= MIN_DIV {
        if div > u32::from(u16::MAX) {
            return Err(ConfigError::BaudUnreachable);
        }
        return Ok(Brr {
            value: div as u16,
            over8: false,
            actual_baud: pclk / div,
        });
    }

    // OVER8: USARTDIV = 2 * pclk / baud, and only even values are encodable.
    let half = div.max(1);
    let usartdiv = 2 * half;
    if usartdiv < MIN_DIV {
        return Err(ConfigError::BaudUnreachable);
    }

    Ok(Brr {
        value: ((usartdiv & !0xF) | ((usartdiv & 0xF) >> 1)) as u16,
        over8: true,
        actual_baud: pclk / half,
    })
}

/// Transmit side of a serial port.
pub trait SerialTx {
    /// Enables the transmitter at `baud`.
    fn open(&mut self, baud: u32) -> Result<Brr, ConfigError>;

    /// Blocks until the port has taken `buf` and returns how many bytes it
    /// accepted.
    fn write_buf(&mut self, buf: &[u8]) -> Result<usize, Fault>;

    /// Address of the transmit data register, as seen by the DMA controller.
    fn tx_data_register(&self) -> usize;

    /// Makes the port raise a DMA request whenever its transmit register is
    /// empty.
    fn enable_dma_tx_request(&mut self);

    /// Like [`write_buf`](SerialTx::write_buf), but a partial write is a
    /// [`Fault::ShortWrite`].
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Fault> {
        let written = self.write_buf(buf)?;
        if written != buf.len() {
            return Err(Fault::ShortWrite {
                written,
                expected: buf.len(),
            });
        }
        Ok(())
    }
}
