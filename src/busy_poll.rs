//! Busy-poll transmitter.
//!
//! Writes the whole transmit buffer with a blocking call, then flips a
//! probe pin and a mirror LED together. The probe's half-period is the time
//! it takes to send one buffer, so a scope on the probe reads throughput
//! directly: `bytes/s = 2 * N * f_probe`.

use embedded_hal::digital::OutputPin;

use crate::buffer::TxBuffer;
use crate::config::BenchConfig;
use crate::error::{pin_fault, Error, Result};
use crate::heartbeat::{Heartbeat, Level};
use crate::serial::{Brr, SerialTx};

pub struct BusyPollBench<'b, S, P, L, const N: usize> {
    serial: S,
    probe: Heartbeat<P>,
    led: L,
    buffer: &'b TxBuffer<N>,
    brr: Brr,
    iterations: u64,
}

impl<'b, S, P, L, const N: usize> BusyPollBench<'b, S, P, L, N>
where
    S: SerialTx,
    P: OutputPin,
    L: OutputPin,
{
    /// Drives both pins low, opens the port, then fills `buffer`.
    pub fn initialize(
        mut serial: S,
        probe: P,
        mut led: L,
        buffer: &'b mut TxBuffer<N>,
        config: &BenchConfig,
    ) -> Result<Self> {
        led.set_low().map_err(pin_fault)?;
        let probe = Heartbeat::new(probe)?;
        let brr = serial.open(config.baud)?;

        buffer.fill(config.sentinel);

        Ok(Self {
            serial,
            probe,
            led,
            buffer,
            brr,
            iterations: 0,
        })
    }

    /// One pass: send the buffer, then flip both pins.
    pub fn step(&mut self) -> Result<Level> {
        self.serial.write_all(self.buffer.as_bytes())?;

        let level = self.probe.toggle()?;
        self.led.set_state(level.into()).map_err(pin_fault)?;
        self.iterations += 1;
        Ok(level)
    }

    /// Steps until something fails and returns what failed.
    pub fn run_forever(&mut self) -> Error {
        loop {
            if let Err(e) = self.step() {
                return e;
            }
        }
    }

    /// Baud rate setting the port was opened with.
    pub fn brr(&self) -> Brr {
        self.brr
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    pub fn level(&self) -> Level {
        self.probe.level()
    }
}
