//! DMA-driven transmitter.
//!
//! A channel streams the transmit buffer into the serial data register in
//! circular mode, so the CPU is not involved per byte. The channel
//! interrupts once per pass; the handler only records the pass (see
//! [`on_interrupt`]) and the steady-state loop toggles a heartbeat pin for
//! the passes it drains.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::buffer::TxBuffer;
use crate::chip::{self, ChannelStatus};
use crate::config::BenchConfig;
use crate::descriptor::{RequestSource, TransferDescriptor};
use crate::dma::{CircularTransfer, DmaEngine};
use crate::error::{ConfigError, Error, Fault, Result};
use crate::heartbeat::{Heartbeat, Level};
use crate::serial::{Brr, SerialTx};
use crate::signal::{Completion, Notifier, Watcher};
use crate::throughput;

/// Request source the transmit channel serves.
pub const TX_REQUEST: RequestSource = RequestSource::Usart1Tx;

/// Peripherals the bench takes ownership of.
pub struct DmaParts<E, S, P, D> {
    pub engine: E,
    pub serial: S,
    pub heartbeat: P,
    pub delay: D,
}

/// Interrupt handler body.
///
/// Counts a pass when `isr` shows a completion or an error on the
/// notifier's channel and returns whether it did. Nothing else happens in
/// interrupt context.
#[inline]
pub fn on_interrupt(notifier: &Notifier<'_>, isr: u32) -> bool {
    let status = ChannelStatus::from_isr(isr, notifier.channel());
    if status.intersects(ChannelStatus::TRANSFER_COMPLETE | ChannelStatus::TRANSFER_ERROR) {
        notifier.notify(isr);
        true
    } else {
        false
    }
}

pub struct DmaBench<'w, E: DmaEngine, S, P, D, const N: usize> {
    transfer: CircularTransfer<E, &'static TxBuffer<N>>,
    // held so the port stays configured for as long as the channel feeds it
    _serial: S,
    heartbeat: Heartbeat<P>,
    delay: D,
    watcher: Watcher<'w>,
    config: BenchConfig,
    descriptor: TransferDescriptor,
    brr: Brr,
    passes: u64,
    polls: u64,
}

impl<'w, E, S, P, D, const N: usize> DmaBench<'w, E, S, P, D, N>
where
    E: DmaEngine,
    S: SerialTx,
    P: OutputPin,
    D: DelayNs,
{
    /// Brings the transmit pipeline up, in this order:
    ///
    /// 1. heartbeat pin driven low
    /// 2. `buffer` filled with the sentinel
    /// 3. descriptor built: buffer -> serial data register, 8/8 bits,
    ///    source increment, circular, completion interrupt
    /// 4. controller initialized
    /// 5. descriptor programmed into the channel
    /// 6. channel interrupt attached
    /// 7. channel enabled
    /// 8. serial port opened and its DMA transmit request enabled
    ///
    /// A rejected descriptor aborts at step 5, before the channel is
    /// enabled. Failures after step 7 disable the channel again.
    pub fn setup(
        parts: DmaParts<E, S, P, D>,
        buffer: &'static mut TxBuffer<N>,
        watcher: Watcher<'w>,
        config: BenchConfig,
    ) -> Result<Self> {
        let DmaParts {
            mut engine,
            mut serial,
            heartbeat,
            delay,
        } = parts;
        let (_, channel) = chip::route(TX_REQUEST);
        if watcher.channel() != channel {
            return Err(ConfigError::InvalidChannel.into());
        }

        let heartbeat = Heartbeat::new(heartbeat)?;

        buffer.fill(config.sentinel);
        let buffer: &'static TxBuffer<N> = buffer;

        let descriptor = TransferDescriptor::memory_to_peripheral(
            &buffer,
            serial.tx_data_register(),
            TX_REQUEST,
        );

        engine.init();
        engine.configure_tube(channel, &descriptor)?;
        engine.attach_interrupt(channel);

        let transfer = CircularTransfer::start(engine, channel, buffer);

        let brr = serial.open(config.baud)?;
        serial.enable_dma_tx_request();

        Ok(Self {
            transfer,
            _serial: serial,
            heartbeat,
            delay,
            watcher,
            config,
            descriptor,
            brr,
            passes: 0,
            polls: 0,
        })
    }

    /// Sleeps for the poll interval, then [`service`](Self::service)s.
    pub fn poll(&mut self) -> Result<Option<Completion>> {
        self.delay.delay_ms(self.config.poll_interval_ms);
        self.polls += 1;
        self.service()
    }

    /// Drains pending passes and toggles the heartbeat for them.
    ///
    /// Fails with [`Fault::TransferError`] once the channel reports an
    /// error, whether or not an interrupt announced it.
    pub fn service(&mut self) -> Result<Option<Completion>> {
        let drained = self.watcher.take();

        // TEIE is off: on an error the controller only latches TEIF and
        // disables the channel, no interrupt follows.
        let live = ChannelStatus::from_isr(self.transfer.isr(), self.transfer.channel());
        if live.is_error() {
            return Err(Fault::TransferError(live).into());
        }

        let completion = match drained {
            Some(completion) => completion,
            None => return Ok(None),
        };

        if completion.status.is_error() {
            return Err(Fault::TransferError(completion.status).into());
        }

        self.passes += u64::from(completion.passes);
        self.heartbeat
            .toggle_times(completion.toggles(self.config.signal_mode))?;
        Ok(Some(completion))
    }

    /// Polls until something fails and returns what failed.
    pub fn run_forever(&mut self) -> Error {
        loop {
            if let Err(e) = self.poll() {
                return e;
            }
        }
    }

    /// Completed passes drained so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    pub fn level(&self) -> Level {
        self.heartbeat.level()
    }

    pub fn descriptor(&self) -> &TransferDescriptor {
        &self.descriptor
    }

    pub fn brr(&self) -> Brr {
        self.brr
    }

    /// Time spent sleeping in [`poll`](Self::poll), which is close to the
    /// total run time since the loop does little else.
    pub fn elapsed_ms(&self) -> u64 {
        self.polls * u64::from(self.config.poll_interval_ms)
    }

    /// Bytes per second streamed so far, judged by drained passes.
    pub fn throughput(&self) -> Option<u64> {
        let bytes = self.passes * N as u64;
        throughput::from_transfer(bytes, self.elapsed_ms() * 1000)
    }

    /// [`throughput`](Self::throughput) as a share of what the configured
    /// line allows, in parts per thousand.
    pub fn efficiency_permille(&self) -> Option<u32> {
        self.throughput()
            .map(|rate| throughput::efficiency_permille(rate, self.brr.actual_baud))
    }
}
