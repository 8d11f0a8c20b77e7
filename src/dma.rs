//! DMA controller seam and the circular transfer built on it.

use core::sync::atomic::{self, Ordering};

use crate::chip::{Channel, ChannelProgram, ChipFamily, Controller};
use crate::descriptor::TransferDescriptor;
use crate::error::ConfigError;
use crate::traits::DmaReadBuffer;

/// One DMA controller instance.
pub trait DmaEngine {
    /// Family whose channel rules apply to this controller.
    fn family(&self) -> ChipFamily;

    fn controller(&self) -> Controller;

    /// Clocks the controller.
    fn init(&mut self);

    /// Writes CPAR/CMAR/CNDTR/CCR of `channel`. The channel is disabled.
    fn write_channel(&mut self, channel: Channel, program: &ChannelProgram);

    /// Routes `channel`'s interrupt to the handler.
    fn attach_interrupt(&mut self, channel: Channel);

    fn enable(&mut self, channel: Channel);

    fn disable(&mut self, channel: Channel);

    /// Raw interrupt status register.
    fn isr(&self) -> u32;

    /// Validates `desc` for `channel` and, only if it is acceptable, writes
    /// it to the hardware.
    fn configure_tube(
        &mut self,
        channel: Channel,
        desc: &TransferDescriptor,
    ) -> Result<(), ConfigError> {
        let program = self.family().program(self.controller(), channel, desc)?;
        self.write_channel(channel, &program);
        Ok(())
    }
}

/// A channel endlessly re-streaming a buffer.
///
/// The controller keeps reading the buffer for as long as the channel is
/// enabled, so the transfer owns the buffer, and requires it to be
/// `'static`, until [`stop`](CircularTransfer::stop) or drop disables it.
pub struct CircularTransfer<E: DmaEngine, B> {
    // always `Some` outside of `Drop::drop`
    inner: Option<TransferInner<E, B>>,
}

impl<E: DmaEngine, B> CircularTransfer<E, B> {
    /// Enables `channel`, which must already hold a program for `buffer`.
    pub fn start(mut engine: E, channel: Channel, buffer: B) -> Self
    where
        B: DmaReadBuffer + 'static,
    {
        // Prevent preceding writes to the buffer from being moved past the
        // channel enable (i.e. after the transfer has started).
        atomic::compiler_fence(Ordering::Release);

        engine.enable(channel);

        CircularTransfer {
            inner: Some(TransferInner {
                engine,
                channel,
                buffer,
            }),
        }
    }

    pub fn channel(&self) -> Channel {
        self.inner().channel
    }

    pub fn isr(&self) -> u32 {
        self.inner().engine.isr()
    }

    pub fn engine(&self) -> &E {
        &self.inner().engine
    }

    /// Disables the channel and gives back the controller and buffer.
    pub fn stop(mut self) -> (E, B) {
        match self.inner.take() {
            Some(mut inner) => {
                inner.stop();
                (inner.engine, inner.buffer)
            }
            None => unreachable!(),
        }
    }

    fn inner(&self) -> &TransferInner<E, B> {
        match &self.inner {
            Some(inner) => inner,
            None => unreachable!(),
        }
    }
}

struct TransferInner<E: DmaEngine, B> {
    engine: E,
    channel: Channel,
    buffer: B,
}

impl<E: DmaEngine, B> TransferInner<E, B> {
    fn stop(&mut self) {
        self.engine.disable(self.channel);

        // Prevent subsequent accesses to the buffer from being moved ahead
        // of the channel disable (i.e. before the transfer is stopped).
        atomic::compiler_fence(Ordering::Acquire);
    }
}

impl<E: DmaEngine, B> Drop for CircularTransfer<E, B> {
    fn drop(&mut self) {
        if let Some(mut inner) = self.inner.take() {
            inner.stop();
        }
    }
}
