//! Completion signalling between the DMA interrupt and the main loop.
//!
//! There is exactly one producer (the channel's interrupt handler) and one
//! consumer (the steady-state loop). The interrupt may preempt the loop at
//! any point but is never nested with itself.
//!
//! Completions are counted rather than latched in a flag: a flag that is
//! checked and then cleared by the consumer drops every completion that
//! lands between the check and the clear, and collapses several passes
//! into one. The counter is drained with a single atomic swap, so no pass
//! is lost however long the consumer sleeps.

use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use crate::chip::{Channel, ChannelStatus};

/// How drained passes are reported to the heartbeat.
///
/// Pass accounting is lossless in both modes; only the heartbeat differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SignalMode {
    /// Every pass toggles the heartbeat once.
    #[default]
    Counting,
    /// Any number of passes since the last poll toggles the heartbeat once,
    /// like a boolean completion flag. Keeps the pin blinking at the poll
    /// rate however many passes fit into one interval.
    Latched,
}

/// Passes drained by one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Completion {
    /// Completed passes since the previous drain
    pub passes: u32,
    /// Channel flags captured by the most recent interrupt
    pub status: ChannelStatus,
}

impl Completion {
    /// Heartbeat toggles this completion is worth under `mode`.
    pub fn toggles(&self, mode: SignalMode) -> u32 {
        match mode {
            SignalMode::Counting => self.passes,
            SignalMode::Latched => 1,
        }
    }
}

/// Shared state behind a [`Notifier`]/[`Watcher`] pair.
///
/// Meant to live in a `static`; see [`CompletionSignal::try_split`].
pub struct CompletionSignal {
    passes: AtomicU32,
    isr: AtomicU32,
    channel: Channel,
    split: AtomicBool,
}

impl CompletionSignal {
    /// Signal for completions of `channel`.
    pub const fn new(channel: Channel) -> Self {
        Self {
            passes: AtomicU32::new(0),
            isr: AtomicU32::new(0),
            channel,
            split: AtomicBool::new(false),
        }
    }

    /// Hands out the producer and consumer halves.
    ///
    /// Returns `None` on every call after the first, so there can only ever
    /// be one of each.
    pub fn try_split(&self) -> Option<(Notifier<'_>, Watcher<'_>)> {
        if self.split.swap(true, Ordering::AcqRel) {
            return None;
        }
        Some((Notifier { signal: self }, Watcher { signal: self }))
    }
}

/// Producer half, owned by the interrupt handler.
pub struct Notifier<'a> {
    signal: &'a CompletionSignal,
}

impl Notifier<'_> {
    /// Records one completed pass together with the controller's ISR value.
    ///
    /// Two atomic stores, nothing else; safe to call from interrupt context.
    #[inline]
    pub fn notify(&self, isr: u32) {
        self.signal.isr.store(isr, Ordering::Relaxed);
        // Release pairs with the consumer's Acquire swap, which makes the
        // snapshot above visible before the count is.
        self.signal.passes.fetch_add(1, Ordering::Release);
    }

    pub fn channel(&self) -> Channel {
        self.signal.channel
    }
}

/// Consumer half, owned by the steady-state loop.
pub struct Watcher<'a> {
    signal: &'a CompletionSignal,
}

impl Watcher<'_> {
    /// Drains all passes recorded since the last call.
    pub fn take(&mut self) -> Option<Completion> {
        let passes = self.signal.passes.swap(0, Ordering::Acquire);
        if passes == 0 {
            return None;
        }

        let isr = self.signal.isr.load(Ordering::Relaxed);
        Some(Completion {
            passes,
            status: ChannelStatus::from_isr(isr, self.signal.channel),
        })
    }

    /// Passes recorded but not yet drained.
    pub fn pending(&self) -> u32 {
        self.signal.passes.load(Ordering::Relaxed)
    }

    pub fn channel(&self) -> Channel {
        self.signal.channel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TC4: u32 = 0b0011 << 12;

    #[test]
    fn split_is_handed_out_once() {
        let signal = CompletionSignal::new(Channel::CH4);
        assert!(signal.try_split().is_some());
        assert!(signal.try_split().is_none());
    }

    #[test]
    fn nothing_pending_initially() {
        let signal = CompletionSignal::new(Channel::CH4);
        let (_, mut watcher) = signal.try_split().unwrap();
        assert_eq!(watcher.take(), None);
    }

    #[test]
    fn back_to_back_completions_are_all_counted() {
        let signal = CompletionSignal::new(Channel::CH4);
        let (notifier, mut watcher) = signal.try_split().unwrap();

        for _ in 0..5 {
            notifier.notify(TC4);
        }
        assert_eq!(watcher.pending(), 5);

        let completion = watcher.take().unwrap();
        assert_eq!(completion.passes, 5);
        assert!(completion.status.contains(ChannelStatus::TRANSFER_COMPLETE));

        // drained
        assert_eq!(watcher.take(), None);
    }

    #[test]
    fn snapshot_is_from_latest_interrupt() {
        let signal = CompletionSignal::new(Channel::CH4);
        let (notifier, mut watcher) = signal.try_split().unwrap();

        notifier.notify(TC4);
        notifier.notify(TC4 | (0b1000 << 12));

        let completion = watcher.take().unwrap();
        assert!(completion.status.is_error());
    }

    #[test]
    fn counting_is_the_default_mode() {
        assert_eq!(SignalMode::default(), SignalMode::Counting);
    }

    #[test]
    fn latched_mode_collapses_passes() {
        let completion = Completion {
            passes: 3,
            status: ChannelStatus::TRANSFER_COMPLETE,
        };
        assert_eq!(completion.toggles(SignalMode::Counting), 3);
        assert_eq!(completion.toggles(SignalMode::Latched), 1);
    }

    #[test]
    fn concurrent_producer_loses_nothing() {
        use std::thread;

        static SIGNAL: CompletionSignal = CompletionSignal::new(Channel::CH4);
        let (notifier, mut watcher) = SIGNAL.try_split().unwrap();

        let producer = thread::spawn(move || {
            for _ in 0..10_000 {
                notifier.notify(TC4);
            }
        });

        let mut seen = 0;
        while seen < 10_000 {
            if let Some(c) = watcher.take() {
                seen += c.passes;
            }
        }
        producer.join().unwrap();

        assert_eq!(seen, 10_000);
        assert_eq!(watcher.take(), None);
    }
}
