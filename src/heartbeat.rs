//! Output pins toggled for external measurement.

use embedded_hal::digital::{OutputPin, PinState};

use crate::error::{pin_fault, Fault};

/// Last level driven onto a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub fn flipped(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }
}

impl From<Level> for PinState {
    fn from(level: Level) -> Self {
        match level {
            Level::Low => PinState::Low,
            Level::High => PinState::High,
        }
    }
}

/// A toggled output pin that remembers what it last drove.
pub struct Heartbeat<P> {
    pin: P,
    level: Level,
    toggles: u64,
}

impl<P: OutputPin> Heartbeat<P> {
    /// Takes `pin` and drives it low.
    pub fn new(mut pin: P) -> Result<Self, Fault> {
        pin.set_low().map_err(pin_fault)?;
        Ok(Self {
            pin,
            level: Level::Low,
            toggles: 0,
        })
    }

    /// Flips the pin and returns the new level.
    pub fn toggle(&mut self) -> Result<Level, Fault> {
        let next = self.level.flipped();
        self.pin.set_state(next.into()).map_err(pin_fault)?;
        self.level = next;
        self.toggles += 1;
        Ok(next)
    }

    /// Accounts for `n` toggles at once.
    ///
    /// Only the net effect reaches the pin: it is flipped once when `n` is
    /// odd and left alone when `n` is even.
    pub fn toggle_times(&mut self, n: u32) -> Result<Level, Fault> {
        if n % 2 == 1 {
            self.toggle()?;
            self.toggles += u64::from(n - 1);
        } else {
            self.toggles += u64::from(n);
        }
        Ok(self.level)
    }

    pub fn level(&self) -> Level {
        self.level
    }

    /// Total toggles accounted for since construction.
    pub fn toggles(&self) -> u64 {
        self.toggles
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockPin;

    #[test]
    fn starts_low() {
        let pin = MockPin::new();
        let hb = Heartbeat::new(pin.clone()).unwrap();

        assert_eq!(hb.level(), Level::Low);
        assert_eq!(pin.state(), Some(PinState::Low));
    }

    #[test]
    fn toggle_alternates() {
        let pin = MockPin::new();
        let mut hb = Heartbeat::new(pin.clone()).unwrap();

        assert_eq!(hb.toggle().unwrap(), Level::High);
        assert_eq!(pin.state(), Some(PinState::High));
        assert_eq!(hb.toggle().unwrap(), Level::Low);
        assert_eq!(pin.state(), Some(PinState::Low));
        assert_eq!(hb.toggles(), 2);
    }

    #[test]
    fn net_level_follows_parity() {
        for m in 0..8u32 {
            let pin = MockPin::new();
            let mut hb = Heartbeat::new(pin.clone()).unwrap();

            let level = hb.toggle_times(m).unwrap();

            let expected = if m % 2 == 0 { Level::Low } else { Level::High };
            assert_eq!(level, expected, "m = {}", m);
            assert_eq!(pin.state(), Some(PinState::from(expected)));
            assert_eq!(hb.toggles(), u64::from(m));
        }
    }

    #[test]
    fn pin_error_is_reported() {
        let pin = MockPin::new();
        let mut hb = Heartbeat::new(pin.clone()).unwrap();

        pin.fail_next();
        assert!(matches!(hb.toggle(), Err(Fault::Pin(_))));
        // level unchanged after a failed drive
        assert_eq!(hb.level(), Level::Low);
    }
}
