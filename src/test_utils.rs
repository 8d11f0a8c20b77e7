//! Mock peripherals for host tests.
//!
//! Every mock can share one [`OpLog`], so a test can check the order in
//! which a bench touched the hardware.

use core::cell::{Cell, RefCell};
use std::rc::Rc;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorKind, ErrorType, OutputPin, PinState};
use heapless::Vec;

use crate::chip::{Channel, ChannelProgram, ChipFamily, Controller};
use crate::config::SYSCLK_HZ;
use crate::dma::DmaEngine;
use crate::error::{ConfigError, Fault};
use crate::serial::{brr_for, Brr, SerialTx};

/// Something a mock was asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    DmaInit,
    Write(Channel, ChannelProgram),
    Attach(Channel),
    Enable(Channel),
    Disable(Channel),
    Open(u32),
    DmaRequest,
    /// Bytes handed to `write_buf`, and the fill byte if they were uniform
    WriteBuf(usize, Option<u8>),
    Pin(u8, PinState),
    DelayMs(u32),
}

/// Shared, ordered record of [`Op`]s. Keeps the first 256.
#[derive(Clone, Default)]
pub struct OpLog(Rc<RefCell<Vec<Op, 256>>>);

impl OpLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, op: Op) {
        let _ = self.0.borrow_mut().push(op);
    }

    pub fn ops(&self) -> Vec<Op, 256> {
        self.0.borrow().clone()
    }

    pub fn count(&self, pred: impl Fn(&Op) -> bool) -> usize {
        self.0.borrow().iter().filter(|op| pred(op)).count()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

// =============================================================================
// DMA
// =============================================================================

pub struct MockDma {
    family: ChipFamily,
    log: OpLog,
    isr: Rc<Cell<u32>>,
}

impl MockDma {
    pub fn new(family: ChipFamily) -> Self {
        Self::with_log(family, OpLog::new())
    }

    pub fn with_log(family: ChipFamily, log: OpLog) -> Self {
        Self {
            family,
            log,
            isr: Rc::new(Cell::new(0)),
        }
    }

    pub fn log(&self) -> OpLog {
        self.log.clone()
    }

    pub fn ops(&self) -> Vec<Op, 256> {
        self.log.ops()
    }

    /// Handle for changing what `isr()` returns after the mock was moved.
    pub fn isr_handle(&self) -> Rc<Cell<u32>> {
        self.isr.clone()
    }
}

impl DmaEngine for MockDma {
    fn family(&self) -> ChipFamily {
        self.family
    }

    fn controller(&self) -> Controller {
        Controller::Dma1
    }

    fn init(&mut self) {
        self.log.push(Op::DmaInit);
    }

    fn write_channel(&mut self, channel: Channel, program: &ChannelProgram) {
        self.log.push(Op::Write(channel, *program));
    }

    fn attach_interrupt(&mut self, channel: Channel) {
        self.log.push(Op::Attach(channel));
    }

    fn enable(&mut self, channel: Channel) {
        self.log.push(Op::Enable(channel));
    }

    fn disable(&mut self, channel: Channel) {
        self.log.push(Op::Disable(channel));
    }

    fn isr(&self) -> u32 {
        self.isr.get()
    }
}

// =============================================================================
// Serial
// =============================================================================

/// USART1 TDR on STM32F3.
pub const MOCK_TDR: usize = 0x4001_3828;

pub struct MockSerial {
    log: OpLog,
    accept: Option<usize>,
    fail: bool,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::with_log(OpLog::new())
    }

    pub fn with_log(log: OpLog) -> Self {
        Self {
            log,
            accept: None,
            fail: false,
        }
    }

    pub fn log(&self) -> OpLog {
        self.log.clone()
    }

    /// Limit every write to `n` bytes.
    pub fn accept_at_most(&mut self, n: usize) {
        self.accept = Some(n);
    }

    /// Make every write fail.
    pub fn fail_writes(&mut self) {
        self.fail = true;
    }
}

impl SerialTx for MockSerial {
    fn open(&mut self, baud: u32) -> Result<Brr, ConfigError> {
        self.log.push(Op::Open(baud));
        brr_for(SYSCLK_HZ, baud)
    }

    fn write_buf(&mut self, buf: &[u8]) -> Result<usize, Fault> {
        if self.fail {
            return Err(Fault::Serial);
        }
        let uniform = match buf.first() {
            Some(&first) if buf.iter().all(|&b| b == first) => Some(first),
            _ => None,
        };
        self.log.push(Op::WriteBuf(buf.len(), uniform));
        Ok(self.accept.map_or(buf.len(), |n| n.min(buf.len())))
    }

    fn tx_data_register(&self) -> usize {
        MOCK_TDR
    }

    fn enable_dma_tx_request(&mut self) {
        self.log.push(Op::DmaRequest);
    }
}

// =============================================================================
// Pins and delay
// =============================================================================

#[derive(Debug)]
pub struct MockPinError;

impl digital::Error for MockPinError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

#[derive(Default)]
struct PinInner {
    state: Option<PinState>,
    fail_next: bool,
}

/// Output pin; clones observe the same pin.
#[derive(Clone, Default)]
pub struct MockPin {
    id: u8,
    inner: Rc<RefCell<PinInner>>,
    log: Option<OpLog>,
}

impl MockPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(id: u8, log: OpLog) -> Self {
        Self {
            id,
            inner: Rc::default(),
            log: Some(log),
        }
    }

    /// Last driven state, `None` if never driven.
    pub fn state(&self) -> Option<PinState> {
        self.inner.borrow().state
    }

    pub fn fail_next(&self) {
        self.inner.borrow_mut().fail_next = true;
    }

    fn drive(&mut self, state: PinState) -> Result<(), MockPinError> {
        let mut inner = self.inner.borrow_mut();
        if inner.fail_next {
            inner.fail_next = false;
            return Err(MockPinError);
        }
        inner.state = Some(state);
        if let Some(log) = &self.log {
            log.push(Op::Pin(self.id, state));
        }
        Ok(())
    }
}

impl ErrorType for MockPin {
    type Error = MockPinError;
}

impl OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(PinState::Low)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(PinState::High)
    }
}

pub struct MockDelay {
    log: OpLog,
}

impl MockDelay {
    pub fn with_log(log: OpLog) -> Self {
        Self { log }
    }
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Op::DelayMs(ms));
    }
}
