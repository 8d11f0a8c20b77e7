//! Streams a buffer into USART1 with DMA1 channel 4 in circular mode.
//!
//! At 9 Mbaud about 90 passes complete per poll interval, so toggling LD3
//! per pass would leave it at the parity of that count. The image runs the
//! heartbeat latched instead: LD3 flips once per poll that saw at least one
//! pass, while the pass count stays exact.

#![no_std]
#![no_main]

use panic_semihosting as _;

use core::cell::RefCell;
use cortex_m::interrupt::{free, Mutex};
use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use usart_bench::board::{self, pac::interrupt, Board};
use usart_bench::chip::Channel;
use usart_bench::config::{BAUD, BUF_SIZE};
use usart_bench::dma_tx::on_interrupt;
use usart_bench::{
    BenchConfig, CompletionSignal, DmaBench, DmaParts, Notifier, SignalMode, TxBuffer,
};

static SIGNAL: CompletionSignal = CompletionSignal::new(Channel::CH4);
static NOTIFIER: Mutex<RefCell<Option<Notifier<'static>>>> = Mutex::new(RefCell::new(None));

#[entry]
fn main() -> ! {
    let board = Board::bring_up().expect("peripherals already taken");

    let buffer = cortex_m::singleton!(: TxBuffer<BUF_SIZE> = TxBuffer::new()).unwrap();
    let (notifier, watcher) = SIGNAL.try_split().unwrap();
    free(|cs| {
        NOTIFIER.borrow(cs).replace(Some(notifier));
    });

    let parts = DmaParts {
        engine: board.dma1,
        serial: board.usart1,
        heartbeat: board.led,
        delay: board.delay,
    };
    let config = BenchConfig::new().with_signal_mode(SignalMode::Latched);
    let mut bench = match DmaBench::setup(parts, buffer, watcher, config) {
        Ok(bench) => bench,
        Err(e) => {
            hprintln!("setup failed: {}", e).unwrap();
            panic!("DMA transfer not configured");
        }
    };

    let brr = bench.brr();
    hprintln!(
        "streaming {} bytes at {} baud (requested {}, {} permille off)",
        BUF_SIZE,
        brr.actual_baud,
        BAUD,
        brr.error_permille(BAUD)
    )
    .unwrap();

    let error = bench.run_forever();
    hprintln!(
        "stopped after {} passes in {} ms: {}",
        bench.passes(),
        bench.elapsed_ms(),
        error
    )
    .unwrap();
    if let (Some(rate), Some(permille)) = (bench.throughput(), bench.efficiency_permille()) {
        hprintln!("{} B/s, {} permille of line rate", rate, permille).unwrap();
    }
    panic!("{}", error);
}

#[interrupt]
fn DMA1_CH4() {
    let isr = board::take_dma1_status(Channel::CH4);
    free(|cs| {
        if let Some(notifier) = NOTIFIER.borrow(cs).borrow().as_ref() {
            on_interrupt(notifier, isr);
        }
    });
}
