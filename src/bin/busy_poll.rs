//! Sends a buffer over USART1 with blocking writes as fast as possible.
//!
//! PA4 flips after every buffer, so its frequency f gives the throughput
//! as 2 * BUF_SIZE * f bytes per second. LD3 mirrors PA4.

#![no_std]
#![no_main]

use panic_semihosting as _;

use cortex_m_rt::entry;
use cortex_m_semihosting::hprintln;
use usart_bench::board::Board;
use usart_bench::config::{BAUD, BUF_SIZE};
use usart_bench::throughput::line_rate;
use usart_bench::{BenchConfig, BusyPollBench, TxBuffer};

#[entry]
fn main() -> ! {
    let board = Board::bring_up().expect("peripherals already taken");

    let buffer = cortex_m::singleton!(: TxBuffer<BUF_SIZE> = TxBuffer::new()).unwrap();

    let mut bench = match BusyPollBench::initialize(
        board.usart1,
        board.probe,
        board.led,
        buffer,
        &BenchConfig::new(),
    ) {
        Ok(bench) => bench,
        Err(e) => {
            hprintln!("setup failed: {}", e).unwrap();
            panic!("serial port not configured");
        }
    };

    let brr = bench.brr();
    hprintln!(
        "sending {} byte buffers at {} baud (requested {}, {} permille off), at most {} B/s",
        BUF_SIZE,
        brr.actual_baud,
        BAUD,
        brr.error_permille(BAUD),
        line_rate(brr.actual_baud)
    )
    .unwrap();

    let error = bench.run_forever();
    hprintln!("stopped after {} buffers: {}", bench.iterations(), error).unwrap();
    panic!("{}", error);
}
