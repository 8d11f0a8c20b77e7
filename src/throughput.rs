//! Throughput arithmetic.
//!
//! Bytes moved over a timed window become bytes per second, which can be
//! compared with what the line rate allows.

/// Bits on the wire per payload byte with 8N1 framing.
pub const BITS_PER_FRAME: u32 = 10;

/// Upper bound for payload bytes per second at `baud` with 8N1 framing.
pub const fn line_rate(baud: u32) -> u32 {
    baud / BITS_PER_FRAME
}

/// Bytes per second from a byte count and the time it took, or `None` for
/// a zero-length window.
pub fn from_transfer(bytes: u64, elapsed_us: u64) -> Option<u64> {
    if elapsed_us == 0 {
        return None;
    }
    Some(bytes.saturating_mul(1_000_000) / elapsed_us)
}

/// `measured` as a share of the line rate at `baud`, in parts per thousand.
pub fn efficiency_permille(measured: u64, baud: u32) -> u32 {
    let max = u64::from(line_rate(baud));
    if max == 0 {
        return 0;
    }
    (measured * 1000 / max) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_rate_of_bench_baud() {
        assert_eq!(line_rate(8_500_000), 850_000);
        assert_eq!(line_rate(115_200), 11_520);
    }

    #[test]
    fn transfer_rate() {
        // 5 MB in 6.25 s
        assert_eq!(from_transfer(5_000_000, 6_250_000), Some(800_000));
        assert_eq!(from_transfer(1, 0), None);
    }

    #[test]
    fn efficiency() {
        assert_eq!(efficiency_permille(850_000, 8_500_000), 1000);
        assert_eq!(efficiency_permille(425_000, 8_500_000), 500);
        assert_eq!(efficiency_permille(1, 0), 0);
    }
}
