// timebase.rs

/// The hardware tick counter wraps at 24 bits.
pub const TICK_MODULUS: u32 = 0xFF_FFFF;

/// Fixed allowance for the latency between the watermark interrupt and the
/// batch actually being processed.
pub const PROCESS_COMPENSATE_MS: u32 = 1;

/// Converts deltas of a monotonically increasing, wrapping hardware tick
/// counter into elapsed milliseconds.
pub struct TimeBase {
    tick_hz: u32,
    last_ticks: u32,
}

impl TimeBase {
    pub const fn new(tick_hz: u32) -> Self {
        Self {
            tick_hz,
            last_ticks: 0,
        }
    }

    /// Milliseconds elapsed since the previous call, rounded, plus the fixed
    /// processing compensation. Handles one wrap of the 24-bit counter.
    pub fn elapsed_ms(&mut self, tick_now: u32) -> u32 {
        let diff_ticks = if tick_now >= self.last_ticks {
            tick_now - self.last_ticks
        } else {
            tick_now + TICK_MODULUS - self.last_ticks
        };
        self.last_ticks = tick_now;
        let ms = (diff_ticks as u64 * 1000 + self.tick_hz as u64 / 2) / self.tick_hz as u64;
        ms as u32 + PROCESS_COMPENSATE_MS
    }

    pub fn reset(&mut self) {
        self.last_ticks = 0;
    }
}
