// filter.rs
use crate::speed::SpeedClass;

pub const MOVING_AVG_WINDOW: usize = 5;

/// Penalty applied to upward excursions in the asymmetric low-pass: the
/// carrier signal rides on gravity, so drops are trusted more than climbs.
pub const CLIMB_PENALTY: f32 = 0.6;

/// Fixed-window moving average over the magnitude signal.
pub struct MovingAverage {
    taps: [f32; MOVING_AVG_WINDOW],
    pos: usize,
    sum: f32,
}

impl MovingAverage {
    pub const fn new() -> Self {
        Self {
            taps: [0.0; MOVING_AVG_WINDOW],
            pos: 0,
            sum: 0.0,
        }
    }

    pub fn update(&mut self, input: f32) -> f32 {
        self.sum = self.sum + input - self.taps[self.pos];
        self.taps[self.pos] = input;
        self.pos = (self.pos + 1) % MOVING_AVG_WINDOW;
        self.sum / MOVING_AVG_WINDOW as f32
    }

    pub fn reset(&mut self) {
        self.taps = [0.0; MOVING_AVG_WINDOW];
        self.pos = 0;
        self.sum = 0.0;
    }
}

/// Exponential low-pass with an excursion clamp and the climbing penalty.
/// `factor` must be in [0, 1]; `clamp` trims off implausible jumps before
/// they are blended in.
pub fn low_pass_asymmetric(input: f32, average: f32, factor: f32, clamp: f32) -> f32 {
    let mut diff = input - average;
    if diff < 0.0 {
        if -diff > clamp {
            diff = -clamp;
        }
        average + factor * diff
    } else {
        if diff > clamp {
            diff = clamp;
        }
        average + factor * CLIMB_PENALTY * diff
    }
}

/// Filter coefficients keyed to the current speed class. The band narrows
/// and the filters get more aggressive as cadence rises: the oscillation is
/// faster and lower-amplitude, while at low speed a wide band rejects road
/// vibration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterParams {
    /// Half-width of the adaptive mean band.
    pub window: f32,
    /// Factor for the carrier low-pass.
    pub low_pass: f32,
    /// Factor for the running-average tracker.
    pub average: f32,
    /// Excursion clamp shared by both filters.
    pub clamp: f32,
}

const WINDOW_HIGH: f32 = 0.05;
const WINDOW_LOW: f32 = 0.15;

impl FilterParams {
    pub const fn for_class(class: SpeedClass) -> Self {
        match class {
            SpeedClass::Low => Self {
                window: WINDOW_LOW,
                low_pass: 0.15,
                average: 0.01,
                clamp: 0.15,
            },
            SpeedClass::Mid => Self {
                window: WINDOW_LOW,
                low_pass: 0.23,
                average: 0.03,
                clamp: 0.23,
            },
            SpeedClass::MidHigh => Self {
                window: (WINDOW_HIGH + WINDOW_LOW) / 2.0,
                low_pass: 0.40,
                average: 0.08,
                clamp: 0.40,
            },
            SpeedClass::High => Self {
                window: WINDOW_HIGH,
                low_pass: 0.80,
                average: 0.20,
                clamp: 2.00,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_average_settles_on_constant_input() {
        let mut avg = MovingAverage::new();
        let mut out = 0.0;
        for _ in 0..MOVING_AVG_WINDOW {
            out = avg.update(2.0);
        }
        assert!((out - 2.0).abs() < 1e-6);
    }

    #[test]
    fn moving_average_is_windowed() {
        let mut avg = MovingAverage::new();
        for _ in 0..MOVING_AVG_WINDOW {
            avg.update(1.0);
        }
        // One outlier shifts the mean by outlier/window.
        let out = avg.update(6.0);
        assert!((out - 2.0).abs() < 1e-6);
    }

    #[test]
    fn low_pass_descends_faster_than_it_climbs() {
        let up = low_pass_asymmetric(1.1, 1.0, 0.5, 1.0) - 1.0;
        let down = 1.0 - low_pass_asymmetric(0.9, 1.0, 0.5, 1.0);
        assert!(down > up);
    }

    #[test]
    fn low_pass_clamps_excursions() {
        // A 10 g spike with a 0.15 clamp moves the average no further than
        // a 0.15 g spike would.
        let spiked = low_pass_asymmetric(11.0, 1.0, 0.5, 0.15);
        let bounded = low_pass_asymmetric(1.15, 1.0, 0.5, 0.15);
        assert!((spiked - bounded).abs() < 1e-6);
    }

    #[test]
    fn params_narrow_with_speed() {
        let low = FilterParams::for_class(SpeedClass::Low);
        let high = FilterParams::for_class(SpeedClass::High);
        assert!(high.window < low.window);
        assert!(high.low_pass > low.low_pass);
    }
}
