// detector.rs
use crate::filter::{low_pass_asymmetric, FilterParams, MovingAverage};

/// Plausible bounds for one revolution, in samples. Outside this range the
/// period estimate is not trusted to gate new detections.
pub const PERIOD_MIN_SAMPLES: u32 = 25;
pub const PERIOD_MAX_SAMPLES: u32 = 150;

/// States of the zero-crossing machine. `Reset` only occurs at startup and
/// after an explicit reset; the cycle afterwards is
/// StartPeak -> PeakDetect -> StartValley -> StepDetect -> StartPeak.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DetectState {
    Reset,
    StartPeak,
    PeakDetect,
    StartValley,
    StepDetect,
}

/// Inputs the detector needs from the rest of the tracker for one sample.
#[derive(Clone, Copy, Debug)]
pub struct DetectContext {
    /// Movement debounce has confirmed motion.
    pub confirmed_moving: bool,
    /// Current speed class is Mid or above.
    pub mid_or_above: bool,
    /// Missed-beat double-count compensation is enabled.
    pub missed_beat_compensation: bool,
}

/// Detects one full revolution per peak -> valley -> peak traversal of the
/// filtered magnitude signal around an adaptive mean band.
pub struct RevolutionDetector {
    state: DetectState,
    peak_bound: f32,
    valley_bound: f32,
    moving_avg: MovingAverage,
    /// Low-passed carrier from the previous sample.
    last_filtered: f32,
    /// Adaptive mean of the carrier; the band is `mean +/- window`.
    running_avg: f32,
    /// Monotonic sample index; wraps at u32.
    sample_counter: u32,
    /// Sample index of the most recent accepted revolution.
    detect_sample: u32,
    /// Blended samples-per-revolution estimate.
    period_estimate: u32,
    /// Cumulative revolutions for the process lifetime. Survives
    /// `reset` so the exported cumulative count stays monotonic across
    /// mode switches.
    total_revolutions: u32,
}

impl RevolutionDetector {
    pub const fn new() -> Self {
        Self {
            state: DetectState::Reset,
            peak_bound: 0.0,
            valley_bound: 0.0,
            moving_avg: MovingAverage::new(),
            last_filtered: 0.0,
            running_avg: 0.0,
            sample_counter: 0,
            detect_sample: 0,
            period_estimate: PERIOD_MAX_SAMPLES,
            total_revolutions: 0,
        }
    }

    /// Feed one raw magnitude sample. Returns the new (pre-clamp) period
    /// estimate when a revolution was accepted, so the caller can re-run the
    /// speed classifier; returns `None` otherwise.
    pub fn step(&mut self, raw_mag: f32, params: &FilterParams, ctx: DetectContext) -> Option<u32> {
        if self.sample_counter == 0 {
            // seed the filters from the very first sample
            self.running_avg = raw_mag;
            self.last_filtered = raw_mag;
            self.sample_counter = 1;
            return None;
        }

        let mut m = self.moving_avg.update(raw_mag);
        m = low_pass_asymmetric(m, self.last_filtered, params.low_pass, params.clamp);
        self.last_filtered = m;
        self.running_avg = low_pass_asymmetric(m, self.running_avg, params.average, params.clamp);

        let band_lo = self.running_avg - params.window;
        let band_hi = self.running_avg + params.window;

        let mut accepted_period = None;
        match self.state {
            DetectState::Reset => {
                if ctx.confirmed_moving {
                    self.state = DetectState::StartPeak;
                    self.valley_bound = band_lo;
                    self.peak_bound = band_hi;
                }
            }
            DetectState::StartPeak => {
                if m > band_hi && m < self.peak_bound {
                    self.valley_bound = m;
                    self.state = DetectState::PeakDetect;
                } else if m > self.peak_bound {
                    self.peak_bound = m;
                }
            }
            DetectState::PeakDetect => {
                if m < band_lo {
                    self.state = DetectState::StartValley;
                    self.valley_bound = m;
                } else if m >= self.peak_bound {
                    self.peak_bound = m;
                }
            }
            DetectState::StartValley => {
                if m > self.valley_bound {
                    self.state = DetectState::StepDetect;
                } else {
                    self.valley_bound = m;
                }
            }
            DetectState::StepDetect => {
                if m > band_hi {
                    if ctx.confirmed_moving {
                        accepted_period = self.close_cycle(ctx);
                    }
                    self.valley_bound = band_lo;
                    self.peak_bound = band_hi;
                    self.state = DetectState::StartPeak;
                } else if m < self.valley_bound {
                    self.valley_bound = m;
                }
            }
        }

        self.sample_counter = self.sample_counter.wrapping_add(1);
        accepted_period
    }

    /// Revolution validity check and period bookkeeping when the carrier
    /// re-crosses the upper band edge in `StepDetect`.
    fn close_cycle(&mut self, ctx: DetectContext) -> Option<u32> {
        let sample_diff = self.sample_counter.wrapping_sub(self.detect_sample);
        let period_plausible =
            (PERIOD_MIN_SAMPLES..=PERIOD_MAX_SAMPLES).contains(&self.period_estimate);
        let accepted = sample_diff as f32 > self.period_estimate as f32 * 0.5 + 1.0
            || !period_plausible;

        let mut new_period = None;
        if accepted {
            self.total_revolutions = self.total_revolutions.wrapping_add(1);
            self.detect_sample = self.sample_counter;
            if sample_diff > self.period_estimate * 2
                && ctx.mid_or_above
                && ctx.missed_beat_compensation
            {
                // a beat was likely swallowed by noise; make up for it
                self.total_revolutions = self.total_revolutions.wrapping_add(1);
            }
            self.period_estimate = (sample_diff + self.period_estimate) / 2;
            new_period = Some(self.period_estimate);
        } else {
            // too soon: treat as noise, but keep blending the estimate so a
            // wrong one cannot persist forever
            self.period_estimate = (sample_diff + self.period_estimate * 2) / 3;
        }

        // park an implausible estimate just outside the bounds so the next
        // detection is accepted unconditionally
        if self.period_estimate > PERIOD_MAX_SAMPLES {
            self.period_estimate = PERIOD_MAX_SAMPLES + 1;
        } else if self.period_estimate < PERIOD_MIN_SAMPLES {
            self.period_estimate = PERIOD_MIN_SAMPLES - 1;
        }
        new_period
    }

    /// Re-anchor the detect index to the current sample after a wall-time
    /// fallback, so the next interpolation starts from fresh counters.
    pub fn resync_detect_sample(&mut self) {
        self.detect_sample = self.sample_counter;
    }

    pub fn state(&self) -> DetectState {
        self.state
    }

    pub fn total_revolutions(&self) -> u32 {
        self.total_revolutions
    }

    pub fn sample_counter(&self) -> u32 {
        self.sample_counter
    }

    pub fn detect_sample(&self) -> u32 {
        self.detect_sample
    }

    pub fn period_estimate(&self) -> u32 {
        self.period_estimate
    }

    pub fn running_average(&self) -> f32 {
        self.running_avg
    }

    /// Back to the initial state. The cumulative revolution count is
    /// deliberately preserved.
    pub fn reset(&mut self) {
        self.state = DetectState::Reset;
        self.peak_bound = 0.0;
        self.valley_bound = 0.0;
        self.moving_avg.reset();
        self.last_filtered = 0.0;
        self.running_avg = 0.0;
        self.sample_counter = 0;
        self.detect_sample = 0;
        self.period_estimate = PERIOD_MAX_SAMPLES;
    }
}

impl Default for RevolutionDetector {
    fn default() -> Self {
        Self::new()
    }
}
