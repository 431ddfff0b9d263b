// tracker.rs
use crate::angle;
use crate::config::TrackerConfig;
use crate::detector::{DetectContext, RevolutionDetector};
use crate::filter::FilterParams;
use crate::guard::WriteGuard;
use crate::rotation::RotationAccumulator;
use crate::speed::{classify, SpeedClass, IDLE_PERIOD_SAMPLES};
use crate::timebase::TimeBase;
use crate::types::{BatchError, ConfigError, EventRecord, MeasureError, RawSample};
use crate::{error, info, warn};

pub use crate::rotation::TOTAL_TIME_MODULUS_MS;

/// 1000 Hz milliseconds to the 1024 Hz fixed-point event clock. The total
/// time modulus of 64 000 ms maps exactly onto the u16 event-time wrap:
/// 64 000 * 1.024 = 65 536.
pub const EVENT_TIME_FACTOR: f32 = 1.024;

/// Export-side history: everything the measurement path needs to remember
/// between two calls. `primed` is false until the first call after a reset
/// has captured a baseline.
#[derive(Clone, Copy, Debug, Default)]
struct MeasurementSnapshot {
    primed: bool,
    last_total_time: u16,
    last_event_time: u16,
    last_sample_counter: u32,
    last_detect_sample: u32,
    last_revolutions: u32,
}

/// Owns the whole signal chain from raw accelerometer batches to exportable
/// revolution measurements.
///
/// Two entry points with distinct callers: [`submit_batch`] runs on the
/// sensor-interrupt path at the FIFO watermark cadence, and
/// [`request_measurement`] runs on the periodic export path. The two are
/// decoupled by an advisory [`WriteGuard`], never by blocking.
///
/// [`submit_batch`]: MotionTracker::submit_batch
/// [`request_measurement`]: MotionTracker::request_measurement
pub struct MotionTracker {
    config: TrackerConfig,
    timebase: TimeBase,
    guard: WriteGuard,
    rotation: RotationAccumulator,
    detector: RevolutionDetector,
    speed_class: SpeedClass,
    snapshot: MeasurementSnapshot,
}

impl MotionTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            "motion tracker: wheel {} mm, {} sample batches at {} ms",
            config.wheel_circumference_mm, config.batch_size, config.sample_interval_ms
        );
        Ok(Self {
            timebase: TimeBase::new(config.tick_hz),
            guard: WriteGuard::new(),
            rotation: RotationAccumulator::new(config.anomaly_policy),
            detector: RevolutionDetector::new(),
            speed_class: SpeedClass::Low,
            snapshot: MeasurementSnapshot::default(),
            config,
        })
    }

    /// Ingest one watermark batch of raw samples. `tick_now` is the current
    /// value of the 24-bit hardware tick counter.
    ///
    /// Per sample: derive angle and magnitude, advance the revolution
    /// detector, and on an accepted revolution re-run the speed classifier.
    /// Per batch: fold the net rotation into the movement debounce and
    /// advance the total-time clock. The write guard is held across the
    /// counter and clock updates and released before the debounce, which
    /// touches no exported state.
    pub fn submit_batch(
        &mut self,
        samples: &[RawSample],
        tick_now: u32,
    ) -> Result<(), BatchError> {
        if samples.len() != self.config.batch_size {
            error!(
                "batch of {} samples, watermark is {}",
                samples.len(),
                self.config.batch_size
            );
            return Err(BatchError::BatchLen);
        }
        let token = self.guard.acquire().map_err(|_| BatchError::GuardHeld)?;
        let elapsed_ms = self.timebase.elapsed_ms(tick_now);

        let mut angles = [0u16; TrackerConfig::MAX_BATCH];
        for (i, &sample) in samples.iter().enumerate() {
            let (a, mag) = angle::extract(sample, &self.config);
            angles[i] = a;

            let params = FilterParams::for_class(self.speed_class);
            let ctx = DetectContext {
                confirmed_moving: self.rotation.is_confirmed(),
                mid_or_above: self.speed_class.is_mid_or_above(),
                missed_beat_compensation: self.config.missed_beat_compensation,
            };
            if let Some(period) = self.detector.step(mag, &params, ctx) {
                self.speed_class =
                    classify(period, self.detector.running_average(), &self.config);
            }
        }

        let net_rotation = self.rotation.accumulate(&angles[..samples.len()]);
        self.rotation.advance_time(elapsed_ms);
        drop(token);

        self.rotation
            .update_movement(net_rotation, self.speed_class.is_mid_or_above());
        Ok(())
    }

    /// Synthesize one measurement for export.
    ///
    /// The event time of the newest revolution is interpolated between the
    /// last two export points: detector samples elapsed, scaled by the batch
    /// clock, converted to the 1024 Hz fixed-point clock. When no revolution
    /// landed since the previous call but a report is still forced, the
    /// event time falls back to wall time and the detect counter is
    /// re-anchored so the next interpolation starts fresh.
    pub fn request_measurement(&mut self) -> Result<EventRecord, MeasureError> {
        if self.guard.is_held() {
            warn!("measurement while a batch is in flight; skipping this cycle");
            return Err(MeasureError::Busy);
        }
        let revolutions = self.detector.total_revolutions();
        let total_time = self.rotation.total_elapsed_ms();

        if !self.snapshot.primed {
            self.snapshot = MeasurementSnapshot {
                primed: true,
                last_total_time: total_time,
                last_event_time: 0,
                last_sample_counter: self.detector.sample_counter(),
                last_detect_sample: self.detector.detect_sample(),
                last_revolutions: revolutions,
            };
            return Err(MeasureError::NoNewData);
        }

        if revolutions == self.snapshot.last_revolutions && !self.rotation.report_flag() {
            if self.speed_class.is_mid_or_above() {
                // coasting: decay the class so the filters reopen
                self.speed_class = classify(
                    IDLE_PERIOD_SAMPLES,
                    self.detector.running_average(),
                    &self.config,
                );
            }
            return Err(MeasureError::NoNewData);
        }

        let total_time_diff = if total_time < self.snapshot.last_total_time {
            total_time as u32 + TOTAL_TIME_MODULUS_MS as u32
                - self.snapshot.last_total_time as u32
        } else {
            (total_time - self.snapshot.last_total_time) as u32
        };
        let sample_span = self
            .detector
            .sample_counter()
            .wrapping_sub(self.snapshot.last_sample_counter);
        let detect_span = self
            .detector
            .detect_sample()
            .wrapping_sub(self.snapshot.last_detect_sample);

        let event_time_inc = if sample_span == 0 {
            0
        } else {
            let scaled = detect_span as f32 * (total_time_diff as f32 / sample_span as f32)
                * EVENT_TIME_FACTOR;
            (scaled as u32) as u16
        };

        if event_time_inc != 0 {
            self.snapshot.last_event_time =
                self.snapshot.last_event_time.wrapping_add(event_time_inc);
            self.snapshot.last_detect_sample = self.detector.detect_sample();
        } else {
            // forced report with no fresh detection: anchor to wall time
            let wall_inc = (total_time_diff as f32 * EVENT_TIME_FACTOR) as u16;
            self.snapshot.last_event_time =
                self.snapshot.last_event_time.wrapping_add(wall_inc);
            self.detector.resync_detect_sample();
            self.snapshot.last_detect_sample = self.detector.detect_sample();
        }

        // A report forced by the flag alone consumes it; a flag raised in
        // the same interval as a lap change survives, forcing one follow-up
        // so the listener still sees the stop declaration.
        if revolutions == self.snapshot.last_revolutions {
            self.rotation.clear_report_flag();
        }
        self.snapshot.last_total_time = total_time;
        self.snapshot.last_sample_counter = self.detector.sample_counter();
        self.snapshot.last_revolutions = revolutions;

        Ok(EventRecord {
            cumulative_revolutions: revolutions,
            last_event_time_1024hz: self.snapshot.last_event_time,
            wheel_rev_data_present: true,
        })
    }

    /// Drop all motion state back to the stopped baseline. The cumulative
    /// revolution count survives; the next measurement call re-primes the
    /// export history.
    pub fn reset_motion_tracking(&mut self) {
        info!("motion tracking reset");
        self.rotation.reset();
        self.detector.reset();
        self.timebase.reset();
        self.speed_class = SpeedClass::Low;
        self.snapshot = MeasurementSnapshot::default();
    }

    pub fn cumulative_revolutions(&self) -> u32 {
        self.detector.total_revolutions()
    }

    pub fn speed_class(&self) -> SpeedClass {
        self.speed_class
    }

    /// Movement debounce has confirmed motion.
    pub fn is_moving(&self) -> bool {
        self.rotation.is_confirmed()
    }

    /// Lifetime count of implausible angle deltas, for diagnostics.
    pub fn anomaly_count(&self) -> u32 {
        self.rotation.anomaly_count()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests;
