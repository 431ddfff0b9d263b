// rotation.rs
use crate::config::AnomalyPolicy;
use crate::warn;

/// Minimum net rotation per batch (degrees) that counts as movement.
/// 22 degrees per 250 ms batch is about 1.8 km/h on a 2.1 m wheel.
pub const MOVE_ANGLE_MIN_DEG: u16 = 22;

/// Batches of movement needed before motion is confirmed (0.75 s window).
pub const MOVE_COUNT_MIN: u8 = 3;

/// Ceiling of the movement counter; the gap to `MOVE_COUNT_MIN` gives the
/// 2.0 s stop-declaration window.
pub const MOVE_COUNT_MAX: u8 = 11;

/// Plausible per-sample angle window (degrees), derived from the maximum
/// supported speed. Deltas beyond it are sensor anomalies.
pub const MAX_ANGLE_WINDOW_DEG: i16 = 75;

/// The internal total time is 1000-based and kept below the 1024-based
/// event-time ceiling: 0x10000 / 0x800 * 2000.
pub const TOTAL_TIME_MODULUS_MS: u16 = 64_000;

/// Accumulates batch rotation across the 0/360 seam and runs the movement
/// debounce counter.
pub struct RotationAccumulator {
    /// Final angle of the previous batch; `None` until the first batch after
    /// a reset has been seen.
    last_angle_residue: Option<u16>,
    total_elapsed_ms: u16,
    move_counter: u8,
    move_report_flag: bool,
    anomaly_count: u32,
    policy: AnomalyPolicy,
}

impl RotationAccumulator {
    pub const fn new(policy: AnomalyPolicy) -> Self {
        Self {
            last_angle_residue: None,
            total_elapsed_ms: 0,
            move_counter: 0,
            move_report_flag: false,
            anomaly_count: 0,
            policy,
        }
    }

    /// Net rotation magnitude of one batch of angle samples, in degrees.
    /// Frame-to-frame deltas are normalized into (-180, 180]; a delta that
    /// still exceeds the per-sample window is an anomaly, handled per the
    /// configured policy. Updates the angle residue for the next batch.
    pub fn accumulate(&mut self, angles: &[u16]) -> u16 {
        let mut net: i32 = 0;
        for (i, &angle) in angles.iter().enumerate() {
            let prev = if i == 0 {
                self.last_angle_residue
            } else {
                Some(angles[i - 1])
            };
            let mut delta = match prev {
                None => 0,
                Some(p) => angle as i16 - p as i16,
            };
            if delta > 180 {
                // backward revolve across the seam, e.g. 350 after 10
                delta -= 360;
            } else if delta < -180 {
                // forward revolve across the seam, e.g. 10 after 350
                delta += 360;
            } else if delta > MAX_ANGLE_WINDOW_DEG || delta < -MAX_ANGLE_WINDOW_DEG {
                warn!(
                    "anomalous angle delta {} at sample {} ({} -> {})",
                    delta,
                    i,
                    prev.unwrap_or(0),
                    angle
                );
                self.anomaly_count = self.anomaly_count.wrapping_add(1);
                if self.policy == AnomalyPolicy::Clamp {
                    delta = delta.clamp(-MAX_ANGLE_WINDOW_DEG, MAX_ANGLE_WINDOW_DEG);
                }
            }
            net += delta as i32;
        }
        if let Some(&last) = angles.last() {
            self.last_angle_residue = Some(last);
        }
        net.unsigned_abs() as u16
    }

    /// Advance the 1000-based total time, modulo the event-time ceiling.
    pub fn advance_time(&mut self, elapsed_ms: u32) {
        self.total_elapsed_ms =
            ((self.total_elapsed_ms as u32 + elapsed_ms) % TOTAL_TIME_MODULUS_MS as u32) as u16;
    }

    /// Movement debounce. Three bands: stopped (counter 0), transitioning
    /// (below `MOVE_COUNT_MIN`) and confirmed moving. `hold_at_speed`
    /// suppresses the decrement so one quiet batch during sustained fast
    /// motion cannot start a stop declaration.
    pub fn update_movement(&mut self, net_rotation: u16, hold_at_speed: bool) {
        if net_rotation < MOVE_ANGLE_MIN_DEG {
            if self.move_counter == 0 {
                // already stopped
            } else if self.move_counter < MOVE_COUNT_MIN {
                // never confirmed; drop straight back and force one report
                self.move_counter = 0;
                self.move_report_flag = true;
            } else if !hold_at_speed {
                self.move_counter -= 1;
            }
        } else if self.move_counter < MOVE_COUNT_MIN {
            self.move_report_flag = true;
            self.move_counter += 1;
        } else {
            self.move_counter = MOVE_COUNT_MAX;
        }
    }

    /// Motion has been confirmed (the counter cleared the minimum window).
    pub fn is_confirmed(&self) -> bool {
        self.move_counter > MOVE_COUNT_MIN
    }

    pub fn move_counter(&self) -> u8 {
        self.move_counter
    }

    pub fn report_flag(&self) -> bool {
        self.move_report_flag
    }

    pub fn clear_report_flag(&mut self) {
        self.move_report_flag = false;
    }

    pub fn total_elapsed_ms(&self) -> u16 {
        self.total_elapsed_ms
    }

    pub fn anomaly_count(&self) -> u32 {
        self.anomaly_count
    }

    pub fn reset(&mut self) {
        self.last_angle_residue = None;
        self.total_elapsed_ms = 0;
        self.move_counter = 0;
        self.move_report_flag = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnomalyPolicy;

    fn acc() -> RotationAccumulator {
        RotationAccumulator::new(AnomalyPolicy::LogOnly)
    }

    #[test]
    fn first_batch_without_residue_starts_at_zero() {
        let mut a = acc();
        assert_eq!(a.accumulate(&[90]), 0);
        // residue is now 90
        assert_eq!(a.accumulate(&[100]), 10);
    }

    #[test]
    fn forward_wraparound_is_small_positive() {
        let mut a = acc();
        a.accumulate(&[350]);
        // 350 -> 10 crosses the seam forward: +20, never +340.
        assert_eq!(a.accumulate(&[10]), 20);
    }

    #[test]
    fn backward_wraparound_is_small_negative() {
        let mut a = acc();
        a.accumulate(&[10]);
        // 10 -> 350 crosses the seam backward: -20 folded to magnitude 20.
        assert_eq!(a.accumulate(&[350]), 20);
    }

    #[test]
    fn anomalous_delta_is_counted_not_dropped() {
        let mut a = acc();
        a.accumulate(&[0]);
        let net = a.accumulate(&[100]); // 100 degrees in one sample
        assert_eq!(net, 100);
        assert_eq!(a.anomaly_count(), 1);
    }

    #[test]
    fn clamp_policy_saturates_the_delta() {
        let mut a = RotationAccumulator::new(AnomalyPolicy::Clamp);
        a.accumulate(&[0]);
        assert_eq!(a.accumulate(&[100]), MAX_ANGLE_WINDOW_DEG as u16);
        assert_eq!(a.anomaly_count(), 1);
    }

    #[test]
    fn confirmed_after_min_window() {
        let mut a = acc();
        for _ in 0..MOVE_COUNT_MIN {
            a.update_movement(MOVE_ANGLE_MIN_DEG, false);
        }
        // counter == MIN is still transitioning; one more batch jumps to MAX
        assert!(!a.is_confirmed());
        a.update_movement(MOVE_ANGLE_MIN_DEG, false);
        assert!(a.is_confirmed());
        assert_eq!(a.move_counter(), MOVE_COUNT_MAX);
    }

    #[test]
    fn single_quiet_batch_decrements_by_one() {
        let mut a = acc();
        for _ in 0..=MOVE_COUNT_MIN {
            a.update_movement(MOVE_ANGLE_MIN_DEG, false);
        }
        assert!(a.is_confirmed());
        a.update_movement(0, false);
        assert_eq!(a.move_counter(), MOVE_COUNT_MAX - 1);
        assert!(a.is_confirmed());
    }

    #[test]
    fn quiet_batch_at_speed_holds_the_counter() {
        let mut a = acc();
        for _ in 0..=MOVE_COUNT_MIN {
            a.update_movement(MOVE_ANGLE_MIN_DEG, false);
        }
        a.update_movement(0, true);
        assert_eq!(a.move_counter(), MOVE_COUNT_MAX);
    }

    #[test]
    fn aborted_start_forces_a_report() {
        let mut a = acc();
        a.update_movement(MOVE_ANGLE_MIN_DEG, false);
        a.clear_report_flag();
        a.update_movement(0, false);
        assert_eq!(a.move_counter(), 0);
        assert!(a.report_flag());
    }

    #[test]
    fn total_time_wraps_at_modulus() {
        let mut a = acc();
        a.advance_time(TOTAL_TIME_MODULUS_MS as u32 - 10);
        a.advance_time(25);
        assert_eq!(a.total_elapsed_ms(), 15);
    }
}
