// angle.rs
use crate::config::{AxisSelect, TrackerConfig};
use crate::types::RawSample;

/// Converts one raw sample into a rotation angle in integer degrees [0, 360)
/// and the g-value of the configured magnitude axis.
///
/// The angle comes from the z/y plane: gravity sweeps through it once per
/// wheel revolution when the sensor is mounted on a spoke or crank arm.
pub fn extract(sample: RawSample, cfg: &TrackerConfig) -> (u16, f32) {
    let divisor = cfg.sensitivity_divisor as f32;
    let y_g = sample.y as f32 / divisor;
    let z_g = sample.z as f32 / divisor;

    let angle = angle_of(z_g, y_g);
    let mag = match cfg.axis_select {
        AxisSelect::Y => y_g,
        AxisSelect::Z => z_g,
    };
    (angle, mag)
}

/// `atan2(a2, a1) * 180/pi + 180`, rounded half-up into [0, 360).
/// The true origin has no defined angle; it maps to 0 by convention.
pub fn angle_of(a2: f32, a1: f32) -> u16 {
    if a2 == 0.0 && a1 == 0.0 {
        return 0;
    }
    let deg = libm::atan2f(a2, a1) * (180.0 / core::f32::consts::PI) + 180.0;
    // round 0.4 down, round 0.5 up
    let rounded = (deg + 0.5) as u16;
    if rounded >= 360 { 0 } else { rounded }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;

    #[test]
    fn cardinal_angles() {
        // Gravity fully on +y: atan2(0, 1) = 0 -> 180 degrees.
        assert_eq!(angle_of(0.0, 1.0), 180);
        // Fully on +z: atan2(1, 0) = pi/2 -> 270 degrees.
        assert_eq!(angle_of(1.0, 0.0), 270);
        // Fully on -z: -pi/2 -> 90 degrees.
        assert_eq!(angle_of(-1.0, 0.0), 90);
        // Fully on -y: pi -> 360, wraps to 0.
        assert_eq!(angle_of(0.0, -1.0), 0);
    }

    #[test]
    fn origin_maps_to_zero() {
        assert_eq!(angle_of(0.0, 0.0), 0);
    }

    #[test]
    fn extract_scales_by_sensitivity() {
        let cfg = TrackerConfig::default(); // divisor 256, magnitude on y
        let (angle, mag) = extract(RawSample::new(0, 256, 0), &cfg);
        assert_eq!(angle, 180);
        assert!((mag - 1.0).abs() < 1e-6);
    }

    #[test]
    fn extract_magnitude_axis_select() {
        let cfg = TrackerConfig {
            axis_select: crate::config::AxisSelect::Z,
            ..TrackerConfig::default()
        };
        let (_, mag) = extract(RawSample::new(0, 256, -128), &cfg);
        assert!((mag + 0.5).abs() < 1e-6);
    }
}
