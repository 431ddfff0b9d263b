// speed.rs
use crate::config::TrackerConfig;

/// Speed thresholds in meters per hour.
pub const SPEED_MID_MH: u32 = 16_000;
pub const SPEED_MIDHIGH_MH: u32 = 30_000;
pub const SPEED_HIGH_MH: u32 = 40_000;

/// Thresholds on the squared running average of the magnitude signal (g^2).
/// A short shock can force a higher class before the period estimate
/// catches up.
pub const SHOCK_MID_G2: f32 = 1.2;
pub const SHOCK_HIGH_G2: f32 = 4.0;

/// Period used to decay the class toward Low when measurements stall.
pub const IDLE_PERIOD_SAMPLES: u32 = 150;

/// Coarse discretization of the current rotation speed, used to select
/// filter aggressiveness. Re-evaluated once per accepted revolution, not per
/// sample, so a class persists until the next accepted revolution crosses a
/// different threshold.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpeedClass {
    Low = 0,
    Mid = 1,
    MidHigh = 2,
    High = 3,
}

impl SpeedClass {
    /// Anything above Low. Gates both the missed-beat compensation and the
    /// move-counter decrement suppression.
    pub fn is_mid_or_above(self) -> bool {
        self != SpeedClass::Low
    }
}

/// Classify from the latest revolution period (in samples) and the running
/// average of the magnitude signal, OR-ing the two signals: either can force
/// a higher class.
pub fn classify(period_samples: u32, running_avg: f32, cfg: &TrackerConfig) -> SpeedClass {
    // samples/rev -> m/h: 3600 s/h * circumference(mm) / period / interval(ms)
    let speed_mh = 3600 * cfg.wheel_circumference_mm / period_samples / cfg.sample_interval_ms;
    let avg_sq = running_avg * running_avg;

    if speed_mh > SPEED_HIGH_MH || avg_sq > SHOCK_HIGH_G2 {
        SpeedClass::High
    } else if speed_mh > SPEED_MIDHIGH_MH {
        SpeedClass::MidHigh
    } else if speed_mh > SPEED_MID_MH || avg_sq > SHOCK_MID_G2 {
        SpeedClass::Mid
    } else {
        SpeedClass::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> TrackerConfig {
        TrackerConfig::default() // 2100 mm wheel, 10 ms samples
    }

    #[test]
    fn slow_period_is_low() {
        // 150 samples/rev = 1.5 s/rev = ~5 km/h.
        assert_eq!(classify(150, 0.0, &cfg()), SpeedClass::Low);
    }

    #[test]
    fn ordered_thresholds() {
        // 40 samples/rev: 3600*2100/40/10 = 18,900 m/h -> Mid.
        assert_eq!(classify(40, 0.0, &cfg()), SpeedClass::Mid);
        // 22 samples/rev: ~34,400 m/h -> MidHigh.
        assert_eq!(classify(22, 0.0, &cfg()), SpeedClass::MidHigh);
        // 18 samples/rev: ~42,000 m/h -> High.
        assert_eq!(classify(18, 0.0, &cfg()), SpeedClass::High);
    }

    #[test]
    fn shock_overrides_period() {
        // Idle-slow period, but a 1.2 g running average forces Mid.
        assert_eq!(classify(150, 1.2, &cfg()), SpeedClass::Mid);
        // And a >2 g average forces High outright.
        assert_eq!(classify(150, 2.1, &cfg()), SpeedClass::High);
    }

    #[test]
    fn mid_or_above() {
        assert!(!SpeedClass::Low.is_mid_or_above());
        assert!(SpeedClass::Mid.is_mid_or_above());
        assert!(SpeedClass::High.is_mid_or_above());
    }
}
