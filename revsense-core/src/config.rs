// config.rs
use crate::types::ConfigError;

/// Which axis carries the zero-crossing magnitude signal. The angle is always
/// derived from the z/y pair; the carrier axis depends on how the sensor is
/// mounted and is fixed per build.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisSelect {
    Y,
    Z,
}

/// What to do with a frame-to-frame angle delta that exceeds the plausible
/// per-sample window. The original firmware logged and folded the raw delta
/// in unchanged; that stays the default so sensor faults remain visible.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AnomalyPolicy {
    /// Log and count the anomaly, keep the raw delta.
    LogOnly,
    /// Saturate the delta to the per-sample ceiling.
    Clamp,
}

/// Immutable device configuration, provided once at initialization.
#[derive(Clone, Copy, Debug, serde::Serialize, serde::Deserialize)]
pub struct TrackerConfig {
    /// LSB per g of the right-justified raw samples (e.g. 256 for a 12-bit
    /// sensor at +/-8 g full scale).
    pub sensitivity_divisor: u16,
    pub wheel_circumference_mm: u32,
    /// FIFO watermark size; every submitted batch must have exactly this
    /// many samples.
    pub batch_size: usize,
    pub sample_interval_ms: u32,
    /// Magnitude carrier axis.
    pub axis_select: AxisSelect,
    /// Frequency of the monotonic tick counter passed to `submit_batch`.
    pub tick_hz: u32,
    pub anomaly_policy: AnomalyPolicy,
    /// Count a second revolution when a detected period gap exceeds twice
    /// the running estimate while in a mid-or-higher speed class. Inherited
    /// tuning from the field-calibrated firmware.
    pub missed_beat_compensation: bool,
}

impl TrackerConfig {
    /// Largest supported watermark. The sensor FIFOs are 32 deep; batch
    /// buffers in the tracker are sized to this.
    pub const MAX_BATCH: usize = 32;

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }
        if self.batch_size > Self::MAX_BATCH {
            return Err(ConfigError::BatchTooLarge);
        }
        if self.sample_interval_ms == 0 {
            return Err(ConfigError::ZeroSampleInterval);
        }
        if self.sensitivity_divisor == 0 {
            return Err(ConfigError::ZeroSensitivity);
        }
        if self.wheel_circumference_mm == 0 {
            return Err(ConfigError::ZeroWheelCircumference);
        }
        if self.tick_hz == 0 {
            return Err(ConfigError::ZeroTickRate);
        }
        Ok(())
    }
}

impl Default for TrackerConfig {
    /// The speed-sensor build: 12-bit +/-8 g sensor at 100 Hz, 25-sample
    /// watermark, 2.1 m wheel, 32.768 kHz tick counter.
    fn default() -> Self {
        Self {
            sensitivity_divisor: 256,
            wheel_circumference_mm: 2100,
            batch_size: 25,
            sample_interval_ms: 10,
            axis_select: AxisSelect::Y,
            tick_hz: 32_768,
            anomaly_policy: AnomalyPolicy::LogOnly,
            missed_beat_compensation: true,
        }
    }
}
