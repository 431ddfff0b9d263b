// types.rs

/// One raw tri-axial accelerometer sample in device LSBs, right-justified.
/// The driver layer is responsible for sign extension and justification;
/// the core only divides by the configured sensitivity.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl RawSample {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

/// The record handed to the measurement encoder once per export tick.
/// `last_event_time_1024hz` is the 1024 Hz fixed-point timestamp of the most
/// recent detected revolution, modulo [`crate::tracker::TOTAL_TIME_MODULUS_MS`].
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventRecord {
    pub cumulative_revolutions: u32,
    pub last_event_time_1024hz: u16,
    pub wheel_rev_data_present: bool,
}

/// Errors surfaced by the batch-ingest (producer) path.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BatchError {
    /// The advisory write guard was already held. This is a contract
    /// violation in the caller: producer invocations must be serialized.
    GuardHeld,
    /// The batch length does not match the configured watermark size.
    BatchLen,
}

/// Non-fatal outcomes of the measurement (consumer) path.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasureError {
    /// The producer currently holds the write guard. Skip this cycle and
    /// try again on the next export tick; never retry synchronously.
    Busy,
    /// No revolution since the previous call (and no force-report flag),
    /// or insufficient history right after a reset.
    NoNewData,
}

/// Configuration invariant violations, checked once at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    ZeroBatchSize,
    BatchTooLarge,
    ZeroSampleInterval,
    ZeroSensitivity,
    ZeroWheelCircumference,
    ZeroTickRate,
}
