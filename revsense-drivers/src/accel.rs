use revsense_core::types::RawSample;

pub mod lis2de12;
pub mod mma8652;

/// Deepest hardware FIFO across the supported parts.
pub const FIFO_DEPTH: usize = 32;

/// One drained watermark batch, oldest sample first.
pub type SampleBatch = heapless::Vec<RawSample, FIFO_DEPTH>;

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccelError {
    /// I2C NACK or bus fault.
    Bus,
    /// WHO_AM_I mismatch or reset that never completed.
    DeviceMissing,
    /// Watermark interrupt fired but the FIFO held fewer samples.
    FifoUnderrun,
}

/// Watermark-batched accelerometer. Two of these exist because the product
/// shipped with different sensors across hardware revisions; the core is
/// oblivious to which one feeds it.
///
/// Mode model: after `init` the part sits in motion-wake standby. The wake
/// interrupt promotes it to streaming, where the FIFO watermark interrupt
/// paces `read_batch`; a stop declaration demotes it back.
#[allow(async_fn_in_trait)]
pub trait Accelerometer {
    /// Probe, reset and configure for the given watermark, leaving the part
    /// in motion-wake standby.
    async fn init(&mut self) -> Result<(), AccelError>;

    /// Enter streaming capture at the full data rate, FIFO watermark
    /// interrupt armed.
    async fn start_streaming(&mut self) -> Result<(), AccelError>;

    /// Drop to the low-power data rate with the motion-threshold interrupt
    /// armed instead of the FIFO.
    async fn enter_motion_wake(&mut self) -> Result<(), AccelError>;

    /// Drain one watermark batch from the FIFO.
    async fn read_batch(&mut self) -> Result<SampleBatch, AccelError>;

    fn watermark(&self) -> usize;
}
