use embedded_hal_async::i2c::I2c as AsyncI2c;
use revsense_core::info;
use revsense_core::types::RawSample;

use super::{AccelError, Accelerometer, SampleBatch, FIFO_DEPTH};

/// NXP MMA8652FC, the sensor of the first hardware revision. 12-bit,
/// big-endian output, FIFO 32 deep.
pub struct Mma8652<I2C> {
    i2c: I2C,
    watermark: usize,
}

// Register map (datasheet rev 3.0)
const STATUS: u8 = 0x00; // F_STATUS while the FIFO is enabled
const OUT_X_MSB: u8 = 0x01;
const F_SETUP: u8 = 0x09;
const WHO_AM_I: u8 = 0x0D;
const XYZ_DATA_CFG: u8 = 0x0E;
const FF_MT_CFG: u8 = 0x15;
const FF_MT_THS: u8 = 0x17;
const FF_MT_COUNT: u8 = 0x18;
const CTRL_REG1: u8 = 0x2A;
const CTRL_REG2: u8 = 0x2B;
const CTRL_REG4: u8 = 0x2D;
const CTRL_REG5: u8 = 0x2E;
const OFF_X: u8 = 0x2F;

const DEVICE_ID: u8 = 0x4A;
const RST: u8 = 0x40;
const ACTIVE: u8 = 0x01;
// 100 Hz output, 12.5 Hz sleep rate
const DR_100HZ_ASLP: u8 = 0x58;
const FS_8G: u8 = 0x02;
const INT_EN_FIFO: u8 = 0x40;
const INT_EN_FF_MT: u8 = 0x04;

impl<I2C: AsyncI2c> Mma8652<I2C> {
    const ADDR: u8 = 0x1D;

    pub fn new(i2c: I2C, watermark: usize) -> Self {
        Self { i2c, watermark }
    }

    async fn write_reg(&mut self, reg: u8, val: u8) -> Result<(), AccelError> {
        self.i2c
            .write(Self::ADDR, &[reg, val])
            .await
            .map_err(|_| AccelError::Bus)
    }

    async fn read_reg(&mut self, reg: u8) -> Result<u8, AccelError> {
        let mut buf = [0u8; 1];
        self.i2c
            .write_read(Self::ADDR, &[reg], &mut buf)
            .await
            .map_err(|_| AccelError::Bus)?;
        Ok(buf[0])
    }

    async fn standby(&mut self) -> Result<(), AccelError> {
        let reg1 = self.read_reg(CTRL_REG1).await?;
        self.write_reg(CTRL_REG1, reg1 & !ACTIVE).await
    }

    async fn activate(&mut self) -> Result<(), AccelError> {
        let reg1 = self.read_reg(CTRL_REG1).await?;
        self.write_reg(CTRL_REG1, reg1 | ACTIVE).await
    }

    /// Write factory calibration offsets (2 mg/LSB, two's complement).
    /// Only valid in standby; callers run this between `init` and the
    /// first mode change.
    pub async fn set_offsets(&mut self, x: i8, y: i8, z: i8) -> Result<(), AccelError> {
        self.standby().await?;
        self.i2c
            .write(Self::ADDR, &[OFF_X, x as u8, y as u8, z as u8])
            .await
            .map_err(|_| AccelError::Bus)?;
        self.activate().await
    }
}

/// 12-bit left-justified big-endian register pair to a signed LSB count.
fn decode_axis(msb: u8, lsb: u8) -> i16 {
    i16::from_be_bytes([msb, lsb]) >> 4
}

impl<I2C: AsyncI2c> Accelerometer for Mma8652<I2C> {
    async fn init(&mut self) -> Result<(), AccelError> {
        let id = self.read_reg(WHO_AM_I).await?;
        if id != DEVICE_ID {
            return Err(AccelError::DeviceMissing);
        }

        self.write_reg(CTRL_REG2, RST).await?;
        let mut resetting = true;
        for _ in 0..100 {
            if self.read_reg(CTRL_REG2).await? & RST == 0 {
                resetting = false;
                break;
            }
        }
        if resetting {
            return Err(AccelError::DeviceMissing);
        }

        self.write_reg(XYZ_DATA_CFG, FS_8G).await?;
        // FIFO stop-on-overflow mode with the watermark in the low bits
        self.write_reg(F_SETUP, 0x40 | self.watermark as u8).await?;
        // Motion on Y/Z, latched; ~1.5 g threshold with a 6-count debounce
        self.write_reg(FF_MT_CFG, 0x60).await?;
        self.write_reg(FF_MT_THS, 0x80 | 0x18).await?;
        self.write_reg(FF_MT_COUNT, 6).await?;
        self.write_reg(CTRL_REG1, DR_100HZ_ASLP).await?;

        info!("MMA8652: online (+/-8g, 100 Hz, watermark {})", self.watermark);
        self.enter_motion_wake().await
    }

    async fn start_streaming(&mut self) -> Result<(), AccelError> {
        self.standby().await?;
        self.write_reg(CTRL_REG4, INT_EN_FIFO).await?;
        // route to INT1
        self.write_reg(CTRL_REG5, INT_EN_FIFO).await?;
        self.activate().await
    }

    async fn enter_motion_wake(&mut self) -> Result<(), AccelError> {
        self.standby().await?;
        self.write_reg(CTRL_REG4, INT_EN_FF_MT).await?;
        self.write_reg(CTRL_REG5, INT_EN_FF_MT).await?;
        self.activate().await
    }

    async fn read_batch(&mut self) -> Result<SampleBatch, AccelError> {
        let count = (self.read_reg(STATUS).await? & 0x3F) as usize;
        if count < self.watermark {
            return Err(AccelError::FifoUnderrun);
        }

        let mut raw = [0u8; FIFO_DEPTH * 6];
        self.i2c
            .write_read(Self::ADDR, &[OUT_X_MSB], &mut raw[..self.watermark * 6])
            .await
            .map_err(|_| AccelError::Bus)?;

        let mut batch = SampleBatch::new();
        for frame in raw[..self.watermark * 6].chunks_exact(6) {
            let sample = RawSample::new(
                decode_axis(frame[0], frame[1]),
                decode_axis(frame[2], frame[3]),
                decode_axis(frame[4], frame[5]),
            );
            // capacity is FIFO_DEPTH and watermark never exceeds it
            let _ = batch.push(sample);
        }
        Ok(batch)
    }

    fn watermark(&self) -> usize {
        self.watermark
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_positive_full_lsb() {
        // +1 g at 8 g full scale is 256 LSB (12-bit, 4096/16).
        assert_eq!(decode_axis(0x10, 0x00), 256);
    }

    #[test]
    fn decode_negative_is_sign_extended() {
        assert_eq!(decode_axis(0xF0, 0x00), -256);
        assert_eq!(decode_axis(0xFF, 0xF0), -1);
    }

    #[test]
    fn decode_ignores_low_nibble() {
        assert_eq!(decode_axis(0x10, 0x0F), 256);
    }
}
