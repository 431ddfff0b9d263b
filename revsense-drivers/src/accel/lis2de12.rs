use embedded_hal_async::i2c::I2c as AsyncI2c;
use revsense_core::info;
use revsense_core::types::RawSample;

use super::{AccelError, Accelerometer, SampleBatch, FIFO_DEPTH};

/// ST LIS2DE12, the sensor of the cost-reduced second revision. Little-endian
/// output read in high-resolution framing, FIFO 32 deep.
pub struct Lis2de12<I2C> {
    i2c: I2C,
    watermark: usize,
}

const WHO_AM_I: u8 = 0x0F;
const CTRL_REG1: u8 = 0x20;
const CTRL_REG3: u8 = 0x22;
const CTRL_REG4: u8 = 0x23;
const CTRL_REG5: u8 = 0x24;
const OUT_X_L: u8 = 0x28;
const FIFO_CTRL_REG: u8 = 0x2E;
const FIFO_SRC_REG: u8 = 0x2F;
const INT1_CFG: u8 = 0x30;
const INT1_THS: u8 = 0x32;
const INT1_DURATION: u8 = 0x33;

const DEVICE_ID: u8 = 0x33;
// multi-byte reads need the address auto-increment bit
const AUTO_INC: u8 = 0x80;
// 100 Hz, all axes on
const ODR_100HZ_XYZ: u8 = 0x57;
// 10 Hz wake-watch rate
const ODR_10HZ_XYZ: u8 = 0x27;
// BDU, +/-8 g, high resolution framing
const BDU_8G_HR: u8 = 0xA8;
const FIFO_EN: u8 = 0x40;
const I1_WTM: u8 = 0x04;
const I1_IA1: u8 = 0x40;
// high-g events on Y or Z
const ZHIE_YHIE: u8 = 0x28;

impl<I2C: AsyncI2c> Lis2de12<I2C> {
    const ADDR: u8 = 0x19;

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
}

/// 12-bit left-justified little-endian register pair to a signed LSB count.
fn decode_axis(lsb: u8, msb: u8) -> i16 {
    i16::from_le_bytes([lsb, msb]) >> 4
}

impl<I2C: AsyncI2c> Accelerometer for Lis2de12<I2C> {
    async fn init(&mut self) -> Result<(), AccelError> {
        let id = self.read_reg(WHO_AM_I).await?;
        if id != DEVICE_ID {
            return Err(AccelError::DeviceMissing);
        }

        self.write_reg(CTRL_REG4, BDU_8G_HR).await?;
        self.write_reg(CTRL_REG5, FIFO_EN).await?;
        // stream mode with the watermark in the low bits
        self.write_reg(FIFO_CTRL_REG, 0x80 | self.watermark as u8).await?;
        // ~1.5 g threshold (62 mg/LSB at 8 g), 6-sample duration
        self.write_reg(INT1_THS, 0x18).await?;
        self.write_reg(INT1_DURATION, 6).await?;
        self.write_reg(INT1_CFG, ZHIE_YHIE).await?;

        info!("LIS2DE12: online (+/-8g, 100 Hz, watermark {})", self.watermark);
        self.enter_motion_wake().await
    }

    async fn start_streaming(&mut self) -> Result<(), AccelError> {
        self.write_reg(CTRL_REG3, I1_WTM).await?;
        self.write_reg(CTRL_REG1, ODR_100HZ_XYZ).await
    }

    async fn enter_motion_wake(&mut self) -> Result<(), AccelError> {
        self.write_reg(CTRL_REG3, I1_IA1).await?;
        self.write_reg(CTRL_REG1, ODR_10HZ_XYZ).await
    }

    async fn read_batch(&mut self) -> Result<SampleBatch, AccelError> {
        let count = (self.read_reg(FIFO_SRC_REG).await? & 0x1F) as usize;
        if count < self.watermark {
            return Err(AccelError::FifoUnderrun);
        }

        let mut raw = [0u8; FIFO_DEPTH * 6];
        self.i2c
            .write_read(
                Self::ADDR,
                &[OUT_X_L | AUTO_INC],
                &mut raw[..self.watermark * 6],
            )
            .await
            .map_err(|_| AccelError::Bus)?;

        let mut batch = SampleBatch::new();
        for frame in raw[..self.watermark * 6].chunks_exact(6) {
            let sample = RawSample::new(
                decode_axis(frame[0], frame[1]),
                decode_axis(frame[2], frame[3]),
                decode_axis(frame[4], frame[5]),
            );
            let _ = batch.push(sample);
        }
        Ok(batch)
    }

    fn watermark(&self) -> usize {
        self.watermark
    }
}
