// lib.rs
#![no_std]

pub mod accel;

pub use accel::lis2de12::Lis2de12;
pub use accel::mma8652::Mma8652;
pub use accel::{AccelError, Accelerometer, SampleBatch, FIFO_DEPTH};
