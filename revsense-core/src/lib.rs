// lib.rs
#![no_std]

pub mod angle;
pub mod config;
pub mod detector;
pub mod filter;
pub mod guard;
pub mod macros;
pub mod rotation;
pub mod speed;
pub mod timebase;
pub mod tracker;
pub mod types;

pub use config::{AnomalyPolicy, AxisSelect, TrackerConfig};
pub use detector::{DetectState, RevolutionDetector};
pub use guard::{WriteGuard, WriteToken};
pub use speed::SpeedClass;
pub use tracker::MotionTracker;
pub use types::*;
