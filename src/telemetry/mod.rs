pub mod imu;
pub mod publisher;

pub use imu::{ImuConfig, ImuSample, ImuSampler, Stamp};
pub use publisher::ImuPublisher;
