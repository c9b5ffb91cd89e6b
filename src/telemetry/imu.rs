use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::dynamics::state::State;
use crate::error::ConfigError;
use crate::frames;

// ---------------------------------------------------------------------------
// IMU samples derived from the simulated body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImuConfig {
    pub publish_rate: f64,          // Hz
    pub frame_id: String,
    /// Report everything in the remote (forward/left/up) frame.
    pub convert_to_remote_frame: bool,
    /// World-frame gravity removed from the measured acceleration.
    pub gravity: [f64; 3],
    pub queue_depth: usize,
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            publish_rate: 100.0,
            frame_id: "drone_imu".into(),
            convert_to_remote_frame: false,
            gravity: [0.0, -9.81, 0.0],
            queue_depth: 64,
        }
    }
}

impl ImuConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.publish_rate.is_finite() && self.publish_rate > 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "imu.publish_rate",
                value: self.publish_rate,
            });
        }
        if self.queue_depth == 0 {
            return Err(ConfigError::InvalidParameter { name: "imu.queue_depth", value: 0.0 });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamp {
    pub sec: i32,
    pub nanosec: u32,
}

impl Stamp {
    pub fn from_seconds(t: f64) -> Self {
        let sec = t.floor();
        Self {
            sec: sec as i32,
            nanosec: (((t - sec) * 1e9) as u32).min(999_999_999),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImuSample {
    pub frame_id: String,
    pub stamp: Stamp,
    pub orientation: UnitQuaternion<f64>,
    pub angular_velocity: Vector3<f64>,     // rad/s, body frame
    pub linear_acceleration: Vector3<f64>,  // m/s², body frame, gravity removed
}

/// Decimates the physics tick down to the publish rate.
#[derive(Debug, Clone)]
pub struct ImuSampler {
    config: ImuConfig,
    interval: f64,
    timer: f64,
    prev_vel: Option<Vector3<f64>>,
}

impl ImuSampler {
    pub fn new(config: ImuConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            interval: 1.0 / config.publish_rate,
            config,
            timer: 0.0,
            prev_vel: None,
        })
    }

    /// Feed the state after each tick of `dt`. Returns a sample when one is
    /// due. Acceleration is differenced tick to tick, not publish to publish.
    pub fn observe(&mut self, state: &State, dt: f64) -> Option<ImuSample> {
        let accel_world = match self.prev_vel.replace(state.vel) {
            Some(prev) if dt > 0.0 => (state.vel - prev) / dt,
            _ => Vector3::zeros(),
        };

        self.timer += dt;
        if self.timer < self.interval {
            return None;
        }
        self.timer = self.timer.rem_euclid(self.interval);

        let g = Vector3::from(self.config.gravity);
        let angular_velocity = state.vehicle().body_angular_velocity();
        let linear_acceleration = state.quat.inverse() * (accel_world - g);

        let sample = if self.config.convert_to_remote_frame {
            ImuSample {
                frame_id: self.config.frame_id.clone(),
                stamp: Stamp::from_seconds(state.time),
                orientation: frames::orientation_local_to_remote(&state.quat),
                angular_velocity: frames::local_to_remote(&angular_velocity),
                linear_acceleration: frames::local_to_remote(&linear_acceleration),
            }
        } else {
            ImuSample {
                frame_id: self.config.frame_id.clone(),
                stamp: Stamp::from_seconds(state.time),
                orientation: state.quat,
                angular_velocity,
                linear_acceleration,
            }
        };
        Some(sample)
    }
}
