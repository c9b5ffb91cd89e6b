use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Body axes (vehicle-local convention: right = +X, up = +Y, forward = +Z)
// ---------------------------------------------------------------------------

pub fn world_up() -> Vector3<f64> {
    Vector3::y()
}

// ---------------------------------------------------------------------------
// Controller-facing kinematics
// ---------------------------------------------------------------------------

/// What the controller may read from the simulator each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleState {
    pub orientation: UnitQuaternion<f64>,   // body→world rotation
    pub linear_velocity: Vector3<f64>,      // m/s, world frame
    pub angular_velocity: Vector3<f64>,     // rad/s, world frame
}

impl VehicleState {
    pub fn at_rest(orientation: UnitQuaternion<f64>) -> Self {
        Self {
            orientation,
            linear_velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
        }
    }

    /// Body up axis in world frame.
    pub fn up(&self) -> Vector3<f64> {
        self.orientation * Vector3::y()
    }

    /// Body forward axis in world frame.
    pub fn forward(&self) -> Vector3<f64> {
        self.orientation * Vector3::z()
    }

    /// Angle between body up and world up (rad).
    pub fn tilt(&self) -> f64 {
        self.up().y.clamp(-1.0, 1.0).acos()
    }

    /// Angular rate about the body's current up axis (rad/s).
    pub fn yaw_rate(&self) -> f64 {
        self.angular_velocity.dot(&self.up())
    }

    /// Angular velocity expressed in the body frame.
    pub fn body_angular_velocity(&self) -> Vector3<f64> {
        self.orientation.inverse() * self.angular_velocity
    }
}

// ---------------------------------------------------------------------------
// Full simulation state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub time: f64,
    pub pos: Vector3<f64>,              // m, world
    pub vel: Vector3<f64>,              // m/s, world
    pub quat: UnitQuaternion<f64>,      // body→world rotation
    pub omega: Vector3<f64>,            // rad/s, world
}

impl State {
    pub fn at_rest(quat: UnitQuaternion<f64>) -> Self {
        Self {
            time: 0.0,
            pos: Vector3::zeros(),
            vel: Vector3::zeros(),
            quat,
            omega: Vector3::zeros(),
        }
    }

    pub fn vehicle(&self) -> VehicleState {
        VehicleState {
            orientation: self.quat,
            linear_velocity: self.vel,
            angular_velocity: self.omega,
        }
    }

    pub fn tilt(&self) -> f64 {
        self.vehicle().tilt()
    }

    pub fn yaw_rate(&self) -> f64 {
        self.vehicle().yaw_rate()
    }
}

impl Default for State {
    fn default() -> Self {
        Self::at_rest(UnitQuaternion::identity())
    }
}

// ---------------------------------------------------------------------------
// Accelerations accumulated over one tick
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deriv {
    pub dvel: Vector3<f64>,     // linear acceleration, world
    pub domega: Vector3<f64>,   // angular acceleration, world
}

impl Deriv {
    pub fn is_finite(&self) -> bool {
        self.dvel.iter().chain(self.domega.iter()).all(|c| c.is_finite())
    }
}

// ---------------------------------------------------------------------------
// Integration limits applied by the simulator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct BodyLimits {
    pub linear_damping: f64,
    pub angular_damping: f64,
    pub max_linear_speed: f64,
    pub max_angular_speed: f64,
}

impl Default for BodyLimits {
    fn default() -> Self {
        Self {
            linear_damping: 0.0,
            angular_damping: 0.05,
            max_linear_speed: f64::INFINITY,
            max_angular_speed: 50.0,
        }
    }
}

/// Scale `v` down to at most `max` in length. The length is taken on the
/// vector divided by its largest component, so huge finite inputs do not
/// overflow to `inf`.
pub fn cap_norm(v: &Vector3<f64>, max: f64) -> Vector3<f64> {
    let scale = v.amax();
    if scale == 0.0 || !scale.is_finite() {
        return *v;
    }
    let unit = v / scale;
    let n = unit.norm();
    if scale > max / n {
        unit * (max / n)
    } else {
        *v
    }
}

// ---------------------------------------------------------------------------
// Simulation config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub dt: f64,
    pub max_time: f64,
}

impl SimConfig {
    pub fn tick_rate(&self) -> f64 {
        1.0 / self.dt
    }

    /// Number of whole ticks that fit in `max_time`.
    pub fn ticks(&self) -> usize {
        (self.max_time / self.dt).round().max(0.0) as usize
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(ConfigError::TickRate(self.dt));
        }
        if !(self.max_time.is_finite() && self.max_time >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "max_time",
                value: self.max_time,
            });
        }
        Ok(())
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            dt: 0.02,         // 50 Hz fixed step
            max_time: 60.0,
        }
    }
}
