use nalgebra::{UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dynamics::state::{BodyLimits, Deriv, State, VehicleState};
use crate::error::ConfigError;
use crate::sim::integrator;

/// How an applied vector is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceMode {
    /// Newtonian force / torque, divided by mass / inertia.
    Force,
    /// Mass-independent: the vector is the resulting acceleration.
    Acceleration,
}

/// The simulator surface the controller drives.
///
/// Implementors own the state; controllers only read it and push loads back.
pub trait RigidBody {
    fn orientation(&self) -> UnitQuaternion<f64>;
    fn linear_velocity(&self) -> Vector3<f64>;
    fn angular_velocity(&self) -> Vector3<f64>;
    fn apply_force(&mut self, force: Vector3<f64>, mode: ForceMode);
    fn apply_torque(&mut self, torque: Vector3<f64>, mode: ForceMode);

    fn kinematics(&self) -> VehicleState {
        VehicleState {
            orientation: self.orientation(),
            linear_velocity: self.linear_velocity(),
            angular_velocity: self.angular_velocity(),
        }
    }
}

// ---------------------------------------------------------------------------
// Reference rigid body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub mass: f64,                  // kg
    pub inertia: f64,               // kg·m^2, scalar (spherical body)
    pub max_angular_speed: f64,     // rad/s
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            mass: 1.5,
            inertia: 0.03,
            max_angular_speed: 50.0,
        }
    }
}

/// Gravity-free rigid body integrating accumulated loads once per tick.
#[derive(Debug, Clone)]
pub struct SimBody {
    state: State,
    limits: BodyLimits,
    mass: f64,
    inertia: f64,
    pending: Deriv,
}

impl SimBody {
    pub fn new(initial: State, config: &BodyConfig) -> Result<Self, ConfigError> {
        positive("mass", config.mass)?;
        positive("inertia", config.inertia)?;
        positive("max_angular_speed", config.max_angular_speed)?;
        Ok(Self {
            state: initial,
            limits: BodyLimits {
                max_angular_speed: config.max_angular_speed,
                ..BodyLimits::default()
            },
            mass: config.mass,
            inertia: config.inertia,
            pending: Deriv::default(),
        })
    }

    pub fn set_linear_damping(&mut self, damping: f64) -> Result<(), ConfigError> {
        self.limits.linear_damping = non_negative("linear_damping", damping)?;
        Ok(())
    }

    pub fn set_angular_damping(&mut self, damping: f64) -> Result<(), ConfigError> {
        self.limits.angular_damping = non_negative("angular_damping", damping)?;
        Ok(())
    }

    pub fn set_max_linear_speed(&mut self, speed: f64) -> Result<(), ConfigError> {
        if !(speed > 0.0) {
            return Err(ConfigError::MaxSpeed(speed));
        }
        self.limits.max_linear_speed = speed;
        Ok(())
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn limits(&self) -> &BodyLimits {
        &self.limits
    }

    /// Integrate the loads applied since the last step, then clear them.
    /// Non-finite loads are discarded for the tick; the body coasts.
    pub fn step(&mut self, dt: f64) {
        let mut loads = std::mem::take(&mut self.pending);
        if !loads.is_finite() {
            warn!(dvel = ?loads.dvel, domega = ?loads.domega, "discarding non-finite loads");
            loads = Deriv::default();
        }
        self.state = integrator::step(&self.state, &loads, &self.limits, dt);
    }
}

impl RigidBody for SimBody {
    fn orientation(&self) -> UnitQuaternion<f64> {
        self.state.quat
    }

    fn linear_velocity(&self) -> Vector3<f64> {
        self.state.vel
    }

    fn angular_velocity(&self) -> Vector3<f64> {
        self.state.omega
    }

    fn apply_force(&mut self, force: Vector3<f64>, mode: ForceMode) {
        self.pending.dvel += match mode {
            ForceMode::Force => force / self.mass,
            ForceMode::Acceleration => force,
        };
    }

    fn apply_torque(&mut self, torque: Vector3<f64>, mode: ForceMode) {
        self.pending.domega += match mode {
            ForceMode::Force => torque / self.inertia,
            ForceMode::Acceleration => torque,
        };
    }
}

fn positive(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NegativeDamping { name, value })
    }
}
