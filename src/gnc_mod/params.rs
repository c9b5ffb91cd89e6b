use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Controller parameters (fixed after initialization)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerParameters {
    pub move_force_gain: f64,           // 1/s, velocity error → acceleration
    pub max_speed: f64,                 // m/s, also the full-stick local speed
    pub angular_speed: f64,             // yaw gain, rad/s² per rad/s commanded
    pub tilt_restoration_force: f64,    // leveling gain
    pub linear_damping: f64,            // 1/s, handed to the simulator
    pub angular_damping: f64,           // 1/s, handed to the simulator
    pub wobble_suppression: Option<f64>, // per-tick keep factor for off-axis spin
    pub keyboard_yaw_rate: f64,         // deg/s at full local yaw input
}

impl ControllerParameters {
    pub fn builder() -> ControllerParametersBuilder {
        ControllerParametersBuilder::default()
    }

    /// Steady-state yaw rate per unit of commanded yaw rate.
    pub fn yaw_rate_ratio(&self) -> f64 {
        self.angular_speed / self.angular_damping
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        finite_positive("move_force_gain", self.move_force_gain)?;
        finite_positive("tilt_restoration_force", self.tilt_restoration_force)?;
        finite_positive("angular_speed", self.angular_speed)?;
        if !(self.max_speed.is_finite() && self.max_speed > 0.0) {
            return Err(ConfigError::MaxSpeed(self.max_speed));
        }
        for (name, value) in [
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::NegativeDamping { name, value });
            }
        }
        if let Some(k) = self.wobble_suppression {
            if !(0.0..=1.0).contains(&k) {
                return Err(ConfigError::InvalidParameter { name: "wobble_suppression", value: k });
            }
        }
        if !(self.keyboard_yaw_rate.is_finite() && self.keyboard_yaw_rate >= 0.0) {
            return Err(ConfigError::InvalidParameter {
                name: "keyboard_yaw_rate",
                value: self.keyboard_yaw_rate,
            });
        }
        Ok(())
    }
}

impl Default for ControllerParameters {
    fn default() -> Self {
        Self {
            move_force_gain: 15.0,
            max_speed: 10.0,
            // Matched to angular_damping: commanded yaw rate is flown 1:1.
            angular_speed: 2.0,
            tilt_restoration_force: 15.0,
            linear_damping: 2.0,
            angular_damping: 2.0,
            wobble_suppression: Some(0.1),
            keyboard_yaw_rate: 90.0,
        }
    }
}

fn finite_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter { name, value })
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct ControllerParametersBuilder {
    params: ControllerParameters,
}

impl ControllerParametersBuilder {
    pub fn move_force_gain(mut self, v: f64) -> Self { self.params.move_force_gain = v; self }
    pub fn max_speed(mut self, v: f64) -> Self { self.params.max_speed = v; self }
    pub fn angular_speed(mut self, v: f64) -> Self { self.params.angular_speed = v; self }
    pub fn tilt_restoration_force(mut self, v: f64) -> Self { self.params.tilt_restoration_force = v; self }
    pub fn linear_damping(mut self, v: f64) -> Self { self.params.linear_damping = v; self }
    pub fn angular_damping(mut self, v: f64) -> Self { self.params.angular_damping = v; self }
    pub fn wobble_suppression(mut self, v: Option<f64>) -> Self { self.params.wobble_suppression = v; self }
    pub fn keyboard_yaw_rate(mut self, v: f64) -> Self { self.params.keyboard_yaw_rate = v; self }

    pub fn build(self) -> Result<ControllerParameters, ConfigError> {
        self.params.validate()?;
        Ok(self.params)
    }
}
