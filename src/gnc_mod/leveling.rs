use std::f64::consts::PI;

use nalgebra::{Unit, UnitQuaternion, Vector3};

use crate::dynamics::state::{world_up, VehicleState};
use crate::gnc_mod::params::ControllerParameters;

// ---------------------------------------------------------------------------
// Self-leveling attitude stabilizer
//
// Keeps body up on world up while leaving heading free:
//   1. shortest-arc rotation taking body up onto world up
//   2. its vector part, vertical component removed, times the tilt gain
//   3. damping of the angular velocity orthogonal to body up (half the gain)
//   4. yaw drive about the body's current up axis
//   5. optional per-tick attenuation of the off-axis spin, as a torque
// Terms 1-3 have no component along body up; only term 4 drives yaw.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelfLevelingStabilizer {
    pub tilt_restoration_force: f64,
    pub angular_speed: f64,
    pub wobble_suppression: Option<f64>,
}

impl SelfLevelingStabilizer {
    pub fn from_params(params: &ControllerParameters) -> Self {
        Self {
            tilt_restoration_force: params.tilt_restoration_force,
            angular_speed: params.angular_speed,
            wobble_suppression: params.wobble_suppression,
        }
    }

    /// Step 1. Shortest arc from `up` to world up.
    ///
    /// When `up` is antiparallel the arc's axis is undefined; a half turn
    /// about the horizontal part of `forward` is used instead (world X if
    /// `forward` is vertical too).
    pub fn righting_rotation(up: &Vector3<f64>, forward: &Vector3<f64>) -> UnitQuaternion<f64> {
        UnitQuaternion::rotation_between(up, &world_up()).unwrap_or_else(|| {
            let axis = Unit::try_new(horizontal(forward), 1e-9).unwrap_or_else(Vector3::x_axis);
            UnitQuaternion::from_axis_angle(&axis, PI)
        })
    }

    /// Step 2.
    pub fn leveling_torque(&self, state: &VehicleState) -> Vector3<f64> {
        let righting = Self::righting_rotation(&state.up(), &state.forward());
        horizontal(&righting.imag()) * self.tilt_restoration_force
    }

    /// Step 3.
    pub fn damping_torque(&self, state: &VehicleState) -> Vector3<f64> {
        -off_axis_spin(state) * (self.tilt_restoration_force * 0.5)
    }

    /// Step 4. `yaw_rate` in deg/s.
    pub fn yaw_torque(&self, state: &VehicleState, yaw_rate: f64) -> Vector3<f64> {
        state.up() * (yaw_rate.to_radians() * self.angular_speed)
    }

    /// Step 5. Torque that leaves `k` of the off-axis angular velocity after
    /// one tick of `dt`.
    pub fn wobble_torque(&self, state: &VehicleState, dt: f64) -> Vector3<f64> {
        match self.wobble_suppression {
            Some(k) if dt > 0.0 => -off_axis_spin(state) * ((1.0 - k) / dt),
            _ => Vector3::zeros(),
        }
    }

    /// Sum of all terms, world frame, acceleration mode.
    pub fn torque(&self, state: &VehicleState, yaw_rate: f64, dt: f64) -> Vector3<f64> {
        self.leveling_torque(state)
            + self.damping_torque(state)
            + self.yaw_torque(state, yaw_rate)
            + self.wobble_torque(state, dt)
    }
}

fn horizontal(v: &Vector3<f64>) -> Vector3<f64> {
    Vector3::new(v.x, 0.0, v.z)
}

// Angular velocity with the component about body up removed.
fn off_axis_spin(state: &VehicleState) -> Vector3<f64> {
    let up = state.up();
    let spin = state.angular_velocity;
    spin - up * spin.dot(&up)
}
