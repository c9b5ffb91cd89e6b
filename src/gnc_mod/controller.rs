use nalgebra::Vector3;

use crate::command::CommandState;
use crate::dynamics::body::{ForceMode, RigidBody};
use crate::dynamics::state::VehicleState;

/// Acceleration-mode force and torque for one tick, world frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Wrench {
    pub force: Vector3<f64>,
    pub torque: Vector3<f64>,
}

impl Wrench {
    /// Push both loads onto the body in acceleration mode. The body's pose
    /// and velocities are never written here.
    pub fn apply_to(&self, body: &mut dyn RigidBody) {
        body.apply_force(self.force, ForceMode::Acceleration);
        body.apply_torque(self.torque, ForceMode::Acceleration);
    }
}

/// Trait for flight controllers.
///
/// Implement this to plug a custom control law into the simulation loop.
pub trait Controller {
    /// Compute the corrective wrench from the current body state and command.
    fn control(&mut self, state: &VehicleState, cmd: &CommandState, dt: f64) -> Wrench;

    /// Reset controller internal state, if any.
    fn reset(&mut self) {}

    /// Human-readable name for logging/display.
    fn name(&self) -> &str {
        "unnamed"
    }
}
