use crate::command::CommandState;
use crate::dynamics::state::VehicleState;
use crate::gnc_mod::controller::{Controller, Wrench};
use crate::gnc_mod::leveling::SelfLevelingStabilizer;
use crate::gnc_mod::params::ControllerParameters;
use crate::gnc_mod::velocity::VelocityTracker;

// ---------------------------------------------------------------------------
// Flight controller: velocity tracking + self-leveling, once per fixed tick
// ---------------------------------------------------------------------------

/// Stateless composition of [`VelocityTracker`] and
/// [`SelfLevelingStabilizer`]. Identical inputs give identical output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightController {
    pub tracker: VelocityTracker,
    pub stabilizer: SelfLevelingStabilizer,
}

impl FlightController {
    pub fn new(params: &ControllerParameters) -> Self {
        Self {
            tracker: VelocityTracker::new(params.move_force_gain, params.max_speed),
            stabilizer: SelfLevelingStabilizer::from_params(params),
        }
    }

    pub fn wrench(&self, state: &VehicleState, cmd: &CommandState, dt: f64) -> Wrench {
        Wrench {
            force: self.tracker.force(&cmd.target_local_velocity, state),
            torque: self.stabilizer.torque(state, cmd.target_yaw_rate, dt),
        }
    }
}

impl Default for FlightController {
    fn default() -> Self {
        Self::new(&ControllerParameters::default())
    }
}

impl Controller for FlightController {
    fn control(&mut self, state: &VehicleState, cmd: &CommandState, dt: f64) -> Wrench {
        self.wrench(state, cmd, dt)
    }

    fn name(&self) -> &str {
        "FlightController"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    #[test]
    fn deterministic_for_identical_inputs() {
        let fc = FlightController::default();
        let mut state = VehicleState::at_rest(UnitQuaternion::from_euler_angles(0.2, -0.1, 0.4));
        state.linear_velocity = Vector3::new(0.3, 0.0, -1.0);
        state.angular_velocity = Vector3::new(0.1, 0.5, -0.2);
        let cmd = CommandState::new(Vector3::new(1.0, 0.0, 2.0), 30.0);
        let a = fc.wrench(&state, &cmd, 0.02);
        let b = fc.wrench(&state, &cmd, 0.02);
        assert_eq!(a, b);
    }

    #[test]
    fn trait_matches_inherent() {
        let mut fc = FlightController::default();
        let state = VehicleState::at_rest(UnitQuaternion::identity());
        let cmd = CommandState::new(Vector3::new(0.0, 0.0, 5.0), 0.0);
        let w = Controller::control(&mut fc, &state, &cmd, 0.02);
        assert_relative_eq!(w.force, Vector3::new(0.0, 0.0, 75.0));
        assert_eq!(w.torque, Vector3::zeros());
        assert_eq!(fc.name(), "FlightController");
    }
}
