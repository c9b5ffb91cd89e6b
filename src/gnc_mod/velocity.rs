use nalgebra::Vector3;

use crate::dynamics::state::{cap_norm, VehicleState};

// ---------------------------------------------------------------------------
// Velocity tracking: local target → world-frame corrective acceleration
// ---------------------------------------------------------------------------

/// Proportional velocity tracker. No integral term: any steady-state offset
/// is left to the balance between this force and the body's linear damping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityTracker {
    pub move_force_gain: f64,
    pub max_speed: f64,
}

impl VelocityTracker {
    pub fn new(move_force_gain: f64, max_speed: f64) -> Self {
        Self { move_force_gain, max_speed }
    }

    /// Acceleration-mode force, world frame. Targets faster than
    /// `max_speed` are flown at `max_speed` in the same direction.
    pub fn force(&self, target_local_velocity: &Vector3<f64>, state: &VehicleState) -> Vector3<f64> {
        let target = cap_norm(target_local_velocity, self.max_speed);
        let world_target = state.orientation * target;
        (world_target - state.linear_velocity) * self.move_force_gain
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::UnitQuaternion;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn forward_target_from_rest() {
        let t = VelocityTracker::new(15.0, 10.0);
        let s = VehicleState::at_rest(UnitQuaternion::identity());
        assert_relative_eq!(t.force(&Vector3::new(0.0, 0.0, 5.0), &s), Vector3::new(0.0, 0.0, 75.0));
    }

    #[test]
    fn target_follows_heading() {
        let t = VelocityTracker::new(1.0, 10.0);
        // Nose swung to world +X.
        let s = VehicleState::at_rest(UnitQuaternion::from_axis_angle(&Vector3::y_axis(), FRAC_PI_2));
        assert_relative_eq!(
            t.force(&Vector3::new(0.0, 0.0, 2.0), &s),
            Vector3::new(2.0, 0.0, 0.0),
            epsilon = 1e-12
        );
    }

    #[test]
    fn zero_target_opposes_motion() {
        let t = VelocityTracker::new(3.0, 10.0);
        let mut s = VehicleState::at_rest(UnitQuaternion::identity());
        s.linear_velocity = Vector3::new(1.0, -2.0, 0.5);
        assert_relative_eq!(t.force(&Vector3::zeros(), &s), Vector3::new(-3.0, 6.0, -1.5));
    }

    #[test]
    fn on_target_gives_no_force() {
        let t = VelocityTracker::new(15.0, 10.0);
        let q = UnitQuaternion::from_euler_angles(0.1, 0.7, -0.2);
        let mut s = VehicleState::at_rest(q);
        let local = Vector3::new(1.0, 0.5, -2.0);
        s.linear_velocity = q * local;
        assert_relative_eq!(t.force(&local, &s), Vector3::zeros(), epsilon = 1e-12);
    }

    #[test]
    fn target_is_capped_at_max_speed() {
        let t = VelocityTracker::new(2.0, 10.0);
        let s = VehicleState::at_rest(UnitQuaternion::identity());
        assert_relative_eq!(t.force(&Vector3::new(0.0, 0.0, 1e308), &s), Vector3::new(0.0, 0.0, 20.0));
    }
}
