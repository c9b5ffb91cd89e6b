use nalgebra::UnitQuaternion;

use crate::dynamics::state::{cap_norm, BodyLimits, Deriv, State};

// ---------------------------------------------------------------------------
// Semi-implicit Euler step with constant accelerations over the step
// ---------------------------------------------------------------------------

/// Advance the body by `dt`.
///
/// Velocities are updated first, then damped as `v / (1 + dt * c)`, capped,
/// and only then used to move the pose.
pub fn step(state: &State, d: &Deriv, limits: &BodyLimits, dt: f64) -> State {
    let vel = cap_norm(
        &((state.vel + d.dvel * dt) / (1.0 + dt * limits.linear_damping)),
        limits.max_linear_speed,
    );
    let omega = cap_norm(
        &((state.omega + d.domega * dt) / (1.0 + dt * limits.angular_damping)),
        limits.max_angular_speed,
    );

    // World-frame angular velocity rotates from the left.
    let delta = UnitQuaternion::from_scaled_axis(omega * dt);
    let quat = UnitQuaternion::new_normalize((delta * state.quat).into_inner());

    State {
        time: state.time + dt,
        pos: state.pos + vel * dt,
        vel,
        quat,
        omega,
    }
}
