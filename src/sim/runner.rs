use tracing::{debug, info, trace};

use crate::command::{CommandRouter, CommandState};
use crate::dynamics::body::{BodyConfig, RigidBody, SimBody};
use crate::dynamics::state::{SimConfig, State};
use crate::error::ConfigError;
use crate::gnc::{Controller, ControllerParameters, FlightController, Wrench};
use super::event::{EventDetector, SimEvent};

// ---------------------------------------------------------------------------
// Body setup
// ---------------------------------------------------------------------------

/// Build a body with the controller's damping and speed limit applied.
pub fn build_body(
    params: &ControllerParameters,
    body: &BodyConfig,
    initial: State,
) -> Result<SimBody, ConfigError> {
    params.validate()?;
    let mut sim = SimBody::new(initial, body)?;
    sim.set_linear_damping(params.linear_damping)?;
    sim.set_angular_damping(params.angular_damping)?;
    sim.set_max_linear_speed(params.max_speed)?;
    Ok(sim)
}

// ---------------------------------------------------------------------------
// Fixed tick
// ---------------------------------------------------------------------------

/// One physics tick: snapshot the command, run the controller on the current
/// body state, apply its wrench in acceleration mode, integrate.
pub fn tick(
    body: &mut SimBody,
    controller: &mut dyn Controller,
    router: &CommandRouter,
    dt: f64,
) -> (CommandState, Wrench) {
    let cmd = router.snapshot();
    let state = body.kinematics();
    let w = controller.control(&state, &cmd, dt);
    trace!(force = ?w.force, torque = ?w.torque, tilt = state.tilt(), "tick");
    w.apply_to(body);
    body.step(dt);
    (cmd, w)
}

// ---------------------------------------------------------------------------
// Offline runs
// ---------------------------------------------------------------------------

/// Run `config.ticks()` ticks. `script` runs before every tick with the tick
/// index and may write commands or flip the mode, standing in for the input
/// activity. Returns the trajectory (initial state first) and the command
/// flown on each tick.
pub fn simulate_scripted<F>(
    body: &mut SimBody,
    controller: &mut dyn Controller,
    router: &CommandRouter,
    config: &SimConfig,
    mut script: F,
) -> (Vec<State>, Vec<CommandState>)
where
    F: FnMut(usize, &CommandRouter),
{
    let ticks = config.ticks();
    let mut trajectory = Vec::with_capacity(ticks.min(200_000) + 1);
    let mut commands = Vec::with_capacity(ticks.min(200_000));
    trajectory.push(body.state().clone());

    controller.reset();
    debug!(controller = controller.name(), ticks, dt = config.dt, "simulation start");
    for i in 0..ticks {
        script(i, router);
        let (cmd, _) = tick(body, controller, router, config.dt);
        trajectory.push(body.state().clone());
        commands.push(cmd);
    }
    (trajectory, commands)
}

/// Run with whatever the router currently holds.
pub fn simulate_with(
    body: &mut SimBody,
    controller: &mut dyn Controller,
    router: &CommandRouter,
    config: &SimConfig,
) -> (Vec<State>, Vec<CommandState>) {
    simulate_scripted(body, controller, router, config, |_, _| {})
}

/// Fly a single held command with the default flight controller.
pub fn simulate(
    params: &ControllerParameters,
    body_config: &BodyConfig,
    initial: State,
    cmd: CommandState,
    config: &SimConfig,
) -> Result<Vec<State>, ConfigError> {
    config.validate()?;
    let mut body = build_body(params, body_config, initial)?;
    let mut controller = FlightController::new(params);
    let router = CommandRouter::default();
    router.submit(router.mode(), cmd);
    let (trajectory, _) = simulate_with(&mut body, &mut controller, &router, config);
    if let Some(last) = trajectory.last() {
        info!(
            ticks = trajectory.len() - 1,
            tilt_deg = last.tilt().to_degrees(),
            speed = last.vel.norm(),
            "simulation finished"
        );
    }
    Ok(trajectory)
}

/// Replay a trajectory through event detectors.
pub fn detect_events(trajectory: &[State], detectors: &mut [&mut dyn EventDetector]) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for (i, pair) in trajectory.windows(2).enumerate() {
        for det in detectors.iter_mut() {
            if let Some(kind) = det.check(&pair[0], &pair[1]) {
                events.push(SimEvent {
                    tick: i + 1,
                    time: pair[1].time,
                    kind,
                    state: pair[1].clone(),
                });
            }
        }
    }
    events
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ControlMode;
    use crate::sim::event::{EventKind, LevelDetector};
    use nalgebra::{UnitQuaternion, Vector3};

    fn params() -> ControllerParameters {
        ControllerParameters::default()
    }

    #[test]
    fn build_body_applies_limits() {
        let p = params();
        let body = build_body(&p, &BodyConfig::default(), State::default()).unwrap();
        assert_eq!(body.limits().linear_damping, p.linear_damping);
        assert_eq!(body.limits().angular_damping, p.angular_damping);
        assert_eq!(body.limits().max_linear_speed, p.max_speed);
    }

    #[test]
    fn bad_configuration_is_rejected_before_running() {
        let bad_tick = SimConfig { dt: 0.0, max_time: 1.0 };
        assert!(matches!(
            simulate(&params(), &BodyConfig::default(), State::default(), CommandState::hover(), &bad_tick),
            Err(ConfigError::TickRate(_))
        ));
        let bad_params = ControllerParameters { max_speed: 0.0, ..params() };
        assert!(matches!(
            simulate(&bad_params, &BodyConfig::default(), State::default(), CommandState::hover(), &SimConfig::default()),
            Err(ConfigError::MaxSpeed(_))
        ));
    }

    #[test]
    fn trajectory_has_one_state_per_tick() {
        let config = SimConfig { dt: 0.02, max_time: 1.0 };
        let traj = simulate(&params(), &BodyConfig::default(), State::default(), CommandState::hover(), &config).unwrap();
        assert_eq!(traj.len(), 51);
        assert!((traj.last().unwrap().time - 1.0).abs() < 1e-9);
    }

    #[test]
    fn hover_at_rest_stays_put() {
        let config = SimConfig { dt: 0.02, max_time: 2.0 };
        let traj = simulate(&params(), &BodyConfig::default(), State::default(), CommandState::hover(), &config).unwrap();
        let last = traj.last().unwrap();
        assert_eq!(last.pos, Vector3::zeros());
        assert_eq!(last.tilt(), 0.0);
    }

    #[test]
    fn speed_never_exceeds_max() {
        let p = params();
        let cmd = CommandState::new(Vector3::new(0.0, 0.0, 50.0), 0.0);
        let config = SimConfig { dt: 0.02, max_time: 5.0 };
        let traj = simulate(&p, &BodyConfig::default(), State::default(), cmd, &config).unwrap();
        assert!(traj.iter().all(|s| s.vel.norm() <= p.max_speed + 1e-9));
    }

    #[test]
    fn script_changes_command_mid_run() {
        let p = params();
        let mut body = build_body(&p, &BodyConfig::default(), State::default()).unwrap();
        let mut fc = FlightController::new(&p);
        let router = CommandRouter::default();
        let config = SimConfig { dt: 0.02, max_time: 0.2 };
        let go = CommandState::new(Vector3::new(0.0, 0.0, 1.0), 0.0);
        let (_, cmds) = simulate_scripted(&mut body, &mut fc, &router, &config, |i, r| {
            if i == 5 {
                r.submit(ControlMode::Remote, go);
            }
        });
        assert_eq!(cmds[4], CommandState::hover());
        assert!(cmds[5..].iter().all(|c| *c == go));
    }

    #[test]
    fn level_event_from_tilted_start() {
        let initial = State::at_rest(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.5));
        let config = SimConfig { dt: 0.02, max_time: 40.0 };
        let traj = simulate(&params(), &BodyConfig::default(), initial, CommandState::hover(), &config).unwrap();
        let mut level = LevelDetector::new(1.0_f64.to_radians());
        let events = detect_events(&traj, &mut [&mut level]);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::Leveled);
        assert!(events[0].time > 0.0 && events[0].time < 40.0);
    }
}
