use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::command::{CommandRouter, ControlMode, InputPoller};
use crate::dynamics::body::SimBody;
use crate::dynamics::state::State;
use crate::error::{ConfigError, LinkError};
use crate::gnc::Controller;
use crate::telemetry::{ImuPublisher, ImuSampler};
use super::runner;

// ---------------------------------------------------------------------------
// Wall-clock execution: a fixed-tick physics thread and a free-running input
// thread sharing one CommandRouter
// ---------------------------------------------------------------------------

/// Local input scaling and poll period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputConfig {
    pub max_speed: f64,
    pub max_yaw_rate: f64,   // deg/s
    pub period: Duration,
}

/// Handle to the running threads.
pub struct Realtime {
    shutdown: Arc<AtomicBool>,
    physics: JoinHandle<State>,
    workers: Vec<JoinHandle<()>>,
}

impl Realtime {
    /// Start the physics loop at a fixed `dt`.
    pub fn start<C>(
        mut body: SimBody,
        mut controller: C,
        router: Arc<CommandRouter>,
        dt: f64,
        mut imu: Option<(ImuSampler, ImuPublisher)>,
    ) -> Result<Self, LinkError>
    where
        C: Controller + Send + 'static,
    {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(ConfigError::TickRate(dt).into());
        }
        let shutdown = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&shutdown);
        let period = Duration::from_secs_f64(dt);

        let physics = thread::Builder::new()
            .name("physics".into())
            .spawn(move || {
                info!(dt, controller = controller.name(), "physics loop started");
                let mut next = Instant::now();
                let mut overruns = 0u64;
                while !stop.load(Ordering::Relaxed) {
                    runner::tick(&mut body, &mut controller, &router, dt);
                    if let Some((sampler, publisher)) = imu.as_mut() {
                        if let Some(sample) = sampler.observe(body.state(), dt) {
                            publisher.publish(sample);
                        }
                    }

                    next += period;
                    let now = Instant::now();
                    if next > now {
                        thread::sleep(next - now);
                    } else if now - next > period {
                        // More than a tick behind: skip ahead instead of bursting.
                        overruns += 1;
                        next = now;
                    }
                }
                let state = body.state().clone();
                info!(time = state.time, overruns, "physics loop stopped");
                state
            })?;

        Ok(Self { shutdown, physics, workers: Vec::new() })
    }

    /// Add the local input thread. Every frame is submitted as the local
    /// command; a toggle edge flips the active source first.
    pub fn with_input<P>(
        mut self,
        mut poller: P,
        router: Arc<CommandRouter>,
        config: InputConfig,
    ) -> Result<Self, LinkError>
    where
        P: InputPoller + 'static,
    {
        let stop = Arc::clone(&self.shutdown);
        let handle = thread::Builder::new()
            .name("input".into())
            .spawn(move || {
                while !stop.load(Ordering::Relaxed) {
                    let frame = poller.poll();
                    if frame.toggle_mode {
                        let mode = router.toggle();
                        info!(?mode, "control mode toggled");
                    }
                    let cmd = frame.axes.to_command(config.max_speed, config.max_yaw_rate);
                    router.submit(ControlMode::Local, cmd);
                    thread::sleep(config.period);
                }
                debug!("input loop stopped");
            })?;
        self.workers.push(handle);
        Ok(self)
    }

    /// Track an externally spawned worker (e.g. the command link) so it is
    /// joined on [`stop`](Self::stop).
    pub fn attach(&mut self, handle: JoinHandle<()>) {
        self.workers.push(handle);
    }

    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal every thread and join them. Returns the final body state, or
    /// `None` if the physics thread panicked.
    pub fn stop(self) -> Option<State> {
        self.shutdown.store(true, Ordering::Relaxed);
        for worker in self.workers {
            if worker.join().is_err() {
                warn!("worker thread panicked");
            }
        }
        self.physics.join().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{AxisInput, HandoverPolicy, InputFrame, ScriptedInput};
    use crate::dynamics::body::BodyConfig;
    use crate::gnc::{ControllerParameters, FlightController};
    use crate::telemetry::ImuConfig;
    use nalgebra::{UnitQuaternion, Vector3};

    fn body(initial: State, p: &ControllerParameters) -> SimBody {
        runner::build_body(p, &BodyConfig::default(), initial).unwrap()
    }

    #[test]
    fn rejects_bad_tick() {
        let p = ControllerParameters::default();
        let router = Arc::new(CommandRouter::default());
        let r = Realtime::start(body(State::default(), &p), FlightController::new(&p), router, 0.0, None);
        assert!(matches!(r, Err(LinkError::Config(ConfigError::TickRate(_)))));
    }

    #[test]
    fn physics_levels_in_wall_clock_time() {
        let p = ControllerParameters::default();
        let initial = State::at_rest(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.4));
        let router = Arc::new(CommandRouter::default());
        let rt = Realtime::start(body(initial, &p), FlightController::new(&p), router, 0.005, None).unwrap();
        thread::sleep(Duration::from_millis(300));
        let last = rt.stop().unwrap();
        assert!(last.time > 0.0);
        assert!(last.tilt() < 0.4);
    }

    #[test]
    fn local_input_takes_over_after_toggle() {
        let p = ControllerParameters::default();
        let router = Arc::new(CommandRouter::new(ControlMode::Remote, HandoverPolicy::HoldLast));
        let forward = AxisInput { forward: 1.0, ..AxisInput::default() };
        let script = ScriptedInput::new(vec![InputFrame { axes: forward, toggle_mode: true }]);
        let input = InputConfig {
            max_speed: p.max_speed,
            max_yaw_rate: p.keyboard_yaw_rate,
            period: Duration::from_millis(5),
        };

        let (publisher, rx) = ImuPublisher::channel(1024);
        let sampler = ImuSampler::new(ImuConfig::default()).unwrap();
        let rt = Realtime::start(
            body(State::default(), &p),
            FlightController::new(&p),
            Arc::clone(&router),
            0.005,
            Some((sampler, publisher)),
        )
        .unwrap()
        .with_input(script, Arc::clone(&router), input)
        .unwrap();

        thread::sleep(Duration::from_millis(300));
        let last = rt.stop().unwrap();
        assert_eq!(router.mode(), ControlMode::Local);
        assert_eq!(router.snapshot().target_local_velocity, Vector3::new(0.0, 0.0, p.max_speed));
        assert!(last.vel.z > 0.0);
        assert!(!rx.is_empty());
    }
}
