use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use nalgebra::{UnitQuaternion, Vector3};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use hover_ctl::command::{pump_key_lines, ChannelInput, CommandRouter, CommandState};
use hover_ctl::config::FlightConfig;
use hover_ctl::dynamics::{BodyConfig, SimConfig, State};
use hover_ctl::error::{ConfigError, LinkError};
use hover_ctl::gnc::{ControllerParameters, FlightController};
use hover_ctl::link::UdpCommandLink;
use hover_ctl::sim::event::{EventDetector, LevelDetector, SpeedReachedDetector, TiltLimitDetector};
use hover_ctl::sim::{self, FlightSummary, InputConfig, Realtime};
use hover_ctl::telemetry::{ImuPublisher, ImuSampler};

const USAGE: &str = "usage: hover-ctl [demo] | serve [config.json] [--seconds N]";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        None | Some("demo") => demo().map_err(LinkError::from),
        Some("serve") => parse_serve(&args[1..]).and_then(|(path, seconds)| serve(path, seconds)),
        Some(other) => {
            eprintln!("unknown command '{other}'\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "hover-ctl failed");
            ExitCode::FAILURE
        }
    }
}

fn parse_serve(args: &[String]) -> Result<(PathBuf, Option<f64>), LinkError> {
    let mut path = PathBuf::from("hover-ctl.json");
    let mut seconds = None;
    let mut it = args.iter();
    while let Some(arg) = it.next() {
        if arg == "--seconds" {
            let value = it.next().and_then(|s| s.parse::<f64>().ok());
            match value {
                Some(s) if s > 0.0 => seconds = Some(s),
                _ => {
                    return Err(ConfigError::InvalidParameter {
                        name: "--seconds",
                        value: value.unwrap_or(f64::NAN),
                    }
                    .into())
                }
            }
        } else {
            path = PathBuf::from(arg);
        }
    }
    Ok((path, seconds))
}

// ---------------------------------------------------------------------------
// Offline demo
// ---------------------------------------------------------------------------

struct Scenario {
    name: &'static str,
    initial: State,
    cmd: CommandState,
    max_time: f64,
}

fn demo() -> Result<(), ConfigError> {
    let params = ControllerParameters::default();
    let body = BodyConfig::default();

    let mut spun = State::at_rest(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 1.0));
    spun.omega = Vector3::new(3.0, 0.0, -2.0);

    let scenarios = [
        Scenario {
            name: "Recover from 60 deg bank",
            initial: State::at_rest(UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 60f64.to_radians())),
            cmd: CommandState::hover(),
            max_time: 40.0,
        },
        Scenario {
            name: "Recover from inverted",
            initial: State::at_rest(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), std::f64::consts::PI)),
            cmd: CommandState::hover(),
            max_time: 60.0,
        },
        Scenario {
            name: "Forward 5 m/s",
            initial: State::default(),
            cmd: CommandState::new(Vector3::new(0.0, 0.0, 5.0), 0.0),
            max_time: 5.0,
        },
        Scenario {
            name: "Yaw 45 deg/s while climbing from a tumble",
            initial: spun,
            cmd: CommandState::new(Vector3::new(0.0, 2.0, 0.0), 45.0),
            max_time: 40.0,
        },
    ];

    println!();
    println!("====================================================================");
    println!("  SELF-LEVELING FLIGHT CONTROLLER");
    println!("====================================================================");
    println!();
    println!("  Controller Parameters");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Move gain:     {:>8.1} 1/s   Max speed:    {:>8.1} m/s",
        params.move_force_gain, params.max_speed
    );
    println!(
        "  Tilt gain:     {:>8.1}       Yaw gain:     {:>8.1}",
        params.tilt_restoration_force, params.angular_speed
    );
    println!(
        "  Lin damping:   {:>8.2} 1/s   Ang damping:  {:>8.2} 1/s",
        params.linear_damping, params.angular_damping
    );
    match params.wobble_suppression {
        Some(k) => println!("  Wobble keep:   {:>8.2}", k),
        None => println!("  Wobble keep:        off"),
    }
    println!();

    for sc in &scenarios {
        let config = SimConfig { dt: 0.02, max_time: sc.max_time };
        let trajectory = sim::simulate(&params, &body, sc.initial.clone(), sc.cmd, &config)?;

        let target_speed = sc.cmd.target_local_velocity.norm();
        let mut level = LevelDetector::new(1f64.to_radians());
        let mut speed = SpeedReachedDetector::new(target_speed, 0.05);
        let mut tilt = TiltLimitDetector { limit: 30f64.to_radians() };
        let mut detectors: Vec<&mut dyn EventDetector> = vec![&mut level, &mut tilt];
        if target_speed > 0.0 {
            detectors.push(&mut speed);
        }
        let events = sim::detect_events(&trajectory, &mut detectors);

        println!("  {}", sc.name);
        println!("  ──────────────────────────────────────────────────────────────────");
        for ev in &events {
            println!(
                "  {:<14} t={:>6.2}s   tilt={:>6.2}deg   speed={:>6.2}m/s",
                format!("{:?}", ev.kind).to_uppercase(),
                ev.time,
                ev.state.tilt().to_degrees(),
                ev.state.vel.norm()
            );
        }
        if let Some(s) = FlightSummary::from_trajectory(&trajectory) {
            println!(
                "  Final tilt:    {:>8.3} deg   Peak tilt:    {:>8.2} deg",
                s.final_tilt_deg, s.peak_tilt_deg
            );
            println!(
                "  Final speed:   {:>8.3} m/s   Peak speed:   {:>8.3} m/s",
                s.final_speed, s.peak_speed
            );
            println!(
                "  Yaw rate:      {:>8.3} deg/s Max accel:    {:>8.2} m/s^2",
                s.final_yaw_rate_deg, s.max_accel
            );
            println!("  Simulation: {} ticks, dt={} s", s.ticks, config.dt);
        }
        println!();
    }
    println!("====================================================================");
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Realtime session
// ---------------------------------------------------------------------------

fn serve(path: PathBuf, seconds: Option<f64>) -> Result<(), LinkError> {
    let config = FlightConfig::load_or_default(&path)?;
    config.validate()?;
    info!(path = %path.display(), mode = ?config.mode, "starting session");

    let router = Arc::new(CommandRouter::new(config.mode, config.handover));
    info!(tick_rate = config.sim.tick_rate(), policy = ?router.policy(), "command router ready");
    let body = sim::build_body(&config.controller, &config.body, State::default())?;

    let imu = match &config.imu {
        Some(imu) => {
            let sampler = ImuSampler::new(imu.sensor.clone())?;
            let (publisher, rx) = ImuPublisher::channel(imu.sensor.queue_depth);
            // Detached: exits when the physics thread drops its publisher.
            ImuPublisher::spawn_udp_sender(rx, imu.target.socket_addr()?)?;
            Some((sampler, publisher))
        }
        None => None,
    };

    let (keys_tx, keys_rx) = crossbeam_channel::unbounded();
    let input = InputConfig {
        max_speed: config.controller.max_speed,
        max_yaw_rate: config.controller.keyboard_yaw_rate,
        period: Duration::from_millis(10),
    };
    let mut rt = Realtime::start(
        body,
        FlightController::new(&config.controller),
        Arc::clone(&router),
        config.sim.dt,
        imu,
    )?
    .with_input(ChannelInput::new(keys_rx), Arc::clone(&router), input)?;

    // Detached: blocks on stdin. Without --seconds, EOF ends the session.
    let stop = rt.shutdown_flag();
    thread::Builder::new().name("stdin-keys".into()).spawn(move || {
        let stop_at_eof = seconds.is_none().then_some(stop.as_ref());
        pump_key_lines(io::stdin().lock(), &keys_tx, stop_at_eof);
    })?;

    let link = UdpCommandLink::bind(config.endpoint.socket_addr()?, Arc::clone(&router))?;
    rt.attach(link.spawn(rt.shutdown_flag())?);

    let started = Instant::now();
    let shutdown = rt.shutdown_flag();
    while !shutdown.load(Ordering::Relaxed) {
        if seconds.is_some_and(|s| started.elapsed().as_secs_f64() >= s) {
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }

    match rt.stop() {
        Some(last) => {
            info!(
                time = last.time,
                tilt_deg = last.tilt().to_degrees(),
                speed = last.vel.norm(),
                "session finished"
            );
            Ok(())
        }
        None => {
            warn!("physics thread did not exit cleanly");
            Ok(())
        }
    }
}
