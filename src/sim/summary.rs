use serde::Serialize;

use crate::dynamics::state::State;

/// Summary statistics computed from a flight trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightSummary {
    pub ticks: usize,
    pub flight_time: f64,
    pub peak_tilt_deg: f64,
    pub final_tilt_deg: f64,
    pub peak_speed: f64,
    pub final_speed: f64,
    pub final_yaw_rate_deg: f64,
    pub max_accel: f64,
    pub distance: f64,
}

impl FlightSummary {
    /// Compute summary from trajectory data. `None` for an empty trajectory.
    pub fn from_trajectory(trajectory: &[State]) -> Option<Self> {
        let first = trajectory.first()?;
        let last = trajectory.last()?;

        let peak_tilt = trajectory.iter().map(State::tilt).fold(0.0_f64, f64::max);
        let peak_speed = trajectory.iter().map(|s| s.vel.norm()).fold(0.0_f64, f64::max);

        let max_accel = trajectory
            .windows(2)
            .map(|w| {
                let dt = w[1].time - w[0].time;
                if dt > 0.0 {
                    (w[1].vel - w[0].vel).norm() / dt
                } else {
                    0.0
                }
            })
            .fold(0.0_f64, f64::max);

        Some(FlightSummary {
            ticks: trajectory.len() - 1,
            flight_time: last.time - first.time,
            peak_tilt_deg: peak_tilt.to_degrees(),
            final_tilt_deg: last.tilt().to_degrees(),
            peak_speed,
            final_speed: last.vel.norm(),
            final_yaw_rate_deg: last.yaw_rate().to_degrees(),
            max_accel,
            distance: (last.pos - first.pos).norm(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{UnitQuaternion, Vector3};

    fn simple_trajectory() -> Vec<State> {
        vec![
            State::at_rest(UnitQuaternion::from_axis_angle(&Vector3::x_axis(), 0.2)),
            State {
                time: 1.0,
                pos: Vector3::new(0.0, 0.0, 2.0),
                vel: Vector3::new(0.0, 0.0, 4.0),
                quat: UnitQuaternion::identity(),
                omega: Vector3::new(0.0, 0.5, 0.0),
            },
            State {
                time: 2.0,
                pos: Vector3::new(0.0, 0.0, 5.0),
                vel: Vector3::new(0.0, 0.0, 3.0),
                quat: UnitQuaternion::identity(),
                omega: Vector3::new(0.0, 1.0, 0.0),
            },
        ]
    }

    #[test]
    fn summary_picks_extremes() {
        let s = FlightSummary::from_trajectory(&simple_trajectory()).unwrap();
        assert_eq!(s.ticks, 2);
        assert_relative_eq!(s.peak_tilt_deg, 0.2_f64.to_degrees(), epsilon = 1e-9);
        assert_eq!(s.final_tilt_deg, 0.0);
        assert_eq!(s.peak_speed, 4.0);
        assert_eq!(s.final_speed, 3.0);
        assert_relative_eq!(s.final_yaw_rate_deg, 1.0_f64.to_degrees());
        assert_eq!(s.max_accel, 4.0);
        assert_eq!(s.distance, 5.0);
    }

    #[test]
    fn empty_trajectory_has_no_summary() {
        assert!(FlightSummary::from_trajectory(&[]).is_none());
    }

    #[test]
    fn serializes_to_json() {
        let s = FlightSummary::from_trajectory(&simple_trajectory()).unwrap();
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"peak_tilt_deg\""));
        assert!(json.contains("\"final_yaw_rate_deg\""));
    }
}
