use nalgebra::Vector3;

/// The pair the flight controller tracks. Always read and written whole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandState {
    pub target_local_velocity: Vector3<f64>,    // m/s, vehicle-local
    pub target_yaw_rate: f64,                   // deg/s about body up
}

impl CommandState {
    pub fn new(target_local_velocity: Vector3<f64>, target_yaw_rate: f64) -> Self {
        Self { target_local_velocity, target_yaw_rate }
    }

    pub fn hover() -> Self {
        Self::new(Vector3::zeros(), 0.0)
    }

    /// Exact bit pattern of all four components.
    pub fn to_bits(&self) -> [u64; 4] {
        let v = &self.target_local_velocity;
        [v.x.to_bits(), v.y.to_bits(), v.z.to_bits(), self.target_yaw_rate.to_bits()]
    }
}

impl Default for CommandState {
    fn default() -> Self {
        Self::hover()
    }
}
