pub mod body;
pub mod state;

pub use body::{BodyConfig, ForceMode, RigidBody, SimBody};
pub use state::{world_up, BodyLimits, Deriv, SimConfig, State, VehicleState};
