pub mod controller;
pub mod flight;
pub mod leveling;
pub mod params;
pub mod velocity;

pub use controller::{Controller, Wrench};
pub use flight::FlightController;
pub use leveling::SelfLevelingStabilizer;
pub use params::{ControllerParameters, ControllerParametersBuilder};
pub use velocity::VelocityTracker;
