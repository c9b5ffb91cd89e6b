pub mod event;
pub mod integrator;
pub mod realtime;
pub mod runner;
pub mod summary;

pub use event::{EventDetector, EventKind, SimEvent};
pub use realtime::{InputConfig, Realtime};
pub use runner::{build_body, detect_events, simulate, simulate_scripted, simulate_with, tick};
pub use summary::FlightSummary;
