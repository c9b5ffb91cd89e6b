use crate::dynamics::state::State;

// ---------------------------------------------------------------------------
// Simulation events
// ---------------------------------------------------------------------------

/// Kinds of simulation events.
#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    Leveled,
    SpeedReached,
    TiltExceeded,
    Custom(String),
}

/// A discrete event that occurred during simulation.
#[derive(Debug, Clone)]
pub struct SimEvent {
    pub tick: usize,
    pub time: f64,
    pub kind: EventKind,
    pub state: State,
}

/// Trait for passive event detectors.
/// Implementations inspect consecutive states and report events.
pub trait EventDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind>;
}

/// Fires once when tilt first drops below `threshold` (rad).
pub struct LevelDetector {
    pub threshold: f64,
    fired: bool,
}

impl LevelDetector {
    pub fn new(threshold: f64) -> Self {
        Self { threshold, fired: false }
    }
}

impl EventDetector for LevelDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        if prev.tilt() >= self.threshold && current.tilt() < self.threshold {
            self.fired = true;
            Some(EventKind::Leveled)
        } else {
            None
        }
    }
}

/// Fires once when world speed first comes within `tolerance` (fraction) of
/// `target` m/s.
pub struct SpeedReachedDetector {
    pub target: f64,
    pub tolerance: f64,
    fired: bool,
}

impl SpeedReachedDetector {
    pub fn new(target: f64, tolerance: f64) -> Self {
        Self { target, tolerance, fired: false }
    }

    fn within(&self, speed: f64) -> bool {
        (speed - self.target).abs() <= self.tolerance * self.target.abs()
    }
}

impl EventDetector for SpeedReachedDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind> {
        if self.fired {
            return None;
        }
        if !self.within(prev.vel.norm()) && self.within(current.vel.norm()) {
            self.fired = true;
            Some(EventKind::SpeedReached)
        } else {
            None
        }
    }
}

/// Fires every time tilt crosses above `limit` (rad).
pub struct TiltLimitDetector {
    pub limit: f64,
}

impl EventDetector for TiltLimitDetector {
    fn check(&mut self, prev: &State, current: &State) -> Option<EventKind> {
        if prev.tilt() <= self.limit && current.tilt() > self.limit {
            Some(EventKind::TiltExceeded)
        } else {
            None
        }
    }
}
