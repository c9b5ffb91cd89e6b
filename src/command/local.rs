use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::{Receiver, Sender};
use nalgebra::Vector3;
use tracing::{debug, info};

use super::state::CommandState;

// ---------------------------------------------------------------------------
// Local (keyboard/joystick style) command input
// ---------------------------------------------------------------------------

/// Normalized axes, each in [-1, 1].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AxisInput {
    pub strafe: f64,    // +right
    pub forward: f64,   // +forward
    pub lift: f64,      // +up
    pub yaw: f64,       // +yaw about body up
}

impl AxisInput {
    /// Build axes from digital keys. Ascend wins over descend and
    /// yaw-right over yaw-left when both are held.
    pub fn from_keys(
        strafe: f64,
        forward: f64,
        ascend: bool,
        descend: bool,
        yaw_right: bool,
        yaw_left: bool,
    ) -> Self {
        let lift = if ascend {
            1.0
        } else if descend {
            -1.0
        } else {
            0.0
        };
        let yaw = if yaw_right {
            1.0
        } else if yaw_left {
            -1.0
        } else {
            0.0
        };
        Self { strafe, forward, lift, yaw }
    }

    pub fn to_command(&self, max_speed: f64, max_yaw_rate: f64) -> CommandState {
        let velocity = Vector3::new(
            axis(self.strafe),
            axis(self.lift),
            axis(self.forward),
        ) * max_speed;
        CommandState::new(velocity, axis(self.yaw) * max_yaw_rate)
    }
}

fn axis(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// One frame of local input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputFrame {
    pub axes: AxisInput,
    /// Edge-triggered request to flip the active command source.
    pub toggle_mode: bool,
}

impl InputFrame {
    /// Parse one line of held keys: `w`/`s` forward and back, `a`/`d`
    /// strafe, `r`/`f` ascend and descend, `q`/`e` yaw left and right, `t`
    /// toggles the source. Unknown characters are ignored; an empty line is
    /// neutral.
    pub fn from_key_line(line: &str) -> Self {
        let held = |c: char| line.chars().any(|k| k.eq_ignore_ascii_case(&c));
        let pair = |pos: char, neg: char| match (held(pos), held(neg)) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        Self {
            axes: AxisInput::from_keys(
                pair('d', 'a'),
                pair('w', 's'),
                held('r'),
                held('f'),
                held('e'),
                held('q'),
            ),
            toggle_mode: held('t'),
        }
    }
}

/// Parse key lines from `reader` onto `tx` until EOF, a read error, or the
/// receiving side going away. `stop_at_eof` is raised only on a clean EOF.
pub fn pump_key_lines<R: BufRead>(reader: R, tx: &Sender<InputFrame>, stop_at_eof: Option<&AtomicBool>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, "key input read failed");
                return;
            }
        };
        if tx.send(InputFrame::from_key_line(&line)).is_err() {
            return;
        }
    }
    if let Some(stop) = stop_at_eof {
        info!("key input closed, stopping");
        stop.store(true, Ordering::Relaxed);
    }
}

/// Polled once per frame by the input loop.
pub trait InputPoller: Send {
    fn poll(&mut self) -> InputFrame;
}

impl<F> InputPoller for F
where
    F: FnMut() -> InputFrame + Send,
{
    fn poll(&mut self) -> InputFrame {
        self()
    }
}

/// Replays a fixed list of frames, then holds the last one.
#[derive(Debug, Clone)]
pub struct ScriptedInput {
    frames: Vec<InputFrame>,
    cursor: usize,
}

impl ScriptedInput {
    pub fn new(frames: Vec<InputFrame>) -> Self {
        Self { frames, cursor: 0 }
    }
}

impl InputPoller for ScriptedInput {
    fn poll(&mut self) -> InputFrame {
        let Some(frame) = self.frames.get(self.cursor).copied() else {
            // Edges are not repeated once the script runs out.
            return InputFrame {
                toggle_mode: false,
                ..self.frames.last().copied().unwrap_or_default()
            };
        };
        self.cursor += 1;
        frame
    }
}

/// Holds the newest frame delivered on a channel. Toggle edges seen since
/// the last poll are merged into the next returned frame.
#[derive(Debug)]
pub struct ChannelInput {
    rx: Receiver<InputFrame>,
    held: AxisInput,
}

impl ChannelInput {
    pub fn new(rx: Receiver<InputFrame>) -> Self {
        Self { rx, held: AxisInput::default() }
    }
}

impl InputPoller for ChannelInput {
    fn poll(&mut self) -> InputFrame {
        let mut toggle_mode = false;
        for frame in self.rx.try_iter() {
            self.held = frame.axes;
            toggle_mode ^= frame.toggle_mode;
        }
        InputFrame { axes: self.held, toggle_mode }
    }
}
