pub mod local;
pub mod remote;
pub mod router;
pub mod state;

pub use local::{pump_key_lines, AxisInput, ChannelInput, InputFrame, InputPoller, ScriptedInput};
pub use remote::TwistMsg;
pub use router::{CommandRouter, ControlMode, HandoverPolicy};
pub use state::CommandState;
