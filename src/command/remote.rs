use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use super::state::CommandState;
use crate::error::CommandError;
use crate::frames;

// ---------------------------------------------------------------------------
// Remote velocity commands (Twist-shaped JSON)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector3Msg {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Only `z` is used; roll/pitch rates may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngularMsg {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TwistMsg {
    pub linear: Vector3Msg,
    pub angular: AngularMsg,
}

impl TwistMsg {
    /// Decode a datagram. Missing `linear.{x,y,z}` or `angular.z` is malformed.
    pub fn decode(bytes: &[u8]) -> Result<Self, CommandError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Map into the vehicle-local command. Values that overflow in the
    /// conversion are rejected like any other malformed update.
    pub fn to_command(&self) -> Result<CommandState, CommandError> {
        let linear = Vector3::new(self.linear.x, self.linear.y, self.linear.z);
        let velocity = frames::remote_to_local(&linear);
        let yaw_rate = frames::yaw_rate_remote_to_local(self.angular.z);
        if !velocity.iter().all(|c| c.is_finite()) {
            return Err(CommandError::NonFinite("linear"));
        }
        if !yaw_rate.is_finite() {
            return Err(CommandError::NonFinite("angular.z"));
        }
        Ok(CommandState::new(velocity, yaw_rate))
    }
}
