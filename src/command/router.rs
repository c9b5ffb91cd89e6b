use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::remote::TwistMsg;
use super::state::CommandState;
use crate::error::CommandError;

/// Which producer currently owns the live command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    Remote,
    Local,
}

impl ControlMode {
    pub fn other(self) -> Self {
        match self {
            ControlMode::Remote => ControlMode::Local,
            ControlMode::Local => ControlMode::Remote,
        }
    }
}

/// What the live command becomes at the moment the mode flips.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoverPolicy {
    /// Keep flying the previous source's command until the new source writes.
    #[default]
    HoldLast,
    /// Switch straight to the newest command the new source has produced,
    /// if it has produced one.
    AdoptLatest,
}

#[derive(Debug)]
struct Inner {
    mode: ControlMode,
    live: CommandState,
    last_remote: Option<CommandState>,
    last_local: Option<CommandState>,
}

impl Inner {
    fn last_from(&self, source: ControlMode) -> Option<CommandState> {
        match source {
            ControlMode::Remote => self.last_remote,
            ControlMode::Local => self.last_local,
        }
    }
}

/// The single shared command cell.
///
/// Mode flag, live command and per-source history sit behind one lock, so a
/// reader never sees a velocity from one write paired with a yaw rate from
/// another, and a mode flip is ordered against every write.
#[derive(Debug)]
pub struct CommandRouter {
    inner: Mutex<Inner>,
    policy: HandoverPolicy,
}

impl CommandRouter {
    pub fn new(mode: ControlMode, policy: HandoverPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner {
                mode,
                live: CommandState::hover(),
                last_remote: None,
                last_local: None,
            }),
            policy,
        }
    }

    // A panicked writer cannot leave a half-written Copy value behind.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn policy(&self) -> HandoverPolicy {
        self.policy
    }

    /// The command the next physics tick will fly.
    pub fn snapshot(&self) -> CommandState {
        self.lock().live
    }

    pub fn mode(&self) -> ControlMode {
        self.lock().mode
    }

    /// Snapshot and mode read under the same lock.
    pub fn snapshot_with_mode(&self) -> (CommandState, ControlMode) {
        let inner = self.lock();
        (inner.live, inner.mode)
    }

    /// Offer a command from `source`. It becomes live only when `source` is
    /// the active producer; it is always remembered as that source's latest.
    pub fn submit(&self, source: ControlMode, cmd: CommandState) -> bool {
        let mut inner = self.lock();
        match source {
            ControlMode::Remote => inner.last_remote = Some(cmd),
            ControlMode::Local => inner.last_local = Some(cmd),
        }
        if inner.mode == source {
            inner.live = cmd;
            true
        } else {
            false
        }
    }

    /// Decode a remote datagram and submit it. A malformed update leaves
    /// every stored command untouched.
    pub fn submit_remote(&self, bytes: &[u8]) -> Result<bool, CommandError> {
        let cmd = TwistMsg::decode(bytes)
            .and_then(|msg| msg.to_command())
            .map_err(|e| {
                debug!(error = %e, len = bytes.len(), "dropping remote command");
                e
            })?;
        Ok(self.submit(ControlMode::Remote, cmd))
    }

    pub fn set_mode(&self, mode: ControlMode) -> ControlMode {
        let mut inner = self.lock();
        let previous = inner.mode;
        if previous != mode {
            self.hand_over(&mut inner, mode);
        }
        previous
    }

    /// Flip the active source; returns the new mode.
    pub fn toggle(&self) -> ControlMode {
        let mut inner = self.lock();
        let mode = inner.mode.other();
        self.hand_over(&mut inner, mode);
        mode
    }

    fn hand_over(&self, inner: &mut Inner, mode: ControlMode) {
        let previous = inner.mode;
        inner.mode = mode;
        if self.policy == HandoverPolicy::AdoptLatest {
            if let Some(latest) = inner.last_from(mode) {
                inner.live = latest;
            }
        }
        info!(from = ?previous, to = ?mode, policy = ?self.policy, "control mode changed");
    }
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new(ControlMode::default(), HandoverPolicy::default())
    }
}
