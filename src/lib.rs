pub mod command;
pub mod config;
pub mod dynamics;
pub mod error;
pub mod frames;
mod gnc_mod;
pub mod link;
pub mod sim;
pub mod telemetry;

// The gnc module: expose gnc_mod as `gnc` publicly
pub mod gnc {
    pub use crate::gnc_mod::*;
}
