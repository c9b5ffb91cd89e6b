pub mod udp;

pub use udp::{Received, UdpCommandLink};
