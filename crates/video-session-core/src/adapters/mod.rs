// Collaborator ports for the messenger and video service
pub mod ports;

pub use ports::{FnPorts, PortResult, VideoSessionPorts};
