// Monitoring pipeline module
// Wires sampler readings through detection to dispatch

pub mod monitor;

pub use monitor::{Monitor, MonitorStatus, SessionState};
