//! SentinelOps agent: runs the telemetry sync core and re-serves the
//! reconciled dashboard view over HTTP.

pub mod api;
pub mod config;
