//! Subcommand implementations

pub mod chaos;
pub mod chart;
pub mod health;
pub mod incidents;
pub mod recommendations;
pub mod status;
