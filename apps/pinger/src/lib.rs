//! Uppe pinger - reachability monitor for a fixed list of addresses.
//!
//! Each probe cycle pings every configured address, logs reachability
//! transitions to a rotating file and a remote log topic, and a status
//! snapshot of all addresses is published on a fixed cadence.

pub mod config;
pub mod logging;
pub mod monitor;
pub mod monitoring;
pub mod publish;
pub mod settings;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use monitor::Monitor;
