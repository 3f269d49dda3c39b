//! graphclaw: batch planning and validation over the discovery node model.
//!
//! The library crates do the work; this crate holds the config layer and the
//! subcommand bodies shared by the binary and its tests.

pub mod commands;
pub mod config;

pub use config::GraphclawConfig;
