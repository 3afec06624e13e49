//! Subcommand implementations.

pub mod config;
pub mod enhance;
pub mod presets;
pub mod quality;
pub mod recommend;
