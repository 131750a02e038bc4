//! Subcommand implementations

pub mod geo;
pub mod run;
