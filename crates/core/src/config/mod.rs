//! Configuration loading and schema definitions
//!
//! Sessions, the simulator and the demo binary all read the same TOML file.

mod loader;
mod schema;

pub use loader::Config;
pub use schema::*;
