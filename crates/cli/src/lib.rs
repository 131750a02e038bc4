//! Terminal output for RoadLink
//!
//! - Status messages and small formatting helpers
//! - Rendering of diffs, nearby drivers and chat messages
//! - Progress bars for simulated runs

pub mod output;
pub mod progress;
pub mod render;
