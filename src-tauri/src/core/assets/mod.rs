//! Asset Management Module
//!
//! Imported media files and the probe that reads their durations.

mod models;
mod probe;

pub use models::*;
pub use probe::*;
