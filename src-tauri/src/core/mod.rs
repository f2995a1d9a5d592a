//! QuranCaption Core Engine
//!
//! Core editing engine module.
//! Handles the tagged project document, the timeline and its editing rules,
//! assets, subtitle export and settings.

pub mod assets;
pub mod captions;
pub mod class_registry;
pub mod fs;
pub mod ids;
pub mod project;
pub mod serialization;
pub mod settings;
pub mod timeline;
pub mod values;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_invariants;
