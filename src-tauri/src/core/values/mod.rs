//! Value Objects
//!
//! Small immutable-ish values shared by clips, tracks and project metadata.

mod duration;
mod status;
mod translation;
mod verse;
mod verse_range;

pub use duration::*;
pub use status::*;
pub use translation::*;
pub use verse::*;
pub use verse_range::*;
