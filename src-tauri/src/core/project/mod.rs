//! Project Module
//!
//! The project aggregate (detail, content, editor state), its translation and
//! style documents, and the service persisting whole projects through a
//! storage collaborator.

mod content;
mod detail;
mod editor_state;
mod models;
mod service;
mod storage;
mod translation;
mod video_style;

pub use content::*;
pub use detail::*;
pub use editor_state::*;
pub use models::*;
pub use service::*;
pub use storage::*;
pub use translation::*;
pub use video_style::*;
