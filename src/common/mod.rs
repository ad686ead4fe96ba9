//! Shared primitives: identifiers, configuration constants and the error type.

pub mod config;
pub mod error;
mod ids;

pub use error::{Error, Result};
pub use ids::{FileId, FrameId, PageId};
