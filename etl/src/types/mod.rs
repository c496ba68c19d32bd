//! Common types used throughout the sync engine.
//!
//! Includes the watermark state owned by every stream, staged records as read
//! back from the staging area and the tagged document values produced by
//! upstream providers.

mod document;
mod staged;
mod watermark;

pub use document::*;
pub use staged::*;
pub use watermark::*;
