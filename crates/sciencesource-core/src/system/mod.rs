//! # System Module
//!
//! Upload stage tracking for a single article.
//!
//! The stage marker is persisted with the article so that an interrupted
//! upload resumes from the last confirmed stage instead of re-creating
//! remote items.

mod stage;

pub use stage::*;
