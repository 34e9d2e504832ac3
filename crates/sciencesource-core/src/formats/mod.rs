//! # Formats Module
//!
//! Durable representation of an article graph.
//!
//! One JSON object per article, nested arrays for anchor points and nested
//! objects for their annotations, using the short keys of the published
//! ScienceSource data schema.

mod persistence;

pub use persistence::*;
