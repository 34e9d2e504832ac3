//! # sciencesource
//!
//! Network side of the ScienceSource uploader: configuration and the
//! Wikibase implementation of [`sciencesource_core::StoreClient`].

pub mod client;
pub mod config;

pub use client::{ClientError, WikibaseClient};
pub use config::Config;
