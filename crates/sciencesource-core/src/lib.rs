//! # sciencesource-core
//!
//! The annotation graph and upload protocol for ScienceSource - THE LOGIC.
//!
//! An [`Article`] owns its [`AnchorPoint`]s in document order; each anchor
//! point owns one [`Annotation`]. Uploading the graph to a Wikibase store
//! means:
//!
//! 1. Collecting every label the record schemas use ([`TagRegistry`])
//! 2. Resolving those labels to remote ids ([`LabelResolver`] → [`Vocabulary`])
//! 3. Driving the article through its [`Stage`]s ([`Uploader`]), translating
//!    fields into property payloads ([`Translator`]) along the way
//! 4. Persisting the graph after each stage ([`formats`]) so a failed run
//!    resumes where it stopped
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies: the store is a [`StoreClient`]
//! - No global state: the vocabulary is passed explicitly
//! - One request at a time; later stages need ids from earlier ones

// =============================================================================
// MODULES
// =============================================================================

pub mod chain;
pub mod formats;
pub mod model;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod system;
pub mod translate;
pub mod types;
pub mod upload;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    ItemId, ItemKind, PageId, PropertyId, PropertyPayload, PropertyValue, Role, StoreError,
    SyncError,
};

// =============================================================================
// RE-EXPORTS: Graph and Protocol
// =============================================================================

pub use chain::{link_chain, verify_chain};
pub use model::{AnchorPoint, Annotation, Article, Record};
pub use registry::TagRegistry;
pub use resolver::{LabelResolver, StoreClient, Vocabulary};
pub use schema::{Field, RecordSchema, TERMINUS_LABEL};
pub use translate::Translator;
pub use upload::{Uploader, sync_article};

// =============================================================================
// RE-EXPORTS: Formats and System
// =============================================================================

pub use formats::{article_from_json, article_to_json, load, save};
pub use system::{Stage, UploadProgress};
