//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the upload protocol:
//! - Remote identifiers (`PropertyId`, `ItemId`, `PageId`)
//! - Label roles and record kinds (`Role`, `ItemKind`)
//! - Property payloads sent to the store (`PropertyValue`, `PropertyPayload`)
//! - Error types (`StoreError`, `SyncError`)
//!
//! ## Determinism Guarantees
//!
//! All identifier types implement `Ord` so that payloads and label maps are
//! `BTreeMap`s with a stable iteration order.

use crate::system::Stage;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// REMOTE IDENTIFIERS
// =============================================================================

/// Identifier of a property slot on the remote store (e.g. `P12`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub String);

impl PropertyId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an item on the remote store (e.g. `Q42`).
///
/// Once assigned to a record, an item id never changes for the session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Page identifier the store assigns to uploaded article text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(pub u64);

impl PageId {
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// ROLES & KINDS
// =============================================================================

/// The role a semantic label plays on the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The label names a property slot.
    Property,
    /// The label names an item.
    Item,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Property => f.write_str("property"),
            Role::Item => f.write_str("item"),
        }
    }
}

/// Discriminator for the three record kinds.
///
/// Each kind is classified on the store by an item whose label is
/// [`ItemKind::label`]; that item becomes the record's "instance of" value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Article,
    AnchorPoint,
    Annotation,
}

impl ItemKind {
    /// Item label used to classify records of this kind.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            ItemKind::Article => "article",
            ItemKind::AnchorPoint => "anchor point",
            ItemKind::Annotation => "annotation",
        }
    }
}

impl fmt::Display for ItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// PROPERTY PAYLOAD
// =============================================================================

/// A single value attached to a property on a remote item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyValue {
    /// Free text.
    Text(String),
    /// Whole-number quantity (lengths, distances, offsets).
    Quantity(i64),
    /// Reference to another remote item.
    Item(ItemId),
}

impl PropertyValue {
    /// Text values with no content are not sent to the store.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, PropertyValue::Text(s) if s.is_empty())
    }
}

/// The property map submitted when creating or editing a remote item.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PropertyPayload(BTreeMap<PropertyId, PropertyValue>);

impl PropertyPayload {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, replacing any previous value for the property.
    pub fn insert(&mut self, property: PropertyId, value: PropertyValue) {
        self.0.insert(property, value);
    }

    #[must_use]
    pub fn get(&self, property: &PropertyId) -> Option<&PropertyValue> {
        self.0.get(property)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PropertyId, &PropertyValue)> {
        self.0.iter()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Opaque failure reported by a [`StoreClient`](crate::StoreClient).
///
/// Network, authentication and API errors are not classified further by
/// the core; the message is carried through unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

impl StoreError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Errors that can occur while resolving, uploading or persisting a graph.
///
/// - No silent failures
/// - Every variant names the label, stage or record involved
/// - A failed stage leaves the article at its last confirmed stage
#[derive(Debug, Error)]
pub enum SyncError {
    /// A label has no entry in the resolved vocabulary.
    ///
    /// Fatal: the local schema and remote vocabulary have diverged, or
    /// resolution was skipped.
    #[error("Unresolved {role} label: {label:?}")]
    UnresolvedLabel { role: Role, label: String },

    /// The store failed to resolve a label. Resolution is side-effect free,
    /// so the whole pass may be retried.
    #[error("Failed to resolve {role} label {label:?}: {source}")]
    Resolution {
        role: Role,
        label: String,
        #[source]
        source: StoreError,
    },

    /// Creating or editing a remote record failed during a stage.
    #[error("Upload failed at stage {stage} for article {article:?} ({record}): {source}")]
    Upload {
        stage: Stage,
        article: String,
        record: String,
        #[source]
        source: StoreError,
    },

    /// A value the next stage depends on is absent.
    #[error("Missing field {field:?} on {record}")]
    MissingField { record: String, field: &'static str },

    /// Article content must be supplied to push the article text.
    #[error("Article content is required to leave stage {0}")]
    MissingContent(Stage),

    /// A remote id was already assigned to this record.
    #[error("Remote id already assigned to {record}: {existing}")]
    IdReassigned { record: String, existing: String },

    /// A store returned an identifier that is reserved for "unassigned".
    #[error("Invalid remote id {value:?} for {record}")]
    InvalidId { record: String, value: String },

    /// Predecessor/successor references disagree.
    #[error("Broken anchor chain: {0}")]
    BrokenChain(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl SyncError {
    /// True for errors caused by configuration rather than the environment.
    ///
    /// These are not worth retrying without changing the schema or store.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, SyncError::UnresolvedLabel { .. })
    }
}

// =============================================================================
// TESTS
// =============================================================================
