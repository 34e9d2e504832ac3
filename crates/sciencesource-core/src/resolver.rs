//! # Label Resolver
//!
//! Turns the labels of a [`TagRegistry`] into remote identifiers.
//!
//! Resolution is fail-fast: the first label the store cannot resolve aborts
//! the pass and no partial map is returned. A graph cannot be uploaded with
//! an incomplete vocabulary, so a partial result would be useless.

use crate::{
    ItemId, PageId, PropertyId, PropertyPayload, Role, StoreError, SyncError, TagRegistry,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// STORE CLIENT
// =============================================================================

/// The remote item/property store.
///
/// Implementations own transport, authentication and timeout policy.
/// Every call is blocking; the core never issues two requests at once.
pub trait StoreClient {
    /// Resolve a property label to its property id.
    fn resolve_property_label(&self, label: &str) -> Result<PropertyId, StoreError>;

    /// Resolve an item label to its item id.
    fn resolve_item_label(&self, label: &str) -> Result<ItemId, StoreError>;

    /// Upload article text under `title`, returning the assigned page id.
    fn create_article(&self, title: &str, content: &str) -> Result<PageId, StoreError>;

    /// Create a new item classified by `item_type` with the given properties.
    fn create_item(
        &self,
        item_type: &ItemId,
        properties: &PropertyPayload,
    ) -> Result<ItemId, StoreError>;

    /// Attach additional property values to an existing item.
    fn add_statements(&self, item: &ItemId, properties: &PropertyPayload)
    -> Result<(), StoreError>;
}

// =============================================================================
// VOCABULARY
// =============================================================================

/// Resolved label maps for one session.
///
/// Built once by [`LabelResolver::resolve`] and read-only afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    properties: BTreeMap<String, PropertyId>,
    items: BTreeMap<String, ItemId>,
}

impl Vocabulary {
    #[must_use]
    pub fn new(properties: BTreeMap<String, PropertyId>, items: BTreeMap<String, ItemId>) -> Self {
        Self { properties, items }
    }

    /// Property id for a label.
    pub fn property(&self, label: &str) -> Result<&PropertyId, SyncError> {
        self.properties
            .get(label)
            .ok_or_else(|| SyncError::UnresolvedLabel {
                role: Role::Property,
                label: label.to_string(),
            })
    }

    /// Item id for a label.
    pub fn item(&self, label: &str) -> Result<&ItemId, SyncError> {
        self.items
            .get(label)
            .ok_or_else(|| SyncError::UnresolvedLabel {
                role: Role::Item,
                label: label.to_string(),
            })
    }

    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, PropertyId> {
        &self.properties
    }

    #[must_use]
    pub fn items(&self) -> &BTreeMap<String, ItemId> {
        &self.items
    }

    /// Check that every label of `registry` is present.
    ///
    /// Used when a vocabulary is loaded from a cache rather than resolved.
    pub fn covers(&self, registry: &TagRegistry) -> Result<(), SyncError> {
        for label in registry.property_labels() {
            self.property(label)?;
        }
        for label in registry.item_labels() {
            self.item(label)?;
        }
        Ok(())
    }
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Resolves labels through a [`StoreClient`], one request per label.
pub struct LabelResolver<'a, C: StoreClient + ?Sized> {
    client: &'a C,
}

impl<'a, C: StoreClient + ?Sized> LabelResolver<'a, C> {
    #[must_use]
    pub fn new(client: &'a C) -> Self {
        Self { client }
    }

    /// Resolve every property label. The first failure aborts the pass.
    pub fn resolve_property_labels(
        &self,
        labels: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, PropertyId>, SyncError> {
        resolve_all(labels, Role::Property, |label| {
            self.client.resolve_property_label(label)
        })
    }

    /// Resolve every item label. The first failure aborts the pass.
    pub fn resolve_item_labels(
        &self,
        labels: &BTreeSet<String>,
    ) -> Result<BTreeMap<String, ItemId>, SyncError> {
        resolve_all(labels, Role::Item, |label| {
            self.client.resolve_item_label(label)
        })
    }

    /// Resolve a whole registry: properties first, then items.
    pub fn resolve(&self, registry: &TagRegistry) -> Result<Vocabulary, SyncError> {
        let properties = self.resolve_property_labels(registry.property_labels())?;
        let items = self.resolve_item_labels(registry.item_labels())?;
        tracing::info!(
            properties = properties.len(),
            items = items.len(),
            "vocabulary resolved"
        );
        Ok(Vocabulary::new(properties, items))
    }
}

fn resolve_all<T>(
    labels: &BTreeSet<String>,
    role: Role,
    mut lookup: impl FnMut(&str) -> Result<T, StoreError>,
) -> Result<BTreeMap<String, T>, SyncError> {
    let mut resolved = BTreeMap::new();
    for label in labels {
        let id = lookup(label).map_err(|source| {
            tracing::warn!(%role, label = %label, error = %source, "label resolution failed");
            SyncError::Resolution {
                role,
                label: label.clone(),
                source,
            }
        })?;
        tracing::debug!(%role, label = %label, "label resolved");
        resolved.insert(label.clone(), id);
    }
    Ok(resolved)
}

// =============================================================================
// TESTS
// =============================================================================
