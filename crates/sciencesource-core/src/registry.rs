//! # Tag Registry
//!
//! Collects the distinct property-role and item-role labels declared by a
//! set of record schemas. Labels are kept in `BTreeSet`s so resolution
//! walks them in a stable order.

use crate::schema::{self, RecordSchema};
use std::collections::BTreeSet;

/// Distinct labels that must be resolved before any upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagRegistry {
    properties: BTreeSet<String>,
    items: BTreeSet<String>,
}

impl TagRegistry {
    /// Inspect the given schemas. No side effects; an empty input yields
    /// an empty registry.
    #[must_use]
    pub fn from_schemas(schemas: &[&RecordSchema]) -> Self {
        let mut registry = Self::default();
        for schema in schemas {
            registry.properties.extend(
                schema
                    .properties
                    .iter()
                    .map(|(_, label)| (*label).to_string()),
            );
            registry.items.insert(schema.kind.label().to_string());
            registry
                .items
                .extend(schema.items.iter().map(|label| (*label).to_string()));
        }
        registry
    }

    /// Registry for the article, anchor point and annotation schemas.
    #[must_use]
    pub fn standard() -> Self {
        Self::from_schemas(&schema::ALL)
    }

    /// Property-role labels.
    #[must_use]
    pub fn property_labels(&self) -> &BTreeSet<String> {
        &self.properties
    }

    /// Item-role labels.
    #[must_use]
    pub fn item_labels(&self) -> &BTreeSet<String> {
        &self.items
    }

    /// Total number of labels across both roles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len() + self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.items.is_empty()
    }
}
