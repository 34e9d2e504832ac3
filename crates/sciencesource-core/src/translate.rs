//! # Field Translation
//!
//! Maps a record's local (field, value) pairs to the property payload the
//! store understands, through the record's schema table and the session
//! vocabulary.

use crate::model::Record;
use crate::schema::{Field, RecordSchema};
use crate::{PropertyPayload, PropertyValue, Role, SyncError, Vocabulary};

/// Translates record fields using a resolved [`Vocabulary`].
#[derive(Debug, Clone, Copy)]
pub struct Translator<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> Translator<'a> {
    #[must_use]
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// Build a payload from explicit values.
    ///
    /// Empty text values are dropped. A field the schema does not declare,
    /// or a declared label the vocabulary does not hold, is an
    /// [`SyncError::UnresolvedLabel`].
    pub fn payload(
        &self,
        schema: &RecordSchema,
        values: Vec<(Field, PropertyValue)>,
    ) -> Result<PropertyPayload, SyncError> {
        let mut payload = PropertyPayload::new();
        for (field, value) in values {
            let label = schema
                .property_label(field)
                .ok_or_else(|| SyncError::UnresolvedLabel {
                    role: Role::Property,
                    label: format!("{}.{}", schema.kind.label(), field.key()),
                })?;
            let property = self.vocabulary.property(label)?;
            if value.is_empty() {
                continue;
            }
            payload.insert(property.clone(), value);
        }
        Ok(payload)
    }

    /// Payload used to create a record's item.
    pub fn creation_payload<R: Record>(&self, record: &R) -> Result<PropertyPayload, SyncError> {
        self.payload(R::SCHEMA, record.values())
    }

    /// Payload holding a record's neighbour references.
    pub fn link_payload<R: Record>(&self, record: &R) -> Result<PropertyPayload, SyncError> {
        self.payload(R::SCHEMA, record.link_values())
    }
}
