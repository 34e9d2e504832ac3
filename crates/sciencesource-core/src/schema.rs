//! # Record Schemas
//!
//! Static field tables for the three record kinds.
//!
//! Each table maps a persisted field to the remote property label it is
//! uploaded under, and lists the extra item labels the record refers to.
//! The tables are the single source the [`TagRegistry`](crate::TagRegistry)
//! derives its labels from; nothing is discovered at runtime.

use crate::ItemKind;

// =============================================================================
// FIELDS
// =============================================================================

/// Every field a record can upload, named after what it holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Term,
    Length,
    Wikidata,
    Dictionary,
    TimeCode,
    InstanceOf,
    PrecedingPhrase,
    FollowingPhrase,
    PrecedingDistance,
    FollowingDistance,
    CharacterNumber,
    ScienceSourceTitle,
    AnchorPointIn,
    PrecedingAnchor,
    FollowingAnchor,
    Anchors,
    ArticleTitle,
    PublicationDate,
    PageId,
}

impl Field {
    /// Short key used for this field in persisted JSON.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Field::Term => "term",
            Field::Length => "length",
            Field::Wikidata => "wikidata",
            Field::Dictionary => "dictionary",
            Field::TimeCode => "time",
            Field::InstanceOf => "instance_of",
            Field::PrecedingPhrase => "preceding_phrase",
            Field::FollowingPhrase => "following_phrase",
            Field::PrecedingDistance => "preceding_distance",
            Field::FollowingDistance => "following_distance",
            Field::CharacterNumber => "character",
            Field::ScienceSourceTitle => "science_source_title",
            Field::AnchorPointIn => "point",
            Field::PrecedingAnchor => "preceding_anchor",
            Field::FollowingAnchor => "following_anchor",
            Field::Anchors => "anchors",
            Field::ArticleTitle => "title",
            Field::PublicationDate => "publication_date",
            Field::PageId => "page_id",
        }
    }
}

// =============================================================================
// RECORD SCHEMA
// =============================================================================

/// Item label of the sentinel that closes the anchor chain.
pub const TERMINUS_LABEL: &str = "terminus";

/// Static description of one record kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordSchema {
    /// Kind discriminator; its label is an item-role label.
    pub kind: ItemKind,
    /// Uploadable fields and their property-role labels.
    pub properties: &'static [(Field, &'static str)],
    /// Additional item-role labels referenced by field values.
    pub items: &'static [&'static str],
}

impl RecordSchema {
    /// Property label declared for a field, if the field belongs to this record.
    #[must_use]
    pub fn property_label(&self, field: Field) -> Option<&'static str> {
        self.properties
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, label)| *label)
    }
}

pub const ANNOTATION: RecordSchema = RecordSchema {
    kind: ItemKind::Annotation,
    properties: &[
        (Field::Term, "term found"),
        (Field::Length, "length of term found"),
        (Field::Wikidata, "Wikidata item code"),
        (Field::Dictionary, "dictionary name"),
        (Field::TimeCode, "time code1"),
        (Field::InstanceOf, "instance of"),
    ],
    items: &[],
};

pub const ANCHOR_POINT: RecordSchema = RecordSchema {
    kind: ItemKind::AnchorPoint,
    properties: &[
        (Field::PrecedingPhrase, "preceding phrase"),
        (Field::FollowingPhrase, "following phrase"),
        (Field::PrecedingDistance, "distance to preceding"),
        (Field::FollowingDistance, "distance to following"),
        (Field::CharacterNumber, "character number"),
        (Field::TimeCode, "time code1"),
        (Field::InstanceOf, "instance of"),
        (Field::ScienceSourceTitle, "ScienceSource article title"),
        (Field::AnchorPointIn, "anchor point in"),
        (Field::PrecedingAnchor, "preceding anchor point"),
        (Field::FollowingAnchor, "following anchor point"),
        (Field::Anchors, "anchors"),
    ],
    items: &[TERMINUS_LABEL],
};

pub const ARTICLE: RecordSchema = RecordSchema {
    kind: ItemKind::Article,
    properties: &[
        (Field::Wikidata, "Wikidata item code"),
        (Field::ArticleTitle, "article text title"),
        (Field::PublicationDate, "publication date"),
        (Field::TimeCode, "time code1"),
        (Field::CharacterNumber, "character number"),
        (Field::PrecedingPhrase, "preceding phrase"),
        (Field::FollowingPhrase, "following phrase"),
        (Field::InstanceOf, "instance of"),
        (Field::ScienceSourceTitle, "ScienceSource article title"),
        (Field::PageId, "page ID"),
        (Field::FollowingAnchor, "following anchor point"),
    ],
    items: &[TERMINUS_LABEL],
};

/// All record schemas uploaded in a session.
pub const ALL: [&RecordSchema; 3] = [&ANNOTATION, &ANCHOR_POINT, &ARTICLE];
