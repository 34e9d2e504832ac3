//! # Annotation Graph Model
//!
//! The three record kinds uploaded for one article:
//!
//! ```text
//! Article ──owns, in document order──▶ AnchorPoint ──owns──▶ Annotation
//!    ▲                                    │  ▲
//!    └──────── "anchor point in" ─────────┘  └── preceding/following ──▶ AnchorPoint
//! ```
//!
//! Every record carries three layers of fields:
//! 1. Known upfront (term, phrases, offsets, publication date, ...)
//! 2. Known once the store's classification items are resolved (`instance_of`)
//! 3. Known only after an upload stage completes (remote ids, references)
//!
//! Layers 2 and 3 are written through checked setters: a remote id or
//! reference, once assigned, can only be re-assigned to the same value.
//!
//! Serialized field names are the short keys of the published ScienceSource
//! data schema. Files written by older tooling mark unassigned ids with `""`
//! and an unassigned page with `0`; both load as unassigned.

use crate::schema::{self, Field, RecordSchema};
use crate::system::Stage;
use crate::{ItemId, PageId, PropertyValue, SyncError};
use serde::{Deserialize, Serialize};

// =============================================================================
// RECORD TRAIT
// =============================================================================

/// A record that can be translated into a remote property payload.
pub trait Record {
    /// Static field table for this record kind.
    const SCHEMA: &'static RecordSchema;

    /// Human-readable description used in error context.
    fn describe(&self) -> String;

    /// Currently populated fields uploaded when the item is created.
    ///
    /// Neighbour references are excluded; they are pushed once the whole
    /// chain is known (see [`Record::link_values`]).
    fn values(&self) -> Vec<(Field, PropertyValue)>;

    /// Currently populated neighbour references.
    fn link_values(&self) -> Vec<(Field, PropertyValue)>;
}

/// Remote identifiers whose file encoding reserves one value for "unassigned".
trait RemoteId: PartialEq + std::fmt::Display {
    fn is_unset_marker(&self) -> bool;
}

impl RemoteId for ItemId {
    fn is_unset_marker(&self) -> bool {
        self.as_str().is_empty()
    }
}

impl RemoteId for PageId {
    fn is_unset_marker(&self) -> bool {
        self.value() == 0
    }
}

/// Set a write-once slot. Re-assigning the same value is a no-op.
///
/// `""` and page `0` are rejected: they would load back as unassigned.
fn assign<T: RemoteId>(
    slot: &mut Option<T>,
    value: T,
    record: impl FnOnce() -> String,
) -> Result<(), SyncError> {
    if value.is_unset_marker() {
        return Err(SyncError::InvalidId {
            record: record(),
            value: value.to_string(),
        });
    }
    match slot {
        Some(existing) if *existing == value => Ok(()),
        Some(existing) => Err(SyncError::IdReassigned {
            record: record(),
            existing: existing.to_string(),
        }),
        None => {
            *slot = Some(value);
            Ok(())
        }
    }
}

fn text(field: Field, value: &str) -> (Field, PropertyValue) {
    (field, PropertyValue::Text(value.to_string()))
}

fn item_ref(field: Field, value: Option<&ItemId>) -> Option<(Field, PropertyValue)> {
    value.map(|id| (field, PropertyValue::Item(id.clone())))
}

// =============================================================================
// ANNOTATION
// =============================================================================

/// The semantic payload of one anchor point: a matched dictionary term.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Annotation {
    /// The term as found in the text.
    pub term: String,
    /// Length of the term as found, in characters.
    pub length: i64,
    /// Wikidata code of the concept the term matched.
    pub wikidata: String,
    /// Dictionary the term was matched from.
    pub dictionary: String,
    /// Time code of the extraction run.
    pub time: String,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    instance_of: Option<ItemId>,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<ItemId>,
}

impl Annotation {
    /// Create an annotation for a matched term; the length is the term's
    /// character count.
    #[must_use]
    pub fn new(
        term: impl Into<String>,
        dictionary: impl Into<String>,
        wikidata: impl Into<String>,
    ) -> Self {
        let term = term.into();
        Self {
            length: term.chars().count() as i64,
            term,
            dictionary: dictionary.into(),
            wikidata: wikidata.into(),
            ..Self::default()
        }
    }

    /// Remote item id, once the annotation has been created.
    #[must_use]
    pub fn id(&self) -> Option<&ItemId> {
        self.id.as_ref()
    }

    #[must_use]
    pub fn instance_of(&self) -> Option<&ItemId> {
        self.instance_of.as_ref()
    }

    /// Record the remote item id. Fails if a different id is already set.
    pub fn assign_id(&mut self, id: ItemId) -> Result<(), SyncError> {
        let term = &self.term;
        assign(&mut self.id, id, || format!("annotation {term:?}"))
    }

    pub fn assign_instance_of(&mut self, item: ItemId) -> Result<(), SyncError> {
        let term = &self.term;
        assign(&mut self.instance_of, item, || format!("annotation {term:?}"))
    }
}

impl Record for Annotation {
    const SCHEMA: &'static RecordSchema = &schema::ANNOTATION;

    fn describe(&self) -> String {
        format!("annotation {:?}", self.term)
    }

    fn values(&self) -> Vec<(Field, PropertyValue)> {
        let mut values = vec![
            text(Field::Term, &self.term),
            (Field::Length, PropertyValue::Quantity(self.length)),
            text(Field::Wikidata, &self.wikidata),
            text(Field::Dictionary, &self.dictionary),
            text(Field::TimeCode, &self.time),
        ];
        values.extend(item_ref(Field::InstanceOf, self.instance_of()));
        values
    }

    fn link_values(&self) -> Vec<(Field, PropertyValue)> {
        Vec::new()
    }
}

// =============================================================================
// ANCHOR POINT
// =============================================================================

/// One located occurrence of a term in the article text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorPoint {
    /// Text immediately before the term.
    pub preceding_phrase: String,
    /// Text immediately after the term.
    pub following_phrase: String,
    /// Characters between the previous anchor and this one.
    pub preceding_distance: i64,
    /// Characters between this anchor and the next one.
    pub following_distance: i64,
    /// Character offset of the term in the article text.
    pub character: i64,
    /// Time code of the extraction run.
    pub time: String,

    /// ScienceSource title of the article this anchor belongs to.
    pub science_source_title: String,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    instance_of: Option<ItemId>,

    #[serde(
        rename = "point",
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    anchor_point_in: Option<ItemId>,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    preceding_anchor: Option<ItemId>,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    following_anchor: Option<ItemId>,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    anchors: Option<ItemId>,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<ItemId>,

    /// The annotation located at this anchor point.
    pub annotation: Annotation,

    /// Set once this anchor's neighbour references were pushed.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    linked: bool,
}

impl AnchorPoint {
    #[must_use]
    pub fn new(annotation: Annotation) -> Self {
        Self {
            annotation,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn id(&self) -> Option<&ItemId> {
        self.id.as_ref()
    }

    #[must_use]
    pub fn instance_of(&self) -> Option<&ItemId> {
        self.instance_of.as_ref()
    }

    /// The article item this anchor point is in.
    #[must_use]
    pub fn anchor_point_in(&self) -> Option<&ItemId> {
        self.anchor_point_in.as_ref()
    }

    /// Previous anchor point, or the article item for the first anchor.
    #[must_use]
    pub fn preceding_anchor(&self) -> Option<&ItemId> {
        self.preceding_anchor.as_ref()
    }

    /// Next anchor point, or the terminus item for the last anchor.
    #[must_use]
    pub fn following_anchor(&self) -> Option<&ItemId> {
        self.following_anchor.as_ref()
    }

    /// The annotation item this anchor point anchors.
    #[must_use]
    pub fn anchors(&self) -> Option<&ItemId> {
        self.anchors.as_ref()
    }

    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.linked
    }

    pub fn assign_id(&mut self, id: ItemId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.id, id, || description)
    }

    pub fn assign_instance_of(&mut self, item: ItemId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.instance_of, item, || description)
    }

    pub fn assign_anchor_point_in(&mut self, article: ItemId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.anchor_point_in, article, || description)
    }

    pub fn assign_anchors(&mut self, annotation: ItemId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.anchors, annotation, || description)
    }

    pub fn assign_preceding_anchor(&mut self, item: ItemId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.preceding_anchor, item, || description)
    }

    pub fn assign_following_anchor(&mut self, item: ItemId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.following_anchor, item, || description)
    }

    pub(crate) fn mark_linked(&mut self) {
        self.linked = true;
    }
}

impl Record for AnchorPoint {
    const SCHEMA: &'static RecordSchema = &schema::ANCHOR_POINT;

    fn describe(&self) -> String {
        format!(
            "anchor point at character {} ({:?})",
            self.character, self.annotation.term
        )
    }

    fn values(&self) -> Vec<(Field, PropertyValue)> {
        let mut values = vec![
            text(Field::PrecedingPhrase, &self.preceding_phrase),
            text(Field::FollowingPhrase, &self.following_phrase),
            (
                Field::PrecedingDistance,
                PropertyValue::Quantity(self.preceding_distance),
            ),
            (
                Field::FollowingDistance,
                PropertyValue::Quantity(self.following_distance),
            ),
            (Field::CharacterNumber, PropertyValue::Quantity(self.character)),
            text(Field::TimeCode, &self.time),
            text(Field::ScienceSourceTitle, &self.science_source_title),
        ];
        values.extend(item_ref(Field::InstanceOf, self.instance_of()));
        values.extend(item_ref(Field::AnchorPointIn, self.anchor_point_in()));
        values.extend(item_ref(Field::Anchors, self.anchors()));
        values
    }

    fn link_values(&self) -> Vec<(Field, PropertyValue)> {
        item_ref(Field::PrecedingAnchor, self.preceding_anchor())
            .into_iter()
            .chain(item_ref(Field::FollowingAnchor, self.following_anchor()))
            .collect()
    }
}

// =============================================================================
// ARTICLE
// =============================================================================

/// Root record: one scientific article and its anchor points.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    /// Wikidata code of the article.
    pub wikidata: String,
    /// Title of the article text.
    pub title: String,
    pub publication_date: String,
    /// Time code of the extraction run.
    pub time: String,
    /// Character number of the article itself. Passed through unchanged.
    pub character: i64,
    pub preceding_phrase: String,
    pub following_phrase: String,

    /// Page title the article text is uploaded under on ScienceSource.
    pub science_source_title: String,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    instance_of: Option<ItemId>,

    #[serde(
        deserialize_with = "unset::page_id",
        skip_serializing_if = "Option::is_none"
    )]
    page_id: Option<PageId>,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    following_anchor: Option<ItemId>,

    #[serde(rename = "annotations")]
    anchor_points: Vec<AnchorPoint>,

    #[serde(
        deserialize_with = "unset::item_id",
        skip_serializing_if = "Option::is_none"
    )]
    id: Option<ItemId>,

    stage: Stage,
}

impl Article {
    /// Create an unsubmitted article with the given text title and
    /// ScienceSource page title.
    #[must_use]
    pub fn new(title: impl Into<String>, science_source_title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            science_source_title: science_source_title.into(),
            ..Self::default()
        }
    }

    /// Append an anchor point. Insertion order is document order.
    pub fn push_anchor_point(&mut self, anchor: AnchorPoint) {
        self.anchor_points.push(anchor);
    }

    /// Anchor points in document order.
    #[must_use]
    pub fn anchor_points(&self) -> &[AnchorPoint] {
        &self.anchor_points
    }

    pub(crate) fn anchor_points_mut(&mut self) -> &mut [AnchorPoint] {
        &mut self.anchor_points
    }

    /// Last confirmed upload stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn set_stage(&mut self, stage: Stage) {
        self.stage = stage;
    }

    /// Remote item id of the article, once created.
    #[must_use]
    pub fn id(&self) -> Option<&ItemId> {
        self.id.as_ref()
    }

    #[must_use]
    pub fn page_id(&self) -> Option<PageId> {
        self.page_id
    }

    #[must_use]
    pub fn instance_of(&self) -> Option<&ItemId> {
        self.instance_of.as_ref()
    }

    /// First anchor point, or the terminus when the article has none.
    #[must_use]
    pub fn following_anchor(&self) -> Option<&ItemId> {
        self.following_anchor.as_ref()
    }

    pub fn assign_id(&mut self, id: ItemId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.id, id, || description)
    }

    pub fn assign_page_id(&mut self, page: PageId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.page_id, page, || description)
    }

    pub fn assign_instance_of(&mut self, item: ItemId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.instance_of, item, || description)
    }

    pub fn assign_following_anchor(&mut self, item: ItemId) -> Result<(), SyncError> {
        let description = self.describe();
        assign(&mut self.following_anchor, item, || description)
    }
}

impl Record for Article {
    const SCHEMA: &'static RecordSchema = &schema::ARTICLE;

    fn describe(&self) -> String {
        format!("article {:?}", self.title)
    }

    fn values(&self) -> Vec<(Field, PropertyValue)> {
        let mut values = vec![
            text(Field::Wikidata, &self.wikidata),
            text(Field::ArticleTitle, &self.title),
            text(Field::PublicationDate, &self.publication_date),
            text(Field::TimeCode, &self.time),
            (Field::CharacterNumber, PropertyValue::Quantity(self.character)),
            text(Field::PrecedingPhrase, &self.preceding_phrase),
            text(Field::FollowingPhrase, &self.following_phrase),
            text(Field::ScienceSourceTitle, &self.science_source_title),
        ];
        values.extend(item_ref(Field::InstanceOf, self.instance_of()));
        values.extend(
            self.page_id
                .map(|page| (Field::PageId, PropertyValue::Text(page.to_string()))),
        );
        values
    }

    fn link_values(&self) -> Vec<(Field, PropertyValue)> {
        item_ref(Field::FollowingAnchor, self.following_anchor())
            .into_iter()
            .collect()
    }
}

// =============================================================================
// LEGACY "UNSET" MARKERS
// =============================================================================

mod unset {
    use crate::{ItemId, PageId};
    use serde::{Deserialize, Deserializer};

    /// `""` and `null` both mean "no id yet".
    pub fn item_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ItemId>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        Ok(raw.filter(|s| !s.is_empty()).map(ItemId))
    }

    /// `0` and `null` both mean "no page yet".
    pub fn page_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<PageId>, D::Error> {
        let raw: Option<u64> = Option::deserialize(d)?;
        Ok(raw.filter(|n| *n != 0).map(PageId))
    }
}

// =============================================================================
// TESTS
// =============================================================================
