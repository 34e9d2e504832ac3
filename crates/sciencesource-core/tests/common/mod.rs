//! Shared fixtures: an in-memory store that records every request.

#![allow(dead_code)]

use sciencesource_core::{
    AnchorPoint, Annotation, Article, ItemId, LabelResolver, PageId, PropertyId, PropertyPayload,
    StoreClient, StoreError, TagRegistry, Vocabulary,
};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// One request received by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ResolveProperty(String),
    ResolveItem(String),
    CreateArticle(String),
    CreateItem(ItemId),
    AddStatements(ItemId),
}

/// In-memory Wikibase stand-in.
///
/// Ids are handed out from one counter. Failures can be injected for a
/// label or for item writes after a number of successful ones.
#[derive(Default)]
pub struct MemoryStore {
    counter: Cell<u64>,
    calls: RefCell<Vec<Call>>,
    items: RefCell<BTreeMap<ItemId, (ItemId, PropertyPayload)>>,
    statements: RefCell<BTreeMap<ItemId, Vec<PropertyPayload>>>,
    fail_label: Option<String>,
    writes_before_failure: Cell<Option<usize>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that refuses to resolve `label`.
    pub fn failing_label(label: &str) -> Self {
        Self {
            fail_label: Some(label.to_string()),
            ..Self::default()
        }
    }

    /// Allow `n` more item writes (create or edit), then fail the rest.
    pub fn fail_writes_after(&self, n: usize) {
        self.writes_before_failure.set(Some(n));
    }

    pub fn heal(&self) {
        self.writes_before_failure.set(None);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, matches: impl Fn(&Call) -> bool) -> usize {
        self.calls.borrow().iter().filter(|c| matches(c)).count()
    }

    pub fn created_items(&self) -> usize {
        self.items.borrow().len()
    }

    /// The type and creation payload of an item.
    pub fn item(&self, id: &ItemId) -> Option<(ItemId, PropertyPayload)> {
        self.items.borrow().get(id).cloned()
    }

    /// Statements added to an existing item, in order.
    pub fn statements(&self, id: &ItemId) -> Vec<PropertyPayload> {
        self.statements.borrow().get(id).cloned().unwrap_or_default()
    }

    fn next(&self) -> u64 {
        let n = self.counter.get() + 1;
        self.counter.set(n);
        n
    }

    fn record(&self, call: Call) {
        self.calls.borrow_mut().push(call);
    }

    fn check_lookup(&self, label: &str) -> Result<(), StoreError> {
        if self.fail_label.as_deref() == Some(label) {
            return Err(StoreError::new(format!("no entity labelled {label:?}")));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<(), StoreError> {
        match self.writes_before_failure.get() {
            Some(0) => Err(StoreError::new("503 Service Unavailable")),
            Some(n) => {
                self.writes_before_failure.set(Some(n - 1));
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl StoreClient for MemoryStore {
    fn resolve_property_label(&self, label: &str) -> Result<PropertyId, StoreError> {
        self.record(Call::ResolveProperty(label.to_string()));
        self.check_lookup(label)?;
        Ok(PropertyId(format!("P{}", self.next())))
    }

    fn resolve_item_label(&self, label: &str) -> Result<ItemId, StoreError> {
        self.record(Call::ResolveItem(label.to_string()));
        self.check_lookup(label)?;
        Ok(ItemId(format!("Q{}", self.next())))
    }

    fn create_article(&self, title: &str, _content: &str) -> Result<PageId, StoreError> {
        self.record(Call::CreateArticle(title.to_string()));
        self.check_write()?;
        Ok(PageId(self.next()))
    }

    fn create_item(
        &self,
        item_type: &ItemId,
        properties: &PropertyPayload,
    ) -> Result<ItemId, StoreError> {
        self.record(Call::CreateItem(item_type.clone()));
        self.check_write()?;
        let id = ItemId(format!("Q{}", self.next()));
        self.items
            .borrow_mut()
            .insert(id.clone(), (item_type.clone(), properties.clone()));
        Ok(id)
    }

    fn add_statements(
        &self,
        item: &ItemId,
        properties: &PropertyPayload,
    ) -> Result<(), StoreError> {
        self.record(Call::AddStatements(item.clone()));
        self.check_write()?;
        if !self.items.borrow().contains_key(item) {
            return Err(StoreError::new(format!("no such item {item}")));
        }
        self.statements
            .borrow_mut()
            .entry(item.clone())
            .or_default()
            .push(properties.clone());
        Ok(())
    }
}

/// Resolve the standard vocabulary against `store`.
pub fn vocabulary(store: &MemoryStore) -> Vocabulary {
    LabelResolver::new(store)
        .resolve(&TagRegistry::standard())
        .expect("resolve vocabulary")
}

/// Article with `anchors` anchor points in document order.
pub fn article(anchors: usize) -> Article {
    let mut article = Article::new("Zika virus and microcephaly", "Zika virus (PMC4820017)");
    article.wikidata = "Q23701435".into();
    article.publication_date = "2016-04-01".into();
    article.time = "2018-06-12T10:00:00Z".into();
    for n in 0..anchors {
        let mut anchor = AnchorPoint::new(Annotation::new(
            format!("term{n}"),
            "disease",
            format!("Q{}", 5000 + n),
        ));
        anchor.character = 100 * n as i64;
        anchor.preceding_phrase = format!("before {n}");
        anchor.following_phrase = format!("after {n}");
        anchor.preceding_distance = if n == 0 { 0 } else { 100 };
        anchor.following_distance = 100;
        article.push_anchor_point(anchor);
    }
    article
}
