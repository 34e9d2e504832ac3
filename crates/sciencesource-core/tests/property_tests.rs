//! # Property-Based Tests
//!
//! Registry, persistence and chain invariants checked with proptest.

mod common;

use common::{MemoryStore, vocabulary};
use proptest::collection::vec;
use proptest::prelude::*;
use proptest::sample::subsequence;
use sciencesource_core::{
    AnchorPoint, Annotation, Article, LabelResolver, Stage, TERMINUS_LABEL, TagRegistry, Uploader,
    article_from_json, article_to_json, load, save, schema, verify_chain,
};
use std::collections::BTreeSet;

// =============================================================================
// STRATEGIES
// =============================================================================

prop_compose! {
    fn anchor_point()(
        term in "\\PC{0,16}",
        dictionary in "[a-z]{0,8}",
        wikidata in "(Q[0-9]{1,6})?",
        character in 0i64..1_000_000,
        preceding in "\\PC{0,24}",
        following in "\\PC{0,24}",
        distances in (0i64..5000, 0i64..5000),
    ) -> AnchorPoint {
        let mut anchor = AnchorPoint::new(Annotation::new(term, dictionary, wikidata));
        anchor.character = character;
        anchor.preceding_phrase = preceding;
        anchor.following_phrase = following;
        anchor.preceding_distance = distances.0;
        anchor.following_distance = distances.1;
        anchor
    }
}

prop_compose! {
    fn article_graph()(
        title in "\\PC{1,40}",
        wikidata in "(Q[0-9]{1,8})?",
        character in any::<i64>(),
        anchors in vec(anchor_point(), 0..12),
    ) -> Article {
        let mut article = Article::new(title.clone(), format!("{title} (ScienceSource)"));
        article.wikidata = wikidata;
        article.character = character;
        for anchor in anchors {
            article.push_anchor_point(anchor);
        }
        article
    }
}

/// Upload `article` through `stages` transitions against a fresh store.
fn staged(mut article: Article, stages: usize) -> Article {
    let store = MemoryStore::new();
    let vocab = vocabulary(&store);
    let uploader = Uploader::new(&store, &vocab);
    for _ in 0..stages {
        uploader
            .advance(&mut article, Some("<html/>"))
            .expect("advance");
    }
    article
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Registry labels are distinct and each resolves to exactly one id.
    #[test]
    fn registry_labels_resolve_once(schemas in subsequence(schema::ALL.to_vec(), 0..=3)) {
        let registry = TagRegistry::from_schemas(&schemas);

        let declared: BTreeSet<&str> = schemas
            .iter()
            .flat_map(|s| s.properties.iter().map(|(_, label)| *label))
            .collect();
        prop_assert_eq!(registry.property_labels().len(), declared.len());

        let store = MemoryStore::new();
        let vocab = LabelResolver::new(&store).resolve(&registry).expect("resolve");
        prop_assert_eq!(vocab.properties().len(), registry.property_labels().len());
        prop_assert_eq!(vocab.items().len(), registry.item_labels().len());

        let ids: BTreeSet<_> = vocab.properties().values().collect();
        prop_assert_eq!(ids.len(), vocab.properties().len());
    }

    /// load(save(article)) == article at every stage.
    #[test]
    fn persistence_roundtrip(article in article_graph(), stages in 0usize..=3) {
        let article = staged(article, stages);
        prop_assert_eq!(article.stage() as usize, stages);

        let bytes = article_to_json(&article).expect("serialize");
        let restored = article_from_json(&bytes).expect("deserialize");
        prop_assert_eq!(&restored, &article);

        let terms: Vec<_> = restored.anchor_points().iter().map(|a| &a.annotation.term).collect();
        let original: Vec<_> = article.anchor_points().iter().map(|a| &a.annotation.term).collect();
        prop_assert_eq!(terms, original);
    }

    /// Linked articles satisfy the bidirectional chain invariant.
    #[test]
    fn linked_chain_is_consistent(article in article_graph()) {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let mut article = article;

        let stage = Uploader::new(&store, &vocab)
            .run(&mut article, Some("<html/>"), |_| Ok(()))
            .expect("run");
        prop_assert_eq!(stage, Stage::Linked);

        let terminus = vocab.item(TERMINUS_LABEL).expect("terminus");
        prop_assert!(verify_chain(&article, terminus).is_ok());

        for pair in article.anchor_points().windows(2) {
            prop_assert_eq!(pair[0].following_anchor(), pair[1].id());
            prop_assert_eq!(pair[1].preceding_anchor(), pair[0].id());
        }
    }
}

// =============================================================================
// FILE ROUNDTRIP
// =============================================================================

#[test]
fn partially_staged_file_roundtrip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("article.json");
    let article = staged(common::article(4), 2);
    assert_eq!(article.stage(), Stage::AnnotationsUploaded);

    save(&article, &path).expect("save");
    assert_eq!(load(&path).expect("load"), article);
}
