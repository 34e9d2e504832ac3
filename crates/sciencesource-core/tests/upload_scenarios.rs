//! # Upload Scenario Tests
//!
//! End-to-end runs of the stage machine against the in-memory store.

mod common;

use common::{Call, MemoryStore, article, vocabulary};
use sciencesource_core::{
    Article, PropertyValue, Stage, SyncError, TERMINUS_LABEL, Uploader, Vocabulary, load, save,
    sync_article, verify_chain,
};
use std::path::Path;

// =============================================================================
// EMPTY ARTICLE
// =============================================================================

mod empty_article {
    use super::*;

    #[test]
    fn reaches_linked_without_anchor_linkage() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let uploader = Uploader::new(&store, &vocab);
        let mut article = article(0);

        let stage = uploader
            .advance(&mut article, Some("<html/>"))
            .expect("article stage");
        assert_eq!(stage, Stage::ArticleUploaded);
        assert!(article.page_id().is_some());
        assert!(article.id().is_some());

        let stage = uploader.run(&mut article, None, |_| Ok(())).expect("run");
        assert_eq!(stage, Stage::Linked);

        let terminus = vocab.item(TERMINUS_LABEL).expect("terminus");
        assert_eq!(article.following_anchor(), Some(terminus));
        assert_eq!(store.count(|c| matches!(c, Call::CreateArticle(_))), 1);
        assert_eq!(store.count(|c| matches!(c, Call::CreateItem(_))), 1);
        // Only the article's own terminus reference is pushed.
        assert_eq!(store.count(|c| matches!(c, Call::AddStatements(_))), 1);
    }
}

// =============================================================================
// THREE ANCHOR POINTS
// =============================================================================

mod three_anchors {
    use super::*;

    #[test]
    fn chain_is_computed_after_annotations_uploaded() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let uploader = Uploader::new(&store, &vocab);
        let mut article = article(3);

        uploader
            .advance(&mut article, Some("<html/>"))
            .expect("article stage");
        let stage = uploader.advance(&mut article, None).expect("annotations");
        assert_eq!(stage, Stage::AnnotationsUploaded);

        let anchors = article.anchor_points();
        assert_eq!(anchors[0].preceding_anchor(), article.id());
        assert_eq!(anchors[1].preceding_anchor(), anchors[0].id());
        assert_eq!(anchors[1].following_anchor(), anchors[2].id());
        assert_eq!(
            anchors[2].following_anchor(),
            Some(vocab.item(TERMINUS_LABEL).expect("terminus"))
        );
        assert_eq!(article.following_anchor(), anchors[0].id());

        // Nothing pushed yet.
        assert_eq!(store.count(|c| matches!(c, Call::AddStatements(_))), 0);
    }

    #[test]
    fn linked_article_mirrors_remote_chain() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let mut article = article(3);

        let stage = Uploader::new(&store, &vocab)
            .run(&mut article, Some("<html/>"), |_| Ok(()))
            .expect("run");
        assert_eq!(stage, Stage::Linked);

        let terminus = vocab.item(TERMINUS_LABEL).expect("terminus");
        verify_chain(&article, terminus).expect("chain");

        let preceding = vocab.property("preceding anchor point").expect("label");
        let following = vocab.property("following anchor point").expect("label");
        for anchor in article.anchor_points() {
            let id = anchor.id().expect("anchor id");
            let pushed = store.statements(id);
            assert_eq!(pushed.len(), 1);
            assert_eq!(
                pushed[0].get(preceding),
                anchor.preceding_anchor().cloned().map(PropertyValue::Item).as_ref()
            );
            assert_eq!(
                pushed[0].get(following),
                anchor.following_anchor().cloned().map(PropertyValue::Item).as_ref()
            );
            assert!(anchor.is_linked());
        }
    }

    #[test]
    fn items_carry_classification_and_references() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let mut article = article(3);
        Uploader::new(&store, &vocab)
            .run(&mut article, Some("<html/>"), |_| Ok(()))
            .expect("run");

        let instance_of = vocab.property("instance of").expect("label");
        let anchor_point_in = vocab.property("anchor point in").expect("label");
        let anchors = vocab.property("anchors").expect("label");
        let term_found = vocab.property("term found").expect("label");

        let anchor = &article.anchor_points()[1];
        let (kind, payload) = store.item(anchor.id().expect("id")).expect("created");
        assert_eq!(&kind, vocab.item("anchor point").expect("kind"));
        assert_eq!(payload.get(instance_of), Some(&PropertyValue::Item(kind.clone())));
        assert_eq!(
            payload.get(anchor_point_in),
            article.id().cloned().map(PropertyValue::Item).as_ref()
        );
        assert_eq!(
            payload.get(anchors),
            anchor.annotation.id().cloned().map(PropertyValue::Item).as_ref()
        );

        let (kind, payload) = store
            .item(anchor.annotation.id().expect("id"))
            .expect("created");
        assert_eq!(&kind, vocab.item("annotation").expect("kind"));
        assert_eq!(
            payload.get(term_found),
            Some(&PropertyValue::Text("term1".into()))
        );
        assert_eq!(anchor.science_source_title, article.science_source_title);
    }
}

// =============================================================================
// RESOLUTION FAILURE
// =============================================================================

mod resolution_failure {
    use super::*;

    #[test]
    fn failing_label_stops_before_any_upload() {
        let store = MemoryStore::failing_label("dictionary name");
        let mut article = article(2);
        let snapshot = article.clone();

        let err = sync_article(&store, &mut article, Some("<html/>"), |_| Ok(()))
            .expect_err("resolution fails");
        match err {
            SyncError::Resolution { label, .. } => assert_eq!(label, "dictionary name"),
            other => unreachable!("unexpected error: {other}"),
        }

        let calls = store.calls();
        assert_eq!(
            calls.last(),
            Some(&Call::ResolveProperty("dictionary name".into()))
        );
        assert!(!calls.iter().any(|c| matches!(
            c,
            Call::CreateArticle(_) | Call::CreateItem(_) | Call::AddStatements(_)
        )));
        assert_eq!(article, snapshot);
    }

    #[test]
    fn incomplete_vocabulary_is_configuration_error() {
        let store = MemoryStore::new();
        let vocab = sciencesource_core::Vocabulary::default();
        let mut article = article(1);

        let err = Uploader::new(&store, &vocab)
            .advance(&mut article, Some("<html/>"))
            .expect_err("unresolved");
        assert!(err.is_configuration());
        assert_eq!(article.stage(), Stage::Unsubmitted);
        assert!(store.calls().is_empty());
    }
}

// =============================================================================
// RESUMABILITY
// =============================================================================

mod resume {
    use super::*;

    #[test]
    fn failed_stage_keeps_last_confirmed_stage() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let uploader = Uploader::new(&store, &vocab);
        let mut article = article(3);
        uploader
            .advance(&mut article, Some("<html/>"))
            .expect("article stage");

        // First annotation and its anchor point succeed, the next write fails.
        store.fail_writes_after(2);
        let err = uploader.advance(&mut article, None).expect_err("write fails");
        match &err {
            SyncError::Upload { stage, record, .. } => {
                assert_eq!(*stage, Stage::ArticleUploaded);
                assert_eq!(record, "annotation #1");
            }
            other => unreachable!("unexpected error: {other}"),
        }
        assert_eq!(article.stage(), Stage::ArticleUploaded);
        assert!(article.anchor_points()[0].id().is_some());
        assert!(article.anchor_points()[1].annotation.id().is_none());

        store.heal();
        uploader.advance(&mut article, None).expect("retry");
        assert_eq!(article.stage(), Stage::AnnotationsUploaded);

        // 1 article + 3 annotations + 3 anchors; the failed attempt created nothing.
        assert_eq!(store.created_items(), 7);
    }

    /// Run to `Linked` with a file checkpoint, failing after `writes` writes.
    /// Returns the error and the graph reloaded from the file.
    fn fail_then_reload(
        store: &MemoryStore,
        vocab: &Vocabulary,
        path: &Path,
        writes: usize,
    ) -> (SyncError, Article) {
        let mut article = article(3);
        store.fail_writes_after(writes);
        let err = Uploader::new(store, vocab)
            .run(&mut article, Some("<html/>"), |a| save(a, path))
            .expect_err("stage fails");
        store.heal();
        (err, load(path).expect("load"))
    }

    #[test]
    fn saved_page_id_is_not_uploaded_again() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("article.json");
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);

        // Article text succeeds, the article item fails.
        let (err, mut restored) = fail_then_reload(&store, &vocab, &path, 1);
        assert!(matches!(
            err,
            SyncError::Upload {
                stage: Stage::Unsubmitted,
                ..
            }
        ));
        assert_eq!(restored.stage(), Stage::Unsubmitted);
        assert!(restored.page_id().is_some());
        assert!(restored.id().is_none());

        // No content needed: the page is already recorded.
        let stage = Uploader::new(&store, &vocab)
            .run(&mut restored, None, |a| save(a, &path))
            .expect("resume");
        assert_eq!(stage, Stage::Linked);
        assert_eq!(store.count(|c| matches!(c, Call::CreateArticle(_))), 1);
        assert_eq!(store.created_items(), 7);
    }

    #[test]
    fn saved_annotation_ids_are_not_created_again() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("article.json");
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);

        // Text, article item, annotation #0, anchor #0, annotation #1; anchor #1 fails.
        let (err, mut restored) = fail_then_reload(&store, &vocab, &path, 5);
        match &err {
            SyncError::Upload { stage, record, .. } => {
                assert_eq!(*stage, Stage::ArticleUploaded);
                assert_eq!(record, "anchor point #1");
            }
            other => unreachable!("unexpected error: {other}"),
        }
        assert_eq!(restored.stage(), Stage::ArticleUploaded);
        assert!(restored.anchor_points()[0].id().is_some());
        assert!(restored.anchor_points()[1].annotation.id().is_some());
        assert!(restored.anchor_points()[1].id().is_none());

        Uploader::new(&store, &vocab)
            .run(&mut restored, None, |a| save(a, &path))
            .expect("resume");
        // 1 article + 3 annotations + 3 anchors.
        assert_eq!(store.created_items(), 7);
    }

    #[test]
    fn saved_link_flags_are_not_pushed_again() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("article.json");
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);

        // 8 creation writes, then two links; the third link fails.
        let (err, mut restored) = fail_then_reload(&store, &vocab, &path, 10);
        assert!(matches!(
            err,
            SyncError::Upload {
                stage: Stage::AnnotationsUploaded,
                ..
            }
        ));
        assert_eq!(restored.stage(), Stage::AnnotationsUploaded);
        let linked = restored.anchor_points().iter().filter(|a| a.is_linked()).count();
        assert_eq!(linked, 2);

        let stage = Uploader::new(&store, &vocab)
            .run(&mut restored, None, |a| save(a, &path))
            .expect("resume");
        assert_eq!(stage, Stage::Linked);
        assert_eq!(store.created_items(), 7);
        for anchor in restored.anchor_points() {
            assert_eq!(store.statements(anchor.id().expect("id")).len(), 1);
        }
        assert_eq!(store.statements(restored.id().expect("id")).len(), 1);

        let terminus = vocab.item(TERMINUS_LABEL).expect("terminus");
        verify_chain(&load(&path).expect("reload"), terminus).expect("chain");
    }

    #[test]
    fn step_checkpoints_failed_stage() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let uploader = Uploader::new(&store, &vocab);
        let mut article = article(2);
        let mut saved = Vec::new();

        store.fail_writes_after(1);
        uploader
            .step(&mut article, Some("<html/>"), |a| {
                saved.push(a.clone());
                Ok(())
            })
            .expect_err("article item fails");

        assert_eq!(saved.len(), 1);
        assert!(saved[0].page_id().is_some());
        assert_eq!(saved[0].stage(), Stage::Unsubmitted);
    }

    #[test]
    fn linked_anchors_are_not_pushed_twice() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let uploader = Uploader::new(&store, &vocab);
        let mut article = article(3);
        uploader
            .advance(&mut article, Some("<html/>"))
            .expect("article");
        uploader.advance(&mut article, None).expect("annotations");

        store.fail_writes_after(2);
        uploader.advance(&mut article, None).expect_err("third link fails");
        let linked = article.anchor_points().iter().filter(|a| a.is_linked()).count();
        assert_eq!(linked, 2);

        store.heal();
        uploader.advance(&mut article, None).expect("retry");
        for anchor in article.anchor_points() {
            assert_eq!(store.statements(anchor.id().expect("id")).len(), 1);
        }
    }

    #[test]
    fn unsubmitted_article_needs_content() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let mut article = article(1);

        let err = Uploader::new(&store, &vocab)
            .advance(&mut article, None)
            .expect_err("no content");
        assert!(matches!(err, SyncError::MissingContent(Stage::Unsubmitted)));
        assert_eq!(store.count(|c| matches!(c, Call::CreateArticle(_))), 0);
    }

    #[test]
    fn recorded_page_is_not_uploaded_again() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let uploader = Uploader::new(&store, &vocab);
        let mut article = article(0);

        let first = uploader
            .upload_article(&mut article, "<html/>")
            .expect("upload");
        let second = uploader
            .upload_article(&mut article, "<html/>")
            .expect("skip");
        assert_eq!(first, second);
        assert_eq!(store.count(|c| matches!(c, Call::CreateArticle(_))), 1);
    }

    #[test]
    fn linked_article_is_left_alone() {
        let store = MemoryStore::new();
        let vocab = vocabulary(&store);
        let uploader = Uploader::new(&store, &vocab);
        let mut article = article(1);
        uploader
            .run(&mut article, Some("<html/>"), |_| Ok(()))
            .expect("run");
        let calls = store.calls().len();

        assert_eq!(
            uploader.advance(&mut article, None).expect("noop"),
            Stage::Linked
        );
        assert_eq!(store.calls().len(), calls);
        assert!(article.id().is_some());
    }
}
