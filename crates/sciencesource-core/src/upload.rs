//! # Upload Orchestrator
//!
//! Drives one article through its [`Stage`]s against a [`StoreClient`]:
//!
//! 1. `Unsubmitted → ArticleUploaded`: push the article text, then create the
//!    article item. Every anchor point learns which article it is in.
//! 2. `ArticleUploaded → AnnotationsUploaded`: create each annotation item,
//!    then the anchor point item that anchors it. Once every id exists the
//!    neighbour chain is computed locally.
//! 3. `AnnotationsUploaded → Linked`: push each anchor's neighbour
//!    references, then the article's.
//!
//! Requests are issued one at a time. Within a stage, records that already
//! hold an id (or are already linked) are skipped, and [`Uploader::step`]
//! checkpoints a failed stage too, so retrying from the saved graph never
//! duplicates confirmed remote items.

use crate::chain::link_chain;
use crate::schema::TERMINUS_LABEL;
use crate::translate::Translator;
use crate::{
    Article, ItemId, ItemKind, LabelResolver, PageId, PropertyPayload, Stage, StoreClient,
    StoreError, SyncError, TagRegistry, Vocabulary,
};

/// Stage-by-stage uploader for articles.
pub struct Uploader<'a, C: StoreClient + ?Sized> {
    client: &'a C,
    vocabulary: &'a Vocabulary,
}

impl<'a, C: StoreClient + ?Sized> Uploader<'a, C> {
    #[must_use]
    pub fn new(client: &'a C, vocabulary: &'a Vocabulary) -> Self {
        Self { client, vocabulary }
    }

    fn translator(&self) -> Translator<'a> {
        Translator::new(self.vocabulary)
    }

    /// Push the article text and record the assigned page id.
    ///
    /// If a page id is already recorded the text is not sent again.
    pub fn upload_article(&self, article: &mut Article, content: &str) -> Result<PageId, SyncError> {
        if let Some(page) = article.page_id() {
            tracing::debug!(page = %page, "article text already uploaded");
            return Ok(page);
        }
        if article.science_source_title.is_empty() {
            return Err(SyncError::MissingField {
                record: format!("article {:?}", article.title),
                field: "science_source_title",
            });
        }

        let page = self
            .client
            .create_article(&article.science_source_title, content)
            .map_err(|source| upload_error(article, "article text", source))?;
        article.assign_page_id(page)?;
        tracing::info!(title = %article.science_source_title, page = %page, "article text uploaded");
        Ok(page)
    }

    /// Perform the next stage transition and return the new stage.
    ///
    /// `content` is only needed to leave `Unsubmitted`. A terminal article
    /// is returned unchanged. The vocabulary must cover every schema label;
    /// this is checked before anything is sent.
    pub fn advance(&self, article: &mut Article, content: Option<&str>) -> Result<Stage, SyncError> {
        let stage = article.stage();
        let Some(next) = stage.next() else {
            return Ok(stage);
        };
        self.vocabulary.covers(&TagRegistry::standard())?;

        match stage {
            Stage::Unsubmitted => self.submit_article(article, content)?,
            Stage::ArticleUploaded => self.upload_annotations(article)?,
            Stage::AnnotationsUploaded => self.push_links(article)?,
            Stage::Linked => {}
        }

        article.set_stage(next);
        tracing::info!(article = %article.title, stage = %next, "stage confirmed");
        Ok(next)
    }

    /// Advance one stage, then call `checkpoint` whether or not it succeeded.
    ///
    /// A failed stage still holds the ids and link flags confirmed before the
    /// failure; the checkpoint persists them so a retry from disk skips those
    /// records. When the stage failed, the stage error is returned and a
    /// checkpoint error is only logged.
    pub fn step(
        &self,
        article: &mut Article,
        content: Option<&str>,
        mut checkpoint: impl FnMut(&Article) -> Result<(), SyncError>,
    ) -> Result<Stage, SyncError> {
        match self.advance(article, content) {
            Ok(stage) => {
                checkpoint(article)?;
                Ok(stage)
            }
            Err(e) => {
                if let Err(save_error) = checkpoint(article) {
                    tracing::warn!(
                        article = %article.title,
                        error = %save_error,
                        "checkpoint after failed stage failed"
                    );
                }
                Err(e)
            }
        }
    }

    /// Advance until `Linked`, checkpointing after every attempted stage.
    ///
    /// The checkpoint is where the caller persists the graph; an error from
    /// it stops the run.
    pub fn run(
        &self,
        article: &mut Article,
        content: Option<&str>,
        mut checkpoint: impl FnMut(&Article) -> Result<(), SyncError>,
    ) -> Result<Stage, SyncError> {
        while !article.stage().is_terminal() {
            self.step(article, content, &mut checkpoint)?;
        }
        Ok(article.stage())
    }

    // =========================================================================
    // STAGES
    // =========================================================================

    fn submit_article(&self, article: &mut Article, content: Option<&str>) -> Result<(), SyncError> {
        if article.page_id().is_none() {
            let content = content.ok_or(SyncError::MissingContent(article.stage()))?;
            self.upload_article(article, content)?;
        }

        article.assign_instance_of(self.kind_item(ItemKind::Article)?)?;

        let article_id = match article.id() {
            Some(id) => id.clone(),
            None => {
                let payload = self.translator().creation_payload(&*article)?;
                let id = self.create(article, ItemKind::Article, &payload, "article item")?;
                article.assign_id(id.clone())?;
                id
            }
        };

        let title = article.science_source_title.clone();
        for anchor in article.anchor_points_mut() {
            anchor.assign_anchor_point_in(article_id.clone())?;
            if anchor.science_source_title.is_empty() {
                anchor.science_source_title.clone_from(&title);
            }
        }
        Ok(())
    }

    fn upload_annotations(&self, article: &mut Article) -> Result<(), SyncError> {
        let annotation_kind = self.kind_item(ItemKind::Annotation)?;
        let anchor_kind = self.kind_item(ItemKind::AnchorPoint)?;
        let translator = self.translator();

        for index in 0..article.anchor_points().len() {
            let annotation_id = match article.anchor_points()[index].annotation.id() {
                Some(id) => id.clone(),
                None => {
                    let annotation = &mut article.anchor_points_mut()[index].annotation;
                    annotation.assign_instance_of(annotation_kind.clone())?;
                    let payload = translator.creation_payload(&*annotation)?;
                    let id = self.create(
                        article,
                        ItemKind::Annotation,
                        &payload,
                        &format!("annotation #{index}"),
                    )?;
                    article.anchor_points_mut()[index]
                        .annotation
                        .assign_id(id.clone())?;
                    id
                }
            };

            if article.anchor_points()[index].id().is_none() {
                let anchor = &mut article.anchor_points_mut()[index];
                anchor.assign_instance_of(anchor_kind.clone())?;
                anchor.assign_anchors(annotation_id)?;
                let payload = translator.creation_payload(&*anchor)?;
                let id = self.create(
                    article,
                    ItemKind::AnchorPoint,
                    &payload,
                    &format!("anchor point #{index}"),
                )?;
                article.anchor_points_mut()[index].assign_id(id)?;
            }
        }

        let terminus = self.vocabulary.item(TERMINUS_LABEL)?;
        link_chain(article, terminus)
    }

    fn push_links(&self, article: &mut Article) -> Result<(), SyncError> {
        let translator = self.translator();

        for index in 0..article.anchor_points().len() {
            let anchor = &article.anchor_points()[index];
            if anchor.is_linked() {
                continue;
            }
            let id = required_id(anchor.id(), || format!("anchor point #{index}"))?;
            let payload = translator.link_payload(anchor)?;
            self.client
                .add_statements(&id, &payload)
                .map_err(|source| upload_error(article, &format!("anchor point #{index}"), source))?;
            article.anchor_points_mut()[index].mark_linked();
            tracing::debug!(index, item = %id, "anchor point linked");
        }

        let id = required_id(article.id(), || format!("article {:?}", article.title))?;
        let payload = translator.link_payload(&*article)?;
        self.client
            .add_statements(&id, &payload)
            .map_err(|source| upload_error(article, "article links", source))?;
        Ok(())
    }

    // =========================================================================
    // HELPERS
    // =========================================================================

    fn kind_item(&self, kind: ItemKind) -> Result<ItemId, SyncError> {
        self.vocabulary.item(kind.label()).cloned()
    }

    fn create(
        &self,
        article: &Article,
        kind: ItemKind,
        payload: &PropertyPayload,
        record: &str,
    ) -> Result<ItemId, SyncError> {
        let item_type = self.kind_item(kind)?;
        let id = self
            .client
            .create_item(&item_type, payload)
            .map_err(|source| upload_error(article, record, source))?;
        tracing::debug!(%kind, item = %id, properties = payload.len(), "item created");
        Ok(id)
    }
}

fn required_id(id: Option<&ItemId>, record: impl FnOnce() -> String) -> Result<ItemId, SyncError> {
    id.cloned().ok_or_else(|| SyncError::MissingField {
        record: record(),
        field: "id",
    })
}

fn upload_error(article: &Article, record: &str, source: StoreError) -> SyncError {
    tracing::warn!(article = %article.title, stage = %article.stage(), record, error = %source, "upload failed");
    SyncError::Upload {
        stage: article.stage(),
        article: article.title.clone(),
        record: record.to_string(),
        source,
    }
}

/// Resolve the standard vocabulary, then upload `article` to `Linked`.
///
/// Resolution runs before any upload: if a label fails to resolve nothing
/// is written to the store.
pub fn sync_article<C: StoreClient + ?Sized>(
    client: &C,
    article: &mut Article,
    content: Option<&str>,
    checkpoint: impl FnMut(&Article) -> Result<(), SyncError>,
) -> Result<(Vocabulary, Stage), SyncError> {
    let vocabulary = LabelResolver::new(client).resolve(&TagRegistry::standard())?;
    let stage = Uploader::new(client, &vocabulary).run(article, content, checkpoint)?;
    Ok((vocabulary, stage))
}
