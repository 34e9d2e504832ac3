//! # Upload Stages
//!
//! Every article moves through four stages, strictly in order:
//!
//! | Stage | Reached when | Enables |
//! |-------|--------------|---------|
//! | Unsubmitted | Constructed or loaded | Article text upload |
//! | ArticleUploaded | Page and article item exist | `anchor point in` references |
//! | AnnotationsUploaded | Every annotation and anchor point item exists | Neighbour references |
//! | Linked | All cross-references pushed | Nothing (terminal) |
//!
//! A stage is only recorded after every remote write it needs has been
//! confirmed. Retrying from a recorded stage never repeats earlier stages.

use crate::model::Article;
use serde::{Deserialize, Serialize};

// =============================================================================
// STAGE ENUM
// =============================================================================

/// Upload stage of one article.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Only known-upfront fields are populated.
    #[default]
    Unsubmitted,
    /// Article text pushed, page id and article item id assigned.
    ArticleUploaded,
    /// Every annotation and anchor point item created, chain computed locally.
    AnnotationsUploaded,
    /// All cross-references pushed to the store.
    Linked,
}

impl Stage {
    /// Get the stage name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Unsubmitted => "Unsubmitted",
            Stage::ArticleUploaded => "Article Uploaded",
            Stage::AnnotationsUploaded => "Annotations Uploaded",
            Stage::Linked => "Linked",
        }
    }

    /// Get the next stage, if any.
    #[must_use]
    pub fn next(&self) -> Option<Stage> {
        match self {
            Stage::Unsubmitted => Some(Stage::ArticleUploaded),
            Stage::ArticleUploaded => Some(Stage::AnnotationsUploaded),
            Stage::AnnotationsUploaded => Some(Stage::Linked),
            Stage::Linked => None,
        }
    }

    /// Check if this stage is terminal (Linked).
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Linked)
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// UPLOAD PROGRESS
// =============================================================================

/// Record-level progress of an article, used to report partial stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    /// Last confirmed stage.
    pub stage: Stage,
    /// Number of anchor points in the article.
    pub anchor_count: usize,
    /// Annotations that already hold a remote id.
    pub annotations_uploaded: usize,
    /// Anchor points that already hold a remote id.
    pub anchors_uploaded: usize,
    /// Anchor points whose neighbour references were pushed.
    pub anchors_linked: usize,
}

impl UploadProgress {
    /// Compute progress from an article.
    #[must_use]
    pub fn from_article(article: &Article) -> Self {
        let anchors = article.anchor_points();
        Self {
            stage: article.stage(),
            anchor_count: anchors.len(),
            annotations_uploaded: anchors
                .iter()
                .filter(|a| a.annotation.id().is_some())
                .count(),
            anchors_uploaded: anchors.iter().filter(|a| a.id().is_some()).count(),
            anchors_linked: anchors.iter().filter(|a| a.is_linked()).count(),
        }
    }

    /// Progress through the anchor points of the current stage, in percent.
    ///
    /// Integer arithmetic only; an article without anchors is either 0 or 100.
    #[must_use]
    pub fn percent(&self) -> usize {
        let done = match self.stage {
            Stage::Unsubmitted => 0,
            Stage::ArticleUploaded => self.anchors_uploaded,
            Stage::AnnotationsUploaded => self.anchors_linked,
            Stage::Linked => return 100,
        };
        if self.anchor_count == 0 {
            0
        } else {
            done.saturating_mul(100) / self.anchor_count
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
