//! # Anchor Chain
//!
//! Anchor points of an article form a doubly linked chain in document order.
//! The article item heads the chain and the terminus item closes it:
//!
//! ```text
//! Article ─following─▶ A0 ⇄ A1 ⇄ ... ⇄ An ─following─▶ Terminus
//!    ▲                  │
//!    └───preceding──────┘
//! ```
//!
//! With no anchor points the article's following anchor is the terminus.

use crate::{Article, ItemId, SyncError};

/// Compute every neighbour reference of `article`.
///
/// Requires the article item id and every anchor point id. Pure: nothing is
/// sent to the store. Re-running on an already linked article is a no-op.
pub fn link_chain(article: &mut Article, terminus: &ItemId) -> Result<(), SyncError> {
    let head = article.id().cloned().ok_or_else(|| SyncError::MissingField {
        record: format!("article {:?}", article.title),
        field: "id",
    })?;

    let ids = article
        .anchor_points()
        .iter()
        .enumerate()
        .map(|(index, anchor)| {
            anchor.id().cloned().ok_or_else(|| SyncError::MissingField {
                record: format!("anchor point #{index}"),
                field: "id",
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    for (index, anchor) in article.anchor_points_mut().iter_mut().enumerate() {
        let preceding = if index == 0 {
            head.clone()
        } else {
            ids[index - 1].clone()
        };
        let following = ids.get(index + 1).unwrap_or(terminus).clone();
        anchor.assign_preceding_anchor(preceding)?;
        anchor.assign_following_anchor(following)?;
    }

    let first = ids.first().unwrap_or(terminus).clone();
    article.assign_following_anchor(first)
}

/// Check the bidirectional invariant of a linked article.
///
/// For adjacent anchors A, B: A's following is B's id and B's preceding is
/// A's id. The first anchor is preceded by the article; the last is followed
/// by `terminus`.
pub fn verify_chain(article: &Article, terminus: &ItemId) -> Result<(), SyncError> {
    let anchors = article.anchor_points();
    let expected_first = anchors.first().and_then(|a| a.id()).unwrap_or(terminus);
    if article.following_anchor() != Some(expected_first) {
        return Err(SyncError::BrokenChain(format!(
            "article following anchor is {:?}, expected {}",
            article.following_anchor(),
            expected_first
        )));
    }

    for (index, anchor) in anchors.iter().enumerate() {
        let preceding = if index == 0 {
            article.id()
        } else {
            anchors[index - 1].id()
        };
        let following = match anchors.get(index + 1) {
            Some(next) => next.id(),
            None => Some(terminus),
        };

        if preceding.is_none() || anchor.preceding_anchor() != preceding {
            return Err(SyncError::BrokenChain(format!(
                "anchor point #{index} preceding is {:?}, expected {:?}",
                anchor.preceding_anchor(),
                preceding
            )));
        }
        if following.is_none() || anchor.following_anchor() != following {
            return Err(SyncError::BrokenChain(format!(
                "anchor point #{index} following is {:?}, expected {:?}",
                anchor.following_anchor(),
                following
            )));
        }
    }
    Ok(())
}
