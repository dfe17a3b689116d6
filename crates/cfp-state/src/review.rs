//! # Reviews
//!
//! A review is one reviewer's verdict on one paper. At most one review
//! exists per `(paper, reviewer)` pair; [`ReviewRegistry`] enforces this
//! under whatever lock guards it, mirroring the database's unique index.
//!
//! Only the reviewer who wrote a review may edit it. Organizers may read
//! every review.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use cfp_core::{AttendeeId, PaperId, RejectionReason, ReviewDecision, ReviewId, Timestamp, ValidationError};

use crate::capability::Actor;

/// Maximum length of review comments.
pub const COMMENTS_MAX_LEN: usize = 8192;

/// Errors from review operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    /// Caller lacks the reviewer capability.
    #[error("attendee {0} is not a reviewer")]
    NotReviewer(AttendeeId),

    /// Only the review's author may modify it.
    #[error("review {0} belongs to another reviewer")]
    NotOwnReviewer(ReviewId),

    /// Caller may not read this review.
    #[error("review {0} is not visible to the caller")]
    NotVisible(ReviewId),

    /// The reviewer already reviewed this paper.
    #[error("{reviewer} has already reviewed {paper}")]
    Duplicate {
        paper: PaperId,
        reviewer: AttendeeId,
    },

    #[error("review {0} not found")]
    NotFound(ReviewId),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl ReviewError {
    /// Whether the error is an authorization denial.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::NotReviewer(_) | Self::NotOwnReviewer(_) | Self::NotVisible(_)
        )
    }
}

/// Reviewer-editable fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewDraft {
    #[serde(default)]
    pub decision: ReviewDecision,
    #[serde(default)]
    pub rejection_reason: Option<RejectionReason>,
    #[serde(default)]
    pub comments: String,
}

impl ReviewDraft {
    /// Check decision/reason consistency and comment length.
    ///
    /// A rejection reason only makes sense alongside `Reject` or
    /// `MaybeAccept`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.rejection_reason.is_some()
            && !matches!(
                self.decision,
                ReviewDecision::Reject | ReviewDecision::MaybeAccept
            )
        {
            return Err(ValidationError::Inconsistent {
                field: "rejection_reason",
                reason: format!("not allowed with decision {}", self.decision),
            });
        }
        if self.comments.chars().count() > COMMENTS_MAX_LEN {
            return Err(ValidationError::TooLong {
                field: "comments",
                max: COMMENTS_MAX_LEN,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub paper_id: PaperId,
    pub reviewer: AttendeeId,
    pub decision: ReviewDecision,
    pub rejection_reason: Option<RejectionReason>,
    pub comments: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Review {
    /// Draft a review of `paper_id` by `actor`. Uniqueness is checked when
    /// the review is inserted into a [`ReviewRegistry`].
    pub fn create(actor: &Actor, paper_id: PaperId, draft: ReviewDraft) -> Result<Self, ReviewError> {
        if !actor.is_reviewer() {
            return Err(ReviewError::NotReviewer(actor.id));
        }
        draft.validate()?;
        let now = Timestamp::now();
        Ok(Self {
            id: ReviewId::new(),
            paper_id,
            reviewer: actor.id,
            decision: draft.decision,
            rejection_reason: draft.rejection_reason,
            comments: draft.comments.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// The reviewer who wrote it, or any organizer.
    pub fn visible_to(&self, actor: &Actor) -> bool {
        actor.id == self.reviewer || actor.is_organizer()
    }

    pub fn require_visible(&self, actor: &Actor) -> Result<(), ReviewError> {
        if self.visible_to(actor) {
            Ok(())
        } else {
            Err(ReviewError::NotVisible(self.id))
        }
    }

    /// Replace the verdict. Only the review's own reviewer may do this.
    pub fn update(&mut self, actor: &Actor, draft: ReviewDraft) -> Result<(), ReviewError> {
        if actor.id != self.reviewer {
            return Err(ReviewError::NotOwnReviewer(self.id));
        }
        draft.validate()?;
        self.decision = draft.decision;
        self.rejection_reason = draft.rejection_reason;
        self.comments = draft.comments.trim().to_string();
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Score on the 0–4 scale.
    pub fn score(&self) -> u8 {
        self.decision.score()
    }
}

/// All reviews, indexed by id and by `(paper, reviewer)`.
#[derive(Debug, Clone, Default)]
pub struct ReviewRegistry {
    reviews: HashMap<ReviewId, Review>,
    by_pair: BTreeMap<(PaperId, AttendeeId), ReviewId>,
}

impl ReviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a review, rejecting a second one for the same pair.
    pub fn insert(&mut self, review: Review) -> Result<(), ReviewError> {
        let key = (review.paper_id, review.reviewer);
        if self.by_pair.contains_key(&key) {
            return Err(ReviewError::Duplicate {
                paper: review.paper_id,
                reviewer: review.reviewer,
            });
        }
        self.by_pair.insert(key, review.id);
        self.reviews.insert(review.id, review);
        Ok(())
    }

    pub fn get(&self, id: &ReviewId) -> Option<&Review> {
        self.reviews.get(id)
    }

    /// Look up the review `reviewer` wrote for `paper`, if any.
    pub fn find(&self, paper: PaperId, reviewer: AttendeeId) -> Option<&Review> {
        self.by_pair
            .get(&(paper, reviewer))
            .and_then(|id| self.reviews.get(id))
    }

    /// Apply `f` to the review with `id`. The pair index is unaffected
    /// because paper and reviewer never change.
    pub fn update<F>(&mut self, id: &ReviewId, f: F) -> Result<Review, ReviewError>
    where
        F: FnOnce(&mut Review) -> Result<(), ReviewError>,
    {
        let review = self.reviews.get_mut(id).ok_or(ReviewError::NotFound(*id))?;
        let mut candidate = review.clone();
        f(&mut candidate)?;
        *review = candidate.clone();
        Ok(candidate)
    }

    pub fn remove(&mut self, id: &ReviewId) -> Option<Review> {
        let review = self.reviews.remove(id)?;
        self.by_pair.remove(&(review.paper_id, review.reviewer));
        Some(review)
    }

    /// Remove and return every review of `paper`.
    pub fn take_for_paper(&mut self, paper: PaperId) -> Vec<Review> {
        let ids: Vec<ReviewId> = self
            .by_pair
            .range((paper, min_attendee())..)
            .take_while(|((p, _), _)| *p == paper)
            .map(|(_, id)| *id)
            .collect();
        ids.iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Put `previous` back only while the stored review still equals
    /// `current`. Returns whether it was restored.
    pub fn restore_if_unchanged(&mut self, current: &Review, previous: Review) -> bool {
        match self.reviews.get_mut(&current.id) {
            Some(review) if review == current => {
                *review = previous;
                true
            }
            _ => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Review> {
        self.reviews.values()
    }

    /// Reviews the actor may read: all for organizers, own otherwise.
    pub fn visible_to<'a>(&'a self, actor: &'a Actor) -> impl Iterator<Item = &'a Review> + 'a {
        self.reviews.values().filter(move |r| r.visible_to(actor))
    }

    pub fn for_paper(&self, paper: PaperId) -> impl Iterator<Item = &Review> {
        self.reviews.values().filter(move |r| r.paper_id == paper)
    }

    pub fn len(&self) -> usize {
        self.reviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reviews.is_empty()
    }
}

impl FromIterator<Review> for ReviewRegistry {
    /// Later duplicates of a pair are dropped.
    fn from_iter<T: IntoIterator<Item = Review>>(iter: T) -> Self {
        let mut registry = Self::new();
        for review in iter {
            let _ = registry.insert(review);
        }
        registry
    }
}

fn min_attendee() -> AttendeeId {
    AttendeeId(Uuid::nil())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilitySet;

    fn reviewer() -> Actor {
        Actor::new(AttendeeId::new(), CapabilitySet::from_flags(true, false))
    }

    fn verdict(decision: ReviewDecision) -> ReviewDraft {
        ReviewDraft {
            decision,
            rejection_reason: None,
            comments: "Solid evaluation.".into(),
        }
    }

    #[test]
    fn only_reviewers_create() {
        let plain = Actor::new(AttendeeId::new(), CapabilitySet::empty());
        assert_eq!(
            Review::create(&plain, PaperId::new(), verdict(ReviewDecision::Accept)),
            Err(ReviewError::NotReviewer(plain.id))
        );
        let organizer = Actor::new(AttendeeId::new(), CapabilitySet::from_flags(false, true));
        assert!(Review::create(&organizer, PaperId::new(), verdict(ReviewDecision::Accept)).is_err());
    }

    #[test]
    fn second_review_of_same_pair_fails() {
        let r = reviewer();
        let paper = PaperId::new();
        let mut registry = ReviewRegistry::new();
        registry
            .insert(Review::create(&r, paper, verdict(ReviewDecision::Accept)).unwrap())
            .unwrap();
        let again = Review::create(&r, paper, verdict(ReviewDecision::Reject)).unwrap();
        assert_eq!(
            registry.insert(again),
            Err(ReviewError::Duplicate { paper, reviewer: r.id })
        );
        assert_eq!(registry.len(), 1);

        let other = reviewer();
        registry
            .insert(Review::create(&other, paper, verdict(ReviewDecision::Reject)).unwrap())
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.find(paper, other.id).is_some());
    }

    #[test]
    fn rejection_reason_requires_negative_decision() {
        let mut draft = verdict(ReviewDecision::Accept);
        draft.rejection_reason = Some(RejectionReason::ConsiderPoster);
        assert!(matches!(
            draft.validate(),
            Err(ValidationError::Inconsistent { field: "rejection_reason", .. })
        ));
        draft.decision = ReviewDecision::MaybeAccept;
        assert!(draft.validate().is_ok());
        draft.decision = ReviewDecision::Reject;
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn only_own_reviewer_updates() {
        let r = reviewer();
        let mut review = Review::create(&r, PaperId::new(), verdict(ReviewDecision::NotReviewed)).unwrap();
        let organizer = Actor::new(AttendeeId::new(), CapabilitySet::from_flags(false, true));
        assert_eq!(
            review.update(&organizer, verdict(ReviewDecision::Reject)),
            Err(ReviewError::NotOwnReviewer(review.id))
        );
        review.update(&r, verdict(ReviewDecision::StrongAccept)).unwrap();
        assert_eq!(review.score(), 4);
        assert!(review.visible_to(&organizer));
        assert!(!review.visible_to(&reviewer()));
    }

    #[test]
    fn registry_update_is_atomic_on_error() {
        let r = reviewer();
        let mut registry = ReviewRegistry::new();
        let review = Review::create(&r, PaperId::new(), verdict(ReviewDecision::Accept)).unwrap();
        let id = review.id;
        registry.insert(review).unwrap();
        let mut bad = verdict(ReviewDecision::Accept);
        bad.rejection_reason = Some(RejectionReason::Other);
        assert!(registry.update(&id, |rev| rev.update(&r, bad)).is_err());
        assert_eq!(registry.get(&id).unwrap().decision, ReviewDecision::Accept);
    }

    #[test]
    fn take_for_paper_frees_pairs() {
        let paper = PaperId::new();
        let keep = PaperId::new();
        let a = reviewer();
        let b = reviewer();
        let mut registry = ReviewRegistry::new();
        for actor in [&a, &b] {
            registry
                .insert(Review::create(actor, paper, verdict(ReviewDecision::Accept)).unwrap())
                .unwrap();
        }
        registry
            .insert(Review::create(&a, keep, verdict(ReviewDecision::Accept)).unwrap())
            .unwrap();
        let taken = registry.take_for_paper(paper);
        assert_eq!(taken.len(), 2);
        assert!(taken.iter().all(|r| r.paper_id == paper));
        assert_eq!(registry.len(), 1);
        assert!(registry
            .insert(Review::create(&a, paper, verdict(ReviewDecision::Reject)).unwrap())
            .is_ok());
    }

    #[test]
    fn restore_if_unchanged_spares_later_revisions() {
        let r = reviewer();
        let mut registry = ReviewRegistry::new();
        let original = Review::create(&r, PaperId::new(), verdict(ReviewDecision::Reject)).unwrap();
        let id = original.id;
        registry.insert(original.clone()).unwrap();

        let ours = registry
            .update(&id, |rev| rev.update(&r, verdict(ReviewDecision::Accept)))
            .unwrap();
        let later = registry
            .update(&id, |rev| rev.update(&r, verdict(ReviewDecision::StrongAccept)))
            .unwrap();

        assert!(!registry.restore_if_unchanged(&ours, original.clone()));
        assert_eq!(registry.get(&id), Some(&later));
        assert!(registry.restore_if_unchanged(&later, ours.clone()));
        assert_eq!(registry.get(&id), Some(&ours));
    }
}
