//! # Response Views
//!
//! Domain records are reshaped here before they leave the service: display
//! labels are resolved, effective capabilities replace stored ones, and
//! review scores gain their star rendering.
//!
//! Domain types carry no schema derives, so view fields that hold them are
//! annotated with a `value_type` for the OpenAPI document.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use cfp_core::{
    AttendeeId, PaperId, PaperTheme, PaperType, RejectionReason, ReviewDecision, ReviewId,
    Timestamp, MAX_REVIEW_SCORE,
};
use cfp_state::{AcceptanceDetails, Attendee, Capability, CapabilitySet, Paper, PresentationLinks, Review};

use crate::state::AppState;

// -- Star Rating --------------------------------------------------------------

/// Visual rendering of a review score on the 0-4 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StarRating {
    pub filled: u8,
    pub empty: u8,
}

impl StarRating {
    pub fn for_decision(decision: ReviewDecision) -> Self {
        let filled = decision.score().min(MAX_REVIEW_SCORE);
        Self {
            filled,
            empty: MAX_REVIEW_SCORE - filled,
        }
    }

    /// `"★★★☆"` for a score of 3.
    pub fn render(&self) -> String {
        let mut out = "★".repeat(self.filled as usize);
        out.push_str(&"☆".repeat(self.empty as usize));
        out
    }
}

// -- Attendees ----------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendeeView {
    #[schema(value_type = String)]
    pub id: AttendeeId,
    pub display_name: String,
    pub name: String,
    /// Present for the attendee themself and organizers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[schema(value_type = String)]
    pub organization: cfp_core::Organization,
    #[schema(value_type = String)]
    pub time_zone: cfp_core::TimeZone,
    pub interested_in_volunteering: bool,
    pub interested_in_speaking: bool,
    /// Effective capabilities, including a derived `speaker`.
    #[schema(value_type = Vec<String>)]
    pub capabilities: Vec<Capability>,
    #[schema(value_type = String)]
    pub registered_at: Timestamp,
}

impl AttendeeView {
    pub fn new(attendee: &Attendee, effective: &CapabilitySet, show_email: bool) -> Self {
        Self {
            id: attendee.id,
            display_name: attendee.display_name(),
            name: attendee.name.clone(),
            email: show_email.then(|| attendee.email.to_string()),
            organization: attendee.organization,
            time_zone: attendee.time_zone,
            interested_in_volunteering: attendee.interested_in_volunteering,
            interested_in_speaking: attendee.interested_in_speaking,
            capabilities: effective.iter().collect(),
            registered_at: attendee.registered_at,
        }
    }
}

/// The public speaker page.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SpeakerView {
    #[schema(value_type = String)]
    pub id: AttendeeId,
    pub display_name: String,
    pub speaker_bio: String,
    pub speaker_avatar: Option<String>,
    /// Labels of the speaker's accepted papers.
    pub papers: Vec<PaperSummary>,
}

// -- Papers -------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaperSummary {
    #[schema(value_type = String)]
    pub id: PaperId,
    pub label: String,
    pub is_accepted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaperView {
    #[schema(value_type = String)]
    pub id: PaperId,
    pub label: String,
    #[schema(value_type = String)]
    pub paper_type: PaperType,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub keywords: String,
    #[schema(value_type = Vec<String>)]
    pub themes: BTreeSet<PaperTheme>,
    #[schema(value_type = String)]
    pub primary_author: AttendeeId,
    #[schema(value_type = Vec<String>)]
    pub co_authors: BTreeSet<AttendeeId>,
    #[schema(value_type = String)]
    pub submitted_at: Timestamp,
    pub is_accepted: bool,
    #[schema(value_type = Option<String>)]
    pub accepted_at: Option<Timestamp>,
    #[schema(value_type = Object)]
    pub acceptance: AcceptanceDetails,
    #[schema(value_type = Object)]
    pub presentation: PresentationLinks,
}

impl PaperView {
    pub fn new(paper: &Paper, label: String) -> Self {
        Self {
            id: paper.id,
            label,
            paper_type: paper.paper_type,
            title: paper.title.clone(),
            abstract_text: paper.abstract_text.clone(),
            keywords: paper.keywords.clone(),
            themes: paper.themes.clone(),
            primary_author: paper.primary_author,
            co_authors: paper.co_authors.clone(),
            submitted_at: paper.submitted_at,
            is_accepted: paper.is_accepted,
            accepted_at: paper.accepted_at,
            acceptance: paper.acceptance.clone(),
            presentation: paper.presentation.clone(),
        }
    }
}

/// `"{title} ({last name} et al)"`, resolving the primary author's name
/// from the attendee store.
pub fn paper_label(state: &AppState, paper: &Paper) -> String {
    match state.attendees.get(&paper.primary_author) {
        Some(author) => paper.label(author.last_name()),
        None => paper.label("unknown"),
    }
}

pub fn paper_view(state: &AppState, paper: &Paper) -> PaperView {
    PaperView::new(paper, paper_label(state, paper))
}

pub fn paper_summary(state: &AppState, paper: &Paper) -> PaperSummary {
    PaperSummary {
        id: paper.id,
        label: paper_label(state, paper),
        is_accepted: paper.is_accepted,
    }
}

// -- Reviews ------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewView {
    #[schema(value_type = String)]
    pub id: ReviewId,
    #[schema(value_type = String)]
    pub paper_id: PaperId,
    #[schema(value_type = String)]
    pub reviewer: AttendeeId,
    #[schema(value_type = String)]
    pub decision: ReviewDecision,
    pub decision_label: String,
    pub score: u8,
    pub stars: StarRating,
    pub stars_display: String,
    #[schema(value_type = Option<String>)]
    pub rejection_reason: Option<RejectionReason>,
    pub comments: String,
    #[schema(value_type = String)]
    pub created_at: Timestamp,
    #[schema(value_type = String)]
    pub updated_at: Timestamp,
}

impl From<&Review> for ReviewView {
    fn from(review: &Review) -> Self {
        let stars = StarRating::for_decision(review.decision);
        Self {
            id: review.id,
            paper_id: review.paper_id,
            reviewer: review.reviewer,
            decision: review.decision,
            decision_label: review.decision.label().to_string(),
            score: review.score(),
            stars,
            stars_display: stars.render(),
            rejection_reason: review.rejection_reason,
            comments: review.comments.clone(),
            created_at: review.created_at,
            updated_at: review.updated_at,
        }
    }
}
