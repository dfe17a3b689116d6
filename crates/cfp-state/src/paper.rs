//! # Paper Lifecycle
//!
//! A paper moves through two phases:
//!
//! ```text
//! Submitted ──accept──▶ Accepted
//!  (primary author edits)  (organizer edits acceptance fields,
//!                           authors attach presentation links)
//! ```
//!
//! Acceptance is one-way. Before it, only the primary author may edit the
//! submission. After it, the submission is frozen and the paper becomes
//! visible to everyone.
//!
//! ## Visibility
//!
//! A paper is visible to its primary author, its co-authors, organizers,
//! and, once accepted, to anyone including anonymous callers.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cfp_core::error::require_text;
use cfp_core::{AttendeeId, PaperId, PaperTheme, PaperType, Timestamp, ValidationError};

use crate::capability::Actor;

/// Maximum title length.
pub const TITLE_MAX_LEN: usize = 128;
/// Maximum keywords length.
pub const KEYWORDS_MAX_LEN: usize = 128;
/// Maximum abstract length.
pub const ABSTRACT_MAX_LEN: usize = 8192;

// ─── Errors ──────────────────────────────────────────────────────────

/// Errors from paper operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaperError {
    /// The caller may not see this paper.
    #[error("paper {0} is not visible to the caller")]
    NotVisible(PaperId),

    /// Only the primary author may perform this action.
    #[error("only the primary author may modify paper {0}")]
    NotPrimaryAuthor(PaperId),

    /// Only an author or organizer may perform this action.
    #[error("only an author or organizer may modify paper {0}")]
    NotAuthorOrOrganizer(PaperId),

    /// Only an organizer may perform this action.
    #[error("only an organizer may perform this action on paper {0}")]
    NotOrganizer(PaperId),

    /// The paper is accepted and its submission is frozen.
    #[error("paper {0} is already accepted")]
    AlreadyAccepted(PaperId),

    /// The action only applies to accepted papers.
    #[error("paper {0} has not been accepted")]
    NotAccepted(PaperId),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl PaperError {
    /// Whether the error is an authorization denial rather than a
    /// conflict with the paper's state.
    pub fn is_denial(&self) -> bool {
        matches!(
            self,
            Self::NotVisible(_)
                | Self::NotPrimaryAuthor(_)
                | Self::NotAuthorOrOrganizer(_)
                | Self::NotOrganizer(_)
        )
    }
}

// ─── Inputs ──────────────────────────────────────────────────────────

/// Author-editable submission fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaperDraft {
    pub paper_type: PaperType,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub keywords: String,
    #[serde(default)]
    pub themes: BTreeSet<PaperTheme>,
    #[serde(default)]
    pub co_authors: BTreeSet<AttendeeId>,
}

/// Organizer-managed fields of an accepted paper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceDetails {
    /// The authors asked for a long-form slot.
    pub long_form_requested: bool,
    /// Consent to publish the paper on SSRN.
    pub ssrn_paper_consent: bool,
    /// Consent to publish the presentation on SSRN.
    pub ssrn_presentation_consent: bool,
    pub scheduled_at: Option<Timestamp>,
}

/// Slide and recording locations in external storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresentationLinks {
    pub slides: Option<String>,
    pub video: Option<String>,
}

// ─── Paper ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    pub id: PaperId,
    pub paper_type: PaperType,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub keywords: String,
    pub themes: BTreeSet<PaperTheme>,
    pub primary_author: AttendeeId,
    pub co_authors: BTreeSet<AttendeeId>,
    pub submitted_at: Timestamp,
    pub is_accepted: bool,
    pub accepted_at: Option<Timestamp>,
    pub acceptance: AcceptanceDetails,
    pub presentation: PresentationLinks,
    pub updated_at: Timestamp,
}

impl Paper {
    /// Submit a new paper with `author` as primary author.
    pub fn submit(author: AttendeeId, draft: PaperDraft) -> Result<Self, PaperError> {
        let now = Timestamp::now();
        let mut paper = Self {
            id: PaperId::new(),
            paper_type: draft.paper_type,
            title: String::new(),
            abstract_text: String::new(),
            keywords: String::new(),
            themes: BTreeSet::new(),
            primary_author: author,
            co_authors: BTreeSet::new(),
            submitted_at: now,
            is_accepted: false,
            accepted_at: None,
            acceptance: AcceptanceDetails::default(),
            presentation: PresentationLinks::default(),
            updated_at: now,
        };
        paper.apply_draft(draft)?;
        Ok(paper)
    }

    /// Whether `attendee` is the primary author or a co-author.
    pub fn is_author(&self, attendee: AttendeeId) -> bool {
        self.primary_author == attendee || self.co_authors.contains(&attendee)
    }

    /// The visibility predicate. `None` is an anonymous caller.
    pub fn visible_to(&self, viewer: Option<&Actor>) -> bool {
        if self.is_accepted {
            return true;
        }
        match viewer {
            Some(actor) => actor.is_organizer() || self.is_author(actor.id),
            None => false,
        }
    }

    pub fn require_visible(&self, viewer: Option<&Actor>) -> Result<(), PaperError> {
        if self.visible_to(viewer) {
            Ok(())
        } else {
            Err(PaperError::NotVisible(self.id))
        }
    }

    /// `"{title} ({last name} et al)"`.
    pub fn label(&self, primary_author_last_name: &str) -> String {
        format!("{} ({} et al)", self.title, primary_author_last_name)
    }

    /// Replace the submission fields (primary author, before acceptance).
    pub fn update_submission(&mut self, actor: &Actor, draft: PaperDraft) -> Result<(), PaperError> {
        if actor.id != self.primary_author {
            return Err(PaperError::NotPrimaryAuthor(self.id));
        }
        if self.is_accepted {
            return Err(PaperError::AlreadyAccepted(self.id));
        }
        self.apply_draft(draft)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Check that `actor` may delete the paper.
    ///
    /// Organizers may always delete. The primary author may delete only
    /// before acceptance.
    pub fn authorize_delete(&self, actor: &Actor) -> Result<(), PaperError> {
        if actor.is_organizer() {
            return Ok(());
        }
        if actor.id != self.primary_author {
            return Err(PaperError::NotPrimaryAuthor(self.id));
        }
        if self.is_accepted {
            return Err(PaperError::AlreadyAccepted(self.id));
        }
        Ok(())
    }

    /// Mark the paper accepted (organizer only, once).
    pub fn accept(&mut self, actor: &Actor) -> Result<(), PaperError> {
        if !actor.is_organizer() {
            return Err(PaperError::NotOrganizer(self.id));
        }
        if self.is_accepted {
            return Err(PaperError::AlreadyAccepted(self.id));
        }
        let now = Timestamp::now();
        self.is_accepted = true;
        self.accepted_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Replace the acceptance fields (organizer only, accepted papers only).
    pub fn update_acceptance(
        &mut self,
        actor: &Actor,
        details: AcceptanceDetails,
    ) -> Result<(), PaperError> {
        if !actor.is_organizer() {
            return Err(PaperError::NotOrganizer(self.id));
        }
        if !self.is_accepted {
            return Err(PaperError::NotAccepted(self.id));
        }
        self.acceptance = details;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Replace the presentation links (authors or organizer, accepted only).
    pub fn update_presentation(
        &mut self,
        actor: &Actor,
        links: PresentationLinks,
    ) -> Result<(), PaperError> {
        if !actor.is_organizer() && !self.is_author(actor.id) {
            return Err(PaperError::NotAuthorOrOrganizer(self.id));
        }
        if !self.is_accepted {
            return Err(PaperError::NotAccepted(self.id));
        }
        self.presentation = PresentationLinks {
            slides: non_blank(links.slides),
            video: non_blank(links.video),
        };
        self.updated_at = Timestamp::now();
        Ok(())
    }

    fn apply_draft(&mut self, draft: PaperDraft) -> Result<(), PaperError> {
        let title = require_text("title", &draft.title, TITLE_MAX_LEN)?;
        let abstract_text = require_text("abstract", &draft.abstract_text, ABSTRACT_MAX_LEN)?;
        let keywords = require_text("keywords", &draft.keywords, KEYWORDS_MAX_LEN)?;
        let mut co_authors = draft.co_authors;
        co_authors.remove(&self.primary_author);

        self.paper_type = draft.paper_type;
        self.title = title;
        self.abstract_text = abstract_text;
        self.keywords = keywords;
        self.themes = draft.themes;
        self.co_authors = co_authors;
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

// ─── Tests ───────────────────────────────────────────────────────────
