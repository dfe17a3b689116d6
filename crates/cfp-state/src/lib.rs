//! # cfp-state — Lifecycle and Authorization Rules
//!
//! The rules governing who may see, edit, or act on attendees, papers and
//! reviews at each stage of the conference timeline.
//!
//! ## Modules
//!
//! - **Capability** (`capability.rs`): flat capability set per attendee.
//!   `Reviewer` and `Organizer` are stored; `Speaker` is derived.
//!
//! - **Attendee** (`attendee.rs`): registration, self-service profile
//!   edits, speaker eligibility, organizer-managed capabilities.
//!
//! - **Paper** (`paper.rs`): `Submitted → Accepted`, the visibility
//!   predicate, and the edit rules on either side of acceptance.
//!
//! - **Review** (`review.rs`): one review per `(paper, reviewer)`, edited
//!   only by its own reviewer.
//!
//! - **Timeline** (`timeline.rs`): eight milestones with exactly one
//!   current, moved by explicit administrative transitions.
//!
//! - **Stats** (`stats.rs`): review progress, score distribution and the
//!   reports organizers pull during the conference.
//!
//! ## Design
//!
//! Every rule is a plain function of the records involved and the acting
//! [`Actor`]. Nothing here performs I/O; `cfp-api` loads the records, asks
//! these rules, and persists the result.

pub mod attendee;
pub mod capability;
pub mod paper;
pub mod review;
pub mod stats;
pub mod timeline;

pub use attendee::{
    is_speaker, Attendee, AttendeeError, ProfileUpdate, Registration, SpeakerProfileUpdate,
};
pub use capability::{Actor, Capability, CapabilityError, CapabilitySet};
pub use paper::{AcceptanceDetails, Paper, PaperDraft, PaperError, PresentationLinks};
pub use review::{Review, ReviewDraft, ReviewError, ReviewRegistry};
pub use stats::{AttendanceStats, PaperScore, ReviewStats, ScoreBucket, SubmissionPoint};
pub use timeline::{
    open_sections, DashboardSection, Milestone, MilestoneEntry, Timeline, TimelineError,
    TimelineTransitionEvidence, TimelineTransitionRecord,
};
