//! # API Route Modules
//!
//! - `signup` — account creation; the attendee row is created with it.
//! - `attendees` — attendee list, profiles, role administration, the
//!   public speaker page and the speaker bio form.
//! - `papers` — submission, visibility-gated retrieval, edits, deletion,
//!   acceptance and post-acceptance fields.
//! - `reviews` — one review per reviewer per paper.
//! - `events` — the conference timeline and its administrative moves.
//! - `dashboard` — per-caller landing page.
//! - `stats` — organizer statistics and reports.

pub mod attendees;
pub mod dashboard;
pub mod events;
pub mod papers;
pub mod reviews;
pub mod signup;
pub mod stats;
