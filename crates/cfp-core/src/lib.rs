//! # cfp-core — Foundational Types for the CFP Portal
//!
//! Every other crate in the workspace depends on `cfp-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Newtype identifiers.** `AttendeeId`, `PaperId`, `ReviewId` are
//!    distinct types. A reviewer id cannot be passed where a paper id is
//!    expected.
//!
//! 2. **Exhaustive reference catalogs.** Organizations, time zones, paper
//!    types, paper themes, review decisions and rejection reasons are enums.
//!    Adding a variant forces every `match` in the workspace to handle it.
//!
//! 3. **UTC-only timestamps.** [`Timestamp`] is UTC with seconds precision.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `cfp-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod catalog;
pub mod error;
pub mod identity;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use catalog::{
    Organization, PaperTheme, PaperType, RejectionReason, ReviewDecision, TimeZone,
    MAX_REVIEW_SCORE,
};
pub use error::{CfpError, ValidationError};
pub use identity::{AttendeeId, EmailAddress, PaperId, ReviewId};
pub use temporal::Timestamp;
