//! # Attendee Capabilities
//!
//! Roles are flat capabilities, not a hierarchy: an organizer is not
//! implicitly a reviewer, and a reviewer is not implicitly anything else.
//!
//! Only [`Capability::Reviewer`] and [`Capability::Organizer`] are stored.
//! [`Capability::Speaker`] is derived from accepted papers on every request
//! (see [`crate::attendee::is_speaker`]) and can never be granted.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cfp_core::AttendeeId;

/// A single capability an attendee may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// May create and edit their own reviews.
    Reviewer,
    /// Has an accepted paper. Derived, never stored.
    Speaker,
    /// Elevated access to every paper, review and acceptance action.
    Organizer,
}

impl Capability {
    /// Whether the capability can be granted or revoked administratively.
    pub fn is_grantable(&self) -> bool {
        !matches!(self, Self::Speaker)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reviewer => "reviewer",
            Self::Speaker => "speaker",
            Self::Organizer => "organizer",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Capability {
    type Err = CapabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reviewer" => Ok(Self::Reviewer),
            "speaker" => Ok(Self::Speaker),
            "organizer" => Ok(Self::Organizer),
            other => Err(CapabilityError::Unknown(other.to_string())),
        }
    }
}

/// Errors from capability administration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// Attempted to grant or revoke a derived capability.
    #[error("capability {0} is derived from accepted papers and cannot be assigned")]
    NotGrantable(Capability),

    /// Capability name did not parse.
    #[error("unknown capability: {0:?}")]
    Unknown(String),
}

/// The set of capabilities an attendee holds.
///
/// Serialized as a sorted list, e.g. `["reviewer", "organizer"]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    /// No capabilities.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a stored set from the two persisted role flags.
    pub fn from_flags(reviewer: bool, organizer: bool) -> Self {
        let mut set = Self::empty();
        if reviewer {
            set.0.insert(Capability::Reviewer);
        }
        if organizer {
            set.0.insert(Capability::Organizer);
        }
        set
    }

    /// Grant a capability. Returns `true` if it was newly added.
    pub fn grant(&mut self, capability: Capability) -> Result<bool, CapabilityError> {
        if !capability.is_grantable() {
            return Err(CapabilityError::NotGrantable(capability));
        }
        Ok(self.0.insert(capability))
    }

    /// Revoke a capability. Returns `true` if it was present.
    pub fn revoke(&mut self, capability: Capability) -> Result<bool, CapabilityError> {
        if !capability.is_grantable() {
            return Err(CapabilityError::NotGrantable(capability));
        }
        Ok(self.0.remove(&capability))
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn is_reviewer(&self) -> bool {
        self.contains(Capability::Reviewer)
    }

    pub fn is_organizer(&self) -> bool {
        self.contains(Capability::Organizer)
    }

    pub fn is_speaker(&self) -> bool {
        self.contains(Capability::Speaker)
    }

    /// The stored set plus `Speaker` when `speaker` is true.
    pub fn effective(&self, speaker: bool) -> Self {
        let mut set = self.clone();
        if speaker {
            set.0.insert(Capability::Speaker);
        }
        set
    }

    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// An authenticated attendee acting on a request, with capabilities
/// already resolved (stored set plus derived `Speaker`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: AttendeeId,
    pub capabilities: CapabilitySet,
}

impl Actor {
    pub fn new(id: AttendeeId, capabilities: CapabilitySet) -> Self {
        Self { id, capabilities }
    }

    pub fn is_organizer(&self) -> bool {
        self.capabilities.is_organizer()
    }

    pub fn is_reviewer(&self) -> bool {
        self.capabilities.is_reviewer()
    }

    pub fn is_speaker(&self) -> bool {
        self.capabilities.is_speaker()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_and_revoke_stored_capabilities() {
        let mut caps = CapabilitySet::empty();
        assert!(caps.grant(Capability::Reviewer).unwrap());
        assert!(!caps.grant(Capability::Reviewer).unwrap());
        assert!(caps.is_reviewer());
        assert!(!caps.is_organizer());
        assert!(caps.revoke(Capability::Reviewer).unwrap());
        assert!(caps.is_empty());
    }

    #[test]
    fn speaker_cannot_be_assigned() {
        let mut caps = CapabilitySet::empty();
        assert_eq!(
            caps.grant(Capability::Speaker),
            Err(CapabilityError::NotGrantable(Capability::Speaker))
        );
        assert!(caps.revoke(Capability::Speaker).is_err());
    }

    #[test]
    fn organizer_does_not_imply_reviewer() {
        let caps = CapabilitySet::from_flags(false, true);
        assert!(caps.is_organizer());
        assert!(!caps.is_reviewer());
    }

    #[test]
    fn effective_adds_speaker_without_mutating() {
        let stored = CapabilitySet::from_flags(true, false);
        let effective = stored.effective(true);
        assert!(effective.is_speaker());
        assert!(!stored.is_speaker());
        assert!(!stored.effective(false).is_speaker());
    }

    #[test]
    fn serializes_as_sorted_list() {
        let caps = CapabilitySet::from_flags(true, true).effective(true);
        let json = serde_json::to_string(&caps).unwrap();
        assert_eq!(json, r#"["reviewer","speaker","organizer"]"#);
    }

    #[test]
    fn parse_names() {
        assert_eq!("organizer".parse::<Capability>().unwrap(), Capability::Organizer);
        assert!("admin".parse::<Capability>().is_err());
    }
}
