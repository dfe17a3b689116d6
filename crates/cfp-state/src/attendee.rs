//! # Attendees
//!
//! One attendee per registered account. Created at signup, after which
//! the profile is edited by the attendee themself and the stored
//! capabilities by organizers.
//!
//! Speaker eligibility is never stored. [`is_speaker`] recomputes it from
//! the paper set each time it is asked.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cfp_core::error::require_text;
use cfp_core::{AttendeeId, EmailAddress, Organization, TimeZone, Timestamp, ValidationError};

use crate::capability::{Capability, CapabilityError, CapabilitySet};
use crate::paper::Paper;

/// Maximum attendee name length.
pub const NAME_MAX_LEN: usize = 128;
/// Maximum speaker bio length.
pub const BIO_MAX_LEN: usize = 4096;

/// Errors from attendee operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttendeeError {
    /// Another attendee already registered this email.
    #[error("an attendee with email {0} is already registered")]
    DuplicateEmail(String),

    /// Only the attendee themself may edit their profile.
    #[error("attendee {actor} may not edit the profile of {target}")]
    NotSelf {
        /// Who tried.
        actor: AttendeeId,
        /// Whose profile.
        target: AttendeeId,
    },

    /// The speaker bio is only available to speakers.
    #[error("attendee {0} has no accepted paper")]
    NotSpeaker(AttendeeId),

    /// Capability administration requires the organizer capability.
    #[error("attendee {0} is not an organizer")]
    NotOrganizer(AttendeeId),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A registered attendee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub id: AttendeeId,
    pub email: EmailAddress,
    /// Empty until the attendee completes their profile.
    pub name: String,
    pub organization: Organization,
    pub time_zone: TimeZone,
    pub interested_in_volunteering: bool,
    pub interested_in_speaking: bool,
    /// Stored capabilities only; see [`Attendee::effective_capabilities`].
    pub capabilities: CapabilitySet,
    pub speaker_bio: String,
    /// Location of the avatar in external storage.
    pub speaker_avatar: Option<String>,
    pub registered_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields supplied at signup.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: EmailAddress,
    pub name: String,
    pub organization: Organization,
    pub time_zone: TimeZone,
}

/// Self-service profile changes. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub organization: Option<Organization>,
    pub time_zone: Option<TimeZone>,
    pub interested_in_volunteering: Option<bool>,
    pub interested_in_speaking: Option<bool>,
}

/// Speaker-only fields.
#[derive(Debug, Clone, Default)]
pub struct SpeakerProfileUpdate {
    pub speaker_bio: Option<String>,
    pub speaker_avatar: Option<Option<String>>,
}

impl Attendee {
    /// Create an attendee from a signup. The name may be blank.
    pub fn register(registration: Registration) -> Result<Self, AttendeeError> {
        let name = optional_name(&registration.name)?;
        let now = Timestamp::now();
        Ok(Self {
            id: AttendeeId::new(),
            email: registration.email,
            name,
            organization: registration.organization,
            time_zone: registration.time_zone,
            interested_in_volunteering: false,
            interested_in_speaking: false,
            capabilities: CapabilitySet::empty(),
            speaker_bio: String::new(),
            speaker_avatar: None,
            registered_at: now,
            updated_at: now,
        })
    }

    /// `"{name} ({org})"`, or `"{email} (signup pending)"` for a blank name.
    pub fn display_name(&self) -> String {
        if self.name.is_empty() {
            format!("{} (signup pending)", self.email)
        } else {
            format!("{} ({})", self.name, self.organization)
        }
    }

    /// Last whitespace-separated word of the name, or the email when blank.
    pub fn last_name(&self) -> &str {
        self.name
            .split_whitespace()
            .last()
            .unwrap_or_else(|| self.email.as_str())
    }

    /// Whether the trimmed name consists of exactly one word.
    pub fn has_single_name(&self) -> bool {
        self.name.split_whitespace().count() == 1
    }

    /// Stored capabilities plus `Speaker` when eligible.
    pub fn effective_capabilities<'a, I>(&self, papers: I) -> CapabilitySet
    where
        I: IntoIterator<Item = &'a Paper>,
    {
        self.capabilities.effective(is_speaker(self.id, papers))
    }

    /// Apply a profile edit made by `actor`.
    pub fn update_profile(
        &mut self,
        actor: AttendeeId,
        update: ProfileUpdate,
    ) -> Result<(), AttendeeError> {
        self.require_self(actor)?;
        if let Some(name) = update.name {
            self.name = optional_name(&name)?;
        }
        if let Some(org) = update.organization {
            self.organization = org;
        }
        if let Some(tz) = update.time_zone {
            self.time_zone = tz;
        }
        if let Some(v) = update.interested_in_volunteering {
            self.interested_in_volunteering = v;
        }
        if let Some(v) = update.interested_in_speaking {
            self.interested_in_speaking = v;
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Edit the speaker bio and avatar. The caller must be this attendee
    /// and must currently be a speaker.
    pub fn update_speaker_profile<'a, I>(
        &mut self,
        actor: AttendeeId,
        papers: I,
        update: SpeakerProfileUpdate,
    ) -> Result<(), AttendeeError>
    where
        I: IntoIterator<Item = &'a Paper>,
    {
        self.require_self(actor)?;
        if !is_speaker(self.id, papers) {
            return Err(AttendeeError::NotSpeaker(self.id));
        }
        if let Some(bio) = update.speaker_bio {
            let bio = bio.trim().to_string();
            if bio.chars().count() > BIO_MAX_LEN {
                return Err(ValidationError::TooLong {
                    field: "speaker_bio",
                    max: BIO_MAX_LEN,
                }
                .into());
            }
            self.speaker_bio = bio;
        }
        if let Some(avatar) = update.speaker_avatar {
            self.speaker_avatar = avatar.filter(|s| !s.trim().is_empty());
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Grant or revoke a stored capability on behalf of `actor`.
    ///
    /// `actor_capabilities` are the organizer's own stored capabilities.
    pub fn set_capability(
        &mut self,
        actor: AttendeeId,
        actor_capabilities: &CapabilitySet,
        capability: Capability,
        enabled: bool,
    ) -> Result<bool, AttendeeError> {
        if !actor_capabilities.is_organizer() {
            return Err(AttendeeError::NotOrganizer(actor));
        }
        let changed = if enabled {
            self.capabilities.grant(capability)?
        } else {
            self.capabilities.revoke(capability)?
        };
        if changed {
            self.updated_at = Timestamp::now();
        }
        Ok(changed)
    }

    fn require_self(&self, actor: AttendeeId) -> Result<(), AttendeeError> {
        if actor != self.id {
            return Err(AttendeeError::NotSelf {
                actor,
                target: self.id,
            });
        }
        Ok(())
    }
}

/// Whether `attendee` is primary author or co-author of an accepted paper.
pub fn is_speaker<'a, I>(attendee: AttendeeId, papers: I) -> bool
where
    I: IntoIterator<Item = &'a Paper>,
{
    papers
        .into_iter()
        .any(|p| p.is_accepted && p.is_author(attendee))
}

/// The public attendee list: named attendees in registration order.
pub fn listed<'a, I>(attendees: I) -> Vec<&'a Attendee>
where
    I: IntoIterator<Item = &'a Attendee>,
{
    let mut list: Vec<&Attendee> = attendees
        .into_iter()
        .filter(|a| !a.name.is_empty())
        .collect();
    list.sort_by_key(|a| (a.registered_at, a.id));
    list
}

fn optional_name(raw: &str) -> Result<String, ValidationError> {
    if raw.trim().is_empty() {
        return Ok(String::new());
    }
    require_text("name", raw, NAME_MAX_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paper::{PaperDraft, Paper};
    use cfp_core::PaperType;
    use proptest::prelude::*;

    fn attendee(name: &str, email: &str) -> Attendee {
        Attendee::register(Registration {
            email: EmailAddress::parse(email).unwrap(),
            name: name.to_string(),
            organization: Organization::Elsevier,
            time_zone: TimeZone::UTC,
        })
        .unwrap()
    }

    fn paper_by(author: AttendeeId) -> Paper {
        Paper::submit(
            author,
            PaperDraft {
                paper_type: PaperType::ShortForm,
                title: "Learning to Rank".into(),
                abstract_text: "We rank.".into(),
                keywords: "ltr".into(),
                themes: Default::default(),
                co_authors: Default::default(),
            },
        )
        .unwrap()
    }

    #[test]
    fn display_name_formats() {
        let a = attendee("Ada Lovelace", "ada@example.org");
        assert_eq!(a.display_name(), "Ada Lovelace (Elsevier)");
        let pending = attendee("", "bob@example.org");
        assert_eq!(pending.display_name(), "bob@example.org (signup pending)");
    }

    #[test]
    fn last_name_and_single_name() {
        let a = attendee("  Grace Brewster Hopper ", "grace@example.org");
        assert_eq!(a.name, "Grace Brewster Hopper");
        assert_eq!(a.last_name(), "Hopper");
        assert!(!a.has_single_name());
        assert!(attendee("Prince", "p@example.org").has_single_name());
        assert!(!attendee("", "q@example.org").has_single_name());
    }

    #[test]
    fn only_self_may_edit_profile() {
        let mut a = attendee("Ada", "ada@example.org");
        let other = AttendeeId::new();
        let err = a
            .update_profile(other, ProfileUpdate::default())
            .unwrap_err();
        assert!(matches!(err, AttendeeError::NotSelf { .. }));

        let id = a.id;
        a.update_profile(
            id,
            ProfileUpdate {
                name: Some("Ada King".into()),
                interested_in_speaking: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(a.name, "Ada King");
        assert!(a.interested_in_speaking);
    }

    #[test]
    fn speaker_requires_accepted_paper() {
        let mut a = attendee("Ada", "ada@example.org");
        let mut paper = paper_by(a.id);
        assert!(!is_speaker(a.id, [&paper]));

        let update = SpeakerProfileUpdate {
            speaker_bio: Some("Bio".into()),
            ..Default::default()
        };
        let id = a.id;
        assert_eq!(
            a.update_speaker_profile(id, [&paper], update.clone()),
            Err(AttendeeError::NotSpeaker(id))
        );

        paper.is_accepted = true;
        assert!(is_speaker(a.id, [&paper]));
        a.update_speaker_profile(id, [&paper], update).unwrap();
        assert_eq!(a.speaker_bio, "Bio");
        assert!(a.effective_capabilities([&paper]).is_speaker());
        assert!(!a.capabilities.is_speaker());
    }

    #[test]
    fn co_author_of_accepted_paper_is_speaker() {
        let author = AttendeeId::new();
        let co = AttendeeId::new();
        let mut paper = paper_by(author);
        paper.co_authors.insert(co);
        paper.is_accepted = true;
        assert!(is_speaker(co, [&paper]));
        assert!(!is_speaker(AttendeeId::new(), [&paper]));
    }

    #[test]
    fn capability_changes_require_organizer() {
        let organizer = attendee("Olga", "olga@example.org");
        let mut target = attendee("Rita", "rita@example.org");
        let none = CapabilitySet::empty();
        assert_eq!(
            target.set_capability(organizer.id, &none, Capability::Reviewer, true),
            Err(AttendeeError::NotOrganizer(organizer.id))
        );
        let org_caps = CapabilitySet::from_flags(false, true);
        assert!(target
            .set_capability(organizer.id, &org_caps, Capability::Reviewer, true)
            .unwrap());
        assert!(target.capabilities.is_reviewer());
        assert!(matches!(
            target.set_capability(organizer.id, &org_caps, Capability::Speaker, true),
            Err(AttendeeError::Capability(_))
        ));
    }

    #[test]
    fn listed_skips_blank_names_and_keeps_registration_order() {
        let first = attendee("First", "a@example.org");
        let blank = attendee("", "b@example.org");
        let mut second = attendee("Second", "c@example.org");
        second.registered_at = Timestamp::parse("2999-01-01T00:00:00Z").unwrap();
        let all = [second.clone(), blank, first.clone()];
        let names: Vec<&str> = listed(all.iter()).iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }

    proptest! {
        #[test]
        fn speaker_iff_author_of_accepted_paper(
            papers in proptest::collection::vec((0u8..3, any::<bool>()), 0..6),
        ) {
            // Role 0: unrelated, 1: primary author, 2: co-author.
            let who = AttendeeId::new();
            let mut expected = false;
            let built: Vec<Paper> = papers
                .iter()
                .map(|(role, accepted)| {
                    let primary = if *role == 1 { who } else { AttendeeId::new() };
                    let mut paper = paper_by(primary);
                    if *role == 2 {
                        paper.co_authors.insert(who);
                    }
                    paper.is_accepted = *accepted;
                    expected |= *role != 0 && *accepted;
                    paper
                })
                .collect();
            prop_assert_eq!(is_speaker(who, built.iter()), expected);
        }
    }
}
