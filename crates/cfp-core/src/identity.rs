//! # Domain Identity Newtypes
//!
//! Newtype wrappers for the portal's identifiers. You cannot pass an
//! `AttendeeId` where a `PaperId` is expected, which rules out a whole
//! class of "checked the wrong id" authorization bugs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Unique identifier for an attendee (one per registered account).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttendeeId(pub Uuid);

/// Unique identifier for a submitted paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaperId(pub Uuid);

/// Unique identifier for a review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewId(pub Uuid);

macro_rules! uuid_newtype {
    ($name:ident, $prefix:literal) => {
        impl $name {
            /// Generate a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

uuid_newtype!(AttendeeId, "attendee");
uuid_newtype!(PaperId, "paper");
uuid_newtype!(ReviewId, "review");

/// A normalized email address.
///
/// Stored lowercased and trimmed so that uniqueness checks compare the
/// same representation the user typed in either case.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

/// Maximum stored email length, matching the `attendees.email` column.
pub const EMAIL_MAX_LEN: usize = 128;

impl EmailAddress {
    /// Parse and normalize an email address.
    ///
    /// Requires exactly one `@` with a non-empty local part and a domain
    /// containing a dot that is neither leading nor trailing.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(ValidationError::Empty { field: "email" });
        }
        if normalized.len() > EMAIL_MAX_LEN {
            return Err(ValidationError::TooLong {
                field: "email",
                max: EMAIL_MAX_LEN,
            });
        }
        let mut parts = normalized.split('@');
        let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
            (Some(local), Some(domain), None) => (local, domain),
            _ => return Err(ValidationError::InvalidEmail(raw.to_string())),
        };
        let domain_ok = domain.contains('.')
            && !domain.starts_with('.')
            && !domain.ends_with('.');
        if local.is_empty() || !domain_ok || normalized.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidEmail(raw.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Borrow the normalized address.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct() {
        assert_ne!(PaperId::new(), PaperId::new());
    }

    #[test]
    fn display_carries_namespace() {
        let id = Uuid::nil();
        assert_eq!(
            AttendeeId(id).to_string(),
            "attendee:00000000-0000-0000-0000-000000000000"
        );
        assert!(PaperId(id).to_string().starts_with("paper:"));
        assert!(ReviewId(id).to_string().starts_with("review:"));
    }

    #[test]
    fn id_serializes_as_bare_uuid() {
        let id = PaperId(Uuid::nil());
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"00000000-0000-0000-0000-000000000000\"");
    }

    #[test]
    fn email_is_normalized() {
        let email = EmailAddress::parse("  Ada.Lovelace@Example.ORG ").unwrap();
        assert_eq!(email.as_str(), "ada.lovelace@example.org");
    }

    #[test]
    fn email_rejects_malformed() {
        for bad in ["", "no-at-sign", "two@@example.org", "@example.org", "a@b", "a@.org", "a b@c.org"] {
            assert!(EmailAddress::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn email_deserialization_validates() {
        assert!(serde_json::from_str::<EmailAddress>("\"x@y.io\"").is_ok());
        assert!(serde_json::from_str::<EmailAddress>("\"nope\"").is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    /// Addresses of mixed case padded with spaces or tabs.
    fn padded_address() -> impl Strategy<Value = String> {
        ("[ \t]{0,3}", "[a-zA-Z0-9._+-]{1,20}", "[a-zA-Z0-9-]{1,15}", "[a-zA-Z]{2,6}", "[ \t]{0,3}")
            .prop_map(|(lead, local, host, tld, trail)| format!("{lead}{local}@{host}.{tld}{trail}"))
    }

    proptest! {
        /// Parsing stores the trimmed, lowercased form and Display echoes it.
        #[test]
        fn email_parse_normalizes(raw in padded_address()) {
            let email = EmailAddress::parse(&raw).unwrap();
            let expected = raw.trim().to_ascii_lowercase();
            prop_assert_eq!(email.as_str(), expected.as_str());
            prop_assert_eq!(email.to_string(), expected);
        }

        /// A displayed address parses back to the same value.
        #[test]
        fn email_display_parses_back(raw in padded_address()) {
            let email = EmailAddress::parse(&raw).unwrap();
            prop_assert_eq!(EmailAddress::parse(&email.to_string()).unwrap(), email);
        }

        /// Without an `@` nothing is accepted.
        #[test]
        fn email_without_at_rejected(raw in "[a-z0-9.]{1,40}") {
            prop_assert!(EmailAddress::parse(&raw).is_err());
        }
    }
}
