//! # Reference Catalogs
//!
//! The fixed lookup tables of the conference: organizations, display time
//! zones, paper types, paper themes, review decisions and rejection
//! reasons. Each is a single enum used everywhere in the workspace, so a
//! new entry is a compile error in every `match` that forgot it.
//!
//! String identifiers (`as_str`) are the values stored in the database
//! and exchanged over the API. Labels (`label`) are for humans.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CfpError;

fn unknown(catalog: &'static str, value: &str) -> CfpError {
    CfpError::UnknownCatalogEntry {
        catalog,
        value: value.to_string(),
    }
}

// ─── Organization ────────────────────────────────────────────────────

/// The organization an attendee belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Organization {
    LexisNexis,
    Elsevier,
    Exhibitions,
    Relx,
    External,
}

impl Organization {
    /// All organizations in display order.
    pub fn all() -> &'static [Organization] {
        &[
            Self::LexisNexis,
            Self::Elsevier,
            Self::Exhibitions,
            Self::Relx,
            Self::External,
        ]
    }

    /// Stable identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LexisNexis => "lexis_nexis",
            Self::Elsevier => "elsevier",
            Self::Exhibitions => "exhibitions",
            Self::Relx => "relx",
            Self::External => "external",
        }
    }

    /// Human-readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::LexisNexis => "LexisNexis",
            Self::Elsevier => "Elsevier",
            Self::Exhibitions => "Exhibitions",
            Self::Relx => "RELX",
            Self::External => "External",
        }
    }
}

impl std::fmt::Display for Organization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Organization {
    type Err = CfpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|o| o.as_str() == s)
            .ok_or_else(|| unknown("organization", s))
    }
}

// ─── Time Zone ───────────────────────────────────────────────────────

/// A whole-hour UTC offset in `-12..=11`, used only for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeZone(i8);

impl TimeZone {
    /// Smallest supported offset.
    pub const MIN_OFFSET: i8 = -12;
    /// Largest supported offset.
    pub const MAX_OFFSET: i8 = 11;
    /// `UTC+0`.
    pub const UTC: TimeZone = TimeZone(0);

    /// Construct from an hour offset.
    pub fn from_offset(hours: i8) -> Result<Self, CfpError> {
        if (Self::MIN_OFFSET..=Self::MAX_OFFSET).contains(&hours) {
            Ok(Self(hours))
        } else {
            Err(unknown("time zone", &hours.to_string()))
        }
    }

    /// Offset from UTC in hours.
    pub fn offset_hours(&self) -> i8 {
        self.0
    }

    /// All supported zones, west to east.
    pub fn all() -> Vec<TimeZone> {
        (Self::MIN_OFFSET..=Self::MAX_OFFSET).map(TimeZone).collect()
    }

    /// Label in the form `UTC+5`, `UTC-3`, `UTC+0`.
    pub fn label(&self) -> String {
        format!("UTC{:+}", self.0)
    }
}

impl Default for TimeZone {
    fn default() -> Self {
        Self::UTC
    }
}

impl std::fmt::Display for TimeZone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for TimeZone {
    type Err = CfpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hours = s
            .strip_prefix("UTC")
            .and_then(|rest| rest.parse::<i8>().ok())
            .ok_or_else(|| unknown("time zone", s))?;
        Self::from_offset(hours).map_err(|_| unknown("time zone", s))
    }
}

impl TryFrom<String> for TimeZone {
    type Error = CfpError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TimeZone> for String {
    fn from(tz: TimeZone) -> Self {
        tz.label()
    }
}

// ─── Paper Type ──────────────────────────────────────────────────────

/// The submission format of a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperType {
    #[default]
    LongForm,
    ShortForm,
    Workshop,
    Poster,
}

impl PaperType {
    pub fn all() -> &'static [PaperType] {
        &[Self::LongForm, Self::ShortForm, Self::Workshop, Self::Poster]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LongForm => "long_form",
            Self::ShortForm => "short_form",
            Self::Workshop => "workshop",
            Self::Poster => "poster",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LongForm => "Long Form",
            Self::ShortForm => "Short Form",
            Self::Workshop => "Workshop",
            Self::Poster => "Poster",
        }
    }
}

impl std::fmt::Display for PaperType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaperType {
    type Err = CfpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| unknown("paper type", s))
    }
}

// ─── Paper Theme ─────────────────────────────────────────────────────

/// Topic areas a paper can be filed under. A paper carries a set of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaperTheme {
    /// Search Algorithms (Text / Boolean).
    TextSearch,
    /// Search Algorithms (Semantic / Entity based).
    SemanticSearch,
    /// Search Algorithms (ML based).
    MlSearch,
    /// Query Context / Understanding.
    QueryUnderstanding,
    /// Search Result Measurement & Evaluation.
    Evaluation,
    /// Techniques applied to Search.
    AppliedTechniques,
    /// Search Infrastructure.
    Infrastructure,
}

impl PaperTheme {
    pub fn all() -> &'static [PaperTheme] {
        &[
            Self::TextSearch,
            Self::SemanticSearch,
            Self::MlSearch,
            Self::QueryUnderstanding,
            Self::Evaluation,
            Self::AppliedTechniques,
            Self::Infrastructure,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextSearch => "text_search",
            Self::SemanticSearch => "semantic_search",
            Self::MlSearch => "ml_search",
            Self::QueryUnderstanding => "query_understanding",
            Self::Evaluation => "evaluation",
            Self::AppliedTechniques => "applied_techniques",
            Self::Infrastructure => "infrastructure",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::TextSearch => "Search Algorithms (Text / Boolean)",
            Self::SemanticSearch => "Search Algorithms (Semantic / Entity based)",
            Self::MlSearch => "Search Algorithms (ML based)",
            Self::QueryUnderstanding => "Query Context / Understanding",
            Self::Evaluation => "Search Result Measurement & Evaluation",
            Self::AppliedTechniques => "Techniques applied to Search",
            Self::Infrastructure => "Search Infrastructure",
        }
    }
}

impl std::fmt::Display for PaperTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for PaperTheme {
    type Err = CfpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| unknown("paper theme", s))
    }
}

// ─── Review Decision ─────────────────────────────────────────────────

/// A reviewer's verdict. Each decision carries a score on a 0–4 scale;
/// higher is more favourable and 0 means the review is still open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    #[default]
    NotReviewed,
    Reject,
    MaybeAccept,
    Accept,
    StrongAccept,
}

/// Highest score a decision can carry.
pub const MAX_REVIEW_SCORE: u8 = 4;

impl ReviewDecision {
    /// All decisions in ascending score order.
    pub fn all() -> &'static [ReviewDecision] {
        &[
            Self::NotReviewed,
            Self::Reject,
            Self::MaybeAccept,
            Self::Accept,
            Self::StrongAccept,
        ]
    }

    /// Numeric score, `0..=4`.
    pub fn score(&self) -> u8 {
        match self {
            Self::NotReviewed => 0,
            Self::Reject => 1,
            Self::MaybeAccept => 2,
            Self::Accept => 3,
            Self::StrongAccept => 4,
        }
    }

    /// Inverse of [`ReviewDecision::score`].
    pub fn from_score(score: u8) -> Result<Self, CfpError> {
        Self::all()
            .iter()
            .copied()
            .find(|d| d.score() == score)
            .ok_or_else(|| unknown("review score", &score.to_string()))
    }

    /// Whether the reviewer has actually made a call.
    pub fn is_scored(&self) -> bool {
        !matches!(self, Self::NotReviewed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotReviewed => "not_reviewed",
            Self::Reject => "reject",
            Self::MaybeAccept => "maybe_accept",
            Self::Accept => "accept",
            Self::StrongAccept => "strong_accept",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NotReviewed => "Not Reviewed",
            Self::Reject => "Reject",
            Self::MaybeAccept => "Maybe Accept",
            Self::Accept => "Accept",
            Self::StrongAccept => "Strong Accept",
        }
    }
}

impl std::fmt::Display for ReviewDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReviewDecision {
    type Err = CfpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| unknown("review decision", s))
    }
}

// ─── Rejection Reason ────────────────────────────────────────────────

/// Why a reviewer recommends against the submitted format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    ConsiderShortForm,
    ConsiderWorkshop,
    ConsiderPoster,
    Other,
}

impl RejectionReason {
    pub fn all() -> &'static [RejectionReason] {
        &[
            Self::ConsiderShortForm,
            Self::ConsiderWorkshop,
            Self::ConsiderPoster,
            Self::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsiderShortForm => "consider_short_form",
            Self::ConsiderWorkshop => "consider_workshop",
            Self::ConsiderPoster => "consider_poster",
            Self::Other => "other",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ConsiderShortForm => "Consider Short Form",
            Self::ConsiderWorkshop => "Consider Workshop",
            Self::ConsiderPoster => "Consider Poster",
            Self::Other => "Other",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for RejectionReason {
    type Err = CfpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| unknown("rejection reason", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn organization_ids_roundtrip() {
        for org in Organization::all() {
            assert_eq!(org.as_str().parse::<Organization>().unwrap(), *org);
            let json = serde_json::to_string(org).unwrap();
            assert_eq!(json, format!("\"{}\"", org.as_str()));
        }
    }

    #[test]
    fn time_zone_labels_match_reference_data() {
        let labels: Vec<String> = TimeZone::all().iter().map(TimeZone::label).collect();
        assert_eq!(labels.len(), 24);
        assert_eq!(labels.first().map(String::as_str), Some("UTC-12"));
        assert_eq!(labels.last().map(String::as_str), Some("UTC+11"));
        assert!(labels.contains(&"UTC+0".to_string()));
    }

    #[test]
    fn time_zone_parse_and_bounds() {
        assert_eq!("UTC-5".parse::<TimeZone>().unwrap().offset_hours(), -5);
        assert_eq!("UTC+0".parse::<TimeZone>().unwrap(), TimeZone::UTC);
        assert!("UTC+12".parse::<TimeZone>().is_err());
        assert!("GMT+1".parse::<TimeZone>().is_err());
        assert!(TimeZone::from_offset(-13).is_err());
    }

    #[test]
    fn time_zone_serializes_as_label() {
        let tz = TimeZone::from_offset(5).unwrap();
        assert_eq!(serde_json::to_string(&tz).unwrap(), "\"UTC+5\"");
        let back: TimeZone = serde_json::from_str("\"UTC+5\"").unwrap();
        assert_eq!(back, tz);
    }

    #[test]
    fn review_scores_are_zero_to_four() {
        let scores: Vec<u8> = ReviewDecision::all().iter().map(|d| d.score()).collect();
        assert_eq!(scores, vec![0, 1, 2, 3, 4]);
        assert_eq!(ReviewDecision::from_score(4).unwrap(), ReviewDecision::StrongAccept);
        assert!(ReviewDecision::from_score(MAX_REVIEW_SCORE + 1).is_err());
    }

    #[test]
    fn only_not_reviewed_is_unscored() {
        for d in ReviewDecision::all() {
            assert_eq!(d.is_scored(), *d != ReviewDecision::NotReviewed);
        }
    }

    #[test]
    fn unknown_entries_name_their_catalog() {
        let err = "keynote".parse::<PaperType>().unwrap_err();
        assert!(err.to_string().contains("paper type"));
        let err = "quantum".parse::<PaperTheme>().unwrap_err();
        assert!(err.to_string().contains("paper theme"));
        assert!("nope".parse::<RejectionReason>().is_err());
        assert!("meh".parse::<ReviewDecision>().is_err());
    }

    #[test]
    fn theme_labels_are_distinct() {
        let mut seen = std::collections::HashSet::new();
        for t in PaperTheme::all() {
            assert!(seen.insert(t.label()));
            assert_eq!(t.as_str().parse::<PaperTheme>().unwrap(), *t);
        }
        assert_eq!(seen.len(), 7);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Every supported offset's label parses back to the same zone.
        #[test]
        fn time_zone_label_parses_back(hours in TimeZone::MIN_OFFSET..=TimeZone::MAX_OFFSET) {
            let zone = TimeZone::from_offset(hours).unwrap();
            prop_assert_eq!(zone.offset_hours(), hours);
            prop_assert_eq!(zone.to_string().parse::<TimeZone>().unwrap(), zone);
        }

        /// Offsets outside the supported range are refused both ways in.
        #[test]
        fn time_zone_out_of_range_rejected(hours in any::<i8>()) {
            prop_assume!(!(TimeZone::MIN_OFFSET..=TimeZone::MAX_OFFSET).contains(&hours));
            prop_assert!(TimeZone::from_offset(hours).is_err());
            let input = format!("UTC{hours:+}");
            prop_assert!(input.parse::<TimeZone>().is_err());
        }
    }
}
