//! # Conference Timeline
//!
//! The conference moves through a fixed sequence of milestones:
//!
//! ```text
//! SIGNUP(0) ─▶ CALL_FOR_PAPERS(10) ─▶ REVIEW_PAPERS(20) ─▶ ACCEPTANCES_SENT(30)
//!   ─▶ ACCEPTANCES_CONFIRMED(40) ─▶ SCHEDULE_CREATED(50) ─▶ CONFERENCE(60)
//!   ─▶ SSRN_SUBMIT(70)
//! ```
//!
//! Exactly one milestone is current at any time. [`Timeline`] stores a
//! single `current` value, so the invariant holds by construction; the
//! database mirrors it with a partial unique index.
//!
//! Moving the current milestone is an administrative act. `advance` steps
//! forward by one. `set_current` jumps anywhere, but moving backwards must
//! be requested explicitly. Every move is recorded.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use cfp_core::{AttendeeId, Timestamp};

// ─── Milestone ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Milestone {
    Signup,
    CallForPapers,
    ReviewPapers,
    AcceptancesSent,
    AcceptancesConfirmed,
    ScheduleCreated,
    Conference,
    SsrnSubmit,
}

impl Milestone {
    /// All milestones in sequence order.
    pub fn all() -> &'static [Milestone] {
        &[
            Self::Signup,
            Self::CallForPapers,
            Self::ReviewPapers,
            Self::AcceptancesSent,
            Self::AcceptancesConfirmed,
            Self::ScheduleCreated,
            Self::Conference,
            Self::SsrnSubmit,
        ]
    }

    /// Sequence number. Gaps of ten leave room for inserted milestones.
    pub fn sequence(&self) -> i32 {
        match self {
            Self::Signup => 0,
            Self::CallForPapers => 10,
            Self::ReviewPapers => 20,
            Self::AcceptancesSent => 30,
            Self::AcceptancesConfirmed => 40,
            Self::ScheduleCreated => 50,
            Self::Conference => 60,
            Self::SsrnSubmit => 70,
        }
    }

    pub fn from_sequence(sequence: i32) -> Option<Self> {
        Self::all().iter().copied().find(|m| m.sequence() == sequence)
    }

    /// The following milestone, if any.
    pub fn next(&self) -> Option<Self> {
        let all = Self::all();
        let idx = all.iter().position(|m| m == self)?;
        all.get(idx + 1).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Signup => "signup",
            Self::CallForPapers => "call_for_papers",
            Self::ReviewPapers => "review_papers",
            Self::AcceptancesSent => "acceptances_sent",
            Self::AcceptancesConfirmed => "acceptances_confirmed",
            Self::ScheduleCreated => "schedule_created",
            Self::Conference => "conference",
            Self::SsrnSubmit => "ssrn_submit",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Signup => "Signup",
            Self::CallForPapers => "Call for papers",
            Self::ReviewPapers => "Review papers",
            Self::AcceptancesSent => "Paper acceptances sent",
            Self::AcceptancesConfirmed => "Paper acceptances confirmed",
            Self::ScheduleCreated => "Schedule created",
            Self::Conference => "Conference",
            Self::SsrnSubmit => "SSRN submit",
        }
    }
}

impl std::fmt::Display for Milestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Signup => "SIGNUP",
            Self::CallForPapers => "CALL_FOR_PAPERS",
            Self::ReviewPapers => "REVIEW_PAPERS",
            Self::AcceptancesSent => "ACCEPTANCES_SENT",
            Self::AcceptancesConfirmed => "ACCEPTANCES_CONFIRMED",
            Self::ScheduleCreated => "SCHEDULE_CREATED",
            Self::Conference => "CONFERENCE",
            Self::SsrnSubmit => "SSRN_SUBMIT",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Milestone {
    type Err = TimelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| TimelineError::UnknownMilestone(s.to_string()))
    }
}

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimelineError {
    /// `advance` was called at the last milestone.
    #[error("timeline is at its final milestone {0}")]
    AtFinalMilestone(Milestone),

    /// Backwards move without `allow_rewind`.
    #[error("moving from {from} back to {to} requires allow_rewind")]
    RewindNotAllowed { from: Milestone, to: Milestone },

    /// Target is already current.
    #[error("{0} is already the current milestone")]
    AlreadyCurrent(Milestone),

    #[error("unknown milestone: {0:?}")]
    UnknownMilestone(String),
}

// ─── Transition Records ──────────────────────────────────────────────

/// Who moved the timeline and why.
#[derive(Debug, Clone, Default)]
pub struct TimelineTransitionEvidence {
    pub reason: String,
    /// `None` for moves made from the admin CLI.
    pub actor: Option<AttendeeId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineTransitionRecord {
    pub from_milestone: Milestone,
    pub to_milestone: Milestone,
    pub timestamp: Timestamp,
    pub actor: Option<AttendeeId>,
    pub reason: String,
}

/// One row of the rendered timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneEntry {
    pub milestone: Milestone,
    pub sequence: i32,
    pub label: String,
    pub is_current: bool,
}

// ─── Timeline ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeline {
    current: Milestone,
    transitions: Vec<TimelineTransitionRecord>,
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Timeline {
    /// A fresh timeline at `Signup`.
    pub fn new() -> Self {
        Self {
            current: Milestone::Signup,
            transitions: Vec::new(),
        }
    }

    /// Rebuild from persisted state.
    pub fn restore(current: Milestone, transitions: Vec<TimelineTransitionRecord>) -> Self {
        Self {
            current,
            transitions,
        }
    }

    pub fn current(&self) -> Milestone {
        self.current
    }

    pub fn transitions(&self) -> &[TimelineTransitionRecord] {
        &self.transitions
    }

    /// Every milestone with exactly one flagged current.
    pub fn entries(&self) -> Vec<MilestoneEntry> {
        Milestone::all()
            .iter()
            .map(|m| MilestoneEntry {
                milestone: *m,
                sequence: m.sequence(),
                label: m.label().to_string(),
                is_current: *m == self.current,
            })
            .collect()
    }

    /// Whether `milestone` has been reached.
    pub fn has_reached(&self, milestone: Milestone) -> bool {
        self.current >= milestone
    }

    /// Step to the next milestone.
    pub fn advance(
        &mut self,
        evidence: TimelineTransitionEvidence,
    ) -> Result<&TimelineTransitionRecord, TimelineError> {
        let next = self
            .current
            .next()
            .ok_or(TimelineError::AtFinalMilestone(self.current))?;
        Ok(self.do_transition(next, evidence))
    }

    /// Jump to `target`. Moving backwards needs `allow_rewind`.
    pub fn set_current(
        &mut self,
        target: Milestone,
        allow_rewind: bool,
        evidence: TimelineTransitionEvidence,
    ) -> Result<&TimelineTransitionRecord, TimelineError> {
        if target == self.current {
            return Err(TimelineError::AlreadyCurrent(target));
        }
        if target < self.current && !allow_rewind {
            return Err(TimelineError::RewindNotAllowed {
                from: self.current,
                to: target,
            });
        }
        Ok(self.do_transition(target, evidence))
    }

    fn do_transition(
        &mut self,
        to: Milestone,
        evidence: TimelineTransitionEvidence,
    ) -> &TimelineTransitionRecord {
        self.transitions.push(TimelineTransitionRecord {
            from_milestone: self.current,
            to_milestone: to,
            timestamp: Timestamp::now(),
            actor: evidence.actor,
            reason: evidence.reason,
        });
        self.current = to;
        &self.transitions[self.transitions.len() - 1]
    }
}

// ─── Dashboard Sections ──────────────────────────────────────────────

/// Parts of the dashboard that open and close with the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DashboardSection {
    Profile,
    SubmitPaper,
    MyPapers,
    Reviews,
    Acceptances,
    SpeakerBio,
    Schedule,
    Presentations,
}

impl DashboardSection {
    pub fn all() -> &'static [DashboardSection] {
        &[
            Self::Profile,
            Self::SubmitPaper,
            Self::MyPapers,
            Self::Reviews,
            Self::Acceptances,
            Self::SpeakerBio,
            Self::Schedule,
            Self::Presentations,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::SubmitPaper => "submit_paper",
            Self::MyPapers => "my_papers",
            Self::Reviews => "reviews",
            Self::Acceptances => "acceptances",
            Self::SpeakerBio => "speaker_bio",
            Self::Schedule => "schedule",
            Self::Presentations => "presentations",
        }
    }

    /// Whether the section is shown while `current` is the current milestone.
    pub fn is_open_at(&self, current: Milestone) -> bool {
        use Milestone::*;
        match self {
            Self::Profile => true,
            Self::SubmitPaper => current == CallForPapers,
            Self::MyPapers => current >= CallForPapers,
            Self::Reviews => (ReviewPapers..=AcceptancesSent).contains(&current),
            Self::Acceptances => current >= AcceptancesSent,
            Self::SpeakerBio => current >= AcceptancesSent,
            Self::Schedule => current >= ScheduleCreated,
            Self::Presentations => current >= Conference,
        }
    }
}

/// Sections shown for `current`, in display order.
pub fn open_sections(current: Milestone) -> Vec<DashboardSection> {
    DashboardSection::all()
        .iter()
        .copied()
        .filter(|s| s.is_open_at(current))
        .collect()
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn evidence(reason: &str) -> TimelineTransitionEvidence {
        TimelineTransitionEvidence {
            reason: reason.to_string(),
            actor: Some(AttendeeId::new()),
        }
    }

    fn current_count(timeline: &Timeline) -> usize {
        timeline.entries().iter().filter(|e| e.is_current).count()
    }

    #[test]
    fn starts_at_signup() {
        let t = Timeline::new();
        assert_eq!(t.current(), Milestone::Signup);
        assert_eq!(current_count(&t), 1);
        assert_eq!(t.entries().len(), 8);
    }

    #[test]
    fn sequences_match_reference_data() {
        let seqs: Vec<i32> = Milestone::all().iter().map(|m| m.sequence()).collect();
        assert_eq!(seqs, vec![0, 10, 20, 30, 40, 50, 60, 70]);
        assert_eq!(Milestone::from_sequence(30), Some(Milestone::AcceptancesSent));
        assert_eq!(Milestone::from_sequence(35), None);
        assert_eq!(Milestone::AcceptancesSent.label(), "Paper acceptances sent");
    }

    #[test]
    fn advance_walks_the_sequence_and_stops() {
        let mut t = Timeline::new();
        for _ in 1..Milestone::all().len() {
            t.advance(evidence("next")).unwrap();
        }
        assert_eq!(t.current(), Milestone::SsrnSubmit);
        assert_eq!(
            t.advance(evidence("past the end")),
            Err(TimelineError::AtFinalMilestone(Milestone::SsrnSubmit))
        );
        assert_eq!(t.transitions().len(), 7);
    }

    #[test]
    fn rewind_requires_flag() {
        let mut t = Timeline::new();
        t.set_current(Milestone::ReviewPapers, false, evidence("skip"))
            .unwrap();
        assert_eq!(
            t.set_current(Milestone::CallForPapers, false, evidence("oops")),
            Err(TimelineError::RewindNotAllowed {
                from: Milestone::ReviewPapers,
                to: Milestone::CallForPapers
            })
        );
        let record = t
            .set_current(Milestone::CallForPapers, true, evidence("extend cfp"))
            .unwrap();
        assert_eq!(record.from_milestone, Milestone::ReviewPapers);
        assert_eq!(record.reason, "extend cfp");
        assert_eq!(t.current(), Milestone::CallForPapers);
    }

    #[test]
    fn setting_current_to_itself_is_rejected() {
        let mut t = Timeline::new();
        assert_eq!(
            t.set_current(Milestone::Signup, true, evidence("noop")),
            Err(TimelineError::AlreadyCurrent(Milestone::Signup))
        );
        assert!(t.transitions().is_empty());
    }

    #[test]
    fn milestone_names_parse() {
        assert_eq!("conference".parse::<Milestone>().unwrap(), Milestone::Conference);
        assert!("party".parse::<Milestone>().is_err());
        assert_eq!(Milestone::CallForPapers.to_string(), "CALL_FOR_PAPERS");
    }

    #[test]
    fn sections_follow_the_timeline() {
        assert_eq!(open_sections(Milestone::Signup), vec![DashboardSection::Profile]);
        assert!(open_sections(Milestone::CallForPapers).contains(&DashboardSection::SubmitPaper));
        assert!(!open_sections(Milestone::ReviewPapers).contains(&DashboardSection::SubmitPaper));
        assert!(open_sections(Milestone::ReviewPapers).contains(&DashboardSection::Reviews));
        assert!(!open_sections(Milestone::Conference).contains(&DashboardSection::Reviews));
        assert!(open_sections(Milestone::Conference).contains(&DashboardSection::Presentations));
    }

    #[derive(Debug, Clone)]
    enum Op {
        Advance,
        Set(usize, bool),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Advance),
            (0..Milestone::all().len(), any::<bool>()).prop_map(|(i, r)| Op::Set(i, r)),
        ]
    }

    proptest! {
        #[test]
        fn exactly_one_current_after_any_moves(ops in proptest::collection::vec(op(), 0..40)) {
            let mut t = Timeline::new();
            let mut expected_log = 0;
            for op in ops {
                let before = t.current();
                let result = match op {
                    Op::Advance => t.advance(evidence("advance")).map(|r| r.to_milestone),
                    Op::Set(i, rewind) => t
                        .set_current(Milestone::all()[i], rewind, evidence("set"))
                        .map(|r| r.to_milestone),
                };
                match result {
                    Ok(to) => {
                        expected_log += 1;
                        prop_assert_eq!(t.current(), to);
                    }
                    Err(_) => prop_assert_eq!(t.current(), before),
                }
                prop_assert_eq!(current_count(&t), 1);
            }
            prop_assert_eq!(t.transitions().len(), expected_log);
        }
    }
}
