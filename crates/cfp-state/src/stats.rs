//! # Aggregate Statistics
//!
//! Counts and ratios over attendees, papers and reviews. Nothing here is
//! weighted; means are plain arithmetic means over scored reviews.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cfp_core::{Organization, PaperId, ReviewDecision};

use crate::attendee::Attendee;
use crate::paper::Paper;
use crate::review::Review;
use crate::timeline::{Milestone, Timeline};

/// Review progress over the whole paper set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    pub total_papers: usize,
    /// Papers with at least one review that is not `NotReviewed`.
    pub papers_reviewed: usize,
    /// `papers_reviewed / total_papers * 100`, or 0 with no papers.
    pub percent_reviewed: f64,
    pub total_reviews: usize,
    pub score_distribution: Vec<ScoreBucket>,
    pub per_paper: Vec<PaperScore>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBucket {
    pub decision: ReviewDecision,
    pub score: u8,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperScore {
    pub paper_id: PaperId,
    pub review_count: usize,
    /// Mean over scored reviews; `None` until one exists.
    pub mean_score: Option<f64>,
}

/// One point of the cumulative submissions curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionPoint {
    pub days_since_open: i64,
    pub cumulative: usize,
}

/// Headcounts for the statistics page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceStats {
    pub total_attendees: usize,
    pub registered_pending: usize,
    pub by_organization: BTreeMap<Organization, usize>,
    pub reviewers: usize,
    pub organizers: usize,
    pub speakers: usize,
    pub accepted_papers: usize,
    pub papers_by_type: BTreeMap<String, usize>,
}

pub fn review_stats<'a, P, R>(papers: P, reviews: R) -> ReviewStats
where
    P: IntoIterator<Item = &'a Paper>,
    R: IntoIterator<Item = &'a Review>,
{
    let mut paper_ids: Vec<PaperId> = papers.into_iter().map(|p| p.id).collect();
    paper_ids.sort();

    let mut counts: HashMap<ReviewDecision, usize> = HashMap::new();
    let mut by_paper: HashMap<PaperId, (usize, Vec<u8>)> = HashMap::new();
    let mut total_reviews = 0;
    for review in reviews {
        if paper_ids.binary_search(&review.paper_id).is_err() {
            continue;
        }
        total_reviews += 1;
        *counts.entry(review.decision).or_default() += 1;
        let entry = by_paper.entry(review.paper_id).or_default();
        entry.0 += 1;
        if review.decision.is_scored() {
            entry.1.push(review.score());
        }
    }

    let per_paper: Vec<PaperScore> = paper_ids
        .iter()
        .map(|id| {
            let (review_count, scores) = by_paper.get(id).cloned().unwrap_or_default();
            PaperScore {
                paper_id: *id,
                review_count,
                mean_score: mean(&scores),
            }
        })
        .collect();

    let papers_reviewed = per_paper.iter().filter(|p| p.mean_score.is_some()).count();
    let percent_reviewed = if paper_ids.is_empty() {
        0.0
    } else {
        papers_reviewed as f64 * 100.0 / paper_ids.len() as f64
    };

    ReviewStats {
        total_papers: paper_ids.len(),
        papers_reviewed,
        percent_reviewed,
        total_reviews,
        score_distribution: ReviewDecision::all()
            .iter()
            .map(|d| ScoreBucket {
                decision: *d,
                score: d.score(),
                count: counts.get(d).copied().unwrap_or(0),
            })
            .collect(),
        per_paper,
    }
}

/// Sorted days-since-open of every submission, paired with the running count.
pub fn submissions_over_time<'a, P>(papers: P, cfp_open: NaiveDate) -> Vec<SubmissionPoint>
where
    P: IntoIterator<Item = &'a Paper>,
{
    let mut days: Vec<i64> = papers
        .into_iter()
        .map(|p| p.submitted_at.days_since(cfp_open))
        .collect();
    days.sort_unstable();
    days.into_iter()
        .enumerate()
        .map(|(i, days_since_open)| SubmissionPoint {
            days_since_open,
            cumulative: i + 1,
        })
        .collect()
}

/// The date the call for papers opened.
///
/// Taken from the most recent move into `CallForPapers`, falling back to the
/// earliest submission date.
pub fn cfp_opened_on<'a, P>(timeline: &Timeline, papers: P) -> Option<NaiveDate>
where
    P: IntoIterator<Item = &'a Paper>,
{
    timeline
        .transitions()
        .iter()
        .rev()
        .find(|t| t.to_milestone == Milestone::CallForPapers)
        .map(|t| t.timestamp.date())
        .or_else(|| papers.into_iter().map(|p| p.submitted_at.date()).min())
}

/// Attendees whose name is a single word, in registration order.
pub fn single_name_attendees<'a, A>(attendees: A) -> Vec<&'a Attendee>
where
    A: IntoIterator<Item = &'a Attendee>,
{
    let mut found: Vec<&Attendee> = attendees
        .into_iter()
        .filter(|a| a.has_single_name())
        .collect();
    found.sort_by_key(|a| (a.registered_at, a.id));
    found
}

pub fn attendance_stats(attendees: &[&Attendee], papers: &[&Paper]) -> AttendanceStats {
    let mut by_organization = BTreeMap::new();
    for a in attendees.iter().filter(|a| !a.name.is_empty()) {
        *by_organization.entry(a.organization).or_insert(0) += 1;
    }
    let mut papers_by_type = BTreeMap::new();
    for p in papers {
        *papers_by_type
            .entry(p.paper_type.as_str().to_string())
            .or_insert(0) += 1;
    }
    let accepted: Vec<&Paper> = papers.iter().copied().filter(|p| p.is_accepted).collect();
    AttendanceStats {
        total_attendees: attendees.len(),
        registered_pending: attendees.iter().filter(|a| a.name.is_empty()).count(),
        by_organization,
        reviewers: attendees.iter().filter(|a| a.capabilities.is_reviewer()).count(),
        organizers: attendees.iter().filter(|a| a.capabilities.is_organizer()).count(),
        speakers: attendees
            .iter()
            .filter(|a| crate::attendee::is_speaker(a.id, accepted.iter().copied()))
            .count(),
        accepted_papers: accepted.len(),
        papers_by_type,
    }
}

fn mean(scores: &[u8]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: u32 = scores.iter().map(|s| u32::from(*s)).sum();
    Some(f64::from(sum) / scores.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendee::Registration;
    use crate::capability::{Actor, CapabilitySet};
    use crate::paper::PaperDraft;
    use crate::review::ReviewDraft;
    use crate::timeline::TimelineTransitionEvidence;
    use cfp_core::{AttendeeId, EmailAddress, PaperType, TimeZone, Timestamp};

    fn paper(submitted: &str) -> Paper {
        let mut p = Paper::submit(
            AttendeeId::new(),
            PaperDraft {
                paper_type: PaperType::Poster,
                title: "T".into(),
                abstract_text: "A".into(),
                keywords: "K".into(),
                ..Default::default()
            },
        )
        .unwrap();
        p.submitted_at = Timestamp::parse(submitted).unwrap();
        p
    }

    fn review(actor: &Actor, paper: &Paper, decision: ReviewDecision) -> Review {
        Review::create(
            actor,
            paper.id,
            ReviewDraft {
                decision,
                ..Default::default()
            },
        )
        .unwrap()
    }

    fn reviewer() -> Actor {
        Actor::new(AttendeeId::new(), CapabilitySet::from_flags(true, false))
    }

    #[test]
    fn percent_reviewed_ignores_unscored_reviews() {
        let p1 = paper("2021-04-02T00:00:00Z");
        let p2 = paper("2021-04-03T00:00:00Z");
        let p3 = paper("2021-04-04T00:00:00Z");
        let (a, b) = (reviewer(), reviewer());
        let reviews = vec![
            review(&a, &p1, ReviewDecision::Accept),
            review(&b, &p1, ReviewDecision::StrongAccept),
            review(&a, &p2, ReviewDecision::NotReviewed),
        ];
        let stats = review_stats([&p1, &p2, &p3], reviews.iter());
        assert_eq!(stats.total_papers, 3);
        assert_eq!(stats.papers_reviewed, 1);
        assert!((stats.percent_reviewed - 100.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.total_reviews, 3);

        let p1_score = stats.per_paper.iter().find(|s| s.paper_id == p1.id).unwrap();
        assert_eq!(p1_score.review_count, 2);
        assert_eq!(p1_score.mean_score, Some(3.5));
        let p2_score = stats.per_paper.iter().find(|s| s.paper_id == p2.id).unwrap();
        assert_eq!(p2_score.mean_score, None);

        let counts: Vec<usize> = stats.score_distribution.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![1, 0, 0, 1, 1]);
    }

    #[test]
    fn reviews_of_unlisted_papers_are_not_counted() {
        let kept = paper("2021-04-02T00:00:00Z");
        let gone = paper("2021-04-03T00:00:00Z");
        let a = reviewer();
        let reviews = vec![
            review(&a, &kept, ReviewDecision::Accept),
            review(&a, &gone, ReviewDecision::StrongAccept),
        ];
        let stats = review_stats([&kept], reviews.iter());
        assert_eq!(stats.total_reviews, 1);
        let per_paper_total: usize = stats.per_paper.iter().map(|s| s.review_count).sum();
        assert_eq!(per_paper_total, stats.total_reviews);
        let bucketed: usize = stats.score_distribution.iter().map(|b| b.count).sum();
        assert_eq!(bucketed, stats.total_reviews);
    }

    #[test]
    fn empty_paper_set_is_zero_percent() {
        let stats = review_stats(std::iter::empty(), std::iter::empty());
        assert_eq!(stats.percent_reviewed, 0.0);
        assert_eq!(stats.score_distribution.len(), 5);
    }

    #[test]
    fn submissions_curve_is_sorted_and_cumulative() {
        let open = NaiveDate::from_ymd_opt(2021, 4, 1).unwrap();
        let papers = [
            paper("2021-05-28T10:00:00Z"),
            paper("2021-04-01T09:00:00Z"),
            paper("2021-04-15T00:00:00Z"),
        ];
        let curve = submissions_over_time(papers.iter(), open);
        assert_eq!(
            curve,
            vec![
                SubmissionPoint { days_since_open: 0, cumulative: 1 },
                SubmissionPoint { days_since_open: 14, cumulative: 2 },
                SubmissionPoint { days_since_open: 57, cumulative: 3 },
            ]
        );
    }

    #[test]
    fn cfp_open_date_prefers_timeline() {
        let papers = [paper("2021-04-05T00:00:00Z")];
        let mut t = Timeline::new();
        assert_eq!(
            cfp_opened_on(&t, papers.iter()),
            NaiveDate::from_ymd_opt(2021, 4, 5)
        );
        t.advance(TimelineTransitionEvidence::default()).unwrap();
        assert_eq!(
            cfp_opened_on(&t, papers.iter()),
            Some(Timestamp::now().date())
        );
    }

    #[test]
    fn single_names_are_found() {
        let make = |name: &str, email: &str| {
            Attendee::register(Registration {
                email: EmailAddress::parse(email).unwrap(),
                name: name.into(),
                organization: Organization::External,
                time_zone: TimeZone::UTC,
            })
            .unwrap()
        };
        let people = [
            make("Cher", "cher@example.org"),
            make("Ada Lovelace", "ada@example.org"),
            make("", "pending@example.org"),
        ];
        let found = single_name_attendees(people.iter());
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Cher");

        let refs: Vec<&Attendee> = people.iter().collect();
        let stats = attendance_stats(&refs, &[]);
        assert_eq!(stats.total_attendees, 3);
        assert_eq!(stats.registered_pending, 1);
        assert_eq!(stats.by_organization.get(&Organization::External), Some(&2));
    }
}
