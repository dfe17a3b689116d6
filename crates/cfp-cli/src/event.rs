//! # Event Subcommand
//!
//! Timeline management from the command line. Moves made here carry no
//! actor in the transition log.
//!
//! ## Subcommands
//!
//! - `show` — Print every milestone with the current one marked.
//! - `advance` — Step to the next milestone.
//! - `set` — Jump to a named milestone (`--allow-rewind` to go back).

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use sqlx::PgPool;

use cfp_state::{Milestone, Timeline, TimelineTransitionEvidence};

/// Arguments for the `cfp event` subcommand.
#[derive(Args, Debug)]
pub struct EventArgs {
    #[command(subcommand)]
    pub command: EventCommand,
}

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Show the timeline.
    Show {
        /// Also print the transition log.
        #[arg(long)]
        history: bool,
    },

    /// Advance to the next milestone.
    Advance {
        /// Reason recorded in the transition log.
        #[arg(long, default_value = "")]
        reason: String,
    },

    /// Make a milestone current.
    Set {
        /// Milestone key, e.g. "call_for_papers".
        milestone: String,
        /// Permit moving to an earlier milestone.
        #[arg(long)]
        allow_rewind: bool,
        /// Reason recorded in the transition log.
        #[arg(long, default_value = "")]
        reason: String,
    },
}

/// Execute the event subcommand.
pub async fn run_event(args: &EventArgs, pool: &PgPool) -> Result<u8> {
    let mut timeline = cfp_api::db::events::load_timeline(pool)
        .await
        .context("failed to load timeline")?;

    match &args.command {
        EventCommand::Show { history } => {
            print!("{}", render_timeline(&timeline, *history));
            Ok(0)
        }

        EventCommand::Advance { reason } => {
            let record = timeline
                .advance(cli_evidence(reason))
                .context("cannot advance timeline")?
                .clone();
            cfp_api::db::events::record_transition(pool, &record)
                .await
                .context("failed to record transition")?;
            println!(
                "OK: {} -> {}",
                record.from_milestone.as_str(),
                record.to_milestone.as_str()
            );
            Ok(0)
        }

        EventCommand::Set {
            milestone,
            allow_rewind,
            reason,
        } => {
            let target: Milestone = milestone.parse()?;
            let record = timeline
                .set_current(target, *allow_rewind, cli_evidence(reason))
                .with_context(|| format!("cannot move timeline to {target}"))?
                .clone();
            cfp_api::db::events::record_transition(pool, &record)
                .await
                .context("failed to record transition")?;
            println!(
                "OK: {} -> {}",
                record.from_milestone.as_str(),
                record.to_milestone.as_str()
            );
            Ok(0)
        }
    }
}

fn cli_evidence(reason: &str) -> TimelineTransitionEvidence {
    TimelineTransitionEvidence {
        reason: reason.to_string(),
        actor: None,
    }
}

/// One line per milestone, `*` marking the current one.
pub fn render_timeline(timeline: &Timeline, history: bool) -> String {
    let mut out = String::new();
    for entry in timeline.entries() {
        let marker = if entry.is_current { '*' } else { ' ' };
        out.push_str(&format!(
            "{marker} {:>2}  {:<20} {}\n",
            entry.sequence,
            entry.milestone.as_str(),
            entry.label
        ));
    }
    if history {
        for t in timeline.transitions() {
            let actor = t
                .actor
                .map(|a| a.to_string())
                .unwrap_or_else(|| "cli".to_string());
            out.push_str(&format!(
                "{}  {} -> {}  by {actor}  {}\n",
                t.timestamp,
                t.from_milestone.as_str(),
                t.to_milestone.as_str(),
                t.reason
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(subcommand)]
        command: EventCommand,
    }

    #[test]
    fn render_marks_exactly_one_current() {
        let timeline = Timeline::new();
        let rendered = render_timeline(&timeline, false);
        let current: Vec<&str> = rendered.lines().filter(|l| l.starts_with('*')).collect();
        assert_eq!(current.len(), 1);
        assert!(current[0].contains("signup"));
        assert_eq!(rendered.lines().count(), Milestone::all().len());
    }

    #[test]
    fn render_history_shows_cli_moves() {
        let mut timeline = Timeline::new();
        timeline.advance(cli_evidence("open CFP")).unwrap();
        let rendered = render_timeline(&timeline, true);
        assert!(rendered.contains("signup -> call_for_papers  by cli  open CFP"));
    }

    #[test]
    fn parse_set_with_rewind() {
        let cli = TestCli::parse_from(["cfp", "set", "signup", "--allow-rewind", "--reason", "redo"]);
        match cli.command {
            EventCommand::Set {
                milestone,
                allow_rewind,
                reason,
            } => {
                assert_eq!(milestone, "signup");
                assert!(allow_rewind);
                assert_eq!(reason, "redo");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_advance_defaults_reason() {
        let cli = TestCli::parse_from(["cfp", "advance"]);
        assert!(matches!(cli.command, EventCommand::Advance { reason } if reason.is_empty()));
    }
}
