//! # Attendee Subcommand
//!
//! Capability administration by email. This is how the first organizer is
//! made when `ORGANIZER_EMAILS` was not set at signup time.

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use sqlx::PgPool;

use cfp_core::{EmailAddress, Timestamp};
use cfp_state::{Attendee, Capability};

/// Arguments for the `cfp attendee` subcommand.
#[derive(Args, Debug)]
pub struct AttendeeArgs {
    #[command(subcommand)]
    pub command: AttendeeCommand,
}

#[derive(Subcommand, Debug)]
pub enum AttendeeCommand {
    /// Show an attendee's stored profile and capabilities.
    Show {
        #[arg(long)]
        email: String,
    },

    /// Grant a capability ("reviewer" or "organizer").
    Grant {
        #[arg(long)]
        email: String,
        capability: String,
    },

    /// Revoke a capability ("reviewer" or "organizer").
    Revoke {
        #[arg(long)]
        email: String,
        capability: String,
    },
}

/// Execute the attendee subcommand.
pub async fn run_attendee(args: &AttendeeArgs, pool: &PgPool) -> Result<u8> {
    match &args.command {
        AttendeeCommand::Show { email } => {
            let attendee = load(pool, email).await?;
            println!("{}", describe(&attendee));
            Ok(0)
        }
        AttendeeCommand::Grant { email, capability } => {
            cmd_set_capability(pool, email, capability, true).await
        }
        AttendeeCommand::Revoke { email, capability } => {
            cmd_set_capability(pool, email, capability, false).await
        }
    }
}

async fn cmd_set_capability(
    pool: &PgPool,
    email: &str,
    capability: &str,
    enabled: bool,
) -> Result<u8> {
    let capability: Capability = capability.parse()?;
    let mut attendee = load(pool, email).await?;

    if !apply_capability(&mut attendee, capability, enabled)? {
        println!("OK: {} unchanged", attendee.email);
        return Ok(0);
    }

    let updated = cfp_api::db::attendees::update(pool, &attendee)
        .await
        .context("failed to update attendee")?;
    if !updated {
        bail!("attendee {} disappeared during update", attendee.email);
    }

    tracing::info!(attendee_id = %attendee.id, %capability, enabled, "capability changed from cli");
    let verb = if enabled { "granted" } else { "revoked" };
    println!("OK: {verb} {capability} for {}", attendee.email);
    Ok(0)
}

async fn load(pool: &PgPool, email: &str) -> Result<Attendee> {
    let email = EmailAddress::parse(email)?;
    cfp_api::db::attendees::find_by_email(pool, &email)
        .await
        .context("failed to look up attendee")?
        .with_context(|| format!("no attendee registered as {email}"))
}

/// Grant or revoke on the stored set. Returns whether anything changed.
pub fn apply_capability(
    attendee: &mut Attendee,
    capability: Capability,
    enabled: bool,
) -> Result<bool> {
    let changed = if enabled {
        attendee.capabilities.grant(capability)?
    } else {
        attendee.capabilities.revoke(capability)?
    };
    if changed {
        attendee.updated_at = Timestamp::now();
    }
    Ok(changed)
}

fn describe(attendee: &Attendee) -> String {
    let capabilities: Vec<&str> = attendee.capabilities.iter().map(|c| c.as_str()).collect();
    format!(
        "{}\n  id: {}\n  email: {}\n  capabilities: {}",
        attendee.display_name(),
        attendee.id,
        attendee.email,
        if capabilities.is_empty() {
            "none".to_string()
        } else {
            capabilities.join(", ")
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cfp_core::{Organization, TimeZone};
    use cfp_state::Registration;

    fn attendee() -> Attendee {
        Attendee::register(Registration {
            email: EmailAddress::parse("olga@example.org").unwrap(),
            name: "Olga Chair".to_string(),
            organization: Organization::Elsevier,
            time_zone: TimeZone::UTC,
        })
        .unwrap()
    }

    #[test]
    fn grant_then_revoke() {
        let mut a = attendee();
        assert!(apply_capability(&mut a, Capability::Organizer, true).unwrap());
        assert!(a.capabilities.is_organizer());
        assert!(!apply_capability(&mut a, Capability::Organizer, true).unwrap());
        assert!(apply_capability(&mut a, Capability::Organizer, false).unwrap());
        assert!(!a.capabilities.is_organizer());
    }

    #[test]
    fn speaker_cannot_be_granted() {
        let mut a = attendee();
        assert!(apply_capability(&mut a, Capability::Speaker, true).is_err());
    }

    #[test]
    fn describe_lists_capabilities() {
        let mut a = attendee();
        assert!(describe(&a).ends_with("capabilities: none"));
        apply_capability(&mut a, Capability::Reviewer, true).unwrap();
        assert!(describe(&a).contains("capabilities: reviewer"));
        assert!(describe(&a).starts_with("Olga Chair (Elsevier)"));
    }
}
