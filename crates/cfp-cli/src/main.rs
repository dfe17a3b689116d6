//! # cfp CLI entry point
//!
//! Parses command-line arguments, connects to `DATABASE_URL`, and
//! dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cfp_cli::attendee::{run_attendee, AttendeeArgs};
use cfp_cli::event::{run_event, EventArgs};

/// CFP portal operator CLI.
///
/// Moves the conference timeline and manages attendee capabilities
/// directly in the portal database.
#[derive(Parser, Debug)]
#[command(name = "cfp", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Conference timeline (show, advance, set).
    Event(EventArgs),

    /// Attendee capabilities (show, grant, revoke).
    Attendee(AttendeeArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let pool = match cfp_cli::connect().await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            return ExitCode::from(2);
        }
    };

    let result = match cli.command {
        Commands::Event(args) => run_event(&args, &pool).await,
        Commands::Attendee(args) => run_attendee(&args, &pool).await,
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
