//! Command-line surface.

use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand};
use staffboard_core::types::DbId;
use staffboard_core::validation::SegmentInput;

#[derive(Debug, Parser)]
#[command(name = "staffboard", version, about = "Staff presence board and day planner")]
pub struct Cli {
    /// User id to act as. Roles are loaded from the database.
    #[arg(long, global = true)]
    pub actor: Option<DbId>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Who is where right now.
    Now {
        /// Resolve at this instant instead of the current time (RFC 3339).
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Seven-day view for a user.
    Week {
        #[arg(long)]
        user: Option<DbId>,
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
    /// Stored segments of one day with the remaining budget.
    Day {
        #[arg(long)]
        date: String,
        #[arg(long)]
        user: Option<DbId>,
    },
    /// Plan segments for a day or a daily repeat.
    Plan {
        #[arg(long)]
        date: String,
        #[arg(long)]
        repeat_until: Option<String>,
        #[arg(long)]
        user: Option<DbId>,
        /// `STATUS[@OFFICE]=HH:MM-HH:MM`, repeatable.
        #[arg(long = "segment", required = true, value_parser = parse_segment)]
        segments: Vec<SegmentInput>,
        /// Notes applied to every segment.
        #[arg(long)]
        notes: Option<String>,
    },
    /// Soft-delete a segment.
    Cancel {
        #[arg(long)]
        segment_id: DbId,
    },
    /// Audit trail of one segment, newest first.
    History {
        #[arg(long)]
        segment_id: DbId,
    },
    /// Active presence statuses.
    Statuses,
    /// Activate or retire a presence status. Admin only.
    StatusActive {
        #[arg(long)]
        code: String,
        #[arg(long, action = ArgAction::Set)]
        active: bool,
    },
    /// Active office locations.
    Offices,
}

/// Parse `AVAILABLE@NEWPORT_BEACH=09:00-17:00` or `WORKING_REMOTE=13:00-15:00`.
/// Times are passed through untouched; the validator owns their format.
pub fn parse_segment(raw: &str) -> Result<SegmentInput, String> {
    let (codes, times) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected STATUS[@OFFICE]=HH:MM-HH:MM, got '{raw}'"))?;
    let (from, to) = times
        .split_once('-')
        .ok_or_else(|| format!("expected a HH:MM-HH:MM range, got '{times}'"))?;
    let (status, office) = match codes.split_once('@') {
        Some((status, office)) => (status, Some(office)),
        None => (codes, None),
    };
    if status.trim().is_empty() {
        return Err(format!("missing status code in '{raw}'"));
    }

    Ok(SegmentInput {
        status_code: status.trim().to_uppercase(),
        office_code: office
            .map(|o| o.trim().to_uppercase())
            .filter(|o| !o.is_empty()),
        from: from.trim().to_string(),
        to: to.trim().to_string(),
        notes: None,
    })
}
