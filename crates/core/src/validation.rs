//! Same-day segment validation. Pure logic, no database access.
//!
//! Violations are collected, never thrown: the caller receives every
//! field-tagged problem at once and maps the list to a 422-class response.
//! Checks run rule by rule in a fixed order (shape, unknown codes, midnight
//! crossing, office requirement, overlap, daily cap), so the report order is
//! stable.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::registry::RegistrySnapshot;
use crate::store::{OfficeLocation, PresenceStatus};
use crate::timezone::{crosses_midnight, minutes_between, parse_hhmm};
use crate::types::DAILY_CAP_MINUTES;

/// Longest accepted free-text note on a segment.
pub const MAX_NOTES_LEN: usize = 500;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One segment of a planning request, in local wall-clock time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentInput {
    pub status_code: String,
    #[serde(default)]
    pub office_code: Option<String>,
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A single field-level violation. `field` is a dotted/indexed path such as
/// `segments[1].officeCode`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A segment that passed every rule, with its codes resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSegment {
    pub index: usize,
    pub status: PresenceStatus,
    pub office: Option<OfficeLocation>,
    pub from: NaiveTime,
    pub to: NaiveTime,
    pub notes: Option<String>,
}

impl ValidatedSegment {
    pub fn minutes(&self) -> i64 {
        minutes_between(self.from, self.to)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Per-segment facts gathered while walking the rules.
struct Checked<'a> {
    status: Option<&'a PresenceStatus>,
    office: Option<&'a OfficeLocation>,
    times: Option<(NaiveTime, NaiveTime)>,
}

fn field(index: usize, name: &str) -> String {
    format!("segments[{index}].{name}")
}

/// Validate one day's worth of segments against the registry.
pub fn validate_segments(
    segments: &[SegmentInput],
    registry: &RegistrySnapshot,
) -> Result<Vec<ValidatedSegment>, Vec<ValidationError>> {
    let mut errors = Vec::new();

    if segments.is_empty() {
        errors.push(ValidationError::new("segments", "At least one segment is required"));
        return Err(errors);
    }

    // Shape: parseable times, bounded notes.
    let mut checked: Vec<Checked> = Vec::with_capacity(segments.len());
    for (i, seg) in segments.iter().enumerate() {
        let from = parse_hhmm(&seg.from);
        let to = parse_hhmm(&seg.to);
        if from.is_err() {
            errors.push(ValidationError::new(field(i, "from"), "Invalid time, expected HH:MM"));
        }
        if to.is_err() {
            errors.push(ValidationError::new(field(i, "to"), "Invalid time, expected HH:MM"));
        }
        if seg.notes.as_ref().is_some_and(|n| n.chars().count() > MAX_NOTES_LEN) {
            errors.push(ValidationError::new(
                field(i, "notes"),
                format!("Notes must be at most {MAX_NOTES_LEN} characters"),
            ));
        }
        checked.push(Checked {
            status: None,
            office: None,
            times: from.ok().zip(to.ok()),
        });
    }

    // Rule 1: unknown or inactive codes.
    for (i, seg) in segments.iter().enumerate() {
        checked[i].status = registry.resolve_status(&seg.status_code);
        if checked[i].status.is_none() {
            errors.push(ValidationError::new(
                field(i, "statusCode"),
                format!("Unknown status '{}'", seg.status_code),
            ));
        }
        if let Some(code) = seg.office_code.as_deref() {
            checked[i].office = registry.resolve_office(code);
            if checked[i].office.is_none() {
                errors.push(ValidationError::new(
                    field(i, "officeCode"),
                    format!("Unknown office location '{code}'"),
                ));
            }
        }
    }

    // Rule 2: midnight crossing. Crossing segments drop out of the time rules.
    for (i, seg) in segments.iter().enumerate() {
        if checked[i].times.is_some() && crosses_midnight(&seg.from, &seg.to) {
            errors.push(ValidationError::new(
                field(i, "to"),
                "Segments cannot cross midnight; split into two segments instead",
            ));
            checked[i].times = None;
        }
    }

    // Rule 3: office requirement.
    for (i, seg) in segments.iter().enumerate() {
        let requires_office = checked[i].status.is_some_and(|s| s.requires_office);
        if requires_office && seg.office_code.is_none() {
            errors.push(ValidationError::new(
                field(i, "officeCode"),
                format!("Status '{}' requires an office location", seg.status_code),
            ));
        }
    }

    // Rule 4: pairwise overlap, reported on the later segment.
    for j in 0..segments.len() {
        let Some((start_j, end_j)) = checked[j].times else {
            continue;
        };
        for i in 0..j {
            let Some((start_i, end_i)) = checked[i].times else {
                continue;
            };
            if start_i.max(start_j) < end_i.min(end_j) {
                errors.push(ValidationError::new(
                    format!("segments[{j}]"),
                    format!("Overlaps with segment {}.", i + 1),
                ));
            }
        }
    }

    // Rule 5: daily cap over the submitted segments alone.
    let total: i64 = checked
        .iter()
        .filter_map(|c| c.times)
        .map(|(from, to)| minutes_between(from, to))
        .sum();
    if total > DAILY_CAP_MINUTES {
        errors.push(ValidationError::new(
            "segments",
            format!(
                "Total scheduled time ({total} minutes) exceeds the daily cap of \
                 {DAILY_CAP_MINUTES} minutes (8 hours)"
            ),
        ));
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(segments
        .iter()
        .zip(checked)
        .enumerate()
        .filter_map(|(index, (seg, c))| {
            let (from, to) = c.times?;
            Some(ValidatedSegment {
                index,
                status: c.status?.clone(),
                office: c.office.cloned(),
                from,
                to,
                notes: seg.notes.clone(),
            })
        })
        .collect())
}
