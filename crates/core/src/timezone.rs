//! Local wall-clock ↔ UTC conversion for presence segments.
//!
//! Planning requests arrive as (date, `HH:MM`, zone) triples; storage is UTC.
//! Everything here is pure and DST-aware: offsets are taken for the specific
//! date being converted, never a fixed "hours from UTC".

use chrono::{Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{CoreError, CoreResult};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse an IANA timezone name such as `America/Los_Angeles`.
pub fn parse_timezone(name: &str) -> CoreResult<Tz> {
    name.parse::<Tz>()
        .map_err(|_| CoreError::Configuration(format!("Invalid timezone: '{name}'")))
}

/// Parse a `YYYY-MM-DD` calendar date.
pub fn parse_date(s: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| CoreError::Configuration(format!("Invalid date: '{s}', expected YYYY-MM-DD")))
}

/// Parse a zero-padded 24-hour `HH:MM` time.
pub fn parse_hhmm(s: &str) -> CoreResult<NaiveTime> {
    let bytes = s.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit());
    if !well_formed {
        return Err(CoreError::Configuration(format!(
            "Invalid time: '{s}', expected HH:MM"
        )));
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|_| CoreError::Configuration(format!("Invalid time: '{s}', expected HH:MM")))
}

pub fn format_hhmm(time: NaiveTime) -> String {
    time.format("%H:%M").to_string()
}

// ---------------------------------------------------------------------------
// Conversion
// ---------------------------------------------------------------------------

/// Interpret `date` + `time` as wall-clock time in `tz` and return the UTC instant.
///
/// Ambiguous times (clocks falling back) resolve to the earlier instant.
/// Times inside a spring-forward gap are shifted forward by the gap length,
/// so `02:30` on a night that jumps from 02:00 to 03:00 becomes `03:30`.
pub fn local_to_utc(date: NaiveDate, time: NaiveTime, tz: Tz) -> Timestamp {
    let naive = date.and_time(time);
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        LocalResult::None => shift_past_gap(naive, tz),
    }
}

fn shift_past_gap(naive: NaiveDateTime, tz: Tz) -> Timestamp {
    // The offset in force before the transition maps the skipped wall time
    // onto the instant the same distance after it.
    let before = tz
        .offset_from_utc_datetime(&(naive - Duration::days(1)))
        .fix()
        .local_minus_utc();
    (naive - Duration::seconds(i64::from(before))).and_utc()
}

/// String form of [`local_to_utc`]: `("2025-01-06", "09:00", "America/Los_Angeles")`.
pub fn local_to_utc_str(date: &str, time: &str, tz: &str) -> CoreResult<Timestamp> {
    let tz = parse_timezone(tz)?;
    Ok(local_to_utc(parse_date(date)?, parse_hhmm(time)?, tz))
}

/// The `HH:MM` wall-clock time of `instant` in `tz`.
pub fn utc_to_local_time(instant: Timestamp, tz: Tz) -> String {
    instant.with_timezone(&tz).format("%H:%M").to_string()
}

/// Same-day ordering check on `HH:MM` strings: true when `to` is not after
/// `from`. Equal times count as crossing, since a zero-length segment is
/// never valid. No date arithmetic is involved.
pub fn crosses_midnight(from: &str, to: &str) -> bool {
    to <= from
}

/// UTC bounds of local midnight to the next local midnight for `date`.
/// The end is exclusive. On DST days the window is 23 or 25 hours long.
pub fn local_day_window(date: NaiveDate, tz: Tz) -> (Timestamp, Timestamp) {
    let start = local_to_utc(date, NaiveTime::MIN, tz);
    let next = date.succ_opt().unwrap_or(date);
    let end = local_to_utc(next, NaiveTime::MIN, tz);
    (start, end)
}

/// Minutes from `from` to `to` on the same day (negative if reversed).
pub fn minutes_between(from: NaiveTime, to: NaiveTime) -> i64 {
    (to - from).num_minutes()
}

/// Every calendar day from `start` through `end` inclusive, one day at a time.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Today's date on the wall clock of `tz`.
pub fn local_date(instant: Timestamp, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}
