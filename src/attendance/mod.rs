//! Attendance reconciliation.
//!
//! Raw check events for one user go in; one classified record per
//! attendance day and the window's totals come out. Everything here is pure
//! and synchronous, so it can run for many users at once without
//! coordination.

pub mod classify;
pub mod day_key;
pub mod event;
pub mod normalize;
pub mod pairing;
pub mod shift;
pub mod window;

use chrono::FixedOffset;
use derive_more::Display;
use once_cell::sync::Lazy;
use serde::Serialize;
use tracing::{debug, warn};

pub use classify::{AttendanceSummary, DayRecord, DayStatus, UnknownShift};
pub use event::{Event, Keyword, RawEvent, RawTimestamp};
pub use normalize::ParseError;
pub use shift::{ShiftLabel, ShiftTable, ShiftWindow};
pub use window::MonthWindow;

/// Reference timezone for day keys and shift hours (UTC+8).
pub static BEIJING: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(8 * 3600).expect("UTC+8 is a valid offset"));

/// Something the reconciler skipped or could not fully score.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReconcileIssue {
    #[display(fmt = "{}", _0)]
    Parse(ParseError),
    #[display(fmt = "{}", _0)]
    UnknownShift(UnknownShift),
}

impl std::error::Error for ReconcileIssue {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reconciliation {
    pub user_id: String,
    pub records: Vec<DayRecord>,
    pub summary: AttendanceSummary,
    pub issues: Vec<ReconcileIssue>,
}

/// Runs normalize, pairing and classification over one user's window.
///
/// Never fails: bad timestamps are dropped and unknown shifts are scored on
/// presence alone, each reported in `issues`.
pub fn reconcile(user_id: &str, events: Vec<RawEvent>, shifts: &ShiftTable) -> Reconciliation {
    let normalized = normalize::normalize(events);
    let days = pairing::pair(&normalized.events);
    let classified = classify::classify(&days, shifts);

    for unknown in &classified.unknown_shifts {
        warn!(user_id, day = %unknown.day, shift = %unknown.name, "Unknown shift, skipping lateness checks");
    }

    debug!(
        user_id,
        events = normalized.events.len(),
        dropped = normalized.rejected.len(),
        days = classified.records.len(),
        complete = classified.summary.complete_count,
        abnormal = classified.summary.abnormal_count,
        make_up = classified.summary.make_up_count,
        "Attendance reconciled"
    );

    let issues = normalized
        .rejected
        .into_iter()
        .map(ReconcileIssue::Parse)
        .chain(
            classified
                .unknown_shifts
                .into_iter()
                .map(ReconcileIssue::UnknownShift),
        )
        .collect();

    Reconciliation {
        user_id: user_id.to_string(),
        records: classified.records,
        summary: classified.summary,
        issues,
    }
}
