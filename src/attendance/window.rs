use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, TimeZone};

use super::BEIJING;
use super::classify::AttendanceSummary;
use super::pairing::MAX_SHIFT_HOURS;
use super::Reconciliation;

/// One calendar month of attendance days, in Beijing time.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MonthWindow {
    pub first_day: NaiveDate,
    /// First day of the following month.
    pub next_month: NaiveDate,
}

impl MonthWindow {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(Self {
            first_day,
            next_month,
        })
    }

    /// Parses `YYYY-MM`.
    pub fn parse(month: &str) -> Option<Self> {
        let (year, month) = month.trim().split_once('-')?;
        Self::new(year.parse().ok()?, month.parse().ok()?)
    }

    pub fn containing(day: NaiveDate) -> Self {
        Self::new(day.year(), day.month()).unwrap_or(Self {
            first_day: day,
            next_month: day.succ_opt().unwrap_or(day),
        })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.first_day <= day && day < self.next_month
    }

    /// Instants worth fetching for the month.
    ///
    /// Starts early enough to see a clock-in that a first-day clock-out
    /// closes, and ends late enough to see the clock-out that closes a
    /// clock-in on the month's last evening.
    pub fn fetch_range(&self) -> Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> {
        let midnight = |day: NaiveDate| {
            BEIJING
                .from_local_datetime(&day.and_hms_opt(0, 0, 0)?)
                .single()
        };
        let start = midnight(self.first_day)? - Duration::hours(MAX_SHIFT_HOURS);
        let end = midnight(self.next_month)? + Duration::hours(MAX_SHIFT_HOURS);
        Some((start, end))
    }

    pub fn label(&self) -> String {
        self.first_day.format("%Y-%m").to_string()
    }

    /// Keeps only the month's days and recomputes the totals over them.
    pub fn restrict(&self, reconciliation: Reconciliation) -> Reconciliation {
        let records: Vec<_> = reconciliation
            .records
            .into_iter()
            .filter(|record| self.contains(record.day))
            .collect();

        let mut summary = AttendanceSummary::default();
        for record in &records {
            summary.add(record);
        }

        Reconciliation {
            records,
            summary,
            ..reconciliation
        }
    }
}
