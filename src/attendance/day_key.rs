use chrono::{DateTime, Days, FixedOffset, NaiveDate, Timelike};

use super::event::{Event, Keyword};

/// Clock-outs before this hour belong to the previous day's shift.
pub const ROLLOVER_HOUR: u32 = 6;

/// Attendance day an event is counted under.
pub fn day_key(event: &Event) -> NaiveDate {
    resolve(event.keyword, &event.at)
}

pub fn resolve(keyword: Keyword, at: &DateTime<FixedOffset>) -> NaiveDate {
    let date = at.date_naive();
    if keyword == Keyword::ClockOut && at.hour() < ROLLOVER_HOUR {
        date.checked_sub_days(Days::new(1)).unwrap_or(date)
    } else {
        date
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::BEIJING;
    use chrono::TimeZone;

    fn at(d: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
        BEIJING.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn clock_out_before_six_rolls_back() {
        assert_eq!(resolve(Keyword::ClockOut, &at(4, 5, 59)), date(3));
        assert_eq!(resolve(Keyword::ClockOut, &at(4, 0, 0)), date(3));
    }

    #[test]
    fn clock_out_at_six_stays() {
        assert_eq!(resolve(Keyword::ClockOut, &at(4, 6, 0)), date(4));
    }

    #[test]
    fn clock_in_never_rolls_back() {
        assert_eq!(resolve(Keyword::ClockIn, &at(4, 1, 30)), date(4));
    }

    #[test]
    fn rollover_crosses_month_boundary() {
        assert_eq!(
            resolve(Keyword::ClockOut, &at(1, 2, 0)),
            NaiveDate::from_ymd_opt(2026, 2, 28).unwrap()
        );
    }
}
