use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate};
use derive_more::Display;
use serde::Serialize;

use super::pairing::PunchPair;
use super::shift::{ShiftLabel, ShiftTable, ShiftWindow, UNSPECIFIED_SHIFT};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// Both punches on time.
    Complete,
    /// One punch missing, the other on time.
    Partial,
    /// Late, early, or both.
    Abnormal,
    /// Back-filled; not scored.
    MakeUp,
    Empty,
}

/// Classified attendance for one day key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayRecord {
    pub day: NaiveDate,
    pub shift_name: String,
    pub is_make_up: bool,
    pub clock_in: Option<DateTime<FixedOffset>>,
    pub clock_out: Option<DateTime<FixedOffset>>,
    pub is_late: bool,
    pub is_early: bool,
    pub status: DayStatus,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AttendanceSummary {
    pub complete_count: u32,
    pub abnormal_count: u32,
    pub make_up_count: u32,
}

impl AttendanceSummary {
    /// Folds one day into the totals.
    ///
    /// Late and early on the same day count as two abnormal marks, and a
    /// clean day counts one per punch present.
    pub fn add(&mut self, record: &DayRecord) {
        if record.is_make_up {
            self.make_up_count += 1;
            return;
        }

        if record.is_late || record.is_early {
            self.abnormal_count += u32::from(record.is_late) + u32::from(record.is_early);
        } else {
            self.complete_count +=
                u32::from(record.clock_in.is_some()) + u32::from(record.clock_out.is_some());
        }
    }
}

/// A day whose shift name is not in the table; it is scored on presence only.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize)]
#[display(fmt = "unknown shift {:?} on {}", name, day)]
pub struct UnknownShift {
    pub day: NaiveDate,
    pub name: String,
}

impl std::error::Error for UnknownShift {}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Ascending by day.
    pub records: Vec<DayRecord>,
    pub summary: AttendanceSummary,
    pub unknown_shifts: Vec<UnknownShift>,
}

fn is_late(clock_in: &DateTime<FixedOffset>, window: &ShiftWindow) -> bool {
    clock_in.time() > window.start
}

fn is_early(day: NaiveDate, clock_out: &DateTime<FixedOffset>, window: &ShiftWindow) -> bool {
    let out_date = clock_out.date_naive();
    if window.crosses_midnight() {
        // an overnight shift must be closed after the date rolls over
        out_date == day
    } else {
        clock_out.time() < window.end
    }
}

pub fn classify_day(
    day: NaiveDate,
    pair: &PunchPair,
    table: &ShiftTable,
) -> (DayRecord, Option<UnknownShift>) {
    let label = pair.shift_label.as_deref().map(ShiftLabel::parse);
    let is_make_up = label.as_ref().is_some_and(|l| l.is_make_up);
    let name = label.as_ref().map(|l| l.name).filter(|n| !n.is_empty());

    let window = name.and_then(|n| table.get(n));
    let unknown = match (name, window) {
        (Some(name), None) => Some(UnknownShift {
            day,
            name: name.to_string(),
        }),
        _ => None,
    };

    let (late, early) = match window {
        Some(window) if !is_make_up => (
            pair.clock_in.as_ref().is_some_and(|t| is_late(t, window)),
            pair.clock_out
                .as_ref()
                .is_some_and(|t| is_early(day, t, window)),
        ),
        _ => (false, false),
    };

    let status = if is_make_up {
        DayStatus::MakeUp
    } else if late || early {
        DayStatus::Abnormal
    } else {
        match (pair.clock_in.is_some(), pair.clock_out.is_some()) {
            (true, true) => DayStatus::Complete,
            (false, false) => DayStatus::Empty,
            _ => DayStatus::Partial,
        }
    };

    let record = DayRecord {
        day,
        shift_name: match window {
            Some(_) => name.unwrap_or(UNSPECIFIED_SHIFT).to_string(),
            None => UNSPECIFIED_SHIFT.to_string(),
        },
        is_make_up,
        clock_in: pair.clock_in,
        clock_out: pair.clock_out,
        is_late: late,
        is_early: early,
        status,
    };

    (record, unknown)
}

/// Scores every paired day against the shift table.
pub fn classify(days: &BTreeMap<NaiveDate, PunchPair>, table: &ShiftTable) -> Classification {
    let mut out = Classification::default();

    for (day, pair) in days {
        let (record, unknown) = classify_day(*day, pair, table);
        out.summary.add(&record);
        out.records.push(record);
        out.unknown_shifts.extend(unknown);
    }

    out
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

    fn punch(
        label: Option<&str>,
        clock_in: Option<DateTime<FixedOffset>>,
        clock_out: Option<DateTime<FixedOffset>>,
    ) -> PunchPair {
        PunchPair {
            shift_label: label.map(str::to_string),
            clock_in,
            clock_out,
        }
    }

    #[test]
    fn on_time_full_day_counts_two() {
        let table = ShiftTable::default();
        let pair = punch(Some("F班"), Some(at(2, 8, 55)), Some(at(2, 21, 10)));
        let (record, unknown) = classify_day(date(2), &pair, &table);

        assert!(!record.is_late && !record.is_early);
        assert_eq!(record.status, DayStatus::Complete);
        assert_eq!(record.shift_name, "F班");
        assert!(unknown.is_none());

        let mut summary = AttendanceSummary::default();
        summary.add(&record);
        assert_eq!(summary.complete_count, 2);
    }

    #[test]
    fn exact_boundaries_are_on_time() {
        let table = ShiftTable::default();
        let pair = punch(Some("F班"), Some(at(2, 9, 0)), Some(at(2, 21, 0)));
        let (record, _) = classify_day(date(2), &pair, &table);
        assert!(!record.is_late);
        assert!(!record.is_early);
    }

    #[test]
    fn late_and_early_count_twice() {
        let table = ShiftTable::default();
        let pair = punch(Some("F班"), Some(at(2, 9, 1)), Some(at(2, 20, 59)));
        let (record, _) = classify_day(date(2), &pair, &table);
        assert!(record.is_late && record.is_early);
        assert_eq!(record.status, DayStatus::Abnormal);

        let mut summary = AttendanceSummary::default();
        summary.add(&record);
        assert_eq!(
            summary,
            AttendanceSummary {
                complete_count: 0,
                abnormal_count: 2,
                make_up_count: 0
            }
        );
    }

    #[test]
    fn overnight_shift_early_only_before_rollover() {
        let table = ShiftTable::default();

        let after = punch(Some("I班"), Some(at(3, 14, 50)), Some(at(4, 0, 10)));
        let (record, _) = classify_day(date(3), &after, &table);
        assert!(!record.is_early);

        let before = punch(Some("I班"), Some(at(3, 14, 50)), Some(at(3, 23, 40)));
        let (record, _) = classify_day(date(3), &before, &table);
        assert!(record.is_early);
    }

    #[test]
    fn day_shift_compares_clock_out_time_of_day() {
        let table = ShiftTable::default();

        // 01:00 is before G班's 22:00 end even though the date rolled over
        let pair = punch(Some("G班"), Some(at(2, 10, 0)), Some(at(3, 1, 0)));
        let (record, _) = classify_day(date(2), &pair, &table);
        assert!(record.is_early);
        assert!(!record.is_late);
        assert_eq!(record.status, DayStatus::Abnormal);

        let mut summary = AttendanceSummary::default();
        summary.add(&record);
        assert_eq!(summary.abnormal_count, 1);
        assert_eq!(summary.complete_count, 0);

        let pair = punch(Some("F班"), Some(at(2, 20, 0)), Some(at(3, 7, 0)));
        let (record, _) = classify_day(date(2), &pair, &table);
        assert!(record.is_early);
    }

    #[test]
    fn make_up_is_exempt() {
        let table = ShiftTable::default();
        let pair = punch(Some("G班（补卡）"), Some(at(2, 11, 0)), None);
        let (record, _) = classify_day(date(2), &pair, &table);
        assert!(record.is_make_up);
        assert!(!record.is_late);
        assert_eq!(record.status, DayStatus::MakeUp);
        assert_eq!(record.shift_name, "G班");

        let mut summary = AttendanceSummary::default();
        summary.add(&record);
        assert_eq!(
            summary,
            AttendanceSummary {
                complete_count: 0,
                abnormal_count: 0,
                make_up_count: 1
            }
        );
    }

    #[test]
    fn unknown_shift_scores_on_presence() {
        let table = ShiftTable::default();
        let pair = punch(Some("Z班"), Some(at(2, 23, 0)), None);
        let (record, unknown) = classify_day(date(2), &pair, &table);

        assert_eq!(record.shift_name, UNSPECIFIED_SHIFT);
        assert!(!record.is_late);
        assert_eq!(record.status, DayStatus::Partial);
        assert_eq!(
            unknown,
            Some(UnknownShift {
                day: date(2),
                name: "Z班".into()
            })
        );

        let mut summary = AttendanceSummary::default();
        summary.add(&record);
        assert_eq!(summary.complete_count, 1);
    }

    #[test]
    fn clock_out_only_day_has_no_shift() {
        let table = ShiftTable::default();
        let pair = punch(None, None, Some(at(3, 2, 0)));
        let (record, unknown) = classify_day(date(2), &pair, &table);
        assert_eq!(record.shift_name, UNSPECIFIED_SHIFT);
        assert!(unknown.is_none());
        assert_eq!(record.status, DayStatus::Partial);
    }

    #[test]
    fn classify_sums_all_days_in_order() {
        let table = ShiftTable::default();
        let mut days = BTreeMap::new();
        days.insert(date(3), punch(Some("F班"), Some(at(3, 9, 30)), None));
        days.insert(date(2), punch(Some("F班"), Some(at(2, 8, 30)), Some(at(2, 21, 0))));
        days.insert(date(4), punch(Some("F班（补卡）"), None, Some(at(4, 21, 0))));

        let out = classify(&days, &table);
        let order: Vec<_> = out.records.iter().map(|r| r.day).collect();
        assert_eq!(order, vec![date(2), date(3), date(4)]);
        assert_eq!(
            out.summary,
            AttendanceSummary {
                complete_count: 2,
                abnormal_count: 1,
                make_up_count: 1
            }
        );
    }
}
