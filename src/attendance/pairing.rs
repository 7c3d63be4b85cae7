use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use serde::Serialize;

use super::day_key::day_key;
use super::event::{Event, Keyword};

/// Longest gap accepted between a clock-in and the clock-out closing it.
pub const MAX_SHIFT_HOURS: i64 = 12;

/// Punches collected for one attendance day.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PunchPair {
    /// `None` for a day that only has a clock-out.
    pub shift_label: Option<String>,
    pub clock_in: Option<DateTime<FixedOffset>>,
    pub clock_out: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum PunchState {
    Unseen,
    PartiallyPunched,
    FullyPunched,
}

impl PunchPair {
    pub fn state(&self) -> PunchState {
        match (self.clock_in.is_some(), self.clock_out.is_some()) {
            (true, true) => PunchState::FullyPunched,
            (false, false) => PunchState::Unseen,
            _ => PunchState::PartiallyPunched,
        }
    }
}

#[derive(Debug, Copy, Clone)]
struct OpenClockIn {
    day: NaiveDate,
    at: DateTime<FixedOffset>,
}

#[derive(Default)]
struct Carry<'a> {
    days: BTreeMap<NaiveDate, PunchPair>,
    open: Option<OpenClockIn>,
    /// Clock-outs at the open clock-in's exact instant. Dropped if a later
    /// clock-out closes the pair, otherwise recorded on their own.
    skipped: Vec<&'a Event>,
}

impl<'a> Carry<'a> {
    fn step(mut self, event: &'a Event) -> Self {
        match event.keyword {
            Keyword::ClockIn => {
                self.close_unmatched();
                let day = day_key(event);
                // re-punch: the latest clock-in and label for a day win
                let pair = self.days.entry(day).or_default();
                pair.shift_label = Some(event.shift_label.clone());
                pair.clock_in = Some(event.at);
                self.open = Some(OpenClockIn { day, at: event.at });
            }
            Keyword::ClockOut => match self.open {
                Some(open) => {
                    let gap = event.at - open.at;
                    if gap <= Duration::zero() {
                        self.skipped.push(event);
                    } else if gap <= Duration::hours(MAX_SHIFT_HOURS) {
                        if let Some(pair) = self.days.get_mut(&open.day) {
                            pair.clock_out = Some(event.at);
                        }
                        self.open = None;
                        self.skipped.clear();
                    } else {
                        self.close_unmatched();
                        self.record_lone_clock_out(event);
                    }
                }
                None => self.record_lone_clock_out(event),
            },
        }
        self
    }

    fn close_unmatched(&mut self) {
        self.open = None;
        for event in std::mem::take(&mut self.skipped) {
            self.record_lone_clock_out(event);
        }
    }

    /// First clock-out wins; the day keeps whatever shift it already had.
    fn record_lone_clock_out(&mut self, event: &Event) {
        let pair = self.days.entry(day_key(event)).or_default();
        if pair.clock_out.is_none() {
            pair.clock_out = Some(event.at);
        }
    }
}

/// Groups sorted events into one punch pair per attendance day.
///
/// `events` must already be sorted ascending by instant.
pub fn pair(events: &[Event]) -> BTreeMap<NaiveDate, PunchPair> {
    let mut carry = events.iter().fold(Carry::default(), Carry::step);
    carry.close_unmatched();
    carry.days
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::BEIJING;
    use chrono::TimeZone;

    fn ev(d: u32, h: u32, m: u32, keyword: Keyword, label: &str) -> Event {
        Event {
            at: BEIJING.with_ymd_and_hms(2026, 3, d, h, m, 0).unwrap(),
            keyword,
            shift_label: label.to_string(),
        }
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[test]
    fn simple_day_pairs_up() {
        let events = vec![
            ev(2, 8, 55, Keyword::ClockIn, "F班"),
            ev(2, 21, 10, Keyword::ClockOut, "F班"),
        ];
        let days = pair(&events);
        let mon = &days[&date(2)];
        assert_eq!(mon.shift_label.as_deref(), Some("F班"));
        assert_eq!(mon.clock_out, Some(events[1].at));
        assert_eq!(mon.state(), PunchState::FullyPunched);
    }

    #[test]
    fn overnight_pair_stays_on_clock_in_day() {
        let events = vec![
            ev(3, 23, 50, Keyword::ClockIn, "I班"),
            ev(4, 0, 10, Keyword::ClockOut, "I班"),
        ];
        let days = pair(&events);
        assert_eq!(days.len(), 1);
        assert_eq!(days[&date(3)].clock_out, Some(events[1].at));
    }

    #[test]
    fn first_clock_out_in_window_wins() {
        let events = vec![
            ev(2, 9, 0, Keyword::ClockIn, "F班"),
            ev(2, 18, 0, Keyword::ClockOut, "F班"),
            ev(2, 21, 0, Keyword::ClockOut, "F班"),
        ];
        let days = pair(&events);
        assert_eq!(days.len(), 1);
        assert_eq!(days[&date(2)].clock_out, Some(events[1].at));
    }

    #[test]
    fn clock_out_beyond_window_is_recorded_alone() {
        let events = vec![
            ev(2, 8, 0, Keyword::ClockIn, "F班"),
            ev(3, 9, 0, Keyword::ClockOut, "F班"),
        ];
        let days = pair(&events);
        assert_eq!(days[&date(2)].clock_out, None);
        assert_eq!(days[&date(2)].state(), PunchState::PartiallyPunched);

        let lone = &days[&date(3)];
        assert_eq!(lone.shift_label, None);
        assert_eq!(lone.clock_in, None);
        assert_eq!(lone.clock_out, Some(events[1].at));
    }

    #[test]
    fn clock_out_without_clock_in() {
        let events = vec![ev(4, 3, 0, Keyword::ClockOut, "I班")];
        let days = pair(&events);
        assert_eq!(days[&date(3)].clock_out, Some(events[0].at));
        assert_eq!(days[&date(3)].shift_label, None);
    }

    #[test]
    fn two_clock_ins_in_a_row_last_write_wins() {
        let events = vec![
            ev(2, 8, 50, Keyword::ClockIn, "F班"),
            ev(2, 9, 40, Keyword::ClockIn, "G班"),
            ev(2, 22, 5, Keyword::ClockOut, "G班"),
        ];
        let days = pair(&events);
        let day = &days[&date(2)];
        assert_eq!(day.shift_label.as_deref(), Some("G班"));
        assert_eq!(day.clock_in, Some(events[1].at));
        assert_eq!(day.clock_out, Some(events[2].at));
    }

    #[test]
    fn re_punch_after_pair_keeps_clock_out() {
        let events = vec![
            ev(2, 9, 0, Keyword::ClockIn, "F班"),
            ev(2, 21, 0, Keyword::ClockOut, "F班"),
            ev(2, 22, 0, Keyword::ClockIn, "G班"),
        ];
        let days = pair(&events);
        assert_eq!(days.len(), 1);
        let day = &days[&date(2)];
        assert_eq!(day.shift_label.as_deref(), Some("G班"));
        assert_eq!(day.clock_in, Some(events[2].at));
        assert_eq!(day.clock_out, Some(events[1].at));
        assert_eq!(day.state(), PunchState::FullyPunched);

        // a clock-out closing the re-punch is bound in its place
        let mut closed = events.clone();
        closed.push(ev(2, 23, 0, Keyword::ClockOut, "G班"));
        let days = pair(&closed);
        assert_eq!(days[&date(2)].clock_in, Some(closed[2].at));
        assert_eq!(days[&date(2)].clock_out, Some(closed[3].at));
    }

    #[test]
    fn matched_clock_out_replaces_earlier_lone_one() {
        let events = vec![
            ev(2, 7, 0, Keyword::ClockOut, ""),
            ev(2, 9, 0, Keyword::ClockIn, "F班"),
            ev(2, 21, 0, Keyword::ClockOut, "F班"),
        ];
        let days = pair(&events);
        assert_eq!(days[&date(2)].clock_in, Some(events[1].at));
        assert_eq!(days[&date(2)].clock_out, Some(events[2].at));
    }

    #[test]
    fn unmatched_clock_in_then_next_day() {
        let events = vec![
            ev(2, 9, 0, Keyword::ClockIn, "F班"),
            ev(3, 9, 0, Keyword::ClockIn, "F班"),
            ev(3, 21, 0, Keyword::ClockOut, "F班"),
        ];
        let days = pair(&events);
        assert_eq!(days[&date(2)].clock_out, None);
        assert_eq!(days[&date(3)].clock_out, Some(events[2].at));
    }

    #[test]
    fn clock_out_at_same_instant_is_not_a_match() {
        let events = vec![
            ev(2, 9, 0, Keyword::ClockIn, "F班"),
            ev(2, 9, 0, Keyword::ClockOut, "F班"),
            ev(2, 21, 0, Keyword::ClockOut, "F班"),
        ];
        let days = pair(&events);
        assert_eq!(days[&date(2)].clock_out, Some(events[2].at));

        let lonely = vec![
            ev(2, 9, 0, Keyword::ClockIn, "F班"),
            ev(2, 9, 0, Keyword::ClockOut, "F班"),
        ];
        let days = pair(&lonely);
        assert_eq!(days[&date(2)].clock_in, Some(lonely[0].at));
        assert_eq!(days[&date(2)].clock_out, Some(lonely[1].at));
    }

    #[test]
    fn empty_input_gives_no_days() {
        assert!(pair(&[]).is_empty());
    }
}
