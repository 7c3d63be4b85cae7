use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use derive_more::Display;
use serde::Serialize;
use tracing::warn;

use super::BEIJING;
use super::event::{Event, RawEvent, RawTimestamp};

/// Offset-less layouts, read as Beijing local time.
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
];

/// Layouts carrying their own offset, besides RFC 3339.
const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// A timestamp string that matched none of the accepted layouts.
#[derive(Debug, Clone, PartialEq, Eq, Display, Serialize)]
#[display(fmt = "unparseable timestamp {:?} in event #{}", input, index)]
pub struct ParseError {
    /// Position of the event in the input list.
    pub index: usize,
    pub input: String,
}

impl std::error::Error for ParseError {}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    /// Sorted ascending by instant; equal instants keep input order.
    pub events: Vec<Event>,
    /// Events dropped because their timestamp could not be read.
    pub rejected: Vec<ParseError>,
}

pub fn parse_timestamp(input: &str) -> Option<DateTime<FixedOffset>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&*BEIJING));
    }

    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(input, fmt).ok())
    {
        return Some(dt.with_timezone(&*BEIJING));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .and_then(|naive| BEIJING.from_local_datetime(&naive).single())
}

/// Converts every timestamp to UTC+8 and sorts the batch.
///
/// Unparseable events are dropped and reported; the rest of the batch is kept.
pub fn normalize(raw: Vec<RawEvent>) -> Normalized {
    let mut events = Vec::with_capacity(raw.len());
    let mut rejected = Vec::new();

    for (index, event) in raw.into_iter().enumerate() {
        let at = match event.timestamp {
            RawTimestamp::Instant(dt) => Some(dt.with_timezone(&*BEIJING)),
            RawTimestamp::Text(ref text) => parse_timestamp(text),
        };

        match at {
            Some(at) => events.push(Event {
                at,
                keyword: event.keyword,
                shift_label: event.shift_label,
            }),
            None => {
                let input = match event.timestamp {
                    RawTimestamp::Text(text) => text,
                    RawTimestamp::Instant(dt) => dt.to_rfc3339(),
                };
                warn!(index, input = %input, "Dropping event with unparseable timestamp");
                rejected.push(ParseError { index, input });
            }
        }
    }

    // stable: equal instants keep their submission order
    events.sort_by_key(|event| event.at);

    Normalized { events, rejected }
}
