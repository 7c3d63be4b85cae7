use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// What a check-in message declares: start or end of a shift.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
pub enum Keyword {
    #[serde(rename = "clock_in", alias = "上班")]
    #[strum(to_string = "clock_in", serialize = "上班")]
    ClockIn,
    #[serde(rename = "clock_out", alias = "下班")]
    #[strum(to_string = "clock_out", serialize = "下班")]
    ClockOut,
}

/// Timestamp as it arrives from the store or from a posted payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Instant(DateTime<FixedOffset>),
    Text(String),
}

impl From<DateTime<FixedOffset>> for RawTimestamp {
    fn from(value: DateTime<FixedOffset>) -> Self {
        RawTimestamp::Instant(value)
    }
}

impl From<&str> for RawTimestamp {
    fn from(value: &str) -> Self {
        RawTimestamp::Text(value.to_string())
    }
}

/// One submitted check, before normalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub timestamp: RawTimestamp,
    pub keyword: Keyword,
    pub shift_label: String,
}

impl RawEvent {
    pub fn new(
        timestamp: impl Into<RawTimestamp>,
        keyword: Keyword,
        shift_label: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: timestamp.into(),
            keyword,
            shift_label: shift_label.into(),
        }
    }
}

/// A normalized check: the instant is always expressed at UTC+8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub at: DateTime<FixedOffset>,
    pub keyword: Keyword,
    pub shift_label: String,
}
