use std::str::FromStr;

use chrono::NaiveTime;
use derive_more::Display;
use once_cell::sync::Lazy;
use serde::Serialize;

/// Marks a manually back-filled entry, e.g. `G班（补卡）`.
pub const MAKE_UP_SUFFIX: &str = "（补卡）";
const MAKE_UP_SUFFIX_ASCII: &str = "(补卡)";

/// Shown in place of a shift name when none was selected or it is unknown.
pub const UNSPECIFIED_SHIFT: &str = "unspecified";

/// Working hours of one named shift.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ShiftWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// A shift ending at or before its start time ends on the next calendar day.
    pub fn crosses_midnight(&self) -> bool {
        self.end <= self.start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
#[display(fmt = "invalid shift table entry {:?}: {}", entry, reason)]
pub struct ShiftTableError {
    pub entry: String,
    pub reason: &'static str,
}

impl std::error::Error for ShiftTableError {}

/// Static shift schedule, looked up by name. Keeps definition order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShiftTable {
    shifts: Vec<(String, ShiftWindow)>,
}

static DEFAULT_TABLE: Lazy<ShiftTable> = Lazy::new(|| {
    let hm = |h, m| NaiveTime::from_hms_opt(h, m, 0).expect("static shift hours are valid");
    ShiftTable::new(vec![
        ("A班".to_string(), ShiftWindow::new(hm(7, 0), hm(15, 0))),
        ("F班".to_string(), ShiftWindow::new(hm(9, 0), hm(21, 0))),
        ("G班".to_string(), ShiftWindow::new(hm(10, 0), hm(22, 0))),
        ("I班".to_string(), ShiftWindow::new(hm(15, 0), hm(0, 0))),
    ])
});

impl ShiftTable {
    pub fn new(shifts: Vec<(String, ShiftWindow)>) -> Self {
        Self { shifts }
    }

    pub fn get(&self, name: &str) -> Option<&ShiftWindow> {
        self.shifts
            .iter()
            .find(|(shift, _)| shift == name)
            .map(|(_, window)| window)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shifts.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.shifts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
    }
}

/// Parses `NAME=HH:MM-HH:MM` entries separated by `;`.
///
/// A later entry with the same name replaces the earlier one.
impl FromStr for ShiftTable {
    type Err = ShiftTableError;

    fn from_str(table: &str) -> Result<Self, Self::Err> {
        let mut shifts: Vec<(String, ShiftWindow)> = Vec::new();

        for entry in table.split(';').map(str::trim).filter(|e| !e.is_empty()) {
            let err = |reason: &'static str| ShiftTableError {
                entry: entry.to_string(),
                reason,
            };

            let (name, hours) = entry.split_once('=').ok_or_else(|| err("missing '='"))?;
            let name = name.trim();
            if name.is_empty() {
                return Err(err("empty shift name"));
            }

            let (start, end) = hours
                .split_once('-')
                .ok_or_else(|| err("expected START-END"))?;
            let start = NaiveTime::parse_from_str(start.trim(), "%H:%M")
                .map_err(|_| err("start is not HH:MM"))?;
            let end = NaiveTime::parse_from_str(end.trim(), "%H:%M")
                .map_err(|_| err("end is not HH:MM"))?;

            let window = ShiftWindow::new(start, end);
            match shifts.iter_mut().find(|(existing, _)| existing == name) {
                Some(slot) => slot.1 = window,
                None => shifts.push((name.to_string(), window)),
            }
        }

        if shifts.is_empty() {
            return Err(ShiftTableError {
                entry: table.to_string(),
                reason: "no shifts defined",
            });
        }

        Ok(Self { shifts })
    }
}

impl Default for ShiftTable {
    fn default() -> Self {
        DEFAULT_TABLE.clone()
    }
}

/// A shift label split into its name and make-up marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftLabel<'a> {
    pub name: &'a str,
    pub is_make_up: bool,
}

impl<'a> ShiftLabel<'a> {
    pub fn parse(label: &'a str) -> Self {
        let trimmed = label.trim();
        let stripped = trimmed
            .strip_suffix(MAKE_UP_SUFFIX)
            .or_else(|| trimmed.strip_suffix(MAKE_UP_SUFFIX_ASCII));

        match stripped {
            Some(name) => Self {
                name: name.trim(),
                is_make_up: true,
            },
            None => Self {
                name: trimmed,
                is_make_up: false,
            },
        }
    }

    /// Label to store for a check on `shift`, marking back-filled entries.
    pub fn compose(shift: &str, is_make_up: bool) -> String {
        if is_make_up {
            format!("{}{}", shift.trim(), MAKE_UP_SUFFIX)
        } else {
            shift.trim().to_string()
        }
    }
}
