use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::attendance::{BEIJING, Keyword, RawEvent};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct CheckEvent {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "wx_42")]
    pub user_id: String,

    #[schema(example = "clock_in")]
    pub keyword: String,

    #[schema(example = "F班")]
    pub shift_label: String,

    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub day_key: NaiveDate,

    #[schema(example = "2026-03-02T00:55:00Z", value_type = String, format = "date-time")]
    pub checked_at: DateTime<Utc>,

    #[schema(example = "2026-03-02T00:55:01Z", value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

impl CheckEvent {
    /// `None` when the stored keyword is not one the reconciler knows.
    pub fn to_raw_event(&self) -> Option<RawEvent> {
        let keyword = Keyword::from_str(&self.keyword).ok()?;
        Some(RawEvent::new(
            self.checked_at.with_timezone(&*BEIJING),
            keyword,
            self.shift_label.clone(),
        ))
    }
}
