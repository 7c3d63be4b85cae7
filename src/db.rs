use chrono::{DateTime, NaiveDate, Utc};
use futures_util::StreamExt;
use sqlx::MySqlPool;
use tracing::warn;

use crate::attendance::RawEvent;
use crate::model::check_event::CheckEvent;

pub async fn init_db(database_url: &str) -> Result<MySqlPool, sqlx::Error> {
    MySqlPool::connect(database_url).await
}

/// A check about to be stored.
#[derive(Debug, Clone)]
pub struct NewCheck<'a> {
    pub user_id: &'a str,
    pub keyword: &'a str,
    pub shift_label: &'a str,
    pub day_key: NaiveDate,
    pub checked_at: DateTime<Utc>,
}

/// Fails with a `23000` database error when the user already has this
/// keyword on this day key.
pub async fn insert_check(pool: &MySqlPool, check: &NewCheck<'_>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO check_events (user_id, keyword, shift_label, day_key, checked_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(check.user_id)
    .bind(check.keyword)
    .bind(check.shift_label)
    .bind(check.day_key)
    .bind(check.checked_at)
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

/// Events for one user with `from <= checked_at < to`, oldest first.
///
/// Rows with a keyword the reconciler does not know are skipped.
pub async fn fetch_window(
    pool: &MySqlPool,
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<RawEvent>, sqlx::Error> {
    let mut stream = sqlx::query_as::<_, CheckEvent>(
        r#"
        SELECT id, user_id, keyword, shift_label, day_key, checked_at, created_at
        FROM check_events
        WHERE user_id = ?
        AND checked_at >= ?
        AND checked_at < ?
        ORDER BY checked_at ASC, id ASC
        "#,
    )
    .bind(user_id)
    .bind(from)
    .bind(to)
    .fetch(pool);

    let mut events = Vec::new();
    while let Some(row) = stream.next().await {
        let row = row?;
        match row.to_raw_event() {
            Some(event) => events.push(event),
            None => warn!(id = row.id, keyword = %row.keyword, "Skipping check with unknown keyword"),
        }
    }

    Ok(events)
}

/// One page of a user's stored checks, newest first, plus the total count.
pub async fn list_checks(
    pool: &MySqlPool,
    user_id: &str,
    page: u64,
    per_page: u64,
) -> Result<(Vec<CheckEvent>, i64), sqlx::Error> {
    let offset = page.saturating_sub(1).saturating_mul(per_page);

    let rows = sqlx::query_as::<_, CheckEvent>(
        r#"
        SELECT id, user_id, keyword, shift_label, day_key, checked_at, created_at
        FROM check_events
        WHERE user_id = ?
        ORDER BY checked_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(per_page)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM check_events WHERE user_id = ?")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok((rows, total))
}

/// Deletes every check older than `cutoff`; returns the number removed.
pub async fn purge_before(pool: &MySqlPool, cutoff: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM check_events WHERE checked_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
