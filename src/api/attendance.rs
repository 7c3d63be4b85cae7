use actix_web::{HttpResponse, Responder, web};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, instrument};
use utoipa::{IntoParams, ToSchema};

use crate::attendance::normalize::parse_timestamp;
use crate::attendance::{
    AttendanceSummary, BEIJING, DayRecord, DayStatus, Keyword, MonthWindow, RawEvent,
    RawTimestamp, Reconciliation, ShiftLabel, day_key, reconcile,
};
use crate::config::Config;
use crate::db::{self, NewCheck};
use crate::model::check_event::CheckEvent;

#[derive(Deserialize, ToSchema)]
pub struct CreateCheck {
    #[schema(example = "wx_42")]
    pub user_id: String,

    #[schema(example = "clock_in", value_type = String)]
    pub keyword: Keyword,

    /// Required for clock-in, optional for clock-out
    #[schema(example = "F班", nullable = true)]
    pub shift: Option<String>,

    /// Back-filled entry; scored as make-up
    #[serde(default)]
    #[schema(example = false)]
    pub make_up: bool,

    /// Only accepted for make-up checks; other checks are stamped now
    #[schema(example = "2026-03-02 08:55", nullable = true)]
    pub timestamp: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct CheckListQuery {
    #[schema(example = "wx_42")]
    pub user_id: String,

    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>,

    #[schema(example = 10)]
    /// Items per page, at most 100
    pub per_page: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct CheckListResponse {
    pub data: Vec<CheckEvent>,
    pub page: u64,
    pub per_page: u64,
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReportQuery {
    /// Month as YYYY-MM; defaults to the current month
    #[schema(example = "2026-03", nullable = true)]
    pub month: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct EventPayload {
    #[schema(example = "2026-03-02 08:55", value_type = String)]
    pub timestamp: RawTimestamp,

    #[schema(example = "clock_in", value_type = String)]
    pub keyword: Keyword,

    #[serde(default)]
    #[schema(example = "F班")]
    pub shift_label: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ReconcileRequest {
    #[schema(example = "wx_42")]
    pub user_id: String,
    pub events: Vec<EventPayload>,
}

#[derive(Serialize, ToSchema)]
pub struct DayRecordResponse {
    #[schema(example = "2026-03-02", value_type = String, format = "date")]
    pub day: NaiveDate,

    #[schema(example = "F班")]
    pub shift_name: String,

    pub is_make_up: bool,

    #[schema(example = "2026-03-02T08:55:00+08:00", value_type = Option<String>, format = "date-time")]
    pub clock_in: Option<DateTime<FixedOffset>>,

    #[schema(example = "2026-03-02T21:10:00+08:00", value_type = Option<String>, format = "date-time")]
    pub clock_out: Option<DateTime<FixedOffset>>,

    pub is_late: bool,
    pub is_early: bool,

    #[schema(example = "complete", value_type = String)]
    pub status: DayStatus,
}

impl From<DayRecord> for DayRecordResponse {
    fn from(record: DayRecord) -> Self {
        Self {
            day: record.day,
            shift_name: record.shift_name,
            is_make_up: record.is_make_up,
            clock_in: record.clock_in,
            clock_out: record.clock_out,
            is_late: record.is_late,
            is_early: record.is_early,
            status: record.status,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct SummaryResponse {
    #[schema(example = 2)]
    pub complete_count: u32,
    #[schema(example = 0)]
    pub abnormal_count: u32,
    #[schema(example = 0)]
    pub make_up_count: u32,
}

impl From<AttendanceSummary> for SummaryResponse {
    fn from(summary: AttendanceSummary) -> Self {
        Self {
            complete_count: summary.complete_count,
            abnormal_count: summary.abnormal_count,
            make_up_count: summary.make_up_count,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct ReconcileResponse {
    #[schema(example = "wx_42")]
    pub user_id: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "2026-03", nullable = true)]
    pub month: Option<String>,

    pub records: Vec<DayRecordResponse>,
    pub summary: SummaryResponse,

    /// Dropped events and unknown shifts, one line each
    pub issues: Vec<String>,
}

impl ReconcileResponse {
    fn new(reconciliation: Reconciliation, month: Option<String>) -> Self {
        Self {
            user_id: reconciliation.user_id,
            month,
            records: reconciliation.records.into_iter().map(Into::into).collect(),
            summary: reconciliation.summary.into(),
            issues: reconciliation.issues.iter().map(ToString::to_string).collect(),
        }
    }
}

fn bad_request(message: impl Into<String>) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({
        "message": message.into()
    }))
}

fn is_duplicate(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23000"))
}

/// Record a clock-in or clock-out
#[utoipa::path(
    post,
    path = "/api/v1/attendance/checks",
    request_body = CreateCheck,
    responses(
        (status = 201, description = "Check recorded", body = Object, example = json!({
            "message": "Check recorded",
            "id": 1,
            "day_key": "2026-03-02"
        })),
        (status = 400, description = "Invalid check or already checked for this day", body = Object, example = json!({
            "message": "Already checked clock_in for 2026-03-02"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
#[instrument(
    name = "attendance_record_check",
    skip(pool, payload),
    fields(user_id = %payload.user_id, keyword = %payload.keyword)
)]
pub async fn record_check(
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateCheck>,
) -> actix_web::Result<impl Responder> {
    let user_id = payload.user_id.trim();
    if user_id.is_empty() {
        return Ok(bad_request("user_id is required"));
    }

    let shift = payload.shift.as_deref().map(str::trim).unwrap_or_default();
    if payload.keyword == Keyword::ClockIn && shift.is_empty() {
        return Ok(bad_request("shift is required for clock_in"));
    }

    let at = match (payload.make_up, payload.timestamp.as_deref()) {
        (true, Some(ts)) => match parse_timestamp(ts) {
            Some(at) => at,
            None => return Ok(bad_request(format!("Unparseable timestamp {ts:?}"))),
        },
        (true, None) => return Ok(bad_request("timestamp is required for make-up checks")),
        (false, Some(_)) => {
            return Ok(bad_request("timestamp is only accepted for make-up checks"));
        }
        (false, None) => Utc::now().with_timezone(&*BEIJING),
    };

    let day = day_key::resolve(payload.keyword, &at);
    let label = if shift.is_empty() {
        String::new()
    } else {
        ShiftLabel::compose(shift, payload.make_up)
    };
    let keyword = payload.keyword.to_string();

    let check = NewCheck {
        user_id,
        keyword: &keyword,
        shift_label: &label,
        day_key: day,
        checked_at: at.with_timezone(&Utc),
    };

    match db::insert_check(pool.get_ref(), &check).await {
        Ok(id) => {
            info!(id, day_key = %day, "Check recorded");
            Ok(HttpResponse::Created().json(serde_json::json!({
                "message": "Check recorded",
                "id": id,
                "day_key": day
            })))
        }
        Err(e) if is_duplicate(&e) => Ok(bad_request(format!(
            "Already checked {} for {}",
            payload.keyword, day
        ))),
        Err(e) => {
            tracing::error!(error = %e, user_id = %user_id, "Recording check failed");
            Err(actix_web::error::ErrorInternalServerError(
                "Internal Server Error",
            ))
        }
    }
}

/// List a user's stored checks, newest first
#[utoipa::path(
    get,
    path = "/api/v1/attendance/checks",
    params(CheckListQuery),
    responses(
        (status = 200, body = CheckListResponse),
        (status = 400, description = "Page out of range", body = Object, example = json!({
            "message": "page is out of range"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn list_checks(
    pool: web::Data<MySqlPool>,
    query: web::Query<CheckListQuery>,
) -> actix_web::Result<impl Responder> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    if page.checked_mul(per_page).is_none() {
        return Ok(bad_request("page is out of range"));
    }

    let (data, total) = db::list_checks(pool.get_ref(), &query.user_id, page, per_page)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %query.user_id, "Failed to fetch check list");
            actix_web::error::ErrorInternalServerError("Internal Server Error")
        })?;

    Ok(HttpResponse::Ok().json(CheckListResponse {
        data,
        page,
        per_page,
        total,
    }))
}

/// Monthly attendance report for one user
#[utoipa::path(
    get,
    path = "/api/v1/attendance/report/{user_id}",
    params(
        ("user_id" = String, Path, description = "User whose checks are reconciled"),
        ReportQuery
    ),
    responses(
        (status = 200, body = ReconcileResponse),
        (status = 400, description = "Invalid month", body = Object, example = json!({
            "message": "month must be YYYY-MM"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn monthly_report(
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    path: web::Path<String>,
    query: web::Query<ReportQuery>,
) -> actix_web::Result<impl Responder> {
    let user_id = path.into_inner();

    let window = match query.month.as_deref() {
        Some(month) => match MonthWindow::parse(month) {
            Some(w) => w,
            None => return Ok(bad_request("month must be YYYY-MM")),
        },
        None => MonthWindow::containing(Utc::now().with_timezone(&*BEIJING).date_naive()),
    };

    let Some((from, to)) = window.fetch_range() else {
        return Ok(bad_request("month is out of range"));
    };

    let events = db::fetch_window(
        pool.get_ref(),
        &user_id,
        from.with_timezone(&Utc),
        to.with_timezone(&Utc),
    )
    .await
    .map_err(|e| {
        tracing::error!(error = %e, user_id = %user_id, "Failed to fetch checks for report");
        actix_web::error::ErrorInternalServerError("Internal Server Error")
    })?;

    let reconciliation = window.restrict(reconcile(&user_id, events, &config.shifts));

    Ok(HttpResponse::Ok().json(ReconcileResponse::new(
        reconciliation,
        Some(window.label()),
    )))
}

/// Reconcile a posted list of events against the configured shifts
#[utoipa::path(
    post,
    path = "/api/v1/attendance/reconcile",
    request_body = ReconcileRequest,
    responses(
        (status = 200, body = ReconcileResponse),
        (status = 400, description = "Missing user_id")
    ),
    tag = "Attendance"
)]
pub async fn reconcile_events(
    config: web::Data<Config>,
    payload: web::Json<ReconcileRequest>,
) -> actix_web::Result<impl Responder> {
    let ReconcileRequest { user_id, events } = payload.into_inner();
    if user_id.trim().is_empty() {
        return Ok(bad_request("user_id is required"));
    }

    let events = events
        .into_iter()
        .map(|e| RawEvent::new(e.timestamp, e.keyword, e.shift_label))
        .collect();

    let reconciliation = reconcile(user_id.trim(), events, &config.shifts);

    Ok(HttpResponse::Ok().json(ReconcileResponse::new(reconciliation, None)))
}
