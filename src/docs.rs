use crate::api::attendance::{
    CheckListQuery, CheckListResponse, CreateCheck, DayRecordResponse, EventPayload,
    ReconcileRequest, ReconcileResponse, ReportQuery, SummaryResponse,
};
use crate::model::check_event::CheckEvent;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance Tracker API",
        version = "0.1.0",
        description = r#"
## Workplace Check-in Tracker

Records clock-in / clock-out checks submitted through the chat layer and
reconciles them into per-day attendance.

### Key Features
- **Checks**
  - One check per keyword per attendance day
  - Make-up (补卡) checks back-filled with an explicit timestamp
- **Reports**
  - Monthly per-user report: on-time, late, early-leave and make-up days
  - Stateless reconciliation of a posted event list

### Attendance days
Clock-outs before 06:00 (UTC+8) count toward the previous day, so overnight
shifts stay on the day they started.
"#,
    ),
    paths(
        crate::api::attendance::record_check,
        crate::api::attendance::list_checks,
        crate::api::attendance::monthly_report,
        crate::api::attendance::reconcile_events
    ),
    components(
        schemas(
            CreateCheck,
            CheckEvent,
            CheckListQuery,
            CheckListResponse,
            ReportQuery,
            EventPayload,
            ReconcileRequest,
            DayRecordResponse,
            SummaryResponse,
            ReconcileResponse
        )
    ),
    tags(
        (name = "Attendance", description = "Check recording and attendance reports"),
    )
)]
pub struct ApiDoc;
