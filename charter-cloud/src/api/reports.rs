//! Scheduled reports, on-demand exports and export history

use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router, extract::State};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    ExportFormat, ExportHistory, ExportRequest, ReportFrequency, ReportType, ScheduledReport,
    ScheduledReportCreate, ScheduledReportUpdate,
};
use shared::util::{millis_to_datetime, now_millis};

use super::{ApiResult, AppJson, AppPath, AppQuery, ValidJson, internal};
use crate::auth::UserIdentity;
use crate::db;
use crate::db::exports::NewExport;
use crate::export::ExportRows;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reports", get(list_reports).post(create_report))
        .route(
            "/api/reports/{id}",
            get(get_report).patch(update_report).delete(delete_report),
        )
        .route("/api/reports/{id}/run", post(run_report))
        .route("/api/exports", post(export_now))
        .route("/api/exports/history", get(export_history))
}

fn next_run(frequency: ReportFrequency, now: i64) -> i64 {
    frequency
        .next_after(millis_to_datetime(now))
        .timestamp_millis()
}

/// POST /api/reports
pub async fn create_report(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    ValidJson(req): ValidJson<ScheduledReportCreate>,
) -> ApiResult<ScheduledReport> {
    identity.require_captain()?;
    let now = now_millis();
    let report = db::reports::create(
        &state.pool,
        shared::util::snowflake_id(),
        identity.user_id,
        &req,
        next_run(req.frequency, now),
        now,
    )
    .await
    .map_err(internal)?;
    tracing::info!(report_id = report.id, report_type = %report.report_type, "Scheduled report created");
    Ok(Json(report))
}

/// GET /api/reports
pub async fn list_reports(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
) -> ApiResult<Vec<ScheduledReport>> {
    identity.require_captain()?;
    let reports = db::reports::list_by_owner(&state.pool, identity.user_id)
        .await
        .map_err(internal)?;
    Ok(Json(reports))
}

async fn owned_report(
    state: &AppState,
    identity: &UserIdentity,
    id: i64,
) -> Result<ScheduledReport, AppError> {
    identity.require_captain()?;
    db::reports::find_owned(&state.pool, id, identity.user_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound))
}

/// GET /api/reports/{id}
pub async fn get_report(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<ScheduledReport> {
    Ok(Json(owned_report(&state, &identity, id).await?))
}

/// PATCH /api/reports/{id}
pub async fn update_report(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
    ValidJson(req): ValidJson<ScheduledReportUpdate>,
) -> ApiResult<ScheduledReport> {
    identity.require_captain()?;
    let now = now_millis();
    let next_run_at = req.frequency.map(|f| next_run(f, now));
    let report = db::reports::update(&state.pool, id, identity.user_id, &req, next_run_at, now)
        .await
        .map_err(internal)?
        .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound))?;
    Ok(Json(report))
}

/// DELETE /api/reports/{id}
pub async fn delete_report(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<serde_json::Value> {
    identity.require_captain()?;
    if !db::reports::delete(&state.pool, id, identity.user_id)
        .await
        .map_err(internal)?
    {
        return Err(AppError::new(ErrorCode::ReportNotFound));
    }
    Ok(Json(serde_json::json!({ "deleted": true })))
}

/// Fetch the rows a report covers. Captains see their own trips; admins
/// see platform-wide payments and reviews.
async fn load_rows(
    state: &AppState,
    identity: &UserIdentity,
    report_type: ReportType,
    from: i64,
    to: i64,
) -> Result<ExportRows, sqlx::Error> {
    let pool = &state.pool;
    let me = identity.user_id;
    Ok(match report_type {
        ReportType::Payments if identity.is_admin() => {
            ExportRows::Payments(db::payments::list_in_range(pool, from, to).await?)
        }
        ReportType::Payments => {
            ExportRows::Payments(db::payments::list_for_captain(pool, me, from, to).await?)
        }
        ReportType::Earnings => {
            ExportRows::Earnings(db::payments::earnings_rows(pool, me, from, to).await?)
        }
        ReportType::Reviews => {
            let captain = (!identity.is_admin()).then_some(me);
            ExportRows::Reviews(db::reviews::list_for_captain(pool, captain, from, to).await?)
        }
        ReportType::Bookings => {
            ExportRows::Bookings(db::bookings::list_for_captain(pool, me, from, to).await?)
        }
    })
}

/// Render an export and record it in the history, failed or not
async fn generate(
    state: &AppState,
    identity: &UserIdentity,
    report_id: Option<i64>,
    report_type: ReportType,
    format: ExportFormat,
    from: i64,
    to: i64,
) -> Result<(ExportHistory, Vec<u8>), AppError> {
    let rendered = load_rows(state, identity, report_type, from, to)
        .await
        .map_err(|e| e.to_string())
        .and_then(|rows| {
            rows.render(format)
                .map(|body| (rows.len(), body))
                .map_err(|e| e.to_string())
        });

    let (row_count, body, error) = match rendered {
        Ok((count, body)) => (count, body, None),
        Err(e) => {
            tracing::error!(error = %e, report_type = report_type.as_db(), "Export failed");
            (0, Vec::new(), Some(e))
        }
    };

    let failed = error.is_some();
    let history = db::exports::record(
        &state.pool,
        &NewExport {
            id: shared::util::snowflake_id(),
            owner_id: identity.user_id,
            report_id,
            report_type,
            format,
            range_from: from,
            range_to: to,
            row_count: row_count as i64,
            size_bytes: body.len() as i64,
            error,
            now: now_millis(),
        },
    )
    .await
    .map_err(internal)?;

    if failed {
        return Err(AppError::new(ErrorCode::ExportFailed).with_detail("export_id", history.id));
    }
    tracing::info!(
        export_id = history.id,
        rows = row_count,
        bytes = history.size_bytes,
        "Export generated"
    );
    Ok((history, body))
}

/// POST /api/reports/{id}/run: export the last period now and reschedule
pub async fn run_report(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppPath(id): AppPath<i64>,
) -> ApiResult<ExportHistory> {
    let report = owned_report(&state, &identity, id).await?;
    if !report.enabled {
        return Err(AppError::new(ErrorCode::ReportDisabled));
    }
    let (Some(report_type), Some(frequency), Some(format)) = (
        ReportType::from_db(&report.report_type),
        ReportFrequency::from_db(&report.frequency),
        ExportFormat::from_db(&report.format),
    ) else {
        return Err(internal(format!("report {id} has an unknown type, frequency or format")));
    };

    let now = now_millis();
    let from = frequency
        .period_start(millis_to_datetime(now))
        .timestamp_millis();
    let (history, _) =
        generate(&state, &identity, Some(id), report_type, format, from, now).await?;

    db::reports::mark_run(&state.pool, id, now, next_run(frequency, now))
        .await
        .map_err(internal)?;
    Ok(Json(history))
}

/// POST /api/exports: the rendered file is the response body
pub async fn export_now(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppJson(req): AppJson<ExportRequest>,
) -> Result<Response, AppError> {
    identity.require_captain()?;
    if req.from > req.to {
        return Err(AppError::with_message(
            ErrorCode::ValueOutOfRange,
            "`from` must not be after `to`",
        ));
    }

    let (history, body) = generate(
        &state,
        &identity,
        None,
        req.report_type,
        req.format,
        req.from,
        req.to,
    )
    .await?;

    let extension = req.format.as_db();
    let disposition = format!(
        "attachment; filename=\"{}-{}.{extension}\"",
        req.report_type.as_db(),
        history.id
    );
    Ok((
        [
            (header::CONTENT_TYPE, req.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// GET /api/exports/history
pub async fn export_history(
    State(state): State<AppState>,
    Extension(identity): Extension<UserIdentity>,
    AppQuery(query): AppQuery<HistoryQuery>,
) -> ApiResult<Vec<ExportHistory>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    let history = db::exports::list_by_owner(&state.pool, identity.user_id, limit)
        .await
        .map_err(internal)?;
    Ok(Json(history))
}
