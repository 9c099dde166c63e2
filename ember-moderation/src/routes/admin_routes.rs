use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use diesel::PgConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::middleware::StaffUser;
use ember_shared::types::api::ApiResponse;
use ember_shared::types::pagination::{Paginated, PaginationParams};

use crate::events::publisher;
use crate::models::{Appeal, AuditEntry, NewAuditEntry, NewUserAction, Report, UserAction};
use crate::schema::{appeals, audit_log, reports, user_actions};
use crate::services::action_service::{self, appeal_status, report_status};
use crate::AppState;

// --- Request / Response types ---

#[derive(Debug, Deserialize)]
pub struct StatusFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub status: Option<String>,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl StatusFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ResolveReportRequest {
    /// "resolved" or "dismissed"
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueActionRequest {
    pub action_type: String,
    pub reason: String,
    pub duration_days: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveAppealRequest {
    /// "approved" or "rejected"
    pub verdict: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardStats {
    pub open_reports: i64,
    pub open_appeals: i64,
    pub active_actions: i64,
    pub reports_today: i64,
}

fn record_audit(
    conn: &mut PgConnection,
    admin_id: Uuid,
    action: impl Into<String>,
    target_user_id: Option<Uuid>,
    details: serde_json::Value,
) -> AppResult<()> {
    let entry = NewAuditEntry {
        admin_id,
        action: action.into(),
        target_user_id,
        details: Some(details),
    };

    diesel::insert_into(audit_log::table)
        .values(&entry)
        .execute(conn)
        .map_err(|e| AppError::internal(format!("failed to write audit log: {e}")))?;

    Ok(())
}

/// Deactivate an action and work out whether the account should unlock:
/// only when the action was a ban and no other ban still binds the user.
fn deactivate_action(
    conn: &mut PgConnection,
    action: &UserAction,
) -> AppResult<(UserAction, bool)> {
    let updated: UserAction = diesel::update(user_actions::table.find(action.id))
        .set(user_actions::is_active.eq(false))
        .get_result(conn)
        .map_err(|e| AppError::internal(format!("failed to deactivate action: {e}")))?;

    if action.action_type != action_service::ACTION_BAN {
        return Ok((updated, false));
    }

    let all_actions = user_actions::table
        .filter(user_actions::user_id.eq(action.user_id))
        .load::<UserAction>(conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let remaining = action_service::remaining_active_bans(&all_actions, action.id, Utc::now());
    Ok((updated, remaining == 0))
}

// --- Reports ---

pub async fn list_reports(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Query(params): Query<StatusFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<Report>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let pagination = params.pagination();
    let offset = pagination.offset() as i64;
    let limit = pagination.limit() as i64;

    let (items, total): (Vec<Report>, i64) = if let Some(ref status) = params.status {
        let items = reports::table
            .filter(reports::status.eq(status))
            .order(reports::created_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<Report>(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        let total: i64 = reports::table
            .filter(reports::status.eq(status))
            .count()
            .get_result(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        (items, total)
    } else {
        let items = reports::table
            .order(reports::created_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<Report>(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        let total: i64 = reports::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        (items, total)
    };

    let paginated = Paginated::new(items, total as u64, &pagination);
    Ok(Json(ApiResponse::ok(paginated)))
}

pub async fn get_report(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Path(report_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Report>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let report = reports::table
        .find(report_id)
        .first::<Report>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound, "report not found"))?;

    Ok(Json(ApiResponse::ok(report)))
}

/// PUT /admin/reports/:id/assign — take ownership of an open report.
pub async fn assign_report(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Path(report_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Report>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let report = reports::table
        .find(report_id)
        .first::<Report>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound, "report not found"))?;

    if !action_service::report_transition_allowed(&report.status, report_status::ASSIGNED) {
        return Err(AppError::new(
            ErrorCode::InvalidReportTransition,
            format!("cannot assign a report in status '{}'", report.status),
        ));
    }

    let updated: Report = diesel::update(reports::table.find(report_id))
        .set((
            reports::status.eq(report_status::ASSIGNED),
            reports::assigned_to.eq(staff.0.id),
        ))
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to update report: {e}")))?;

    record_audit(
        &mut conn,
        staff.0.id,
        "assign_report",
        None,
        serde_json::json!({ "report_id": report_id }),
    )?;

    Ok(Json(ApiResponse::ok(updated)))
}

/// PUT /admin/reports/:id/resolve — close out a report.
pub async fn resolve_report(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Path(report_id): Path<Uuid>,
    Json(body): Json<ResolveReportRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    if body.status != report_status::RESOLVED && body.status != report_status::DISMISSED {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "status must be 'resolved' or 'dismissed'",
        ));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let report = reports::table
        .find(report_id)
        .first::<Report>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::ReportNotFound, "report not found"))?;

    if !action_service::report_transition_allowed(&report.status, &body.status) {
        return Err(AppError::new(
            ErrorCode::InvalidReportTransition,
            format!("cannot move a report from '{}' to '{}'", report.status, body.status),
        ));
    }

    let updated: Report = diesel::update(reports::table.find(report_id))
        .set((
            reports::status.eq(&body.status),
            reports::resolved_by.eq(staff.0.id),
            reports::resolved_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to update report: {e}")))?;

    record_audit(
        &mut conn,
        staff.0.id,
        format!("resolve_report_{}", body.status),
        None,
        serde_json::json!({ "report_id": report_id, "status": body.status }),
    )?;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- User actions ---

pub async fn list_user_actions(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<UserAction>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let actions = user_actions::table
        .filter(user_actions::user_id.eq(user_id))
        .order(user_actions::created_at.desc())
        .load::<UserAction>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(actions)))
}

/// POST /admin/users/:id/actions — issue a ban, mute, or warn.
pub async fn issue_action(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<IssueActionRequest>,
) -> AppResult<Json<ApiResponse<UserAction>>> {
    if !action_service::is_valid_action_type(&body.action_type) {
        return Err(AppError::new(
            ErrorCode::InvalidActionType,
            format!(
                "invalid action_type '{}'. Must be one of: {}",
                body.action_type,
                action_service::VALID_ACTION_TYPES.join(", ")
            ),
        ));
    }

    if let Some(days) = body.duration_days {
        if days <= 0 {
            return Err(AppError::new(
                ErrorCode::ValidationError,
                "duration_days must be positive",
            ));
        }
    }

    // No lateral or upward action: the target's rank must be below ours.
    let target = state.access.user_level(user_id).await?;
    if !staff.0.outranks(target.role_level) {
        return Err(AppError::new(
            ErrorCode::InsufficientRoleLevel,
            "cannot action a user of equal or higher role level",
        ));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let expires_at = action_service::expiry_from_duration(Utc::now(), body.duration_days);

    let new_action = NewUserAction {
        user_id,
        action_type: body.action_type.clone(),
        reason: body.reason.clone(),
        duration_days: body.duration_days,
        expires_at,
        created_by: staff.0.id,
    };

    let action: UserAction = diesel::insert_into(user_actions::table)
        .values(&new_action)
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to create action: {e}")))?;

    publisher::publish_action_issued(
        &state.rabbitmq,
        action.id,
        action.user_id,
        &action.action_type,
        &action.reason,
        action.expires_at,
        action.action_type == action_service::ACTION_BAN,
    )
    .await;

    record_audit(
        &mut conn,
        staff.0.id,
        "issue_action",
        Some(user_id),
        serde_json::json!({
            "action_id": action.id,
            "action_type": body.action_type,
            "reason": body.reason,
            "expires_at": action.expires_at,
        }),
    )?;

    Ok(Json(ApiResponse::ok(action)))
}

/// DELETE /admin/users/:id/actions/:aid — lift an action. The account
/// unlocks only if this was the user's last binding ban.
pub async fn lift_action(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Path((user_id, action_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<UserAction>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let action = user_actions::table
        .find(action_id)
        .first::<UserAction>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::ActionNotFound, "action not found"))?;

    if action.user_id != user_id {
        return Err(AppError::new(
            ErrorCode::ActionNotFound,
            "action not found for this user",
        ));
    }

    if !action.is_active {
        return Err(AppError::new(
            ErrorCode::ActionAlreadyLifted,
            "this action has already been lifted",
        ));
    }

    let (updated, unlock_account) = deactivate_action(&mut conn, &action)?;

    publisher::publish_action_lifted(
        &state.rabbitmq,
        action.id,
        user_id,
        &action.action_type,
        unlock_account,
    )
    .await;

    record_audit(
        &mut conn,
        staff.0.id,
        "lift_action",
        Some(user_id),
        serde_json::json!({
            "action_id": action_id,
            "action_type": action.action_type,
            "unlock_account": unlock_account,
        }),
    )?;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- Appeals ---

pub async fn list_appeals(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Query(params): Query<StatusFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<Appeal>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let pagination = params.pagination();
    let offset = pagination.offset() as i64;
    let limit = pagination.limit() as i64;

    let (items, total): (Vec<Appeal>, i64) = if let Some(ref status) = params.status {
        let items = appeals::table
            .filter(appeals::status.eq(status))
            .order(appeals::created_at.asc())
            .offset(offset)
            .limit(limit)
            .load::<Appeal>(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        let total: i64 = appeals::table
            .filter(appeals::status.eq(status))
            .count()
            .get_result(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        (items, total)
    } else {
        let items = appeals::table
            .order(appeals::created_at.asc())
            .offset(offset)
            .limit(limit)
            .load::<Appeal>(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        let total: i64 = appeals::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        (items, total)
    };

    let paginated = Paginated::new(items, total as u64, &pagination);
    Ok(Json(ApiResponse::ok(paginated)))
}

/// PUT /admin/appeals/:id/resolve — approve or reject an open appeal.
/// Approval deactivates the linked action; either way the user is notified
/// downstream via the appeal.resolved event.
pub async fn resolve_appeal(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Path(appeal_id): Path<Uuid>,
    Json(body): Json<ResolveAppealRequest>,
) -> AppResult<Json<ApiResponse<Appeal>>> {
    if !action_service::appeal_verdict_allowed(&body.verdict) {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "verdict must be 'approved' or 'rejected'",
        ));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let appeal = appeals::table
        .find(appeal_id)
        .first::<Appeal>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::AppealNotFound, "appeal not found"))?;

    if appeal.status != appeal_status::OPEN {
        return Err(AppError::new(
            ErrorCode::AppealAlreadyResolved,
            "this appeal has already been resolved",
        ));
    }

    // Approval reverses the linked action before the appeal row flips, so a
    // crash in between leaves the user unblocked rather than wrongly blocked.
    if body.verdict == appeal_status::APPROVED {
        if let Some(action_id) = appeal.action_id {
            let action = user_actions::table
                .find(action_id)
                .first::<UserAction>(&mut conn)
                .optional()
                .map_err(|e| AppError::internal(format!("db error: {e}")))?;

            if let Some(action) = action.filter(|a| a.is_active) {
                let (_, unlock_account) = deactivate_action(&mut conn, &action)?;
                publisher::publish_action_lifted(
                    &state.rabbitmq,
                    action.id,
                    action.user_id,
                    &action.action_type,
                    unlock_account,
                )
                .await;
            }
        }
    }

    let updated: Appeal = diesel::update(appeals::table.find(appeal_id))
        .set((
            appeals::status.eq(&body.verdict),
            appeals::resolved_by.eq(staff.0.id),
            appeals::resolved_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to update appeal: {e}")))?;

    publisher::publish_appeal_resolved(
        &state.rabbitmq,
        appeal.id,
        appeal.user_id,
        appeal.action_id,
        &body.verdict,
    )
    .await;

    record_audit(
        &mut conn,
        staff.0.id,
        format!("resolve_appeal_{}", body.verdict),
        Some(appeal.user_id),
        serde_json::json!({
            "appeal_id": appeal_id,
            "action_id": appeal.action_id,
            "verdict": body.verdict,
        }),
    )?;

    Ok(Json(ApiResponse::ok(updated)))
}

// --- Dashboard stats ---

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
) -> AppResult<Json<ApiResponse<DashboardStats>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let open_reports: i64 = reports::table
        .filter(reports::status.eq(report_status::OPEN))
        .count()
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let open_appeals: i64 = appeals::table
        .filter(appeals::status.eq(appeal_status::OPEN))
        .count()
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let now = Utc::now();
    let active_actions: i64 = user_actions::table
        .filter(user_actions::is_active.eq(true))
        .filter(user_actions::expires_at.is_null().or(user_actions::expires_at.gt(now)))
        .count()
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let today_start = now.date_naive().and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc();

    let reports_today: i64 = reports::table
        .filter(reports::created_at.ge(today_start))
        .count()
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(DashboardStats {
        open_reports,
        open_appeals,
        active_actions,
        reports_today,
    })))
}

// --- Audit log ---

pub async fn get_audit_log(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<AuditEntry>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let offset = params.offset() as i64;
    let limit = params.limit() as i64;

    let items = audit_log::table
        .order(audit_log::created_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<AuditEntry>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let total: i64 = audit_log::table
        .count()
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let paginated = Paginated::new(items, total as u64, &params);
    Ok(Json(ApiResponse::ok(paginated)))
}
