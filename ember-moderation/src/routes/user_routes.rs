use axum::extract::State;
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::ratelimit::{self, scopes, RateQuota};
use ember_shared::types::api::ApiResponse;
use ember_shared::types::auth::AuthUser;

use crate::events::publisher;
use crate::models::{Appeal, NewAppeal, NewReport, Report, UserAction};
use crate::schema::{appeals, reports, user_actions};
use crate::services::action_service;
use crate::AppState;

const TARGET_USER: &str = "user";
const VALID_TARGET_TYPES: [&str; 3] = [TARGET_USER, "forum_post", "media_comment"];

#[derive(Debug, Deserialize, Validate)]
pub struct CreateReportRequest {
    pub target_type: String,
    pub target_id: Uuid,
    #[validate(length(min = 10, max = 2000, message = "reason must be 10-2000 characters"))]
    pub reason: String,
}

pub async fn create_report(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateReportRequest>,
) -> AppResult<Json<ApiResponse<Report>>> {
    body.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    if !VALID_TARGET_TYPES.contains(&body.target_type.as_str()) {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            format!(
                "invalid target_type '{}'. Must be one of: {}",
                body.target_type,
                VALID_TARGET_TYPES.join(", ")
            ),
        ));
    }

    if body.target_type == TARGET_USER && body.target_id == auth.id {
        return Err(AppError::new(ErrorCode::CannotReportSelf, "you cannot report yourself"));
    }

    ratelimit::check(
        &state.redis,
        scopes::REPORT_CREATE,
        &auth,
        RateQuota::new(state.config.report_limit, 3600),
    )
    .await?;

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    // One open report per reporter per target
    let existing: i64 = reports::table
        .filter(reports::reporter_id.eq(auth.id))
        .filter(reports::target_type.eq(&body.target_type))
        .filter(reports::target_id.eq(body.target_id))
        .filter(reports::status.eq(action_service::report_status::OPEN))
        .count()
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    if existing > 0 {
        return Err(AppError::new(
            ErrorCode::DuplicateReport,
            "you already have an open report for this target",
        ));
    }

    let new_report = NewReport {
        reporter_id: auth.id,
        target_type: body.target_type.clone(),
        target_id: body.target_id,
        reason: body.reason,
    };

    let report: Report = diesel::insert_into(reports::table)
        .values(&new_report)
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to create report: {e}")))?;

    publisher::publish_report_created(
        &state.rabbitmq,
        report.id,
        report.reporter_id,
        &report.target_type,
        report.target_id,
    )
    .await;

    Ok(Json(ApiResponse::ok(report)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateAppealRequest {
    pub action_id: Option<Uuid>,
    #[validate(length(min = 20, max = 5000, message = "appeal body must be 20-5000 characters"))]
    pub body: String,
}

pub async fn create_appeal(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateAppealRequest>,
) -> AppResult<Json<ApiResponse<Appeal>>> {
    body.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    ratelimit::check(
        &state.redis,
        scopes::APPEAL_CREATE,
        &auth,
        RateQuota::new(state.config.appeal_limit, 86400),
    )
    .await?;

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    if let Some(action_id) = body.action_id {
        let action = user_actions::table
            .find(action_id)
            .first::<UserAction>(&mut conn)
            .optional()
            .map_err(|e| AppError::internal(format!("db error: {e}")))?
            .ok_or_else(|| AppError::new(ErrorCode::ActionNotFound, "moderation action not found"))?;

        if action.user_id != auth.id {
            return Err(AppError::new(
                ErrorCode::AppealActionMismatch,
                "you can only appeal actions against your own account",
            ));
        }

        if !action_service::in_force(&action, Utc::now()) {
            return Err(AppError::new(
                ErrorCode::ActionAlreadyLifted,
                "this action is no longer in force",
            ));
        }

        let open_appeals: i64 = appeals::table
            .filter(appeals::action_id.eq(action_id))
            .filter(appeals::status.eq(action_service::appeal_status::OPEN))
            .count()
            .get_result(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        if open_appeals > 0 {
            return Err(AppError::new(
                ErrorCode::DuplicateAppeal,
                "there is already an open appeal for this action",
            ));
        }
    }

    let new_appeal = NewAppeal {
        user_id: auth.id,
        action_id: body.action_id,
        body: body.body,
    };

    let appeal: Appeal = diesel::insert_into(appeals::table)
        .values(&new_appeal)
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to create appeal: {e}")))?;

    Ok(Json(ApiResponse::ok(appeal)))
}

/// GET /me/actions — the caller's own moderation history.
pub async fn my_actions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<UserAction>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let actions = user_actions::table
        .filter(user_actions::user_id.eq(auth.id))
        .order(user_actions::created_at.desc())
        .load::<UserAction>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(actions)))
}

/// GET /me/appeals
pub async fn my_appeals(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> AppResult<Json<ApiResponse<Vec<Appeal>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let my = appeals::table
        .filter(appeals::user_id.eq(auth.id))
        .order(appeals::created_at.desc())
        .load::<Appeal>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(my)))
}
