use axum::extract::{Path, State};
use axum::Json;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::middleware::StaffUser;
use ember_shared::types::api::ApiResponse;

use crate::events::publisher;
use crate::models::{NewOverlayGrant, OverlayGrant, Permission, Role, User};
use crate::schema::{overlay_grants, permissions, roles, users};
use crate::services::permission_service::{self, SOURCE_ROLE};
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateOverlayRequest {
    #[validate(length(min = 1, max = 100))]
    pub permission_key: String,
    /// Provenance tag, e.g. "twitch". "role" is reserved for the role table.
    #[validate(length(min = 1, max = 30))]
    pub source: String,
    #[validate(length(min = 1, max = 100))]
    pub source_label: String,
    pub valid_from: Option<DateTime<Utc>>,
    pub valid_until: DateTime<Utc>,
}

pub async fn list_overlays(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<OverlayGrant>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let grants = overlay_grants::table
        .filter(overlay_grants::user_id.eq(user_id))
        .order(overlay_grants::valid_until.desc())
        .load::<OverlayGrant>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(grants)))
}

pub async fn create_overlay(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<CreateOverlayRequest>,
) -> AppResult<Json<ApiResponse<OverlayGrant>>> {
    body.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    if body.source == SOURCE_ROLE {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "source 'role' is reserved for role-table grants",
        ));
    }

    let valid_from = body.valid_from.unwrap_or_else(Utc::now);
    if body.valid_until <= valid_from {
        return Err(AppError::new(
            ErrorCode::ValidationError,
            "valid_until must be after valid_from",
        ));
    }

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let (_target, target_role) = users::table
        .inner_join(roles::table)
        .filter(users::id.eq(user_id))
        .first::<(User, Role)>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    if !staff.0.outranks(target_role.level) {
        return Err(AppError::new(
            ErrorCode::InsufficientRoleLevel,
            "cannot modify a user of equal or higher role level",
        ));
    }

    let permission = permissions::table
        .filter(permissions::key.eq(&body.permission_key))
        .first::<Permission>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::not_found("no permission with that key"))?;

    let new_grant = NewOverlayGrant {
        user_id,
        permission_id: permission.id,
        source: body.source.clone(),
        source_label: body.source_label.clone(),
        valid_from,
        valid_until: body.valid_until,
    };

    let grant: OverlayGrant = diesel::insert_into(overlay_grants::table)
        .values(&new_grant)
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to create overlay grant: {e}")))?;

    if let Err(e) = state.redis.del(&permission_service::cache_key(user_id)).await {
        tracing::warn!(error = %e, "failed to drop permission cache entry");
    }

    publisher::publish_overlay_granted(
        &state.rabbitmq,
        grant.id,
        user_id,
        &permission.key,
        &grant.source,
    )
    .await;

    Ok(Json(ApiResponse::ok(grant)))
}

pub async fn revoke_overlay(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Path((user_id, grant_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<ApiResponse<OverlayGrant>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let (grant, permission) = overlay_grants::table
        .inner_join(permissions::table)
        .filter(overlay_grants::id.eq(grant_id))
        .first::<(OverlayGrant, Permission)>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::OverlayGrantNotFound, "overlay grant not found"))?;

    if grant.user_id != user_id {
        return Err(AppError::new(
            ErrorCode::OverlayGrantNotFound,
            "overlay grant not found for this user",
        ));
    }

    let target_role = users::table
        .inner_join(roles::table)
        .filter(users::id.eq(user_id))
        .select(roles::all_columns)
        .first::<Role>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    if !staff.0.outranks(target_role.level) {
        return Err(AppError::new(
            ErrorCode::InsufficientRoleLevel,
            "cannot modify a user of equal or higher role level",
        ));
    }

    diesel::delete(overlay_grants::table.find(grant_id))
        .execute(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to delete overlay grant: {e}")))?;

    if let Err(e) = state.redis.del(&permission_service::cache_key(user_id)).await {
        tracing::warn!(error = %e, "failed to drop permission cache entry");
    }

    publisher::publish_overlay_revoked(
        &state.rabbitmq,
        grant.id,
        user_id,
        &permission.key,
        &grant.source,
    )
    .await;

    Ok(Json(ApiResponse::ok(grant)))
}
