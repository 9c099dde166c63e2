use axum::extract::{Path, State};
use axum::Json;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::middleware::StaffUser;
use ember_shared::types::api::ApiResponse;

use crate::models::{Permission, Role};
use crate::schema::{permission_role, permissions, roles};
use crate::AppState;

pub async fn list_roles(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
) -> AppResult<Json<ApiResponse<Vec<Role>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let all_roles = roles::table
        .order(roles::level.asc())
        .load::<Role>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(all_roles)))
}

pub async fn get_role_permissions(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Path(role_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<Permission>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    roles::table
        .find(role_id)
        .first::<Role>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound, "role not found"))?;

    let granted = permission_role::table
        .inner_join(permissions::table)
        .filter(permission_role::role_id.eq(role_id))
        .select(permissions::all_columns)
        .order((permissions::category.asc(), permissions::key.asc()))
        .load::<Permission>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(granted)))
}
