use axum::extract::{Path, Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::middleware::StaffUser;
use ember_shared::types::api::ApiResponse;
use ember_shared::types::auth::AuthUser;
use ember_shared::types::pagination::{Paginated, PaginationParams};

use crate::events::publisher;
use crate::models::{Role, User};
use crate::schema::{overlay_grants, roles, users};
use crate::services::permission_service::{self, ResolvedPermissions};
use crate::AppState;

// --- Request / Response types ---

#[derive(Debug, Deserialize)]
pub struct UserFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub username: Option<String>,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl UserFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub role: String,
    pub role_level: i32,
    pub account_locked: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<(User, Role)> for UserRow {
    fn from((user, role): (User, Role)) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: role.name,
            role_level: role.level,
            account_locked: user.account_locked,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub user: User,
    pub role: Role,
    pub active_overlays: i64,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub role_id: Uuid,
}

// --- Resolve effective permissions ---

/// GET /users/:id/permissions
/// Callers may inspect their own set; staff may inspect anyone's. Served
/// from the Redis cache when fresh; the hash lets clients skip re-rendering.
pub async fn get_permissions(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ResolvedPermissions>>> {
    if auth.id != user_id && !auth.is_staff() {
        return Err(AppError::forbidden("cannot inspect another user's permissions"));
    }

    let cache_key = permission_service::cache_key(user_id);
    if let Ok(Some(cached)) = state.redis.get(&cache_key).await {
        if let Ok(resolved) = serde_json::from_str::<ResolvedPermissions>(&cached) {
            return Ok(Json(ApiResponse::ok(resolved)));
        }
    }

    let resolved = permission_service::resolve(&state.db, user_id)?;

    match serde_json::to_string(&resolved) {
        Ok(serialized) => {
            if let Err(e) = state.redis.set(&cache_key, &serialized, state.config.permission_cache_ttl).await {
                tracing::warn!(error = %e, "failed to cache resolved permissions");
            }
        }
        Err(e) => tracing::warn!(error = %e, "failed to serialize resolved permissions for cache"),
    }

    Ok(Json(ApiResponse::ok(resolved)))
}

// --- List users (paginated, optional username filter) ---

pub async fn list_users(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Query(params): Query<UserFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<UserRow>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let pagination = params.pagination();
    let offset = pagination.offset() as i64;
    let limit = pagination.limit() as i64;

    let (rows, total): (Vec<(User, Role)>, i64) = if let Some(ref username) = params.username {
        let pattern = format!("%{username}%");
        let rows = users::table
            .inner_join(roles::table)
            .filter(users::username.ilike(pattern.clone()))
            .order(users::created_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<(User, Role)>(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        let total: i64 = users::table
            .filter(users::username.ilike(pattern))
            .count()
            .get_result(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        (rows, total)
    } else {
        let rows = users::table
            .inner_join(roles::table)
            .order(users::created_at.desc())
            .offset(offset)
            .limit(limit)
            .load::<(User, Role)>(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        let total: i64 = users::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        (rows, total)
    };

    let items: Vec<UserRow> = rows.into_iter().map(UserRow::from).collect();
    let paginated = Paginated::new(items, total as u64, &pagination);
    Ok(Json(ApiResponse::ok(paginated)))
}

// --- Get user details ---

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Path(user_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<UserDetail>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let (user, role) = users::table
        .inner_join(roles::table)
        .filter(users::id.eq(user_id))
        .first::<(User, Role)>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let now = chrono::Utc::now();
    let active_overlays: i64 = overlay_grants::table
        .filter(overlay_grants::user_id.eq(user_id))
        .filter(overlay_grants::valid_from.le(now))
        .filter(overlay_grants::valid_until.gt(now))
        .count()
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    Ok(Json(ApiResponse::ok(UserDetail { user, role, active_overlays })))
}

// --- Assign role ---

/// PUT /admin/users/:id/role
/// The actor must outrank both the target's current role and the new role.
/// Equal levels are rejected, so nobody can promote laterally or touch
/// themselves.
pub async fn assign_role(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Path(user_id): Path<Uuid>,
    Json(body): Json<AssignRoleRequest>,
) -> AppResult<Json<ApiResponse<UserRow>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let (target, current_role) = users::table
        .inner_join(roles::table)
        .filter(users::id.eq(user_id))
        .first::<(User, Role)>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound, "user not found"))?;

    let new_role = roles::table
        .find(body.role_id)
        .first::<Role>(&mut conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::RoleNotFound, "role not found"))?;

    if !staff.0.outranks(current_role.level) {
        return Err(AppError::new(
            ErrorCode::InsufficientRoleLevel,
            "cannot modify a user of equal or higher role level",
        ));
    }
    if !staff.0.outranks(new_role.level) {
        return Err(AppError::new(
            ErrorCode::InsufficientRoleLevel,
            "cannot assign a role of equal or higher level than your own",
        ));
    }

    let updated: User = diesel::update(users::table.find(user_id))
        .set((
            users::role_id.eq(new_role.id),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to update role: {e}")))?;

    if let Err(e) = state.redis.del(&permission_service::cache_key(user_id)).await {
        tracing::warn!(error = %e, "failed to drop permission cache entry");
    }

    publisher::publish_role_changed(
        &state.rabbitmq,
        target.id,
        new_role.id,
        &new_role.name,
        new_role.level,
        staff.0.id,
    )
    .await;

    Ok(Json(ApiResponse::ok(UserRow::from((updated, new_role)))))
}
