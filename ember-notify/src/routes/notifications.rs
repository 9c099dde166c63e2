use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use uuid::Uuid;

use ember_shared::errors::AppResult;
use ember_shared::types::api::ApiResponse;
use ember_shared::types::auth::AuthUser;
use ember_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::Notification;
use crate::services::notification_service;
use crate::AppState;

/// GET /notifications — the authenticated user's notifications, newest first.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Notification>>>> {
    let limit = params.limit() as i64;
    let offset = params.offset() as i64;

    let (items, total) =
        notification_service::list_notifications(&state.db, auth.id, limit, offset)?;

    let paginated = Paginated::new(items, total as u64, &params);
    Ok(Json(ApiResponse::ok(paginated)))
}

/// GET /notifications/unread-count
pub async fn unread_count(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> AppResult<Json<ApiResponse<UnreadCountResponse>>> {
    let count = notification_service::count_unread(&state.db, auth.id)?;

    Ok(Json(ApiResponse::ok(UnreadCountResponse { count })))
}

#[derive(Debug, serde::Serialize)]
pub struct UnreadCountResponse {
    pub count: i64,
}

/// POST /notifications/mark-all-read
pub async fn mark_all_read(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> AppResult<Json<ApiResponse<MarkAllReadResponse>>> {
    let updated = notification_service::mark_all_read(&state.db, auth.id)?;

    Ok(Json(ApiResponse::ok(MarkAllReadResponse { updated })))
}

#[derive(Debug, serde::Serialize)]
pub struct MarkAllReadResponse {
    pub updated: usize,
}

/// POST /notifications/:id/read
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Notification>>> {
    let notification = notification_service::mark_read(&state.db, id, auth.id)?;

    Ok(Json(ApiResponse::ok(notification)))
}
