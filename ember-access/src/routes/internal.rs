use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use diesel::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{Role, User};
use crate::schema::{roles, users};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UserLevelResponse {
    pub user_id: Uuid,
    pub role_name: String,
    pub role_level: i32,
    pub account_locked: bool,
}

/// GET /internal/users/:id/level — role rank lookup for other services
/// (service-to-service, no auth). Moderation gates its actions on this.
pub async fn get_user_level(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserLevelResponse>, StatusCode> {
    let mut conn = state.db.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection for level lookup");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let (user, role) = users::table
        .inner_join(roles::table)
        .filter(users::id.eq(user_id))
        .first::<(User, Role)>(&mut conn)
        .optional()
        .map_err(|e| {
            tracing::error!(error = %e, "level lookup query failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(StatusCode::NOT_FOUND)?;

    Ok(Json(UserLevelResponse {
        user_id: user.id,
        role_name: role.name,
        role_level: role.level,
        account_locked: user.account_locked,
    }))
}
