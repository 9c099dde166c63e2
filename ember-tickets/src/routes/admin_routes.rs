use axum::extract::{Query, State};
use axum::Json;
use diesel::prelude::*;
use serde::Deserialize;
use std::sync::Arc;

use ember_shared::errors::{AppError, AppResult};
use ember_shared::middleware::StaffUser;
use ember_shared::types::api::ApiResponse;
use ember_shared::types::pagination::{Paginated, PaginationParams};

use crate::models::Ticket;
use crate::schema::tickets;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TicketFilterParams {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    pub status: Option<String>,
}

fn default_page() -> u64 { 1 }
fn default_per_page() -> u64 { 20 }

impl TicketFilterParams {
    fn pagination(&self) -> PaginationParams {
        PaginationParams {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

/// GET /admin/tickets — the staff queue, oldest activity first.
pub async fn list_tickets(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Query(params): Query<TicketFilterParams>,
) -> AppResult<Json<ApiResponse<Paginated<Ticket>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let pagination = params.pagination();
    let offset = pagination.offset() as i64;
    let limit = pagination.limit() as i64;

    let (items, total): (Vec<Ticket>, i64) = if let Some(ref status) = params.status {
        let items = tickets::table
            .filter(tickets::status.eq(status))
            .order(tickets::updated_at.asc())
            .offset(offset)
            .limit(limit)
            .load::<Ticket>(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        let total: i64 = tickets::table
            .filter(tickets::status.eq(status))
            .count()
            .get_result(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        (items, total)
    } else {
        let items = tickets::table
            .order(tickets::updated_at.asc())
            .offset(offset)
            .limit(limit)
            .load::<Ticket>(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        let total: i64 = tickets::table
            .count()
            .get_result(&mut conn)
            .map_err(|e| AppError::internal(format!("db error: {e}")))?;

        (items, total)
    };

    let paginated = Paginated::new(items, total as u64, &pagination);
    Ok(Json(ApiResponse::ok(paginated)))
}
