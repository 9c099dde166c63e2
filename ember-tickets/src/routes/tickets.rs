use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::ratelimit::{self, scopes, RateQuota};
use ember_shared::types::api::ApiResponse;
use ember_shared::types::auth::AuthUser;
use ember_shared::types::pagination::{Paginated, PaginationParams};

use crate::events::publisher;
use crate::models::{
    NewTicket, NewTicketAttachment, NewTicketMessage, Ticket, TicketAttachment, TicketMessage,
};
use crate::schema::{ticket_attachments, ticket_messages, tickets};
use crate::services::ticket_service::{self, ticket_status};
use crate::AppState;

// --- Request / Response types ---

#[derive(Debug, Deserialize, Validate)]
pub struct AttachmentMeta {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1, max = 100))]
    pub content_type: String,
    pub size_bytes: i64,
    /// Object key in upload storage; the bytes themselves never pass
    /// through this service.
    #[validate(length(min = 1, max = 255))]
    pub storage_key: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(email(message = "invalid contact email"))]
    pub contact_email: String,
    #[validate(length(min = 3, max = 200, message = "subject must be 3-200 characters"))]
    pub subject: String,
    #[validate(length(min = 10, max = 10000, message = "message must be 10-10000 characters"))]
    pub body: String,
    #[validate]
    pub attachment: Option<AttachmentMeta>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReplyRequest {
    #[validate(length(min = 1, max = 10000, message = "message must be 1-10000 characters"))]
    pub body: String,
    #[validate]
    pub attachment: Option<AttachmentMeta>,
}

#[derive(Debug, Serialize)]
pub struct MessageWithAttachments {
    #[serde(flatten)]
    pub message: TicketMessage,
    pub attachments: Vec<TicketAttachment>,
}

#[derive(Debug, Serialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: Ticket,
    pub messages: Vec<MessageWithAttachments>,
}

fn check_attachment_size(meta: &AttachmentMeta, max_bytes: i64) -> AppResult<()> {
    if meta.size_bytes <= 0 {
        return Err(AppError::new(ErrorCode::ValidationError, "size_bytes must be positive"));
    }
    if meta.size_bytes > max_bytes {
        return Err(AppError::new(
            ErrorCode::AttachmentTooLarge,
            format!("attachment exceeds the {max_bytes} byte limit"),
        ));
    }
    Ok(())
}

// --- Create ticket ---

/// POST /tickets — ticket, first message, and optional attachment are one
/// transaction: either the whole thread exists or none of it does.
pub async fn create_ticket(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CreateTicketRequest>,
) -> AppResult<Json<ApiResponse<TicketDetail>>> {
    body.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    if let Some(ref meta) = body.attachment {
        check_attachment_size(meta, state.config.max_attachment_bytes)?;
    }

    ratelimit::check(
        &state.redis,
        scopes::TICKET_CREATE,
        &auth,
        RateQuota::new(state.config.ticket_create_limit, 86400),
    )
    .await?;

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let new_ticket = NewTicket {
        user_id: auth.id,
        contact_email: body.contact_email.clone(),
        reference: ticket_service::generate_reference(),
        subject: body.subject.clone(),
    };

    let (ticket, message, attachment) = conn
        .transaction::<(Ticket, TicketMessage, Option<TicketAttachment>), diesel::result::Error, _>(
            |conn| {
                let ticket: Ticket = diesel::insert_into(tickets::table)
                    .values(&new_ticket)
                    .get_result(conn)?;

                let message: TicketMessage = diesel::insert_into(ticket_messages::table)
                    .values(&NewTicketMessage {
                        ticket_id: ticket.id,
                        author_id: auth.id,
                        author_is_staff: false,
                        body: body.body.clone(),
                    })
                    .get_result(conn)?;

                let attachment = match &body.attachment {
                    Some(meta) => Some(
                        diesel::insert_into(ticket_attachments::table)
                            .values(&NewTicketAttachment {
                                message_id: message.id,
                                file_name: meta.file_name.clone(),
                                content_type: meta.content_type.clone(),
                                size_bytes: meta.size_bytes,
                                storage_key: meta.storage_key.clone(),
                            })
                            .get_result::<TicketAttachment>(conn)?,
                    ),
                    None => None,
                };

                Ok((ticket, message, attachment))
            },
        )?;

    tracing::info!(ticket_id = %ticket.id, reference = %ticket.reference, "ticket created");

    publisher::publish_message_created(&state.rabbitmq, &ticket, &message).await;

    let detail = TicketDetail {
        ticket,
        messages: vec![MessageWithAttachments {
            message,
            attachments: attachment.into_iter().collect(),
        }],
    };

    Ok(Json(ApiResponse::ok(detail)))
}

// --- List own tickets ---

pub async fn list_my_tickets(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<ApiResponse<Paginated<Ticket>>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let offset = params.offset() as i64;
    let limit = params.limit() as i64;

    let items = tickets::table
        .filter(tickets::user_id.eq(auth.id))
        .order(tickets::updated_at.desc())
        .offset(offset)
        .limit(limit)
        .load::<Ticket>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let total: i64 = tickets::table
        .filter(tickets::user_id.eq(auth.id))
        .count()
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let paginated = Paginated::new(items, total as u64, &params);
    Ok(Json(ApiResponse::ok(paginated)))
}

// --- Get ticket with thread ---

pub async fn get_ticket(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<TicketDetail>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let ticket = load_ticket_checked(&mut conn, ticket_id, &auth)?;

    let messages = ticket_messages::table
        .filter(ticket_messages::ticket_id.eq(ticket_id))
        .order(ticket_messages::created_at.asc())
        .load::<TicketMessage>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let message_ids: Vec<Uuid> = messages.iter().map(|m| m.id).collect();
    let attachments = ticket_attachments::table
        .filter(ticket_attachments::message_id.eq_any(&message_ids))
        .load::<TicketAttachment>(&mut conn)
        .map_err(|e| AppError::internal(format!("db error: {e}")))?;

    let thread = messages
        .into_iter()
        .map(|message| {
            let attached = attachments
                .iter()
                .filter(|a| a.message_id == message.id)
                .cloned()
                .collect();
            MessageWithAttachments { message, attachments: attached }
        })
        .collect();

    Ok(Json(ApiResponse::ok(TicketDetail { ticket, messages: thread })))
}

// --- Reply ---

/// POST /tickets/:id/messages — add a message to the thread. A user reply
/// moves the ticket back to open, reopening a closed ticket; a staff reply
/// marks it answered.
pub async fn reply(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(ticket_id): Path<Uuid>,
    Json(body): Json<ReplyRequest>,
) -> AppResult<Json<ApiResponse<TicketDetail>>> {
    body.validate()
        .map_err(|e| AppError::new(ErrorCode::ValidationError, e.to_string()))?;

    if let Some(ref meta) = body.attachment {
        check_attachment_size(meta, state.config.max_attachment_bytes)?;
    }

    ratelimit::check(
        &state.redis,
        scopes::TICKET_REPLY,
        &auth,
        RateQuota::new(state.config.ticket_reply_limit, 3600),
    )
    .await?;

    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let ticket = load_ticket_checked(&mut conn, ticket_id, &auth)?;

    let author_is_staff = auth.is_staff() && auth.id != ticket.user_id;
    let next_status = ticket_service::status_after_reply(author_is_staff);

    let (updated, message, attachment) = conn
        .transaction::<(Ticket, TicketMessage, Option<TicketAttachment>), diesel::result::Error, _>(
            |conn| {
                let message: TicketMessage = diesel::insert_into(ticket_messages::table)
                    .values(&NewTicketMessage {
                        ticket_id,
                        author_id: auth.id,
                        author_is_staff,
                        body: body.body.clone(),
                    })
                    .get_result(conn)?;

                let attachment = match &body.attachment {
                    Some(meta) => Some(
                        diesel::insert_into(ticket_attachments::table)
                            .values(&NewTicketAttachment {
                                message_id: message.id,
                                file_name: meta.file_name.clone(),
                                content_type: meta.content_type.clone(),
                                size_bytes: meta.size_bytes,
                                storage_key: meta.storage_key.clone(),
                            })
                            .get_result::<TicketAttachment>(conn)?,
                    ),
                    None => None,
                };

                let updated: Ticket = diesel::update(tickets::table.find(ticket_id))
                    .set((
                        tickets::status.eq(next_status),
                        tickets::updated_at.eq(Utc::now()),
                    ))
                    .get_result(conn)?;

                Ok((updated, message, attachment))
            },
        )?;

    // Mail notification is downstream of this event and best-effort.
    publisher::publish_message_created(&state.rabbitmq, &updated, &message).await;

    let detail = TicketDetail {
        ticket: updated,
        messages: vec![MessageWithAttachments {
            message,
            attachments: attachment.into_iter().collect(),
        }],
    };

    Ok(Json(ApiResponse::ok(detail)))
}

// --- Close ---

pub async fn close_ticket(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(ticket_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Ticket>>> {
    let mut conn = state.db.get()
        .map_err(|e| AppError::internal(format!("db pool error: {e}")))?;

    let ticket = load_ticket_checked(&mut conn, ticket_id, &auth)?;

    if ticket.status == ticket_status::CLOSED {
        return Ok(Json(ApiResponse::ok(ticket)));
    }

    let updated: Ticket = diesel::update(tickets::table.find(ticket_id))
        .set((
            tickets::status.eq(ticket_status::CLOSED),
            tickets::updated_at.eq(Utc::now()),
        ))
        .get_result(&mut conn)
        .map_err(|e| AppError::internal(format!("failed to close ticket: {e}")))?;

    Ok(Json(ApiResponse::ok(updated)))
}

fn load_ticket_checked(
    conn: &mut PgConnection,
    ticket_id: Uuid,
    auth: &AuthUser,
) -> AppResult<Ticket> {
    let ticket = tickets::table
        .find(ticket_id)
        .first::<Ticket>(conn)
        .optional()
        .map_err(|e| AppError::internal(format!("db error: {e}")))?
        .ok_or_else(|| AppError::new(ErrorCode::TicketNotFound, "ticket not found"))?;

    if ticket.user_id != auth.id && !auth.is_staff() {
        return Err(AppError::new(
            ErrorCode::NotTicketParticipant,
            "only the ticket owner or staff may view this ticket",
        ));
    }

    Ok(ticket)
}
