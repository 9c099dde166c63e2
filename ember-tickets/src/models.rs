use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{ticket_attachments, ticket_messages, tickets};

// --- Ticket ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = tickets)]
pub struct Ticket {
    pub id: Uuid,
    pub user_id: Uuid,
    pub contact_email: String,
    pub reference: String,
    pub subject: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = tickets)]
pub struct NewTicket {
    pub user_id: Uuid,
    pub contact_email: String,
    pub reference: String,
    pub subject: String,
}

// --- TicketMessage ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = ticket_messages)]
pub struct TicketMessage {
    pub id: Uuid,
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub author_is_staff: bool,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ticket_messages)]
pub struct NewTicketMessage {
    pub ticket_id: Uuid,
    pub author_id: Uuid,
    pub author_is_staff: bool,
    pub body: String,
}

// --- TicketAttachment ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = ticket_attachments)]
pub struct TicketAttachment {
    pub id: Uuid,
    pub message_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = ticket_attachments)]
pub struct NewTicketAttachment {
    pub message_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_key: String,
}
