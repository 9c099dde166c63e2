use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{appeals, audit_log, reports, user_actions};

// --- UserAction ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = user_actions)]
pub struct UserAction {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action_type: String,
    pub reason: String,
    pub duration_days: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = user_actions)]
pub struct NewUserAction {
    pub user_id: Uuid,
    pub action_type: String,
    pub reason: String,
    pub duration_days: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
}

// --- Appeal ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = appeals)]
pub struct Appeal {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action_id: Option<Uuid>,
    pub body: String,
    pub status: String,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = appeals)]
pub struct NewAppeal {
    pub user_id: Uuid,
    pub action_id: Option<Uuid>,
    pub body: String,
}

// --- Report ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = reports)]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub target_type: String,
    pub target_id: Uuid,
    pub reason: String,
    pub status: String,
    pub assigned_to: Option<Uuid>,
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reports)]
pub struct NewReport {
    pub reporter_id: Uuid,
    pub target_type: String,
    pub target_id: Uuid,
    pub reason: String,
}

// --- AuditEntry ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = audit_log)]
pub struct AuditEntry {
    pub id: Uuid,
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = audit_log)]
pub struct NewAuditEntry {
    pub admin_id: Uuid,
    pub action: String,
    pub target_user_id: Option<Uuid>,
    pub details: Option<serde_json::Value>,
}
