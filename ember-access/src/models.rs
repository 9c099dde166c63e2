use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::schema::{overlay_grants, permissions, roles, users};

// --- User ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub email: String,
    pub role_id: Uuid,
    pub avatar_url: Option<String>,
    pub account_locked: bool,
    pub locked_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// --- Role ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = roles)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    pub level: i32,
}

// --- Permission ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = permissions)]
pub struct Permission {
    pub id: Uuid,
    pub key: String,
    pub label: String,
    pub category: String,
}

// --- OverlayGrant ---

#[derive(Debug, Queryable, Identifiable, Serialize, Clone)]
#[diesel(table_name = overlay_grants)]
pub struct OverlayGrant {
    pub id: Uuid,
    pub user_id: Uuid,
    pub permission_id: Uuid,
    pub source: String,
    pub source_label: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = overlay_grants)]
pub struct NewOverlayGrant {
    pub user_id: Uuid,
    pub permission_id: Uuid,
    pub source: String,
    pub source_label: String,
    pub valid_from: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
}
