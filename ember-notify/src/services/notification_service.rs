use diesel::prelude::*;
use uuid::Uuid;

use ember_shared::clients::db::DbPool;
use ember_shared::errors::{AppError, AppResult, ErrorCode};
use ember_shared::types::event::payloads;

use crate::models::{NewNotification, Notification};
use crate::schema::notifications;

/// The notification categories this service emits. The wire/database
/// representation is the snake_case string from `as_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    ActionIssued,
    ActionLifted,
    AppealResolved,
    TicketReply,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ActionIssued => "action_issued",
            Self::ActionLifted => "action_lifted",
            Self::AppealResolved => "appeal_resolved",
            Self::TicketReply => "ticket_reply",
        }
    }
}

/// A notification ready to be written, addressed to nobody yet. Drafting is
/// pure so the wording can be tested without a broker or a database.
#[derive(Debug)]
pub struct Draft {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

pub fn draft_action_issued(payload: &payloads::ActionIssued) -> Draft {
    let expiry = match payload.expires_at {
        Some(at) => format!("until {}", at.format("%Y-%m-%d %H:%M UTC")),
        None => "permanently".to_string(),
    };

    Draft {
        kind: NotificationKind::ActionIssued,
        title: "Moderation action".to_string(),
        body: format!("You received a {} {expiry}: {}", payload.action_type, payload.reason),
        data: serde_json::json!({
            "action_id": payload.action_id,
            "action_type": payload.action_type,
            "reason": payload.reason,
            "expires_at": payload.expires_at,
        }),
    }
}

pub fn draft_action_lifted(payload: &payloads::ActionLifted) -> Draft {
    Draft {
        kind: NotificationKind::ActionLifted,
        title: "Moderation action lifted".to_string(),
        body: format!("Your {} has been lifted", payload.action_type),
        data: serde_json::json!({
            "action_id": payload.action_id,
            "action_type": payload.action_type,
        }),
    }
}

pub fn draft_appeal_resolved(payload: &payloads::AppealResolved) -> Draft {
    let body = if payload.verdict == "approved" {
        "Your appeal was approved and the linked action has been lifted"
    } else {
        "Your appeal was reviewed and rejected"
    };

    Draft {
        kind: NotificationKind::AppealResolved,
        title: "Appeal decision".to_string(),
        body: body.to_string(),
        data: serde_json::json!({
            "appeal_id": payload.appeal_id,
            "action_id": payload.action_id,
            "verdict": payload.verdict,
        }),
    }
}

pub fn draft_ticket_reply(payload: &payloads::TicketMessageCreated) -> Draft {
    Draft {
        kind: NotificationKind::TicketReply,
        title: format!("New reply on ticket #{}", payload.ticket_reference),
        body: payload.body_preview.clone(),
        data: serde_json::json!({
            "ticket_id": payload.ticket_id,
            "message_id": payload.message_id,
            "ticket_reference": payload.ticket_reference,
        }),
    }
}

fn conn(pool: &DbPool) -> AppResult<ember_shared::clients::db::DbConnection> {
    pool.get().map_err(|e| {
        tracing::error!(error = %e, "failed to get db connection");
        AppError::internal("database connection error")
    })
}

/// Write a drafted notification for a user.
pub fn deliver(pool: &DbPool, user_id: Uuid, draft: Draft) -> AppResult<Notification> {
    let mut conn = conn(pool)?;

    let row = NewNotification {
        user_id,
        notification_type: draft.kind.as_str().to_string(),
        title: draft.title,
        body: draft.body,
        data: Some(draft.data),
    };

    let notification = diesel::insert_into(notifications::table)
        .values(&row)
        .get_result::<Notification>(&mut conn)?;

    tracing::debug!(
        notification_id = %notification.id,
        user_id = %user_id,
        kind = draft.kind.as_str(),
        "notification delivered"
    );

    Ok(notification)
}

/// A user's notifications, newest first, with the total for pagination.
pub fn list_notifications(
    pool: &DbPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> AppResult<(Vec<Notification>, i64)> {
    let mut conn = conn(pool)?;

    let mine = notifications::table.filter(notifications::user_id.eq(user_id));

    let total: i64 = mine.count().get_result(&mut conn)?;

    let items = mine
        .order(notifications::created_at.desc())
        .limit(limit)
        .offset(offset)
        .load::<Notification>(&mut conn)?;

    Ok((items, total))
}

pub fn count_unread(pool: &DbPool, user_id: Uuid) -> AppResult<i64> {
    let mut conn = conn(pool)?;

    let count: i64 = notifications::table
        .filter(notifications::user_id.eq(user_id))
        .filter(notifications::is_read.eq(false))
        .count()
        .get_result(&mut conn)?;

    Ok(count)
}

pub fn mark_all_read(pool: &DbPool, user_id: Uuid) -> AppResult<usize> {
    let mut conn = conn(pool)?;

    let updated = diesel::update(
        notifications::table
            .filter(notifications::user_id.eq(user_id))
            .filter(notifications::is_read.eq(false)),
    )
    .set(notifications::is_read.eq(true))
    .execute(&mut conn)?;

    Ok(updated)
}

/// Mark a single notification as read. The update is scoped to the owner, so
/// someone else's notification id comes back as not found rather than leaking
/// its existence.
pub fn mark_read(pool: &DbPool, notification_id: Uuid, user_id: Uuid) -> AppResult<Notification> {
    let mut conn = conn(pool)?;

    let updated = diesel::update(
        notifications::table
            .filter(notifications::id.eq(notification_id))
            .filter(notifications::user_id.eq(user_id)),
    )
    .set(notifications::is_read.eq(true))
    .get_result::<Notification>(&mut conn)
    .optional()?;

    mark_read_result(updated)
}

fn mark_read_result(updated: Option<Notification>) -> AppResult<Notification> {
    updated.ok_or_else(|| AppError::new(ErrorCode::NotificationNotFound, "notification not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn issued(expires_at: Option<chrono::DateTime<Utc>>) -> payloads::ActionIssued {
        payloads::ActionIssued {
            action_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            action_type: "ban".to_string(),
            reason: "spam".to_string(),
            expires_at,
            lock_account: true,
        }
    }

    #[test]
    fn kind_strings_are_stable() {
        assert_eq!(NotificationKind::ActionIssued.as_str(), "action_issued");
        assert_eq!(NotificationKind::ActionLifted.as_str(), "action_lifted");
        assert_eq!(NotificationKind::AppealResolved.as_str(), "appeal_resolved");
        assert_eq!(NotificationKind::TicketReply.as_str(), "ticket_reply");
    }

    #[test]
    fn permanent_ban_reads_permanently() {
        let draft = draft_action_issued(&issued(None));

        assert_eq!(draft.kind, NotificationKind::ActionIssued);
        assert_eq!(draft.body, "You received a ban permanently: spam");
    }

    #[test]
    fn timed_ban_names_the_expiry() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 18, 30, 0).single();
        let draft = draft_action_issued(&issued(at));

        assert_eq!(draft.body, "You received a ban until 2026-03-01 18:30 UTC: spam");
    }

    #[test]
    fn appeal_verdict_picks_the_body() {
        let mut payload = payloads::AppealResolved {
            appeal_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            action_id: None,
            verdict: "approved".to_string(),
        };

        let draft = draft_appeal_resolved(&payload);
        assert_eq!(draft.body, "Your appeal was approved and the linked action has been lifted");

        payload.verdict = "rejected".to_string();
        let draft = draft_appeal_resolved(&payload);
        assert_eq!(draft.body, "Your appeal was reviewed and rejected");
    }

    #[test]
    fn ticket_reply_draft_carries_the_reference() {
        let payload = payloads::TicketMessageCreated {
            ticket_id: Uuid::new_v4(),
            message_id: Uuid::new_v4(),
            ticket_reference: "TKT-2026-000042".to_string(),
            ticket_owner_id: Uuid::new_v4(),
            contact_email: "user@example.com".to_string(),
            author_id: Uuid::new_v4(),
            author_is_staff: true,
            subject: "Login broken".to_string(),
            body_preview: "We pushed a fix, can you retry?".to_string(),
        };

        let draft = draft_ticket_reply(&payload);

        assert_eq!(draft.kind, NotificationKind::TicketReply);
        assert_eq!(draft.title, "New reply on ticket #TKT-2026-000042");
        assert_eq!(draft.body, "We pushed a fix, can you retry?");
        assert_eq!(draft.data["ticket_reference"], "TKT-2026-000042");
    }

    #[test]
    fn mark_read_misses_map_to_not_found() {
        let err = mark_read_result(None).unwrap_err();

        match err {
            AppError::Known { code, .. } => assert_eq!(code, ErrorCode::NotificationNotFound),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
