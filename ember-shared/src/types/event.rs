use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// RabbitMQ event envelope wrapping all domain events.
///
/// Routing key format: `ember.{domain}.{entity}.{action}`
/// Example: `ember.moderation.action.issued`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event<T: Serialize> {
    pub id: Uuid,
    pub source: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: T,
}

impl<T: Serialize> Event<T> {
    pub fn new(source: impl Into<String>, event_type: impl Into<String>, data: T) -> Self {
        Self {
            id: Uuid::now_v7(),
            source: source.into(),
            event_type: event_type.into(),
            timestamp: Utc::now(),
            correlation_id: None,
            user_id: None,
            data,
        }
    }

    pub fn with_user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }
}

/// RabbitMQ routing keys
pub mod routing_keys {
    // Access events
    pub const ACCESS_ROLE_CHANGED: &str = "ember.access.role.changed";
    pub const ACCESS_OVERLAY_GRANTED: &str = "ember.access.overlay.granted";
    pub const ACCESS_OVERLAY_REVOKED: &str = "ember.access.overlay.revoked";

    // Moderation events
    pub const MODERATION_ACTION_ISSUED: &str = "ember.moderation.action.issued";
    pub const MODERATION_ACTION_LIFTED: &str = "ember.moderation.action.lifted";
    pub const MODERATION_APPEAL_RESOLVED: &str = "ember.moderation.appeal.resolved";
    pub const MODERATION_REPORT_CREATED: &str = "ember.moderation.report.created";

    // Ticket events
    pub const TICKETS_MESSAGE_CREATED: &str = "ember.tickets.message.created";
}

/// Common event data payloads
pub mod payloads {
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct RoleChanged {
        pub user_id: Uuid,
        pub role_id: Uuid,
        pub role_name: String,
        pub role_level: i32,
        pub changed_by: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct OverlayChanged {
        pub grant_id: Uuid,
        pub user_id: Uuid,
        pub permission_key: String,
        pub source: String,
    }

    /// A moderation action was issued. `lock_account` is true only for bans;
    /// the access service flips `account_locked` off it.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ActionIssued {
        pub action_id: Uuid,
        pub user_id: Uuid,
        pub action_type: String,
        pub reason: String,
        pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
        pub lock_account: bool,
    }

    /// An action was deactivated. `unlock_account` is true only when the
    /// lifted action was a ban and no other active ban remains for the user.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ActionLifted {
        pub action_id: Uuid,
        pub user_id: Uuid,
        pub action_type: String,
        pub unlock_account: bool,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct AppealResolved {
        pub appeal_id: Uuid,
        pub user_id: Uuid,
        pub action_id: Option<Uuid>,
        pub verdict: String,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct ReportCreated {
        pub report_id: Uuid,
        pub reporter_id: Uuid,
        pub target_type: String,
        pub target_id: Uuid,
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct TicketMessageCreated {
        pub ticket_id: Uuid,
        pub message_id: Uuid,
        pub ticket_reference: String,
        pub ticket_owner_id: Uuid,
        pub contact_email: String,
        pub author_id: Uuid,
        pub author_is_staff: bool,
        pub subject: String,
        pub body_preview: String,
    }
}
