use chrono::{DateTime, Utc};
use uuid::Uuid;

use ember_shared::clients::rabbitmq::RabbitMQClient;
use ember_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_action_issued(
    rabbitmq: &RabbitMQClient,
    action_id: Uuid,
    user_id: Uuid,
    action_type: &str,
    reason: &str,
    expires_at: Option<DateTime<Utc>>,
    lock_account: bool,
) {
    let event = Event::new(
        "ember-moderation",
        routing_keys::MODERATION_ACTION_ISSUED,
        payloads::ActionIssued {
            action_id,
            user_id,
            action_type: action_type.to_string(),
            reason: reason.to_string(),
            expires_at,
            lock_account,
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_ACTION_ISSUED, &event).await {
        tracing::error!(error = %e, "failed to publish action.issued event");
    }
}

pub async fn publish_action_lifted(
    rabbitmq: &RabbitMQClient,
    action_id: Uuid,
    user_id: Uuid,
    action_type: &str,
    unlock_account: bool,
) {
    let event = Event::new(
        "ember-moderation",
        routing_keys::MODERATION_ACTION_LIFTED,
        payloads::ActionLifted {
            action_id,
            user_id,
            action_type: action_type.to_string(),
            unlock_account,
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_ACTION_LIFTED, &event).await {
        tracing::error!(error = %e, "failed to publish action.lifted event");
    }
}

pub async fn publish_appeal_resolved(
    rabbitmq: &RabbitMQClient,
    appeal_id: Uuid,
    user_id: Uuid,
    action_id: Option<Uuid>,
    verdict: &str,
) {
    let event = Event::new(
        "ember-moderation",
        routing_keys::MODERATION_APPEAL_RESOLVED,
        payloads::AppealResolved {
            appeal_id,
            user_id,
            action_id,
            verdict: verdict.to_string(),
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_APPEAL_RESOLVED, &event).await {
        tracing::error!(error = %e, "failed to publish appeal.resolved event");
    }
}

pub async fn publish_report_created(
    rabbitmq: &RabbitMQClient,
    report_id: Uuid,
    reporter_id: Uuid,
    target_type: &str,
    target_id: Uuid,
) {
    let event = Event::new(
        "ember-moderation",
        routing_keys::MODERATION_REPORT_CREATED,
        payloads::ReportCreated {
            report_id,
            reporter_id,
            target_type: target_type.to_string(),
            target_id,
        },
    )
    .with_user(reporter_id);

    if let Err(e) = rabbitmq.publish(routing_keys::MODERATION_REPORT_CREATED, &event).await {
        tracing::error!(error = %e, "failed to publish report.created event");
    }
}
