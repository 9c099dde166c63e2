use uuid::Uuid;

use ember_shared::clients::rabbitmq::RabbitMQClient;
use ember_shared::types::event::{payloads, routing_keys, Event};

pub async fn publish_role_changed(
    rabbitmq: &RabbitMQClient,
    user_id: Uuid,
    role_id: Uuid,
    role_name: &str,
    role_level: i32,
    changed_by: Uuid,
) {
    let event = Event::new(
        "ember-access",
        routing_keys::ACCESS_ROLE_CHANGED,
        payloads::RoleChanged {
            user_id,
            role_id,
            role_name: role_name.to_string(),
            role_level,
            changed_by,
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::ACCESS_ROLE_CHANGED, &event).await {
        tracing::error!(error = %e, "failed to publish role.changed event");
    }
}

pub async fn publish_overlay_granted(
    rabbitmq: &RabbitMQClient,
    grant_id: Uuid,
    user_id: Uuid,
    permission_key: &str,
    source: &str,
) {
    let event = Event::new(
        "ember-access",
        routing_keys::ACCESS_OVERLAY_GRANTED,
        payloads::OverlayChanged {
            grant_id,
            user_id,
            permission_key: permission_key.to_string(),
            source: source.to_string(),
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::ACCESS_OVERLAY_GRANTED, &event).await {
        tracing::error!(error = %e, "failed to publish overlay.granted event");
    }
}

pub async fn publish_overlay_revoked(
    rabbitmq: &RabbitMQClient,
    grant_id: Uuid,
    user_id: Uuid,
    permission_key: &str,
    source: &str,
) {
    let event = Event::new(
        "ember-access",
        routing_keys::ACCESS_OVERLAY_REVOKED,
        payloads::OverlayChanged {
            grant_id,
            user_id,
            permission_key: permission_key.to_string(),
            source: source.to_string(),
        },
    )
    .with_user(user_id);

    if let Err(e) = rabbitmq.publish(routing_keys::ACCESS_OVERLAY_REVOKED, &event).await {
        tracing::error!(error = %e, "failed to publish overlay.revoked event");
    }
}
