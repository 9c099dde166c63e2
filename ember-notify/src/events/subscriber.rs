use std::sync::Arc;

use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use ember_shared::types::event::{payloads, routing_keys, Event};

use crate::services::notification_service;
use crate::AppState;

/// Listen for moderation events (action.issued, action.lifted,
/// appeal.resolved) and write in-app notifications for the affected user.
pub async fn listen_moderation_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "ember-notify.moderation",
        &[
            routing_keys::MODERATION_ACTION_ISSUED,
            routing_keys::MODERATION_ACTION_LIFTED,
            routing_keys::MODERATION_APPEAL_RESOLVED,
        ],
    ).await?;

    tracing::info!("listening for moderation events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let routing_key = delivery.routing_key.to_string();

                if routing_key == routing_keys::MODERATION_ACTION_ISSUED {
                    match serde_json::from_slice::<Event<payloads::ActionIssued>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            tracing::info!(
                                user_id = %data.user_id,
                                action_type = %data.action_type,
                                "received action.issued event"
                            );

                            let draft = notification_service::draft_action_issued(data);
                            if let Err(e) =
                                notification_service::deliver(&state.db, data.user_id, draft)
                            {
                                tracing::error!(error = %e, "failed to deliver action_issued notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize action.issued event");
                        }
                    }
                } else if routing_key == routing_keys::MODERATION_ACTION_LIFTED {
                    match serde_json::from_slice::<Event<payloads::ActionLifted>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            tracing::info!(
                                user_id = %data.user_id,
                                action_id = %data.action_id,
                                "received action.lifted event"
                            );

                            let draft = notification_service::draft_action_lifted(data);
                            if let Err(e) =
                                notification_service::deliver(&state.db, data.user_id, draft)
                            {
                                tracing::error!(error = %e, "failed to deliver action_lifted notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize action.lifted event");
                        }
                    }
                } else if routing_key == routing_keys::MODERATION_APPEAL_RESOLVED {
                    match serde_json::from_slice::<Event<payloads::AppealResolved>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            tracing::info!(
                                user_id = %data.user_id,
                                appeal_id = %data.appeal_id,
                                verdict = %data.verdict,
                                "received appeal.resolved event"
                            );

                            let draft = notification_service::draft_appeal_resolved(data);
                            if let Err(e) =
                                notification_service::deliver(&state.db, data.user_id, draft)
                            {
                                tracing::error!(error = %e, "failed to deliver appeal_resolved notification");
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize appeal.resolved event");
                        }
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "moderation consumer error");
            }
        }
    }

    Ok(())
}

/// Listen for ticket events (message.created). Staff replies notify the
/// ticket owner in-app and by mail; mail is best effort.
pub async fn listen_ticket_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "ember-notify.tickets",
        &[routing_keys::TICKETS_MESSAGE_CREATED],
    ).await?;

    tracing::info!("listening for ticket events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                match serde_json::from_slice::<Event<payloads::TicketMessageCreated>>(&delivery.data) {
                    Ok(event) => {
                        let data = &event.data;
                        tracing::info!(
                            ticket_id = %data.ticket_id,
                            message_id = %data.message_id,
                            author_is_staff = data.author_is_staff,
                            "received ticket.message.created event"
                        );

                        // Owner replies need no self-notification.
                        if data.author_is_staff {
                            let draft = notification_service::draft_ticket_reply(data);
                            if let Err(e) =
                                notification_service::deliver(&state.db, data.ticket_owner_id, draft)
                            {
                                tracing::error!(error = %e, "failed to deliver ticket_reply notification");
                            }

                            if let Some(email) = &state.email {
                                if let Err(e) = email
                                    .send_ticket_reply(
                                        &data.contact_email,
                                        &data.ticket_reference,
                                        &data.subject,
                                        &data.body_preview,
                                    )
                                    .await
                                {
                                    tracing::error!(
                                        error = %e,
                                        ticket_id = %data.ticket_id,
                                        "failed to send ticket reply email"
                                    );
                                }
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "failed to deserialize ticket.message.created event");
                    }
                }

                let _ = delivery.ack(BasicAckOptions::default()).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "ticket consumer error");
            }
        }
    }

    Ok(())
}
