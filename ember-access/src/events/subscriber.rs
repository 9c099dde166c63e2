use std::sync::Arc;

use diesel::prelude::*;
use futures_lite::StreamExt;
use lapin::options::BasicAckOptions;

use ember_shared::types::event::{payloads, routing_keys, Event};

use crate::schema::users;
use crate::services::permission_service;
use crate::AppState;

/// Apply moderation action events to the user record. A ban locks the
/// account; a lift unlocks it only when moderation says no other active ban
/// remains.
pub async fn listen_moderation_events(state: Arc<AppState>) -> anyhow::Result<()> {
    let mut consumer = state.rabbitmq.subscribe(
        "ember-access.moderation",
        &[
            routing_keys::MODERATION_ACTION_ISSUED,
            routing_keys::MODERATION_ACTION_LIFTED,
        ],
    ).await?;

    tracing::info!("listening for moderation action events");

    while let Some(delivery) = consumer.next().await {
        match delivery {
            Ok(delivery) => {
                let routing_key = delivery.routing_key.to_string();

                if routing_key == routing_keys::MODERATION_ACTION_ISSUED {
                    match serde_json::from_slice::<Event<payloads::ActionIssued>>(&delivery.data) {
                        Ok(event) => {
                            let data = &event.data;
                            if data.lock_account {
                                if let Err(e) = lock_account(&state, data.user_id, &data.reason) {
                                    tracing::error!(error = %e, user_id = %data.user_id, "failed to lock account");
                                }
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
                            if data.unlock_account {
                                if let Err(e) = unlock_account(&state, data.user_id) {
                                    tracing::error!(error = %e, user_id = %data.user_id, "failed to unlock account");
                                }
                            }
                        }
                        Err(e) => {
                            tracing::error!(error = %e, "failed to deserialize action.lifted event");
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

fn lock_account(state: &AppState, user_id: uuid::Uuid, reason: &str) -> anyhow::Result<()> {
    let mut conn = state.db.get()?;
    let updated = diesel::update(users::table.find(user_id))
        .set((
            users::account_locked.eq(true),
            users::locked_reason.eq(Some(reason.to_string())),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(&mut conn)?;

    tracing::info!(user_id = %user_id, updated, "account locked by moderation event");
    invalidate_permission_cache(state, user_id);
    Ok(())
}

fn unlock_account(state: &AppState, user_id: uuid::Uuid) -> anyhow::Result<()> {
    let mut conn = state.db.get()?;
    let updated = diesel::update(users::table.find(user_id))
        .set((
            users::account_locked.eq(false),
            users::locked_reason.eq(None::<String>),
            users::updated_at.eq(chrono::Utc::now()),
        ))
        .execute(&mut conn)?;

    tracing::info!(user_id = %user_id, updated, "account unlocked by moderation event");
    invalidate_permission_cache(state, user_id);
    Ok(())
}

fn invalidate_permission_cache(state: &AppState, user_id: uuid::Uuid) {
    let redis = state.redis.clone();
    let key = permission_service::cache_key(user_id);
    tokio::spawn(async move {
        if let Err(e) = redis.del(&key).await {
            tracing::warn!(error = %e, key = %key, "failed to drop permission cache entry");
        }
    });
}
