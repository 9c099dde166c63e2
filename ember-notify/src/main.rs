use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;
mod services;

use config::AppConfig;
use ember_shared::clients::db::{create_pool, DbPool};
use ember_shared::clients::email::EmailClient;
use ember_shared::clients::rabbitmq::RabbitMQClient;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    /// None when no mail API key is configured; in-app rows still happen.
    pub email: Option<EmailClient>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    ember_shared::middleware::init_tracing("ember-notify", &config.environment);
    let port = config.port;

    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = create_pool(&config.database_url)?;
    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let email = if config.email_enabled() {
        Some(EmailClient::new(&config.email_api_key, &config.email_from, &config.email_from_name))
    } else {
        tracing::warn!("no email API key configured, mail delivery disabled");
        None
    };

    let state = Arc::new(AppState { db, config, rabbitmq, email });

    let metrics_handle = ember_shared::middleware::init_metrics("ember-notify");

    let moderation_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_moderation_events(moderation_state).await {
            tracing::error!(error = %e, "moderation event subscriber failed");
        }
    });

    let ticket_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_ticket_events(ticket_state).await {
            tracing::error!(error = %e, "ticket event subscriber failed");
        }
    });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/unread-count", get(routes::notifications::unread_count))
        .route("/notifications/mark-all-read", post(routes::notifications::mark_all_read))
        .route("/notifications/:id/read", post(routes::notifications::mark_read))
        .layer(axum::middleware::from_fn(ember_shared::middleware::track_http))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "ember-notify starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
