use axum::routing::{delete, get, post, put};
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
use ember_shared::clients::rabbitmq::RabbitMQClient;
use ember_shared::clients::redis::RedisClient;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    ember_shared::middleware::init_tracing("ember-access", &config.environment);
    let port = config.port;

    // The auth extractor reads the secret from the environment
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = create_pool(&config.database_url)?;
    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq, redis });

    let metrics_handle = ember_shared::middleware::init_metrics("ember-access");

    let moderation_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_moderation_events(moderation_state).await {
            tracing::error!(error = %e, "moderation event subscriber failed");
        }
    });

    let admin_routes = Router::new()
        .route("/users", get(routes::users::list_users))
        .route("/users/:id", get(routes::users::get_user))
        .route("/users/:id/role", put(routes::users::assign_role))
        .route("/users/:id/overlays", get(routes::overlays::list_overlays))
        .route("/users/:id/overlays", post(routes::overlays::create_overlay))
        .route("/users/:id/overlays/:gid", delete(routes::overlays::revoke_overlay))
        .route("/roles", get(routes::roles::list_roles))
        .route("/roles/:id/permissions", get(routes::roles::get_role_permissions));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        .route("/users/:id/permissions", get(routes::users::get_permissions))
        .route("/internal/users/:id/level", get(routes::internal::get_user_level))
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn(ember_shared::middleware::track_http))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "ember-access starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
