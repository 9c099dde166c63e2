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
use services::access_client::AccessClient;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub redis: RedisClient,
    pub access: AccessClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;
    ember_shared::middleware::init_tracing("ember-moderation", &config.environment);
    let port = config.port;

    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = create_pool(&config.database_url)?;
    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;
    let access = AccessClient::new(&config.access_base_url);

    let state = Arc::new(AppState { db, config, rabbitmq, redis, access });

    let metrics_handle = ember_shared::middleware::init_metrics("ember-moderation");

    let admin_routes = Router::new()
        .route("/reports", get(routes::admin_routes::list_reports))
        .route("/reports/:id", get(routes::admin_routes::get_report))
        .route("/reports/:id/assign", put(routes::admin_routes::assign_report))
        .route("/reports/:id/resolve", put(routes::admin_routes::resolve_report))
        .route("/users/:id/actions", get(routes::admin_routes::list_user_actions))
        .route("/users/:id/actions", post(routes::admin_routes::issue_action))
        .route("/users/:id/actions/:aid", delete(routes::admin_routes::lift_action))
        .route("/appeals", get(routes::admin_routes::list_appeals))
        .route("/appeals/:id/resolve", put(routes::admin_routes::resolve_appeal))
        .route("/stats", get(routes::admin_routes::get_stats))
        .route("/audit-log", get(routes::admin_routes::get_audit_log));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        .route("/report", post(routes::user_routes::create_report))
        .route("/appeals", post(routes::user_routes::create_appeal))
        .route("/me/actions", get(routes::user_routes::my_actions))
        .route("/me/appeals", get(routes::user_routes::my_appeals))
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn(ember_shared::middleware::track_http))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "ember-moderation starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
