use axum::routing::{get, post, put};
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
    ember_shared::middleware::init_tracing("ember-tickets", &config.environment);
    let port = config.port;

    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = create_pool(&config.database_url)?;
    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let redis = RedisClient::connect(&config.redis_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq, redis });

    let metrics_handle = ember_shared::middleware::init_metrics("ember-tickets");

    let admin_routes = Router::new()
        .route("/tickets", get(routes::admin_routes::list_tickets));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(move || async move { metrics_handle.render() }))
        .route(
            "/tickets",
            post(routes::tickets::create_ticket).get(routes::tickets::list_my_tickets),
        )
        .route("/tickets/:id", get(routes::tickets::get_ticket))
        .route("/tickets/:id/messages", post(routes::tickets::reply))
        .route("/tickets/:id/close", put(routes::tickets::close_ticket))
        .nest("/admin", admin_routes)
        .layer(axum::middleware::from_fn(ember_shared::middleware::track_http))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "ember-tickets starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
