use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the tracing subscriber. `environment` comes from the service's
/// config; production gets JSON lines for the log pipeline, anything else a
/// human-readable format with source locations.
pub fn init_tracing(service_name: &str, environment: &str) {
    // Crate targets use underscores even when the package name has hyphens.
    let crate_target = service_name.replace('-', "_");
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{crate_target}=debug,tower_http=debug")));

    let registry = tracing_subscriber::registry().with(env_filter);

    if environment == "production" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true),
            )
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }

    tracing::info!(service = service_name, environment, "tracing initialized");
}
