use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus recorder. Every metric carries a `service` label
/// so the scrape stays attributable when all services feed one dashboard.
pub fn init_metrics(service_name: &str) -> PrometheusHandle {
    PrometheusBuilder::new()
        .add_global_label("service", service_name.to_string())
        .install_recorder()
        .expect("failed to install Prometheus recorder")
}

/// Request counter, latency histogram, and in-flight gauge. Labelled by the
/// matched route template, not the raw path, so uuids in the path do not
/// explode label cardinality.
pub async fn track_http(
    matched_path: Option<MatchedPath>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let route = matched_path
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    gauge!("http_requests_in_flight").increment(1.0);
    let start = Instant::now();

    let response = next.run(req).await;

    let elapsed = start.elapsed().as_secs_f64();
    gauge!("http_requests_in_flight").decrement(1.0);

    let status = response.status().as_u16().to_string();
    counter!(
        "http_requests_total",
        "method" => method.clone(),
        "route" => route.clone(),
        "status" => status.clone()
    )
    .increment(1);
    histogram!(
        "http_request_duration_seconds",
        "method" => method,
        "route" => route,
        "status" => status
    )
    .record(elapsed);

    response
}
