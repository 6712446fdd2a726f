//! Prometheus exposition of the retail metrics.

use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use metrics::Unit;
use metrics_exporter_prometheus::PrometheusHandle;

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Registers help text for the metrics the services record.
pub fn describe() {
    metrics::describe_counter!("orders_total", "Buy requests received");
    metrics::describe_counter!("orders_completed", "Buy requests that persisted an order");
    metrics::describe_counter!("orders_aborted", "Buy requests aborted, by stage");
    metrics::describe_histogram!(
        "order_duration_seconds",
        Unit::Seconds,
        "Time spent driving one buy request"
    );
    metrics::describe_counter!("stock_decrements_total", "Stock decrements applied");
    metrics::describe_counter!("prices_calculated_total", "Carts priced");
    metrics::describe_counter!("loyalty_points_earned_total", "Loyalty points credited");
    metrics::describe_counter!("loyalty_points_redeemed_total", "Loyalty points debited");
    metrics::describe_counter!(
        "upstream_call_failures_total",
        "Failed collaborator calls, by collaborator"
    );
}

/// GET /metrics — Prometheus text format.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    handle.run_upkeep();
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, CONTENT_TYPE)],
        handle.render(),
    )
}
