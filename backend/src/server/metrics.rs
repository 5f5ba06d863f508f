//! Prometheus request metrics served at `/metrics`.

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use prometheus::Registry;

/// Request counters and latency histograms labelled by route and status.
pub(crate) fn request_metrics() -> std::io::Result<PrometheusMetrics> {
    PrometheusMetricsBuilder::new("loans")
        .registry(Registry::new())
        .endpoint("/metrics")
        .build()
        .map_err(|err| std::io::Error::other(format!("metrics registration failed: {err}")))
}

#[cfg(test)]
mod tests {
    use actix_web::{App, HttpResponse, test, web};

    use super::*;

    #[actix_web::test]
    async fn metrics_endpoint_reports_requests() {
        let metrics = request_metrics().expect("metrics");
        let app = test::init_service(
            App::new()
                .wrap(metrics)
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;
        test::call_service(&app, test::TestRequest::get().uri("/ping").to_request()).await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
        let body = test::read_body(res).await;

        assert!(String::from_utf8_lossy(&body).contains("loans_http_requests_total"));
    }
}
