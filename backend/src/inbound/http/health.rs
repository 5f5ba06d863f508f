//! Health endpoints: liveness and readiness checks for orchestration.
//!
//! Liveness answers with the standard success envelope so simple uptime
//! checks can assert on `success`. Readiness flips once the stores are wired
//! and migrations have run.

use std::sync::atomic::{AtomicBool, Ordering};

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError, get, http::header, web};
use serde::Serialize;

use crate::domain::Error;
use crate::inbound::http::envelope::Envelope;

/// Shared health state.
pub struct HealthState {
    ready: AtomicBool,
    live: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            ready: AtomicBool::new(false),
            live: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    /// Not ready, but live.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the service as ready.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Release);
    }

    /// Fail liveness so orchestrators drain the instance during shutdown.
    pub fn mark_unhealthy(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn is_alive(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }
}

#[derive(Debug, Serialize)]
struct ProbeReport {
    status: &'static str,
}

fn check_response(passing: bool, healthy: &'static str, unhealthy: &str) -> HttpResponse {
    let mut response = if passing {
        Envelope::data(ProbeReport { status: healthy })
            .with_message("Service is healthy")
            .respond(StatusCode::OK)
    } else {
        Error::service_unavailable(format!("Service is {unhealthy}")).error_response()
    };
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, header::HeaderValue::from_static("no-store"));
    response
}

/// Liveness check. 200 while the process is alive, 503 once draining.
#[utoipa::path(
    get,
    path = "/api/health",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is alive"),
        (status = 503, description = "Server is shutting down")
    )
)]
#[get("/health")]
pub async fn live(state: web::Data<HealthState>) -> HttpResponse {
    check_response(state.is_alive(), "ok", "draining")
}

/// Readiness check. 200 once dependencies are initialised, 503 before that.
#[utoipa::path(
    get,
    path = "/api/health/ready",
    tags = ["health"],
    security([]),
    responses(
        (status = 200, description = "Server is ready to handle traffic"),
        (status = 503, description = "Server is not ready")
    )
)]
#[get("/health/ready")]
pub async fn ready(state: web::Data<HealthState>) -> HttpResponse {
    check_response(state.is_ready(), "ready", "starting")
}
