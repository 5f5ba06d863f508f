//! Server construction and middleware wiring.

mod config;
#[cfg(feature = "metrics")]
mod metrics;
mod state_builders;

pub use config::{AppSettings, SettingsError};
pub use state_builders::{StartupError, Storage, build_http_state, connect_storage};

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use tracing::info;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

use crate::Trace;
#[cfg(debug_assertions)]
use crate::doc::ApiDoc;
use crate::inbound::http::configure;
use crate::inbound::http::health::HealthState;

/// Connect the stores, bind the listener and mark the service ready.
///
/// The returned [`Server`] must be awaited to drive the listener.
///
/// # Errors
/// [`StartupError`] when settings are invalid, the database is unreachable,
/// migrations fail or the socket cannot be bound.
pub async fn create_server(
    health_state: web::Data<HealthState>,
    settings: &AppSettings,
) -> Result<Server, StartupError> {
    let bind_addr = settings.bind_addr()?;
    let storage = connect_storage(settings).await?;
    let http_state = web::Data::new(build_http_state(&storage, settings)?);
    #[cfg(feature = "metrics")]
    let prometheus = metrics::request_metrics()?;

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let app = App::new()
            .app_data(server_health_state.clone())
            .app_data(http_state.clone())
            .wrap(Trace)
            .configure(configure);

        #[cfg(debug_assertions)]
        let app =
            app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

        #[cfg(feature = "metrics")]
        let app = app.wrap(prometheus.clone());

        app
    })
    .bind(bind_addr)?
    .run();

    info!(%bind_addr, "listening");
    health_state.mark_ready();
    Ok(server)
}
