//! HTTP inbound adapter exposing the REST API under `/api`.

pub mod admin;
pub mod auth;
pub mod dashboard;
pub mod envelope;
pub mod error;
pub mod health;
pub mod identity;
pub mod loans;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

pub use error::ApiResult;

use actix_web::web;

/// Register every `/api` route and the extractor error handlers.
///
/// Callers provide `web::Data<HttpState>` and `web::Data<HealthState>`.
///
/// # Examples
/// ```
/// use actix_web::App;
/// use loan_backend::inbound::http::configure;
///
/// let _app = App::new().configure(configure);
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(error::json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(error::query_error_handler))
        .app_data(web::PathConfig::default().error_handler(error::path_error_handler))
        .service(
            web::scope("/api")
                .service(health::live)
                .service(health::ready)
                .service(auth::login)
                .service(auth::me)
                .service(loans::apply)
                .service(loans::list_loans)
                .service(loans::get_loan)
                .service(loans::verify_loan)
                .service(admin::approve_loan)
                .service(admin::list_users)
                .service(admin::create_user)
                .service(admin::deactivate_user)
                .service(admin::activate_user)
                .service(dashboard::stats)
                .service(dashboard::recent_loans)
                .service(dashboard::my_activity),
        );
}
