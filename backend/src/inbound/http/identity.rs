//! Bearer-token identity extractor.
//!
//! Handlers that take [`Authenticated`] only run once the `Authorization`
//! header has been resolved to an active user. Role checks stay in the domain
//! services; this adapter only answers "who is calling".

use actix_web::http::header::AUTHORIZATION;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, User};
use crate::inbound::http::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// The resolved caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated(pub User);

impl Authenticated {
    /// Borrow the resolved user.
    pub fn user(&self) -> &User {
        &self.0
    }
}

/// Extract the raw token from an `Authorization` header value.
pub(crate) fn bearer_token(header: Option<&str>) -> Result<&str, Error> {
    let header = header.ok_or_else(|| Error::unauthorized("Authentication required"))?;
    let token = header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("Authorization header must use the Bearer scheme"))?;
    Ok(token)
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = req.app_data::<web::Data<HttpState>>().cloned();
        let header = req
            .headers()
            .get(AUTHORIZATION)
            .map(|value| value.to_str().map(str::to_owned));

        Box::pin(async move {
            let state =
                state.ok_or_else(|| Error::internal("HTTP state is not registered"))?;
            let header = match header {
                None => None,
                Some(Ok(value)) => Some(value),
                Some(Err(_)) => {
                    debug!("authorization header is not valid ASCII");
                    return Err(Error::unauthorized("Invalid token"));
                }
            };
            let token = bearer_token(header.as_deref())?;
            state.identity.resolve(token).await.map(Authenticated)
        })
    }
}
