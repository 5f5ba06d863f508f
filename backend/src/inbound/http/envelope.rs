//! Success envelope shared by every JSON endpoint.
//!
//! Successful responses are wrapped as `{success: true, message?, data?}`.
//! Failures use the matching shape produced by the error adapter.

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

/// Success body wrapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T: Serialize> Envelope<T> {
    /// Wrap `data`.
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    /// Attach a human-readable message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Render with `status`.
    pub fn respond(self, status: StatusCode) -> HttpResponse {
        HttpResponse::build(status).json(self)
    }
}

impl Envelope<()> {
    /// Message-only envelope.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}

/// `200 OK` with `data`.
pub fn ok<T: Serialize>(data: T) -> HttpResponse {
    Envelope::data(data).respond(StatusCode::OK)
}

/// `200 OK` with `data` and a message.
pub fn ok_with_message<T: Serialize>(data: T, message: &str) -> HttpResponse {
    Envelope::data(data)
        .with_message(message)
        .respond(StatusCode::OK)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn data_envelope_omits_message() {
        let value = serde_json::to_value(Envelope::data(json!({ "id": 1 }))).expect("serialise");
        assert_eq!(value, json!({ "success": true, "data": { "id": 1 } }));
    }

    #[test]
    fn message_envelope_omits_data() {
        let value = serde_json::to_value(Envelope::message("done")).expect("serialise");
        assert_eq!(value, json!({ "success": true, "message": "done" }));
    }
}
