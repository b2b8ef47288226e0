//! Default error translator.
use http::{HeaderValue, header};

use crate::{
    core::{FlowError, TransportResponse},
    ports::{ErrorTranslator, Translation},
};

/// Answers [`FlowError::Api`] with its status and `{"error": message}`;
/// forwards every other error.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultErrorTranslator;

impl DefaultErrorTranslator {
    pub fn new() -> Self {
        Self
    }
}

impl ErrorTranslator for DefaultErrorTranslator {
    fn translate(&self, error: FlowError, target: &mut TransportResponse) -> Translation {
        let FlowError::Api(api) = error else {
            return Translation::Forward(error);
        };

        target.set_status(api.status());
        target.insert_header(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        match target.send(api.body().to_string()) {
            Ok(()) => Translation::Handled,
            Err(e) => {
                tracing::warn!("Could not write API error response: {}", e);
                Translation::Forward(FlowError::Api(api))
            }
        }
    }
}
