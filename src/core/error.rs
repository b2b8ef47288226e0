//! Error taxonomy for request flows.
//!
//! * [`ApiError`] carries the HTTP semantics the flow intends; the error
//!   translator turns it into a `{"error": message}` response.
//! * [`FlowError::FlowNotDefined`] is a configuration error: no request flow
//!   was installed.
//! * Everything else is unclassified and goes to the transport's generic
//!   failure path.
use http::StatusCode;
use serde_json::{Value, json};
use thiserror::Error;

/// An error raised by business logic that knows its HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The structured body written for this error.
    pub fn body(&self) -> Value {
        json!({ "error": self.message })
    }
}

/// Failure delivered through a request flow's failure continuation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FlowError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("request flow not defined")]
    FlowNotDefined,

    #[error("request flow dropped its reply without responding")]
    ReplyDropped,

    #[error(transparent)]
    Other(#[from] eyre::Report),
}

impl FlowError {
    /// Wrap any message as an unclassified error.
    pub fn other(message: impl std::fmt::Display) -> Self {
        FlowError::Other(eyre::eyre!("{message}"))
    }

    /// Short label used in logs, events and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FlowError::Api(_) => "api",
            FlowError::FlowNotDefined => "flow_not_defined",
            FlowError::ReplyDropped => "reply_dropped",
            FlowError::Other(_) => "unclassified",
        }
    }

    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            FlowError::Api(api) => Some(api),
            _ => None,
        }
    }
}
