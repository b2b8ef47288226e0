//! Default response materializer.
use std::sync::Arc;

use http::{HeaderName, HeaderValue, header};

use crate::{
    adapters::command_executor::CommandExecutor,
    core::{CanonicalResponse, Payload, TransportError, TransportResponse},
    ports::ResponseMaterializer,
};

/// Runs commands, stamps the exit code header, sets the status and sends the
/// serialized payload, in that order.
#[derive(Debug, Clone)]
pub struct DefaultResponseMaterializer {
    executor: Arc<CommandExecutor>,
    exit_code_header: HeaderName,
}

impl DefaultResponseMaterializer {
    pub fn new(executor: Arc<CommandExecutor>, exit_code_header: HeaderName) -> Self {
        Self {
            executor,
            exit_code_header,
        }
    }

    pub fn exit_code_header(&self) -> &HeaderName {
        &self.exit_code_header
    }
}

/// Serialize a payload, returning the bytes and the content type it implies.
pub fn encode_payload(payload: Payload) -> Result<(bytes::Bytes, Option<&'static str>), TransportError> {
    Ok(match payload {
        Payload::Empty => (bytes::Bytes::new(), None),
        Payload::Text(text) => (text.into(), Some("text/plain; charset=utf-8")),
        Payload::Json(value) => (serde_json::to_vec(&value)?.into(), Some("application/json")),
        Payload::Bytes(bytes) => (bytes, Some("application/octet-stream")),
    })
}

impl ResponseMaterializer for DefaultResponseMaterializer {
    fn materialize(
        &self,
        response: CanonicalResponse,
        target: &mut TransportResponse,
    ) -> Result<(), TransportError> {
        if target.is_sent() {
            return Err(TransportError::AlreadySent);
        }
        let (status, payload, exit_code, commands) = response.into_parts();

        if !commands.is_empty() {
            self.executor.execute(&commands, target);
        }
        target.insert_header(self.exit_code_header.clone(), HeaderValue::from(exit_code));
        target.set_status(status);

        let (body, content_type) = encode_payload(payload)?;
        // A content type chosen through a command wins.
        match content_type {
            Some(content_type) if !target.headers().contains_key(header::CONTENT_TYPE) => {
                target.insert_header(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
            }
            _ => {}
        }
        target.send(body)
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;
    use serde_json::json;

    use super::*;
    use crate::core::{Command, CookieSpec};

    fn materializer() -> DefaultResponseMaterializer {
        DefaultResponseMaterializer::new(
            Arc::new(CommandExecutor::with_builtins("HttpAdapter")),
            HeaderName::from_static("x-exit-code"),
        )
    }

    #[test]
    fn test_status_exit_code_and_body() {
        let mut target = TransportResponse::new();
        let response = CanonicalResponse::ok(json!({"ok": true})).with_exit_code(7);

        materializer().materialize(response, &mut target).unwrap();

        assert_eq!(target.status(), StatusCode::OK);
        assert_eq!(target.headers().get("x-exit-code").unwrap(), "7");
        assert_eq!(target.headers().get(header::CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(target.body().as_ref(), br#"{"ok":true}"#);
        assert!(target.is_sent());
    }

    #[test]
    fn test_commands_run_before_body() {
        let mut target = TransportResponse::new();
        let response = CanonicalResponse::new(StatusCode::CREATED, "made")
            .with_exit_code(-2)
            .with_commands(vec![
                Command::set_header([("Content-Type", "text/csv")]),
                Command::set_cookie("session", CookieSpec::new("abc").http_only()),
            ]);

        materializer().materialize(response, &mut target).unwrap();

        assert_eq!(target.status(), StatusCode::CREATED);
        assert_eq!(target.headers().get("x-exit-code").unwrap(), "-2");
        assert_eq!(target.headers().get(header::CONTENT_TYPE).unwrap(), "text/csv");
        assert!(target.headers().contains_key(header::SET_COOKIE));
        assert_eq!(target.body().as_ref(), b"made");
    }

    #[test]
    fn test_exit_code_header_set_without_commands() {
        let mut target = TransportResponse::new();
        materializer()
            .materialize(CanonicalResponse::new(StatusCode::NO_CONTENT, Payload::Empty), &mut target)
            .unwrap();

        assert_eq!(target.headers().get("x-exit-code").unwrap(), "0");
        assert!(!target.headers().contains_key(header::CONTENT_TYPE));
        assert!(target.body().is_empty());
    }

    #[test]
    fn test_second_materialization_is_rejected() {
        let mut target = TransportResponse::new();
        let m = materializer();
        m.materialize(CanonicalResponse::ok("first"), &mut target).unwrap();

        let err = m
            .materialize(CanonicalResponse::ok("second").with_exit_code(9), &mut target)
            .unwrap_err();

        assert!(matches!(err, TransportError::AlreadySent));
        assert_eq!(target.body().as_ref(), b"first");
        assert_eq!(target.headers().get("x-exit-code").unwrap(), "0");
    }
}
