//! Canonical response model produced by request flows.
use bytes::Bytes;
use http::StatusCode;
use serde_json::Value;

use crate::core::command::{Command, CommandEntry};

/// Response body as decided by the request flow.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Payload {
    #[default]
    Empty,
    Text(String),
    Json(Value),
    Bytes(Bytes),
}

impl From<Value> for Payload {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Payload::Empty,
            other => Payload::Json(other),
        }
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(bytes))
    }
}

/// Status, payload, exit code and commands returned by a request flow.
///
/// The exit code is an application-level result discriminator. It is always
/// surfaced to the client as a response header, next to (and independent of)
/// the HTTP status.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalResponse {
    status: StatusCode,
    payload: Payload,
    exit_code: i64,
    commands: Vec<CommandEntry>,
}

impl CanonicalResponse {
    pub fn new(status: StatusCode, payload: impl Into<Payload>) -> Self {
        Self {
            status,
            payload: payload.into(),
            exit_code: 0,
            commands: Vec::new(),
        }
    }

    /// A `200 OK` response.
    pub fn ok(payload: impl Into<Payload>) -> Self {
        Self::new(StatusCode::OK, payload)
    }

    pub fn with_exit_code(mut self, exit_code: i64) -> Self {
        self.exit_code = exit_code;
        self
    }

    pub fn with_command(mut self, command: impl Into<CommandEntry>) -> Self {
        self.commands.push(command.into());
        self
    }

    pub fn with_commands<I>(mut self, commands: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<CommandEntry>,
    {
        self.commands.extend(commands.into_iter().map(Into::into));
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn exit_code(&self) -> i64 {
        self.exit_code
    }

    pub fn commands(&self) -> &[CommandEntry] {
        &self.commands
    }

    /// Split into parts; used by materializers that consume the response.
    pub fn into_parts(self) -> (StatusCode, Payload, i64, Vec<CommandEntry>) {
        (self.status, self.payload, self.exit_code, self.commands)
    }
}

impl From<Command> for CanonicalResponse {
    /// An empty `204 No Content` carrying only a command.
    fn from(command: Command) -> Self {
        CanonicalResponse::new(StatusCode::NO_CONTENT, Payload::Empty).with_command(command)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_null_json_becomes_empty_payload() {
        assert_eq!(Payload::from(Value::Null), Payload::Empty);
        assert_eq!(Payload::from(json!({"ok": true})), Payload::Json(json!({"ok": true})));
    }

    #[test]
    fn test_builder_defaults_and_parts() {
        let response = CanonicalResponse::ok(json!({"ok": true}))
            .with_exit_code(7)
            .with_command(Command::set_header([("X-Test", "1")]));

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.exit_code(), 7);
        assert_eq!(response.commands().len(), 1);

        let (status, payload, exit_code, commands) = response.into_parts();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload, Payload::Json(json!({"ok": true})));
        assert_eq!(exit_code, 7);
        assert_eq!(commands.len(), 1);
    }
}
