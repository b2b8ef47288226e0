//! Command executor: a fixed registry of named handlers applied to the live
//! response.
use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

use crate::{
    core::{
        CommandEntry, CookieSpec, TransportError, TransportResponse,
        command::{self, Command, SET_COOKIE, SET_HEADER},
    },
    metrics,
};

/// Failure of a single command. Logged and skipped; never fails the response.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CommandError {
    #[error("invalid payload for command '{command}': {source}")]
    InvalidPayload {
        command: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

type CommandHandler =
    Arc<dyn Fn(&mut TransportResponse, &Value) -> Result<(), CommandError> + Send + Sync>;

/// Runs commands addressed to one adapter.
#[derive(Clone)]
pub struct CommandExecutor {
    adapter_name: String,
    registry: HashMap<String, CommandHandler>,
}

impl CommandExecutor {
    /// An executor with an empty registry.
    pub fn new(adapter_name: impl Into<String>) -> Self {
        Self {
            adapter_name: adapter_name.into(),
            registry: HashMap::new(),
        }
    }

    /// An executor preloaded with `setHeader` and `setCookie`.
    pub fn with_builtins(adapter_name: impl Into<String>) -> Self {
        let mut executor = Self::new(adapter_name);
        executor.register(SET_HEADER, |target, headers: BTreeMap<String, String>| {
            for (name, value) in &headers {
                target.set_header(name, value)?;
            }
            Ok(())
        });
        executor.register(SET_COOKIE, |target, cookies: BTreeMap<String, CookieSpec>| {
            for (name, cookie) in &cookies {
                target.set_cookie(name, cookie)?;
            }
            Ok(())
        });
        executor
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Register (or replace) a command whose payload deserializes into `P`.
    pub fn register<P, F>(&mut self, name: impl Into<String>, handler: F)
    where
        P: DeserializeOwned,
        F: Fn(&mut TransportResponse, P) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        let name = name.into();
        let command_name = name.clone();
        let handler: CommandHandler = Arc::new(move |target: &mut TransportResponse, payload: &Value| {
            let typed = P::deserialize(payload).map_err(|source| CommandError::InvalidPayload {
                command: command_name.clone(),
                source,
            })?;
            handler(target, typed)
        });
        self.registry.insert(name, handler);
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registry.contains_key(name)
    }

    /// Execute `entries` in order, flattening nested lists. Returns how many
    /// commands ran successfully.
    pub fn execute(&self, entries: &[CommandEntry], target: &mut TransportResponse) -> usize {
        command::flatten(entries)
            .into_iter()
            .filter(|command| self.execute_one(command, target))
            .count()
    }

    fn execute_one(&self, command: &Command, target: &mut TransportResponse) -> bool {
        if !command.applies_to(&self.adapter_name) {
            tracing::debug!(
                command = %command.name,
                adapter = %self.adapter_name,
                "Skipping command addressed to other adapters"
            );
            return false;
        }
        let Some(handler) = self.registry.get(&command.name) else {
            tracing::debug!(command = %command.name, "Ignoring unknown command");
            return false;
        };

        match handler(target, &command.payload) {
            Ok(()) => {
                metrics::increment_command_total(&command.name, "ok");
                true
            }
            Err(e) => {
                tracing::warn!(command = %command.name, "Command failed: {}", e);
                metrics::increment_command_total(&command.name, "error");
                false
            }
        }
    }
}

impl std::fmt::Debug for CommandExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<_> = self.registry.keys().collect();
        names.sort();
        f.debug_struct("CommandExecutor")
            .field("adapter_name", &self.adapter_name)
            .field("commands", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use http::header;
    use serde_json::json;

    use super::*;

    #[test]
    fn test_set_header_command() {
        let executor = CommandExecutor::with_builtins("HttpAdapter");
        let mut target = TransportResponse::new();

        let ran = executor.execute(
            &[CommandEntry::from(Command::set_header([("X-Test", "1")]))],
            &mut target,
        );

        assert_eq!(ran, 1);
        assert_eq!(target.headers().get("x-test").unwrap(), "1");
        assert_eq!(target.headers().len(), 1);
    }

    #[test]
    fn test_set_cookie_command() {
        let executor = CommandExecutor::with_builtins("HttpAdapter");
        let mut target = TransportResponse::new();
        let payload = json!({"session": {"value": "abc", "httpOnly": true}});

        executor.execute(&[CommandEntry::from(Command::new(SET_COOKIE, payload))], &mut target);

        let cookie = target.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("session=abc;"));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn test_adapter_filter_prevents_execution() {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut executor = CommandExecutor::new("HttpAdapter");
        let counter = calls.clone();
        executor.register("count", move |_target, _payload: Value| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let mut target = TransportResponse::new();

        let entries: Vec<CommandEntry> = vec![
            Command::new("count", Value::Null).for_adapters(["OtherAdapter"]).into(),
            Command::new("count", Value::Null).into(),
            Command::new("count", Value::Null)
                .for_adapters(["OtherAdapter", "HttpAdapter"])
                .into(),
        ];
        let ran = executor.execute(&entries, &mut target);

        assert_eq!(ran, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unknown_and_invalid_commands_are_skipped() {
        let executor = CommandExecutor::with_builtins("HttpAdapter");
        let mut target = TransportResponse::new();

        let entries: Vec<CommandEntry> = vec![
            Command::new("teleport", json!({"to": "mars"})).into(),
            Command::new(SET_HEADER, json!(["not", "a", "map"])).into(),
            CommandEntry::Nested(vec![Command::set_header([("X-After", "yes")]).into()]),
        ];
        let ran = executor.execute(&entries, &mut target);

        assert_eq!(ran, 1);
        assert_eq!(target.headers().get("x-after").unwrap(), "yes");
    }

    #[test]
    fn test_debug_lists_registered_commands() {
        let executor = CommandExecutor::with_builtins("HttpAdapter");
        assert!(executor.is_registered(SET_HEADER));
        assert!(executor.is_registered(SET_COOKIE));
        let debug = format!("{executor:?}");
        assert!(debug.contains("setCookie") && debug.contains("setHeader"));
    }
}
