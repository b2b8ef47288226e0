//! Configuration data structures for the HTTP adapter.
//!
//! These types map directly to TOML (also JSON / YAML) configuration files. Every
//! field has a default so that minimal configs remain concise.
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::{HttpMethod, RouteDescriptor};

pub const DEFAULT_ADAPTER_NAME: &str = "HttpAdapter";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_EXIT_CODE_HEADER: &str = "x-exit-code";
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";
pub const DEFAULT_BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// Transport middleware toggles.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MiddlewareConfig {
    /// Assign (or reuse) a request id and echo it on the response
    pub request_id: bool,
    /// Log each request with its latency
    pub request_timing: bool,
    /// Compress response bodies according to `Accept-Encoding`
    pub compression: bool,
}

impl Default for MiddlewareConfig {
    fn default() -> Self {
        Self {
            request_id: true,
            request_timing: true,
            compression: false,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// A route declared in the configuration file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RouteEntry {
    pub url: String,
    pub methods: Vec<HttpMethod>,
}

impl RouteEntry {
    pub fn new(url: impl Into<String>, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        Self {
            url: url.into(),
            methods: methods.into_iter().collect(),
        }
    }

    pub fn descriptor(&self) -> Arc<RouteDescriptor> {
        RouteDescriptor::shared(self.url.clone(), self.methods.iter().copied())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AdapterConfig {
    /// Adapter name matched against a command's `adapters` list
    pub name: String,
    pub listen_addr: String,
    pub exit_code_header: String,
    pub request_id_header: String,
    pub body_limit_bytes: usize,
    pub middleware: MiddlewareConfig,
    pub logging: LoggingConfig,
    pub routes: Vec<RouteEntry>,
}

impl AdapterConfig {
    /// Create a new adapter configuration builder
    pub fn builder() -> AdapterConfigBuilder {
        AdapterConfigBuilder::default()
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ADAPTER_NAME.to_string(),
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            exit_code_header: DEFAULT_EXIT_CODE_HEADER.to_string(),
            request_id_header: DEFAULT_REQUEST_ID_HEADER.to_string(),
            body_limit_bytes: DEFAULT_BODY_LIMIT_BYTES,
            middleware: MiddlewareConfig::default(),
            logging: LoggingConfig::default(),
            routes: Vec::new(),
        }
    }
}

/// Builder for AdapterConfig to allow for cleaner configuration creation
#[derive(Debug, Default)]
pub struct AdapterConfigBuilder {
    config: AdapterConfig,
}

impl AdapterConfigBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    pub fn exit_code_header(mut self, header: impl Into<String>) -> Self {
        self.config.exit_code_header = header.into();
        self
    }

    pub fn request_id_header(mut self, header: impl Into<String>) -> Self {
        self.config.request_id_header = header.into();
        self
    }

    pub fn body_limit_bytes(mut self, limit: usize) -> Self {
        self.config.body_limit_bytes = limit;
        self
    }

    pub fn middleware(mut self, middleware: MiddlewareConfig) -> Self {
        self.config.middleware = middleware;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Append a route declaration
    pub fn route(mut self, url: impl Into<String>, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        self.config.routes.push(RouteEntry::new(url, methods));
        self
    }

    pub fn build(self) -> AdapterConfig {
        self.config
    }
}
