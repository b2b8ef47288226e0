//! Axon adapter - binds an axum HTTP server to a transport-agnostic request flow.
//!
//! The adapter receives raw HTTP requests, normalizes them into a
//! [`CanonicalRequest`](core::CanonicalRequest), hands them to a
//! [`RequestFlow`](ports::RequestFlow) together with a
//! [`Reply`](ports::Reply) continuation, and turns the flow's
//! [`CanonicalResponse`](core::CanonicalResponse) back into HTTP: commands
//! (`setHeader`, `setCookie`, custom ones) first, then the exit code header,
//! the status and the body.
//!
//! # Features
//! - Routes as `(url, methods)` descriptors, registered at most once each
//! - Express-style `:param` / `*rest` url segments
//! - Parameters from headers, cookies, body, query and url path, scoped by source
//! - Extensible command protocol with adapter-name filtering
//! - API errors rendered as `{"error": message}`, everything else sent to a generic 500
//! - Lifecycle and per-request events over a broadcast channel
//! - Metrics via the `metrics` facade & structured tracing via `tracing`
//!
//! # Quick Example
//! ```no_run
//! use axon_adapter::{
//!     HttpAdapter,
//!     config::AdapterConfig,
//!     core::{CanonicalResponse, HttpMethod},
//!     ports::flow_fn,
//! };
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = AdapterConfig::builder()
//!     .listen_addr("127.0.0.1:8080")
//!     .route("/hello/:name", [HttpMethod::Get])
//!     .build();
//!
//! let mut adapter = HttpAdapter::new(&config)?;
//! adapter.set_request_flow(flow_fn(|_route, request, reply| async move {
//!     reply.succeed(CanonicalResponse::ok(request.url().to_string()));
//! }))?;
//! let addr = adapter.start().await?;
//! # let _ = addr;
//! adapter.stop().await?;
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (axum-backed
//! implementations) while keeping the transport-independent model inside
//! `core`.
//!
//! # Error Handling
//! Domain errors are `thiserror` enums; configuration and binary code use
//! `eyre::Result` with context attached through `WrapErr`.
pub mod config;
pub mod metrics;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{AdapterError, HttpAdapter},
    config::AdapterConfig,
    ports::{Reply, RequestFlow, flow_fn},
};
