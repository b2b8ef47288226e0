//! Lightweight metrics helpers for the adapter.
//!
//! Thin wrappers around the `metrics` crate macros. No exporter is embedded;
//! the hosting application installs whichever recorder it wants. Without a
//! recorder every call is a no-op.
//!
//! Provided metrics:
//! * `axon_adapter_requests_total` (counter; method, route, status)
//! * `axon_adapter_request_duration_seconds` (histogram; method, route)
//! * `axon_adapter_flow_errors_total` (counter; kind)
//! * `axon_adapter_commands_total` (counter; command, outcome)
//! * `axon_adapter_routes_registered_total` (counter; method)
//!
//! [`RequestTimer`] records its duration on `Drop`, so early returns are
//! still measured.
use std::time::Instant;

use metrics::{Unit, counter, describe_counter, describe_histogram, histogram};
use once_cell::sync::Lazy;

pub const ADAPTER_REQUESTS_TOTAL: &str = "axon_adapter_requests_total";
pub const ADAPTER_REQUEST_DURATION_SECONDS: &str = "axon_adapter_request_duration_seconds";
pub const ADAPTER_FLOW_ERRORS_TOTAL: &str = "axon_adapter_flow_errors_total";
pub const ADAPTER_COMMANDS_TOTAL: &str = "axon_adapter_commands_total";
pub const ADAPTER_ROUTES_REGISTERED_TOTAL: &str = "axon_adapter_routes_registered_total";

static DESCRIPTIONS: Lazy<()> = Lazy::new(|| {
    describe_counter!(
        ADAPTER_REQUESTS_TOTAL,
        Unit::Count,
        "Total number of requests answered through bound routes."
    );
    describe_histogram!(
        ADAPTER_REQUEST_DURATION_SECONDS,
        Unit::Seconds,
        "Time from route match to materialized response."
    );
    describe_counter!(
        ADAPTER_FLOW_ERRORS_TOTAL,
        Unit::Count,
        "Requests that ended on the failure path, by error kind."
    );
    describe_counter!(
        ADAPTER_COMMANDS_TOTAL,
        Unit::Count,
        "Response commands executed, by command name and outcome."
    );
    describe_counter!(
        ADAPTER_ROUTES_REGISTERED_TOTAL,
        Unit::Count,
        "Route methods bound to the transport."
    );
});

/// Register metric descriptions (idempotent).
pub fn init_metrics() -> eyre::Result<()> {
    tracing::info!("Initializing adapter metrics");
    Lazy::force(&DESCRIPTIONS);
    Ok(())
}

pub fn increment_request_total(route: &str, method: &str, status: u16) {
    counter!(
        ADAPTER_REQUESTS_TOTAL,
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn increment_flow_error(kind: &'static str) {
    counter!(ADAPTER_FLOW_ERRORS_TOTAL, "kind" => kind).increment(1);
}

pub fn increment_command_total(command: &str, outcome: &'static str) {
    counter!(
        ADAPTER_COMMANDS_TOTAL,
        "command" => command.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn increment_routes_registered(method: &str) {
    counter!(ADAPTER_ROUTES_REGISTERED_TOTAL, "method" => method.to_string()).increment(1);
}

/// RAII helper measuring request duration per route.
pub struct RequestTimer {
    start: Instant,
    route: String,
    method: String,
}

impl RequestTimer {
    pub fn new(route: &str, method: &str) -> Self {
        Self {
            start: Instant::now(),
            route: route.to_string(),
            method: method.to_string(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        histogram!(
            ADAPTER_REQUEST_DURATION_SECONDS,
            "route" => self.route.clone(),
            "method" => self.method.clone()
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_metrics() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_recording_without_recorder_is_noop() {
        increment_request_total("/users/:id", "get", 200);
        increment_flow_error("api");
        increment_command_total("setHeader", "ok");
        increment_routes_registered("post");
        drop(RequestTimer::new("/users/:id", "get"));
    }
}
