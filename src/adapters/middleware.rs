//! Transport middleware wired around every bound route at boot.
//!
//! These are plain Axum `from_fn` layers. They run before the request flow
//! pipeline and only touch transport concerns: request identity and timing.
use std::{pin::Pin, time::Instant};

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

pub use crate::core::RequestId;

/// Reuse the inbound request id header or generate a UUID, expose it to the
/// pipeline and echo it on the response.
pub async fn request_id_middleware(mut req: Request, next: Next, header: HeaderName) -> Response {
    let request_id = req
        .headers()
        .get(&header)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    req.extensions_mut().insert(RequestId(request_id.clone()));

    let span = tracing::info_span!("request", request_id = %request_id);
    let mut response = next.run(req).instrument(span).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(header, header_value);
    }

    response
}

/// Create a cloneable closure wrapping [`request_id_middleware`].
pub fn create_request_id_middleware(
    header: HeaderName,
) -> impl Fn(Request, Next) -> Pin<Box<dyn std::future::Future<Output = Response> + Send>> + Clone
{
    move |req, next| {
        let header = header.clone();
        Box::pin(async move { request_id_middleware(req, next, header).await })
    }
}

/// Log start/end of a request including latency.
pub async fn request_timing_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    tracing::debug!("Started processing {} {}", method, uri);

    let response = next.run(req).await;

    tracing::info!(
        "Completed {} {} - {} in {:?}",
        method,
        uri,
        response.status(),
        start.elapsed()
    );

    response
}
