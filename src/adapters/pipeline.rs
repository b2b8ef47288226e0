//! Per-request orchestration.
//!
//! Every bound route funnels into [`RequestPipeline::run`]:
//!
//! ```text
//! Received -> Normalizing -> Dispatched -> Responded
//!     |                           |
//!     +-----------> Failed <------+
//! ```
//!
//! A request is handled exactly once and always ends in `Responded` or
//! `Failed`; nothing is retried.
use std::{fmt, sync::Arc};

use axum::{
    body::Body as AxumBody,
    extract::Request,
    response::{IntoResponse, Response},
};
use http::StatusCode;
use tracing::Instrument;

use crate::{
    core::{
        AdapterEvent, CanonicalResponse, EventBus, FlowError, HttpMethod, RawRequest,
        RouteDescriptor, TransportResponse,
    },
    metrics,
    ports::{
        ErrorTranslator, FlowOutcome, Reply, RequestFlow, RequestNormalizer, ResponseMaterializer,
        Translation,
    },
};

/// Where a request currently is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Normalizing,
    Dispatched,
    Responded,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Received => "received",
            Stage::Normalizing => "normalizing",
            Stage::Dispatched => "dispatched",
            Stage::Responded => "responded",
            Stage::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Identity of the request being processed, kept for events and metrics.
#[derive(Debug, Clone)]
struct RequestContext {
    route: Arc<RouteDescriptor>,
    method: HttpMethod,
    url: String,
    request_id: Option<String>,
}

/// Components active for the lifetime of a booted adapter.
pub struct RequestPipeline {
    adapter_name: String,
    body_limit: usize,
    normalizer: Arc<dyn RequestNormalizer>,
    materializer: Arc<dyn ResponseMaterializer>,
    error_translator: Arc<dyn ErrorTranslator>,
    flow: Option<Arc<dyn RequestFlow>>,
    events: EventBus,
}

impl RequestPipeline {
    pub fn new(
        adapter_name: impl Into<String>,
        body_limit: usize,
        normalizer: Arc<dyn RequestNormalizer>,
        materializer: Arc<dyn ResponseMaterializer>,
        error_translator: Arc<dyn ErrorTranslator>,
        flow: Option<Arc<dyn RequestFlow>>,
        events: EventBus,
    ) -> Self {
        Self {
            adapter_name: adapter_name.into(),
            body_limit,
            normalizer,
            materializer,
            error_translator,
            flow,
            events,
        }
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }

    /// Entry point bound to the transport for `(route, method)`.
    pub async fn run(
        &self,
        route: Arc<RouteDescriptor>,
        method: HttpMethod,
        req: Request,
    ) -> Response<AxumBody> {
        match RawRequest::from_request(req, self.body_limit).await {
            Ok(raw) => self.process(route, method, raw).await,
            Err(rejection) => rejection.into_response(),
        }
    }

    /// Drive an already parsed request through the pipeline.
    pub async fn process(
        &self,
        route: Arc<RouteDescriptor>,
        method: HttpMethod,
        raw: RawRequest,
    ) -> Response<AxumBody> {
        let ctx = RequestContext {
            route: Arc::clone(&route),
            method,
            url: raw.url.clone(),
            request_id: raw.request_id.clone(),
        };
        let span = tracing::info_span!(
            "flow",
            http.method = %method,
            http.route = %route.url(),
            request.id = ctx.request_id.as_deref().unwrap_or("-"),
        );
        self.process_inner(ctx, raw).instrument(span).await
    }

    async fn process_inner(&self, ctx: RequestContext, raw: RawRequest) -> Response<AxumBody> {
        let _timer = metrics::RequestTimer::new(ctx.route.url(), ctx.method.as_str());
        tracing::debug!(stage = %Stage::Received, url = %ctx.url);

        let Some(flow) = self.flow.as_ref() else {
            return self.fail(&ctx, FlowError::FlowNotDefined);
        };

        tracing::debug!(stage = %Stage::Normalizing);
        let request = self
            .normalizer
            .normalize(&self.adapter_name, &raw, ctx.method);

        tracing::debug!(stage = %Stage::Dispatched, identification = %request.identification());
        let (reply, outcome) = Reply::channel();
        flow.handle(Arc::clone(&ctx.route), request, reply).await;

        match outcome.await {
            Ok(FlowOutcome::Success(response)) => self.respond(&ctx, response),
            Ok(FlowOutcome::Failure(error)) => self.fail(&ctx, error),
            Err(_) => self.fail(&ctx, FlowError::ReplyDropped),
        }
    }

    fn respond(&self, ctx: &RequestContext, response: CanonicalResponse) -> Response<AxumBody> {
        let status = response.status();
        let exit_code = response.exit_code();
        let mut target = TransportResponse::new();

        if let Err(e) = self.materializer.materialize(response, &mut target) {
            tracing::error!("Failed to materialize response: {}", e);
            return self.fail(ctx, FlowError::other(e));
        }

        tracing::debug!(stage = %Stage::Responded, status = status.as_u16(), exit_code);
        metrics::increment_request_total(ctx.route.url(), ctx.method.as_str(), status.as_u16());
        self.events.emit(AdapterEvent::Responded {
            request_id: ctx.request_id.clone(),
            method: ctx.method,
            url: ctx.url.clone(),
            status: status.as_u16(),
            exit_code,
        });
        target.into_response()
    }

    fn fail(&self, ctx: &RequestContext, error: FlowError) -> Response<AxumBody> {
        let kind = error.kind();
        let message = error.to_string();
        tracing::debug!(stage = %Stage::Failed, kind, "{}", message);

        let mut target = TransportResponse::new();
        let response = match self.error_translator.translate(error, &mut target) {
            Translation::Handled => target.into_response(),
            Translation::Forward(error) => transport_error_response(error),
        };

        metrics::increment_flow_error(kind);
        metrics::increment_request_total(
            ctx.route.url(),
            ctx.method.as_str(),
            response.status().as_u16(),
        );
        self.events.emit(AdapterEvent::Errored {
            request_id: ctx.request_id.clone(),
            method: ctx.method,
            url: ctx.url.clone(),
            kind,
            message,
        });
        response
    }
}

impl fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("adapter_name", &self.adapter_name)
            .field("body_limit", &self.body_limit)
            .field("flow_defined", &self.flow.is_some())
            .finish_non_exhaustive()
    }
}

/// A forwarded error, attached to the generic failure response so that an
/// outer layer can inspect it and answer differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardedError {
    pub kind: &'static str,
    pub message: String,
}

/// The transport's generic failure path for errors nobody classified.
pub fn transport_error_response(error: FlowError) -> Response<AxumBody> {
    tracing::error!("Request handling error: {:?}", error);
    let mut response = (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response();
    response.extensions_mut().insert(ForwardedError {
        kind: error.kind(),
        message: error.to_string(),
    });
    response
}
