use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::core::{CanonicalRequest, CanonicalResponse, FlowError, RouteDescriptor};

/// What a request flow decided for one request.
#[derive(Debug)]
pub enum FlowOutcome {
    Success(CanonicalResponse),
    Failure(FlowError),
}

/// The success/failure continuation pair handed to a request flow.
///
/// Both continuations consume the reply, so a flow can answer at most once.
/// The reply may be moved into a spawned task and answered later; dropping it
/// unanswered fails the request with [`FlowError::ReplyDropped`].
#[derive(Debug)]
pub struct Reply {
    tx: oneshot::Sender<FlowOutcome>,
}

impl Reply {
    /// Create a reply and the receiver the adapter awaits on.
    pub fn channel() -> (Self, oneshot::Receiver<FlowOutcome>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx }, rx)
    }

    /// Success continuation.
    pub fn succeed(self, response: CanonicalResponse) {
        self.send(FlowOutcome::Success(response));
    }

    /// Failure continuation.
    pub fn fail(self, error: impl Into<FlowError>) {
        self.send(FlowOutcome::Failure(error.into()));
    }

    /// Route a `Result` to the matching continuation.
    pub fn respond(self, result: Result<CanonicalResponse, FlowError>) {
        match result {
            Ok(response) => self.succeed(response),
            Err(error) => self.fail(error),
        }
    }

    fn send(self, outcome: FlowOutcome) {
        if self.tx.send(outcome).is_err() {
            tracing::debug!("Reply discarded: the request was abandoned by the transport");
        }
    }
}

/// The business handler contract.
///
/// The adapter calls `handle` with the matched route, the normalized request
/// and a [`Reply`]. The flow decides the outcome and reports it through the
/// reply; it never returns errors directly.
#[async_trait]
pub trait RequestFlow: Send + Sync + 'static {
    async fn handle(&self, route: Arc<RouteDescriptor>, request: CanonicalRequest, reply: Reply);
}

/// A [`RequestFlow`] backed by a closure.
pub struct FnFlow<F> {
    f: F,
}

/// Turn an async closure into a [`RequestFlow`].
///
/// ```
/// use axon_adapter::{core::CanonicalResponse, ports::flow_fn};
///
/// let flow = flow_fn(|_route, request, reply| async move {
///     reply.succeed(CanonicalResponse::ok(request.url().to_string()));
/// });
/// # let _ = flow;
/// ```
pub fn flow_fn<F, Fut>(f: F) -> FnFlow<F>
where
    F: Fn(Arc<RouteDescriptor>, CanonicalRequest, Reply) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    FnFlow { f }
}

#[async_trait]
impl<F, Fut> RequestFlow for FnFlow<F>
where
    F: Fn(Arc<RouteDescriptor>, CanonicalRequest, Reply) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    async fn handle(&self, route: Arc<RouteDescriptor>, request: CanonicalRequest, reply: Reply) {
        (self.f)(route, request, reply).await
    }
}

#[cfg(test)]
mod tests {
    use http::StatusCode;

    use super::*;
    use crate::core::{ApiError, HttpMethod};

    fn request() -> CanonicalRequest {
        CanonicalRequest::builder("test", "/ping", HttpMethod::Get).build()
    }

    #[tokio::test]
    async fn test_closure_flow_succeeds() {
        let flow = flow_fn(|_route, request, reply| async move {
            reply.succeed(CanonicalResponse::ok(request.url().to_string()));
        });
        let (reply, rx) = Reply::channel();

        flow.handle(RouteDescriptor::shared("/ping", [HttpMethod::Get]), request(), reply)
            .await;

        match rx.await.unwrap() {
            FlowOutcome::Success(response) => assert_eq!(response.status(), StatusCode::OK),
            FlowOutcome::Failure(e) => panic!("unexpected failure: {e}"),
        }
    }

    #[tokio::test]
    async fn test_reply_answered_from_spawned_task() {
        let flow = flow_fn(|_route, _request, reply| async move {
            tokio::spawn(async move {
                reply.fail(ApiError::not_found("gone"));
            });
        });
        let (reply, rx) = Reply::channel();

        flow.handle(RouteDescriptor::shared("/ping", [HttpMethod::Get]), request(), reply)
            .await;

        match rx.await.unwrap() {
            FlowOutcome::Failure(FlowError::Api(api)) => assert_eq!(api.message(), "gone"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_dropped_reply_closes_channel() {
        let (reply, rx) = Reply::channel();
        drop(reply);
        assert!(rx.await.is_err());
    }
}
