//! Adapter lifecycle: configure, boot, start, stop.
//!
//! ```text
//! new ──► (setters, register) ──► boot ──► start ──► stop
//!                                   ▲        │
//!                                   └ auto ──┘
//! ```
//!
//! Swappable components and routes can only change before `boot`. After boot
//! the router is frozen and every request runs through one
//! [`RequestPipeline`].
use std::{collections::BTreeMap, net::SocketAddr, sync::Arc};

use axum::{Router, http::StatusCode, middleware, response::IntoResponse};
use http::HeaderName;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::{net::TcpListener, sync::broadcast, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower_http::compression::CompressionLayer;

use crate::{
    adapters::{
        command_executor::{CommandError, CommandExecutor},
        dispatcher::Dispatcher,
        error_translator::DefaultErrorTranslator,
        materializer::DefaultResponseMaterializer,
        middleware::{create_request_id_middleware, request_timing_middleware},
        normalizer::DefaultRequestNormalizer,
        pipeline::RequestPipeline,
    },
    config::models::{AdapterConfig, MiddlewareConfig},
    core::{AdapterEvent, EventBus, RouteDescriptor, TransportResponse},
    ports::{ErrorTranslator, RequestFlow, RequestNormalizer, ResponseMaterializer, RouteContainer},
};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum AdapterError {
    #[error("invalid listen address '{address}': {reason}")]
    InvalidListenAddr { address: String, reason: String },

    #[error("invalid header name for {field}: '{value}'")]
    InvalidHeaderName { field: &'static str, value: String },

    #[error("adapter is already booted; components and routes are frozen")]
    AlreadyBooted,

    #[error("adapter is already listening on {0}")]
    AlreadyStarted(SocketAddr),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Server(String),
}

/// A running listener.
struct Listening {
    addr: SocketAddr,
    token: CancellationToken,
    handle: JoinHandle<std::io::Result<()>>,
}

/// Binds an axum server to a [`RequestFlow`].
pub struct HttpAdapter {
    name: String,
    listen_addr: SocketAddr,
    exit_code_header: HeaderName,
    request_id_header: HeaderName,
    body_limit: usize,
    middleware: MiddlewareConfig,
    config_routes: Vec<Arc<RouteDescriptor>>,

    normalizer: Arc<dyn RequestNormalizer>,
    materializer: Option<Arc<dyn ResponseMaterializer>>,
    error_translator: Arc<dyn ErrorTranslator>,
    flow: Option<Arc<dyn RequestFlow>>,
    executor: CommandExecutor,

    dispatcher: Dispatcher,
    events: EventBus,
    router: Option<Router>,
    listening: Option<Listening>,
}

impl HttpAdapter {
    /// Build an adapter from configuration. The listen address is read here
    /// once and never again.
    pub fn new(config: &AdapterConfig) -> Result<Self, AdapterError> {
        let listen_addr =
            config
                .listen_addr
                .parse()
                .map_err(|e: std::net::AddrParseError| AdapterError::InvalidListenAddr {
                    address: config.listen_addr.clone(),
                    reason: e.to_string(),
                })?;
        let exit_code_header = parse_header_name("exit_code_header", &config.exit_code_header)?;
        let request_id_header = parse_header_name("request_id_header", &config.request_id_header)?;
        let events = EventBus::default();

        Ok(Self {
            name: config.name.clone(),
            listen_addr,
            exit_code_header,
            request_id_header,
            body_limit: config.body_limit_bytes,
            middleware: config.middleware.clone(),
            config_routes: config.routes.iter().map(|entry| entry.descriptor()).collect(),
            normalizer: Arc::new(DefaultRequestNormalizer::new()),
            materializer: None,
            error_translator: Arc::new(DefaultErrorTranslator::new()),
            flow: None,
            executor: CommandExecutor::with_builtins(config.name.clone()),
            dispatcher: Dispatcher::new(events.clone()),
            events,
            router: None,
            listening: None,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn ensure_configurable(&self) -> Result<(), AdapterError> {
        if self.router.is_some() {
            return Err(AdapterError::AlreadyBooted);
        }
        Ok(())
    }

    pub fn set_request_flow(&mut self, flow: impl RequestFlow) -> Result<(), AdapterError> {
        self.ensure_configurable()?;
        self.flow = Some(Arc::new(flow));
        Ok(())
    }

    pub fn set_normalizer(
        &mut self,
        normalizer: impl RequestNormalizer + 'static,
    ) -> Result<(), AdapterError> {
        self.ensure_configurable()?;
        self.normalizer = Arc::new(normalizer);
        Ok(())
    }

    /// Replace the materializer. A custom materializer is responsible for
    /// running commands itself.
    pub fn set_materializer(
        &mut self,
        materializer: impl ResponseMaterializer + 'static,
    ) -> Result<(), AdapterError> {
        self.ensure_configurable()?;
        self.materializer = Some(Arc::new(materializer));
        Ok(())
    }

    pub fn set_error_translator(
        &mut self,
        translator: impl ErrorTranslator + 'static,
    ) -> Result<(), AdapterError> {
        self.ensure_configurable()?;
        self.error_translator = Arc::new(translator);
        Ok(())
    }

    /// Add a command to the default materializer's registry.
    pub fn register_command<P, F>(
        &mut self,
        name: impl Into<String>,
        handler: F,
    ) -> Result<(), AdapterError>
    where
        P: DeserializeOwned,
        F: Fn(&mut TransportResponse, P) -> Result<(), CommandError> + Send + Sync + 'static,
    {
        self.ensure_configurable()?;
        self.executor.register(name, handler);
        Ok(())
    }

    /// Register the routes of `container`. Descriptors already loaded are
    /// skipped, so registering a container twice is harmless.
    pub fn register(&mut self, container: &dyn RouteContainer) -> Result<usize, AdapterError> {
        self.ensure_configurable()?;
        Ok(self.dispatcher.register(container))
    }

    pub fn loaded_routes(&self) -> BTreeMap<String, Arc<RouteDescriptor>> {
        self.dispatcher.loaded_routes()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AdapterEvent> {
        self.events.subscribe()
    }

    pub fn is_booted(&self) -> bool {
        self.router.is_some()
    }

    pub fn is_started(&self) -> bool {
        self.listening.is_some()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listening.as_ref().map(|listening| listening.addr)
    }

    /// Register the config routes, wire middleware and freeze the router.
    pub fn boot(&mut self) -> Result<(), AdapterError> {
        self.ensure_configurable()?;
        self.booted_router();
        Ok(())
    }

    /// The booted router, booting first if needed.
    pub fn router(&mut self) -> Router {
        self.booted_router()
    }

    fn booted_router(&mut self) -> Router {
        if let Some(router) = &self.router {
            return router.clone();
        }

        let config_routes = self.config_routes.clone();
        self.dispatcher.register(&config_routes);

        let materializer = self.materializer.clone().unwrap_or_else(|| {
            Arc::new(DefaultResponseMaterializer::new(
                Arc::new(self.executor.clone()),
                self.exit_code_header.clone(),
            ))
        });
        let pipeline = Arc::new(RequestPipeline::new(
            self.name.clone(),
            self.body_limit,
            Arc::clone(&self.normalizer),
            materializer,
            Arc::clone(&self.error_translator),
            self.flow.clone(),
            self.events.clone(),
        ));
        if self.flow.is_none() {
            tracing::warn!("Booting without a request flow; every request will fail");
        }

        let mut router = self.dispatcher.router(pipeline).fallback(not_found);
        if self.middleware.request_timing {
            router = router.layer(middleware::from_fn(request_timing_middleware));
        }
        if self.middleware.request_id {
            router = router.layer(middleware::from_fn(create_request_id_middleware(
                self.request_id_header.clone(),
            )));
        }
        if self.middleware.compression {
            router = router.layer(CompressionLayer::new());
        }

        let routes = self.dispatcher.loaded_count();
        tracing::info!(adapter = %self.name, routes, "Adapter booted");
        self.events.emit(AdapterEvent::Booted { routes });
        self.router = Some(router.clone());
        router
    }

    /// Bind the listener and serve in the background. Boots first if needed.
    /// Returns the bound address, which differs from the configured one when
    /// the port is `0`.
    pub async fn start(&mut self) -> Result<SocketAddr, AdapterError> {
        if let Some(listening) = &self.listening {
            return Err(AdapterError::AlreadyStarted(listening.addr));
        }
        let router = self.booted_router();

        let listener = TcpListener::bind(self.listen_addr)
            .await
            .map_err(|source| AdapterError::Bind {
                addr: self.listen_addr,
                source,
            })?;
        let addr = listener.local_addr().map_err(|source| AdapterError::Bind {
            addr: self.listen_addr,
            source,
        })?;

        let token = CancellationToken::new();
        let shutdown = token.clone().cancelled_owned();
        let handle = tokio::spawn(async move {
            axum::serve(
                listener,
                router.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(shutdown)
            .await
        });

        tracing::info!(adapter = %self.name, "Listening on {}", addr);
        self.listening = Some(Listening {
            addr,
            token,
            handle,
        });
        self.events.emit(AdapterEvent::Started { addr });
        Ok(addr)
    }

    /// Stop accepting connections and wait for in-flight ones to finish.
    /// A no-op when not started.
    pub async fn stop(&mut self) -> Result<(), AdapterError> {
        let Some(listening) = self.listening.take() else {
            tracing::debug!(adapter = %self.name, "Stop requested but adapter is not started");
            return Ok(());
        };

        listening.token.cancel();
        let result = match listening.handle.await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(AdapterError::Server(e.to_string())),
            Err(e) => Err(AdapterError::Server(e.to_string())),
        };

        tracing::info!(adapter = %self.name, "Stopped listening on {}", listening.addr);
        self.events.emit(AdapterEvent::Stopped);
        result
    }
}

impl std::fmt::Debug for HttpAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpAdapter")
            .field("name", &self.name)
            .field("listen_addr", &self.listen_addr)
            .field("booted", &self.is_booted())
            .field("local_addr", &self.local_addr())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

fn parse_header_name(field: &'static str, value: &str) -> Result<HeaderName, AdapterError> {
    HeaderName::try_from(value).map_err(|_| AdapterError::InvalidHeaderName {
        field,
        value: value.to_string(),
    })
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}

#[cfg(test)]
mod tests {
    use axum::{body::Body, extract::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt; // for oneshot

    use super::*;
    use crate::{
        core::{CanonicalResponse, HttpMethod},
        ports::flow_fn,
    };

    fn adapter() -> HttpAdapter {
        let config = AdapterConfig::builder()
            .listen_addr("127.0.0.1:0")
            .route("/ping", [HttpMethod::Get])
            .build();
        HttpAdapter::new(&config).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let bad_addr = AdapterConfig::builder().listen_addr("nowhere").build();
        assert!(matches!(
            HttpAdapter::new(&bad_addr),
            Err(AdapterError::InvalidListenAddr { .. })
        ));

        let bad_header = AdapterConfig::builder().exit_code_header("x exit").build();
        assert!(matches!(
            HttpAdapter::new(&bad_header),
            Err(AdapterError::InvalidHeaderName {
                field: "exit_code_header",
                ..
            })
        ));
    }

    #[test]
    fn test_setters_fail_after_boot() {
        let mut adapter = adapter();
        adapter.boot().unwrap();

        assert!(matches!(
            adapter.set_request_flow(flow_fn(|_, _, reply| async move {
                reply.succeed(CanonicalResponse::ok("late"));
            })),
            Err(AdapterError::AlreadyBooted)
        ));
        assert!(matches!(adapter.boot(), Err(AdapterError::AlreadyBooted)));
        assert!(matches!(
            adapter.register(&Vec::<Arc<RouteDescriptor>>::new()),
            Err(AdapterError::AlreadyBooted)
        ));
        assert!(adapter.loaded_routes().contains_key("/ping"));
    }

    #[tokio::test]
    async fn test_router_serves_config_routes_through_flow() {
        let mut adapter = adapter();
        adapter
            .set_request_flow(flow_fn(|route, _request, reply| async move {
                reply.succeed(CanonicalResponse::ok(route.url().to_string()).with_exit_code(1));
            }))
            .unwrap();

        let response = adapter
            .router()
            .oneshot(Request::builder().uri("/ping").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("x-exit-code").unwrap(), "1");
        assert!(response.headers().contains_key("x-request-id"));
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body.as_ref(), b"/ping");
    }

    #[tokio::test]
    async fn test_unknown_path_and_method() {
        let mut adapter = adapter();
        let router = adapter.router();

        let missing = router
            .clone()
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let wrong_method = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/ping")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_booted_event_counts_routes() {
        let mut adapter = adapter();
        let mut rx = adapter.subscribe();
        adapter
            .register(&vec![RouteDescriptor::shared("/extra", [HttpMethod::Post])])
            .unwrap();
        adapter.boot().unwrap();

        let booted = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|event| matches!(event, AdapterEvent::Booted { .. }));
        assert_eq!(booted, Some(AdapterEvent::Booted { routes: 2 }));
    }
}
