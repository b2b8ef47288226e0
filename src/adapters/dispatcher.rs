//! Route table and dispatcher.
//!
//! `register` records, for every new descriptor, one binding per method tag.
//! Bindings are turned into an Axum [`Router`] by [`Dispatcher::router`],
//! each wrapped in a closure that hands the request to the
//! [`RequestPipeline`].
//!
//! Method tags map to transport capabilities through [`METHOD_BINDINGS`];
//! tags missing from that table (`search`) are skipped with a warning.
use std::{
    collections::{BTreeMap, HashSet},
    sync::Arc,
};

use axum::{
    Router,
    extract::Request,
    routing::{MethodFilter, MethodRouter},
};

use crate::{
    adapters::pipeline::RequestPipeline,
    core::{AdapterEvent, EventBus, HttpMethod, LoadedRouteIndex, RouteDescriptor},
    metrics,
    ports::RouteContainer,
};

/// How a method tag is registered on the transport.
#[derive(Debug, Clone, Copy)]
pub enum MethodBinding {
    /// Answer every method not bound more specifically.
    Any,
    Filter(MethodFilter),
}

/// Method tag to transport capability.
pub const METHOD_BINDINGS: &[(HttpMethod, MethodBinding)] = &[
    (HttpMethod::All, MethodBinding::Any),
    (HttpMethod::Get, MethodBinding::Filter(MethodFilter::GET)),
    (HttpMethod::Post, MethodBinding::Filter(MethodFilter::POST)),
    (HttpMethod::Put, MethodBinding::Filter(MethodFilter::PUT)),
    (HttpMethod::Patch, MethodBinding::Filter(MethodFilter::PATCH)),
    (HttpMethod::Delete, MethodBinding::Filter(MethodFilter::DELETE)),
    (HttpMethod::Head, MethodBinding::Filter(MethodFilter::HEAD)),
    (HttpMethod::Options, MethodBinding::Filter(MethodFilter::OPTIONS)),
    (HttpMethod::Connect, MethodBinding::Filter(MethodFilter::CONNECT)),
    (HttpMethod::Trace, MethodBinding::Filter(MethodFilter::TRACE)),
];

pub fn binding_for(method: HttpMethod) -> Option<MethodBinding> {
    METHOD_BINDINGS
        .iter()
        .find(|(tag, _)| *tag == method)
        .map(|(_, binding)| *binding)
}

/// One `(path, method)` pair bound to a descriptor.
#[derive(Debug, Clone)]
struct Binding {
    route: Arc<RouteDescriptor>,
    method: HttpMethod,
    capability: MethodBinding,
}

/// Holds every route registered with the adapter.
pub struct Dispatcher {
    loaded: LoadedRouteIndex,
    /// Router path -> bindings, in registration order.
    bindings: BTreeMap<String, Vec<Binding>>,
    bound: HashSet<(String, HttpMethod)>,
    /// Conflict checker and the router paths already accepted by it.
    patterns: matchit::Router<()>,
    accepted: HashSet<String>,
    events: EventBus,
}

impl Dispatcher {
    pub fn new(events: EventBus) -> Self {
        Self {
            loaded: LoadedRouteIndex::new(),
            bindings: BTreeMap::new(),
            bound: HashSet::new(),
            patterns: matchit::Router::new(),
            accepted: HashSet::new(),
            events,
        }
    }

    /// Load every descriptor of `container` not loaded yet. Returns the
    /// number of newly loaded descriptors; known ones are skipped silently.
    pub fn register(&mut self, container: &dyn RouteContainer) -> usize {
        container
            .routes()
            .into_iter()
            .filter(|route| {
                if self.loaded.contains(route) {
                    tracing::trace!(url = %route.url(), "Route already loaded");
                    return false;
                }
                self.bind(route);
                self.loaded.insert(Arc::clone(route))
            })
            .count()
    }

    fn bind(&mut self, route: &Arc<RouteDescriptor>) {
        let path = route.router_path();
        if !path.starts_with('/') {
            tracing::warn!(url = %route.url(), "Route URL must start with '/'; not bound");
            return;
        }
        if !self.accepted.contains(&path) {
            if let Err(e) = self.patterns.insert(path.clone(), ()) {
                tracing::warn!(url = %route.url(), "Route pattern rejected by router: {}", e);
                return;
            }
            self.accepted.insert(path.clone());
        }

        for &method in route.methods() {
            let Some(capability) = binding_for(method) else {
                tracing::warn!(
                    url = %route.url(),
                    %method,
                    "Transport has no registration for this method; skipping"
                );
                continue;
            };
            if !self.bound.insert((path.clone(), method)) {
                tracing::warn!(
                    url = %route.url(),
                    %method,
                    "Method already bound on this path by another route; skipping"
                );
                continue;
            }

            self.bindings.entry(path.clone()).or_default().push(Binding {
                route: Arc::clone(route),
                method,
                capability,
            });
            tracing::info!("Registered {} {}", method, route.url());
            metrics::increment_routes_registered(method.as_str());
            self.events.emit(AdapterEvent::MethodRegistered {
                method,
                url: route.url().to_string(),
            });
        }

        self.events.emit(AdapterEvent::RouteRegistered {
            url: route.url().to_string(),
            methods: route.methods().to_vec(),
        });
    }

    /// URL -> descriptor for every loaded route (last registration wins).
    pub fn loaded_routes(&self) -> BTreeMap<String, Arc<RouteDescriptor>> {
        self.loaded.snapshot()
    }

    /// Number of distinct descriptors loaded.
    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    /// Build the Axum router, every binding dispatching into `pipeline`.
    pub fn router(&self, pipeline: Arc<RequestPipeline>) -> Router {
        self.bindings
            .iter()
            .fold(Router::new(), |router, (path, bindings)| {
                let method_router = bindings.iter().fold(MethodRouter::new(), |mr, binding| {
                    let pipeline = Arc::clone(&pipeline);
                    let route = Arc::clone(&binding.route);
                    let method = binding.method;
                    let handler = move |req: Request| {
                        let pipeline = Arc::clone(&pipeline);
                        let route = Arc::clone(&route);
                        async move { pipeline.run(route, method, req).await }
                    };
                    match binding.capability {
                        MethodBinding::Any => mr.fallback(handler),
                        MethodBinding::Filter(filter) => mr.on(filter, handler),
                    }
                });
                router.route(path, method_router)
            })
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("loaded", &self.loaded.len())
            .field("paths", &self.bindings.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
