//! Route descriptors and the index of routes already loaded.
use std::{collections::BTreeMap, sync::Arc};

use crate::core::method::HttpMethod;

/// A URL pattern answered by one or more method tags.
///
/// Descriptors are owned by the container that defines them and shared as
/// `Arc<RouteDescriptor>`; the adapter identifies them by pointer, not by
/// value, so two descriptors with the same URL are still distinct routes.
#[derive(Debug, PartialEq, Eq)]
pub struct RouteDescriptor {
    url: String,
    methods: Vec<HttpMethod>,
}

impl RouteDescriptor {
    pub fn new(url: impl Into<String>, methods: impl IntoIterator<Item = HttpMethod>) -> Self {
        let mut unique = Vec::new();
        for method in methods {
            if !unique.contains(&method) {
                unique.push(method);
            }
        }
        Self {
            url: url.into(),
            methods: unique,
        }
    }

    /// Build a descriptor already wrapped for sharing.
    pub fn shared(
        url: impl Into<String>,
        methods: impl IntoIterator<Item = HttpMethod>,
    ) -> Arc<Self> {
        Arc::new(Self::new(url, methods))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn methods(&self) -> &[HttpMethod] {
        &self.methods
    }

    /// Translate Express-style segments (`:id`, `*rest`) into the
    /// `{id}` / `{*rest}` syntax understood by the router.
    pub fn router_path(&self) -> String {
        if self.url == "/" {
            return self.url.clone();
        }
        self.url
            .split('/')
            .map(|segment| {
                if let Some(name) = segment.strip_prefix(':') {
                    format!("{{{name}}}")
                } else if let Some(name) = segment.strip_prefix('*') {
                    let name = if name.is_empty() { "wildcard" } else { name };
                    format!("{{*{name}}}")
                } else {
                    segment.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// Every descriptor loaded so far, in registration order.
#[derive(Debug, Default)]
pub struct LoadedRouteIndex {
    routes: Vec<Arc<RouteDescriptor>>,
}

impl LoadedRouteIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity check: true only for the very same descriptor instance.
    pub fn contains(&self, route: &Arc<RouteDescriptor>) -> bool {
        self.routes.iter().any(|loaded| Arc::ptr_eq(loaded, route))
    }

    /// Mark a descriptor loaded. Returns false if it already was.
    pub fn insert(&mut self, route: Arc<RouteDescriptor>) -> bool {
        if self.contains(&route) {
            return false;
        }
        self.routes.push(route);
        true
    }

    /// Number of distinct descriptors ever loaded.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<RouteDescriptor>> {
        self.routes.iter()
    }

    /// URL → descriptor map rebuilt from the loaded set. When two descriptors
    /// share a URL the one registered last wins.
    pub fn snapshot(&self) -> BTreeMap<String, Arc<RouteDescriptor>> {
        self.routes
            .iter()
            .map(|route| (route.url().to_string(), Arc::clone(route)))
            .collect()
    }
}
