use std::sync::Arc;

use crate::core::RouteDescriptor;

/// Anything that can enumerate its route descriptors.
///
/// Containers own their descriptors; registering the same container twice
/// yields the same `Arc`s, which the dispatcher recognizes as already loaded.
pub trait RouteContainer: Send + Sync {
    fn routes(&self) -> Vec<Arc<RouteDescriptor>>;
}

impl RouteContainer for Vec<Arc<RouteDescriptor>> {
    fn routes(&self) -> Vec<Arc<RouteDescriptor>> {
        self.clone()
    }
}

impl RouteContainer for [Arc<RouteDescriptor>] {
    fn routes(&self) -> Vec<Arc<RouteDescriptor>> {
        self.to_vec()
    }
}
