use crate::core::{CanonicalRequest, HttpMethod, RawRequest};

/// Port turning a parsed transport request into a [`CanonicalRequest`].
///
/// Implementations must be deterministic and must not fail: malformed input
/// is rejected by the transport before normalization runs.
pub trait RequestNormalizer: Send + Sync + 'static {
    /// # Arguments
    /// * `adapter` - Name of the adapter stamped on the request
    /// * `raw` - The request as parsed by the transport
    /// * `method` - Method tag of the route binding that matched; one URL may
    ///   answer several methods, so it is not inferred from `raw`
    fn normalize(&self, adapter: &str, raw: &RawRequest, method: HttpMethod) -> CanonicalRequest;
}
