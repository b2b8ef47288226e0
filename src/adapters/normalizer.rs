//! Default request normalizer.
use serde_json::Value;

use crate::{
    core::{CanonicalRequest, HttpMethod, ParamSource, RawRequest},
    ports::RequestNormalizer,
};

/// Stand-in used in the identification string when no user agent was sent.
pub const USER_AGENT_NOT_PROVIDED: &str = "not provided";

/// Copies every parameter source verbatim into the canonical parameter bag.
///
/// Header names are the lowercase names kept by the HTTP stack; repeated
/// headers are joined with `", "`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRequestNormalizer;

impl DefaultRequestNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// `"<addr> - <addr> | <user agent>"`
    pub fn identification(raw: &RawRequest) -> String {
        format!(
            "{} | {}",
            raw.client_addrs.join(" - "),
            raw.user_agent().unwrap_or(USER_AGENT_NOT_PROVIDED)
        )
    }
}

impl RequestNormalizer for DefaultRequestNormalizer {
    fn normalize(&self, adapter: &str, raw: &RawRequest, method: HttpMethod) -> CanonicalRequest {
        let headers = raw.headers.keys().map(|name| {
            let joined = raw
                .headers
                .get_all(name)
                .iter()
                .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (name.as_str().to_string(), Value::String(joined))
        });

        CanonicalRequest::builder(adapter, raw.url.clone(), method)
            .identification(Self::identification(raw))
            .request_id(raw.request_id.clone())
            .params(ParamSource::Header, headers)
            .params(ParamSource::Cookie, raw.cookies.iter().cloned())
            .params(ParamSource::Body, raw.body.iter().cloned())
            .params(ParamSource::Query, raw.query.iter().cloned())
            .params(ParamSource::UrlPath, raw.path_params.iter().cloned())
            .build()
    }
}
