//! Canonical request model.
//!
//! A [`CanonicalRequest`] is the transport-independent view of one inbound
//! call. It is assembled once through [`CanonicalRequestBuilder`] and is
//! read-only afterwards: the request flow receives it by value and can only
//! inspect it.
use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::method::HttpMethod;

/// Where a parameter was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParamSource {
    Header,
    Cookie,
    Body,
    Query,
    UrlPath,
}

impl fmt::Display for ParamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParamSource::Header => "header",
            ParamSource::Cookie => "cookie",
            ParamSource::Body => "body",
            ParamSource::Query => "query",
            ParamSource::UrlPath => "url-path",
        };
        f.write_str(label)
    }
}

/// A single named value and its source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub source: ParamSource,
    pub value: Value,
}

/// Parameters keyed by `(name, source)`.
///
/// The same name may appear once per source. Insertion order is kept so that
/// iteration is stable, but nothing should depend on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ParamBag {
    params: Vec<Param>,
    /// Source -> name -> position in `params`.
    #[serde(skip)]
    index: HashMap<ParamSource, HashMap<String, usize>>,
}

impl ParamBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the value stored under `(name, source)`.
    ///
    /// Returns the previous value when one was replaced.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        source: ParamSource,
        value: impl Into<Value>,
    ) -> Option<Value> {
        let name = name.into();
        let value = value.into();
        let names = self.index.entry(source).or_default();
        if let Some(&position) = names.get(&name) {
            return Some(std::mem::replace(&mut self.params[position].value, value));
        }
        names.insert(name.clone(), self.params.len());
        self.params.push(Param {
            name,
            source,
            value,
        });
        None
    }

    pub fn get(&self, name: &str, source: ParamSource) -> Option<&Value> {
        let position = *self.index.get(&source)?.get(name)?;
        self.params.get(position).map(|p| &p.value)
    }

    /// Convenience accessor for parameters holding a JSON string.
    pub fn get_str(&self, name: &str, source: ParamSource) -> Option<&str> {
        self.get(name, source).and_then(Value::as_str)
    }

    pub fn contains(&self, name: &str, source: ParamSource) -> bool {
        self.get(name, source).is_some()
    }

    /// All parameters from one source, in insertion order.
    pub fn from_source(&self, source: ParamSource) -> impl Iterator<Item = &Param> {
        self.params.iter().filter(move |p| p.source == source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Param> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Normalized representation of an inbound request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRequest {
    adapter: String,
    url: String,
    method: HttpMethod,
    identification: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_id: Option<String>,
    params: ParamBag,
}

impl CanonicalRequest {
    pub fn builder(
        adapter: impl Into<String>,
        url: impl Into<String>,
        method: HttpMethod,
    ) -> CanonicalRequestBuilder {
        CanonicalRequestBuilder {
            request: CanonicalRequest {
                adapter: adapter.into(),
                url: url.into(),
                method,
                identification: String::new(),
                request_id: None,
                params: ParamBag::new(),
            },
        }
    }

    /// Name of the adapter that produced this request.
    pub fn adapter(&self) -> &str {
        &self.adapter
    }

    /// The original URL, path and query string included.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The method tag of the route binding that received the call.
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    /// Client address chain and user agent, for tracing and logs.
    pub fn identification(&self) -> &str {
        &self.identification
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn params(&self) -> &ParamBag {
        &self.params
    }

    pub fn param(&self, name: &str, source: ParamSource) -> Option<&Value> {
        self.params.get(name, source)
    }
}

/// Assembles a [`CanonicalRequest`]; the request is frozen by [`build`](Self::build).
#[derive(Debug)]
pub struct CanonicalRequestBuilder {
    request: CanonicalRequest,
}

impl CanonicalRequestBuilder {
    pub fn identification(mut self, identification: impl Into<String>) -> Self {
        self.request.identification = identification.into();
        self
    }

    pub fn request_id(mut self, request_id: Option<String>) -> Self {
        self.request.request_id = request_id;
        self
    }

    pub fn param(
        mut self,
        name: impl Into<String>,
        source: ParamSource,
        value: impl Into<Value>,
    ) -> Self {
        self.request.params.insert(name, source, value);
        self
    }

    pub fn params<I, K, V>(mut self, source: ParamSource, entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in entries {
            self.request.params.insert(name, source, value);
        }
        self
    }

    pub fn build(self) -> CanonicalRequest {
        self.request
    }
}
