//! Transport-side request parsing.
//!
//! This is the capability the HTTP stack supplies: cookie, query, body and
//! path parameter parsing on top of an axum request. The result feeds the
//! request normalizer, which never sees axum types beyond the header map.
use std::{collections::HashMap, net::SocketAddr};

use axum::{
    body::Body as AxumBody,
    extract::{ConnectInfo, FromRequestParts, RawPathParams, Request},
    response::{IntoResponse, Response},
};
use http::{HeaderMap, StatusCode, header};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use serde_json::Value;
use thiserror::Error;

/// Request id assigned by the request id middleware, stored in the request
/// extensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Rejections produced while reading the request off the wire.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RawRequestError {
    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("malformed JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("failed to read request body: {0}")]
    Body(String),
}

impl RawRequestError {
    pub fn status(&self) -> StatusCode {
        match self {
            RawRequestError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            RawRequestError::InvalidJson(_) => StatusCode::BAD_REQUEST,
            RawRequestError::Body(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for RawRequestError {
    fn into_response(self) -> Response {
        tracing::warn!("Rejecting request before normalization: {}", self);
        (self.status(), self.to_string()).into_response()
    }
}

/// A request with every parameter source already parsed.
#[derive(Debug, Clone, Default)]
pub struct RawRequest {
    /// Path and query as received.
    pub url: String,
    pub headers: HeaderMap,
    pub cookies: Vec<(String, String)>,
    pub body: Vec<(String, Value)>,
    pub query: Vec<(String, Value)>,
    pub path_params: Vec<(String, String)>,
    /// Forwarded chain when present, otherwise the peer address.
    pub client_addrs: Vec<String>,
    pub request_id: Option<String>,
}

impl RawRequest {
    /// Read and parse an axum request, buffering at most `body_limit` bytes.
    pub async fn from_request(req: Request, body_limit: usize) -> Result<Self, RawRequestError> {
        let (mut parts, body) = req.into_parts();

        let path_params = match RawPathParams::from_request_parts(&mut parts, &()).await {
            Ok(params) => params
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            Err(rejection) => {
                tracing::debug!("No path parameters extracted: {}", rejection);
                Vec::new()
            }
        };

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| *addr);
        let request_id = parts
            .extensions
            .get::<RequestId>()
            .map(|RequestId(id)| id.clone());

        let url = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_string(), |pq| pq.as_str().to_string());
        let query = parts.uri.query().map(parse_query).unwrap_or_default();
        let cookies = parse_cookies(&parts.headers);
        let client_addrs = client_chain(&parts.headers, peer);

        let bytes = read_body(body, body_limit).await?;
        let body = parse_body(&parts.headers, &bytes)?;

        Ok(Self {
            url,
            headers: parts.headers,
            cookies,
            body,
            query,
            path_params,
            client_addrs,
            request_id,
        })
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.headers
            .get(header::USER_AGENT)
            .and_then(|value| value.to_str().ok())
    }
}

async fn read_body(body: AxumBody, limit: usize) -> Result<bytes::Bytes, RawRequestError> {
    match Limited::new(body, limit).collect().await {
        Ok(collected) => Ok(collected.to_bytes()),
        Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
            Err(RawRequestError::PayloadTooLarge { limit })
        }
        Err(e) => Err(RawRequestError::Body(e.to_string())),
    }
}

/// Parse the `Cookie` header(s) into name/value pairs, percent-decoding values.
pub fn parse_cookies(headers: &HeaderMap) -> Vec<(String, String)> {
    let mut cookies = Vec::new();
    for value in headers.get_all(header::COOKIE) {
        let Ok(value) = value.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((name, raw)) = pair.split_once('=') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let raw = raw.trim().trim_matches('"');
            let decoded = urlencoding::decode(raw)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| raw.to_string());
            cookies.push((name.to_string(), decoded));
        }
    }
    cookies
}

/// Parse a query string. Keys repeated in the query collect into an array.
pub fn parse_query(query: &str) -> Vec<(String, Value)> {
    let mut out: Vec<(String, Value)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = Value::String(value.into_owned());
        let Some(&position) = positions.get(key.as_ref()) else {
            positions.insert(key.to_string(), out.len());
            out.push((key.into_owned(), value));
            continue;
        };
        match &mut out[position].1 {
            Value::Array(items) => items.push(value),
            slot => {
                let first = std::mem::take(slot);
                *slot = Value::Array(vec![first, value]);
            }
        }
    }
    out
}

/// Parse a body by content type: JSON objects and urlencoded forms yield
/// fields; anything else yields none.
pub fn parse_body(headers: &HeaderMap, bytes: &[u8]) -> Result<Vec<(String, Value)>, RawRequestError> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or("").trim().to_ascii_lowercase())
        .unwrap_or_default();

    if content_type == "application/json" || content_type.ends_with("+json") {
        return match serde_json::from_slice::<Value>(bytes)? {
            Value::Object(fields) => Ok(fields.into_iter().collect()),
            _ => Ok(Vec::new()),
        };
    }
    if content_type == "application/x-www-form-urlencoded" {
        return Ok(parse_query(&String::from_utf8_lossy(bytes)));
    }
    Ok(Vec::new())
}

/// Client address chain: the `X-Forwarded-For` hops when present, otherwise
/// the socket peer address.
pub fn client_chain(headers: &HeaderMap, peer: Option<SocketAddr>) -> Vec<String> {
    let forwarded: Vec<String> = headers
        .get_all("x-forwarded-for")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map(str::to_string)
        .collect();

    if !forwarded.is_empty() {
        return forwarded;
    }
    peer.map(|addr| vec![addr.ip().to_string()]).unwrap_or_default()
}
