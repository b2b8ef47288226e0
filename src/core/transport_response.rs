//! The live response handle the materializer, command executor and error
//! translator write into before it is handed back to axum.
use axum::{body::Body as AxumBody, response::Response};
use bytes::Bytes;
use chrono::{DateTime, Duration, Utc};
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use thiserror::Error;

use crate::core::CookieSpec;

/// Errors raised while writing to a [`TransportResponse`].
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TransportError {
    /// The response body was already sent.
    #[error("response already sent")]
    AlreadySent,

    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value for header '{0}'")]
    InvalidHeaderValue(String),

    #[error("invalid cookie: {0}")]
    InvalidCookie(String),

    #[error("failed to serialize payload: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Mutable response under construction for a single request.
#[derive(Debug)]
pub struct TransportResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
}

impl TransportResponse {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            sent: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn is_sent(&self) -> bool {
        self.sent
    }

    /// Set (replace) a header from untyped strings.
    pub fn set_header(&mut self, name: &str, value: &str) -> Result<(), TransportError> {
        let header_name = name
            .parse::<HeaderName>()
            .map_err(|_| TransportError::InvalidHeaderName(name.to_string()))?;
        let header_value = HeaderValue::from_str(value)
            .map_err(|_| TransportError::InvalidHeaderValue(name.to_string()))?;
        self.headers.insert(header_name, header_value);
        Ok(())
    }

    pub fn insert_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Append a `Set-Cookie` header for `name`.
    pub fn set_cookie(&mut self, name: &str, cookie: &CookieSpec) -> Result<(), TransportError> {
        let rendered = render_set_cookie(name, cookie, Utc::now())?;
        let value = HeaderValue::from_str(&rendered)
            .map_err(|_| TransportError::InvalidCookie(format!("cookie '{name}' is not a valid header value")))?;
        self.headers.append(header::SET_COOKIE, value);
        Ok(())
    }

    /// Write the body and finish the response. Only the first call succeeds.
    pub fn send(&mut self, body: impl Into<Bytes>) -> Result<(), TransportError> {
        if self.sent {
            return Err(TransportError::AlreadySent);
        }
        self.body = body.into();
        self.sent = true;
        Ok(())
    }

    pub fn into_response(self) -> Response<AxumBody> {
        let mut response = Response::new(AxumBody::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for TransportResponse {
    fn default() -> Self {
        Self::new()
    }
}

fn valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?={}".contains(&b))
}

/// Render a `Set-Cookie` header value. `now` anchors the `Expires` date
/// derived from `max_age`.
pub fn render_set_cookie(
    name: &str,
    cookie: &CookieSpec,
    now: DateTime<Utc>,
) -> Result<String, TransportError> {
    if !valid_cookie_name(name) {
        return Err(TransportError::InvalidCookie(format!("invalid cookie name '{name}'")));
    }

    let mut out = format!("{name}={}", urlencoding::encode(&cookie.value));

    if let Some(max_age_ms) = cookie.max_age {
        out.push_str(&format!("; Max-Age={}", max_age_ms.div_euclid(1000)));
        if let Some(expires) =
            Duration::try_milliseconds(max_age_ms).and_then(|age| now.checked_add_signed(age))
        {
            out.push_str(&format!(
                "; Expires={}",
                expires.format("%a, %d %b %Y %H:%M:%S GMT")
            ));
        }
    } else if let Some(expires) = &cookie.expires {
        out.push_str(&format!("; Expires={expires}"));
    }
    if let Some(domain) = &cookie.domain {
        out.push_str(&format!("; Domain={domain}"));
    }
    out.push_str(&format!("; Path={}", cookie.path.as_deref().unwrap_or("/")));
    if cookie.http_only {
        out.push_str("; HttpOnly");
    }
    if cookie.secure {
        out.push_str("; Secure");
    }
    if let Some(same_site) = cookie.same_site {
        out.push_str(&format!("; SameSite={}", same_site.as_str()));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use http_body_util::BodyExt;

    use super::*;
    use crate::core::SameSite;

    #[test]
    fn test_send_only_once() {
        let mut target = TransportResponse::new();
        target.send("first").unwrap();
        assert!(matches!(target.send("second"), Err(TransportError::AlreadySent)));
        assert_eq!(target.body(), &Bytes::from("first"));
    }

    #[test]
    fn test_set_header_rejects_invalid_input() {
        let mut target = TransportResponse::new();
        assert!(target.set_header("X-Ok", "1").is_ok());
        assert!(matches!(
            target.set_header("bad header", "1"),
            Err(TransportError::InvalidHeaderName(_))
        ));
        assert!(matches!(
            target.set_header("X-Bad", "line\nbreak"),
            Err(TransportError::InvalidHeaderValue(_))
        ));
        assert_eq!(target.headers().get("x-ok").unwrap(), "1");
    }

    #[test]
    fn test_render_cookie_attributes() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let cookie = CookieSpec::new("a b")
            .http_only()
            .secure()
            .max_age_ms(60_000)
            .same_site(SameSite::Strict);

        let rendered = render_set_cookie("session", &cookie, now).unwrap();
        assert_eq!(
            rendered,
            "session=a%20b; Max-Age=60; Expires=Mon, 01 Jan 2024 00:01:00 GMT; Path=/; HttpOnly; Secure; SameSite=Strict"
        );
    }

    #[test]
    fn test_render_cookie_rejects_bad_name() {
        let err = render_set_cookie("bad;name", &CookieSpec::new("x"), Utc::now()).unwrap_err();
        assert!(matches!(err, TransportError::InvalidCookie(_)));
    }

    #[tokio::test]
    async fn test_into_response_carries_parts() {
        let mut target = TransportResponse::new();
        target.set_status(StatusCode::CREATED);
        target.set_cookie("a", &CookieSpec::new("1")).unwrap();
        target.set_cookie("b", &CookieSpec::new("2")).unwrap();
        target.send("done").unwrap();

        let response = target.into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers().get_all(header::SET_COOKIE).iter().count(), 2);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, Bytes::from("done"));
    }
}
