//! HTTP method tags a route can be bound to.
//!
//! The tag set is fixed and wider than what a given transport may support:
//! `all` means "every method", and `search` exists even though not every
//! transport exposes a registration call for it.
use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// A method tag attached to a route descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    All,
    Get,
    Search,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
    Connect,
    Trace,
}

impl HttpMethod {
    /// Every known tag, in declaration order.
    pub const TAGS: [HttpMethod; 11] = [
        HttpMethod::All,
        HttpMethod::Get,
        HttpMethod::Search,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Patch,
        HttpMethod::Delete,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Connect,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::All => "all",
            HttpMethod::Get => "get",
            HttpMethod::Search => "search",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Patch => "patch",
            HttpMethod::Delete => "delete",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Connect => "connect",
            HttpMethod::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string does not name a known method tag.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown HTTP method tag '{0}'")]
pub struct ParseMethodError(pub String);

impl FromStr for HttpMethod {
    type Err = ParseMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::TAGS
            .iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| ParseMethodError(s.to_string()))
    }
}

// Config files commonly spell methods in upper case, so accept any casing.
impl<'de> Deserialize<'de> for HttpMethod {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("GET".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
        assert_eq!("Search".parse::<HttpMethod>().unwrap(), HttpMethod::Search);
        assert_eq!(" all ".parse::<HttpMethod>().unwrap(), HttpMethod::All);
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        let err = "brew".parse::<HttpMethod>().unwrap_err();
        assert_eq!(err, ParseMethodError("brew".to_string()));
    }

    #[test]
    fn test_serde_uses_lowercase_tags() {
        let encoded = serde_json::to_string(&HttpMethod::Delete).unwrap();
        assert_eq!(encoded, "\"delete\"");

        let decoded: Vec<HttpMethod> = serde_json::from_str(r#"["POST", "patch"]"#).unwrap();
        assert_eq!(decoded, vec![HttpMethod::Post, HttpMethod::Patch]);
    }
}
