//! Command protocol.
//!
//! Commands are plain data a request flow attaches to its response to ask for
//! transport-level side effects (headers, cookies) without knowing which
//! transport will carry the response. Only the command executor gives them
//! meaning.
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Built-in command setting response headers.
pub const SET_HEADER: &str = "setHeader";
/// Built-in command setting response cookies.
pub const SET_COOKIE: &str = "setCookie";

/// A named directive with an optional adapter filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub name: String,
    /// When present, only the listed adapters execute this command.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapters: Option<Vec<String>>,
    #[serde(default)]
    pub payload: Value,
}

impl Command {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        Self {
            name: name.into(),
            adapters: None,
            payload,
        }
    }

    /// `setHeader` with the given header name/value pairs.
    pub fn set_header<I, K, V>(headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let headers: BTreeMap<String, String> = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(SET_HEADER, json!(headers))
    }

    /// `setCookie` with a single cookie.
    pub fn set_cookie(name: impl Into<String>, cookie: CookieSpec) -> Self {
        let mut cookies = BTreeMap::new();
        cookies.insert(name.into(), cookie);
        Self::new(SET_COOKIE, json!(cookies))
    }

    /// Restrict this command to the named adapters.
    pub fn for_adapters<I, S>(mut self, adapters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.adapters = Some(adapters.into_iter().map(Into::into).collect());
        self
    }

    /// Whether an adapter called `adapter` should run this command.
    pub fn applies_to(&self, adapter: &str) -> bool {
        self.adapters
            .as_ref()
            .is_none_or(|names| names.iter().any(|name| name == adapter))
    }
}

/// Either one command or a nested list of them.
///
/// Flows built by composing smaller handlers often return lists of lists;
/// they are flattened depth-first when executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandEntry {
    Single(Command),
    Nested(Vec<CommandEntry>),
}

impl From<Command> for CommandEntry {
    fn from(command: Command) -> Self {
        CommandEntry::Single(command)
    }
}

impl From<Vec<Command>> for CommandEntry {
    fn from(commands: Vec<Command>) -> Self {
        CommandEntry::Nested(commands.into_iter().map(CommandEntry::Single).collect())
    }
}

/// Depth-first flattening of a command list, preserving order.
pub fn flatten(entries: &[CommandEntry]) -> Vec<&Command> {
    fn walk<'a>(entries: &'a [CommandEntry], out: &mut Vec<&'a Command>) {
        for entry in entries {
            match entry {
                CommandEntry::Single(command) => out.push(command),
                CommandEntry::Nested(inner) => walk(inner, out),
            }
        }
    }

    let mut out = Vec::new();
    walk(entries, &mut out);
    out
}

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SameSite {
    #[serde(alias = "strict")]
    Strict,
    #[serde(alias = "lax")]
    Lax,
    #[serde(alias = "none")]
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Value and attributes of a cookie carried by `setCookie`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieSpec {
    pub value: String,
    #[serde(default)]
    pub http_only: bool,
    #[serde(default)]
    pub secure: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Lifetime in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<i64>,
    /// HTTP date; ignored when `max_age` is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
}

impl CookieSpec {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    pub fn http_only(mut self) -> Self {
        self.http_only = true;
        self
    }

    pub fn secure(mut self) -> Self {
        self.secure = true;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn max_age_ms(mut self, millis: i64) -> Self {
        self.max_age = Some(millis);
        self
    }

    pub fn same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_applies_to_without_filter() {
        let command = Command::set_header([("X-Test", "1")]);
        assert!(command.applies_to("HttpAdapter"));
        assert!(command.applies_to("AnythingElse"));
    }

    #[test]
    fn test_applies_to_with_filter() {
        let command = Command::set_header([("X-Test", "1")]).for_adapters(["OtherAdapter"]);
        assert!(!command.applies_to("HttpAdapter"));
        assert!(command.applies_to("OtherAdapter"));

        let empty = Command::new(SET_HEADER, Value::Null).for_adapters(Vec::<String>::new());
        assert!(!empty.applies_to("HttpAdapter"));
    }

    #[test]
    fn test_flatten_nested_lists_in_order() {
        let entries = vec![
            CommandEntry::from(Command::new("a", Value::Null)),
            CommandEntry::Nested(vec![
                Command::new("b", Value::Null).into(),
                CommandEntry::Nested(vec![Command::new("c", Value::Null).into()]),
            ]),
            Command::new("d", Value::Null).into(),
        ];

        let names: Vec<_> = flatten(&entries).iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_deserialize_wire_commands() {
        let raw = r#"[
            {"name": "setHeader", "payload": {"X-Test": "1"}},
            [{"name": "setCookie", "adapters": ["HttpAdapter"],
              "payload": {"session": {"value": "abc", "httpOnly": true, "sameSite": "lax"}}}]
        ]"#;
        let entries: Vec<CommandEntry> = serde_json::from_str(raw).unwrap();
        let commands = flatten(&entries);

        assert_eq!(commands.len(), 2);
        assert_eq!(commands[0].name, SET_HEADER);
        assert_eq!(commands[1].adapters.as_deref(), Some(&["HttpAdapter".to_string()][..]));

        let cookies: BTreeMap<String, CookieSpec> =
            serde_json::from_value(commands[1].payload.clone()).unwrap();
        let session = &cookies["session"];
        assert_eq!(session.value, "abc");
        assert!(session.http_only);
        assert_eq!(session.same_site, Some(SameSite::Lax));
    }
}
