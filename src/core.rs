//! Core domain types and service traits for ntfy-wrapper
//!
//! This module defines the destinations a notification can be published to,
//! the resolved configuration a `Notifier` works with, the per-destination
//! dispatch outcome, and the `Transport` trait that performs the actual HTTP
//! exchange.

use crate::error::DispatchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The public ntfy instance used when no base URL is configured.
pub const DEFAULT_BASE_URL: &str = "https://ntfy.sh";

/// A publication target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Destination {
    /// A public topic. Anyone who knows its name can subscribe to it.
    Topic(String),
    /// An e-mail address the server relays the notification to.
    Email(String),
}

impl Destination {
    pub fn topic(name: impl Into<String>) -> Self {
        Destination::Topic(name.into())
    }

    pub fn email(address: impl Into<String>) -> Self {
        Destination::Email(address.into())
    }

    /// The raw identifier: topic name or e-mail address.
    pub fn value(&self) -> &str {
        match self {
            Destination::Topic(v) | Destination::Email(v) => v,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Destination::Topic(_) => "topic",
            Destination::Email(_) => "email",
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.value())
    }
}

/// An ordered set of destinations, unique per variant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Destinations {
    items: Vec<Destination>,
}

impl Destinations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from raw topic and e-mail strings.
    ///
    /// Values are trimmed; empty values and duplicates are dropped.
    pub fn from_parts<T, E>(topics: T, emails: E) -> Self
    where
        T: IntoIterator,
        T::Item: Into<String>,
        E: IntoIterator,
        E::Item: Into<String>,
    {
        let mut set = Self::new();
        for topic in topics {
            set.insert(Destination::Topic(topic.into()));
        }
        for email in emails {
            set.insert(Destination::Email(email.into()));
        }
        set
    }

    /// Inserts a destination, returning `false` if it was empty or already present.
    pub fn insert(&mut self, destination: Destination) -> bool {
        let destination = normalize(&destination);
        if destination.value().is_empty() || self.items.contains(&destination) {
            return false;
        }
        self.items.push(destination);
        true
    }

    /// Removes a destination, returning `false` if it was not present.
    pub fn remove(&mut self, destination: &Destination) -> bool {
        let destination = normalize(destination);
        let before = self.items.len();
        self.items.retain(|d| *d != destination);
        self.items.len() != before
    }

    pub fn contains(&self, destination: &Destination) -> bool {
        self.items.contains(&normalize(destination))
    }

    pub fn clear_topics(&mut self) {
        self.items.retain(|d| !matches!(d, Destination::Topic(_)));
    }

    pub fn clear_emails(&mut self) {
        self.items.retain(|d| !matches!(d, Destination::Email(_)));
    }

    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|d| match d {
            Destination::Topic(v) => Some(v.as_str()),
            Destination::Email(_) => None,
        })
    }

    pub fn emails(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|d| match d {
            Destination::Email(v) => Some(v.as_str()),
            Destination::Topic(_) => None,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Destination> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[Destination] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Stored values are trimmed, so lookups are too.
fn normalize(destination: &Destination) -> Destination {
    match destination {
        Destination::Topic(v) => Destination::Topic(v.trim().to_string()),
        Destination::Email(v) => Destination::Email(v.trim().to_string()),
    }
}

impl FromIterator<Destination> for Destinations {
    fn from_iter<I: IntoIterator<Item = Destination>>(iter: I) -> Self {
        let mut set = Self::new();
        for destination in iter {
            set.insert(destination);
        }
        set
    }
}

/// The recognized keys of the `notify_defaults` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DefaultKey {
    Title,
    Priority,
    Tags,
    Click,
    Attach,
    Actions,
    Icon,
}

impl DefaultKey {
    pub const ALL: [DefaultKey; 7] = [
        DefaultKey::Title,
        DefaultKey::Priority,
        DefaultKey::Tags,
        DefaultKey::Click,
        DefaultKey::Attach,
        DefaultKey::Actions,
        DefaultKey::Icon,
    ];

    /// Parses a key case-insensitively.
    pub fn parse(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(key))
    }

    /// The key as written in the configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            DefaultKey::Title => "title",
            DefaultKey::Priority => "priority",
            DefaultKey::Tags => "tags",
            DefaultKey::Click => "click",
            DefaultKey::Attach => "attach",
            DefaultKey::Actions => "actions",
            DefaultKey::Icon => "icon",
        }
    }

    /// The HTTP header the ntfy publish API reads this field from.
    pub fn header(&self) -> &'static str {
        match self {
            DefaultKey::Title => "Title",
            DefaultKey::Priority => "Priority",
            DefaultKey::Tags => "Tags",
            DefaultKey::Click => "Click",
            DefaultKey::Attach => "Attach",
            DefaultKey::Actions => "Actions",
            DefaultKey::Icon => "Icon",
        }
    }
}

impl fmt::Display for DefaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Default message fields, as stored in the `notify_defaults` section.
///
/// Recognized keys are available through typed accessors. Anything else is
/// kept in an extension map and forwarded verbatim as a request header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotifyDefaults {
    known: BTreeMap<DefaultKey, String>,
    extra: BTreeMap<String, String>,
}

impl NotifyDefaults {
    pub fn new() -> Self {
        Self::default()
    }

    /// The defaults written into a freshly created configuration file.
    pub fn stock() -> Self {
        let mut defaults = Self::new();
        defaults.set("title", "Message from ntfy-wrapper");
        defaults.set("tags", "fire");
        defaults.set(
            "icon",
            "https://raw.githubusercontent.com/vict0rsch/ntfy-wrapper/main/assets/logo.png",
        );
        defaults
    }

    /// Sets a value, returning the previous one.
    ///
    /// Keys are normalized to lowercase. An empty value removes the key.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Option<String> {
        let value = value.into().trim().to_string();
        if value.is_empty() {
            return self.remove(key);
        }
        match DefaultKey::parse(key) {
            Some(known) => self.known.insert(known, value),
            None => self.extra.insert(key.trim().to_lowercase(), value),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        match DefaultKey::parse(key) {
            Some(known) => self.field(known),
            None => self.extra.get(&key.trim().to_lowercase()).map(String::as_str),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        match DefaultKey::parse(key) {
            Some(known) => self.known.remove(&known),
            None => self.extra.remove(&key.trim().to_lowercase()),
        }
    }

    pub fn field(&self, key: DefaultKey) -> Option<&str> {
        self.known.get(&key).map(String::as_str)
    }

    pub fn title(&self) -> Option<&str> {
        self.field(DefaultKey::Title)
    }

    pub fn priority(&self) -> Option<&str> {
        self.field(DefaultKey::Priority)
    }

    /// Tags, split on commas.
    pub fn tags(&self) -> Vec<String> {
        split_list(self.field(DefaultKey::Tags), ',')
    }

    pub fn click(&self) -> Option<&str> {
        self.field(DefaultKey::Click)
    }

    pub fn attach(&self) -> Option<&str> {
        self.field(DefaultKey::Attach)
    }

    /// Actions, split on the `;` separator used by the ntfy `Actions` header.
    pub fn actions(&self) -> Vec<String> {
        split_list(self.field(DefaultKey::Actions), ';')
    }

    pub fn icon(&self) -> Option<&str> {
        self.field(DefaultKey::Icon)
    }

    /// Keys that are not part of the recognized schema.
    pub fn extra(&self) -> &BTreeMap<String, String> {
        &self.extra
    }

    /// Overlays `other` on top of `self`; values from `other` win.
    pub fn extend(&mut self, other: NotifyDefaults) {
        self.known.extend(other.known);
        self.extra.extend(other.extra);
    }

    /// All entries, recognized keys first in schema order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.known
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(self.extra.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }

    pub fn len(&self) -> usize {
        self.known.len() + self.extra.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.extra.is_empty()
    }
}

/// Splits a delimited list, trimming items and dropping empty ones.
pub(crate) fn split_list(value: Option<&str>, separator: char) -> Vec<String> {
    value
        .map(|v| {
            v.split(separator)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

/// The resolved state a `Notifier` works with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Configuration {
    pub destinations: Destinations,
    pub defaults: NotifyDefaults,
    pub base_url: Option<String>,
}

impl Configuration {
    /// The configured base URL without trailing slashes, or the public instance.
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .map(|url| url.trim_end_matches('/'))
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// The HTTP method of a publish request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Post,
    Put,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Post => f.write_str("POST"),
            Method::Put => f.write_str("PUT"),
        }
    }
}

/// One fully built request to the push service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl PublishRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// What the push service answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Full request/response detail, captured in debug mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExchangeDetail {
    pub method: Method,
    pub url: String,
    pub request_headers: Vec<(String, String)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_body: Option<String>,
}

/// The outcome of publishing to a single destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub destination: Destination,
    pub success: bool,
    /// HTTP status, if the server answered at all.
    pub status: Option<u16>,
    pub status_detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exchange: Option<ExchangeDetail>,
}

// =============================================================================
// Service Traits
// =============================================================================

/// Performs the HTTP exchange with the push service.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Executes a publish request.
    ///
    /// # Returns
    /// * `Ok(TransportResponse)` whenever the server answered, whatever the status
    /// * `Err` if the request could not be sent or no response was received
    async fn execute(&self, request: &PublishRequest) -> Result<TransportResponse, DispatchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_are_unique_per_variant() {
        let mut set = Destinations::new();
        assert!(set.insert(Destination::topic("abc")));
        assert!(!set.insert(Destination::topic(" abc ")));
        assert!(set.insert(Destination::email("abc")));
        assert!(!set.insert(Destination::topic("")));
        assert_eq!(set.len(), 2);
        assert_eq!(set.topics().collect::<Vec<_>>(), vec!["abc"]);
        assert_eq!(set.emails().collect::<Vec<_>>(), vec!["abc"]);
    }

    #[test]
    fn clearing_one_variant_keeps_the_other() {
        let mut set = Destinations::from_parts(["a", "b"], ["me@example.com"]);
        set.clear_topics();
        assert_eq!(set.as_slice(), &[Destination::email("me@example.com")]);
        assert!(!set.remove(&Destination::topic("a")));
    }

    #[test]
    fn lookups_ignore_surrounding_whitespace() {
        let mut set = Destinations::from_parts(["first", "second"], Vec::<String>::new());
        assert!(set.contains(&Destination::topic(" first")));
        assert!(set.remove(&Destination::topic(" first ")));
        assert_eq!(set.as_slice(), &[Destination::topic("second")]);
    }

    #[test]
    fn defaults_split_known_and_extra_keys() {
        let mut defaults = NotifyDefaults::new();
        defaults.set("Title", "hello");
        defaults.set("tags", "warning, skull,");
        defaults.set("X-Delay", "10m");

        assert_eq!(defaults.title(), Some("hello"));
        assert_eq!(defaults.tags(), vec!["warning", "skull"]);
        assert_eq!(defaults.get("x-delay"), Some("10m"));
        assert_eq!(defaults.extra().len(), 1);
        assert_eq!(defaults.len(), 3);
    }

    #[test]
    fn setting_an_empty_value_removes_the_key() {
        let mut defaults = NotifyDefaults::stock();
        let previous = defaults.set("tags", "  ");
        assert_eq!(previous.as_deref(), Some("fire"));
        assert!(defaults.get("tags").is_none());
    }

    #[test]
    fn extend_prefers_the_overlay() {
        let mut base = NotifyDefaults::stock();
        let mut overlay = NotifyDefaults::new();
        overlay.set("title", "override");
        base.extend(overlay);
        assert_eq!(base.title(), Some("override"));
        assert_eq!(base.get("tags"), Some("fire"));
    }

    #[test]
    fn base_url_falls_back_and_trims() {
        let mut config = Configuration::default();
        assert_eq!(config.base_url(), DEFAULT_BASE_URL);
        config.base_url = Some("http://localhost:5555/".to_string());
        assert_eq!(config.base_url(), "http://localhost:5555");
    }
}
