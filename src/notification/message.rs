//! Message fields and their translation into ntfy publish requests.

use crate::core::{
    split_list, DefaultKey, Destination, Method, NotifyDefaults, PublishRequest,
};
use crate::error::{NotifierError, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Topic that e-mail relays are published to.
pub const EMAIL_TOPIC: &str = "alerts";

/// Per-call message fields. Anything left unset falls back to the defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageOptions {
    pub title: Option<String>,
    /// 1 (min) to 5 (max), or one of ntfy's priority names.
    pub priority: Option<String>,
    pub tags: Vec<String>,
    /// URL opened when the notification is clicked.
    pub click: Option<String>,
    /// A URL, or a local file to upload.
    pub attach: Option<String>,
    pub actions: Vec<String>,
    pub icon: Option<String>,
    /// Additional headers, forwarded as-is.
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl MessageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn click(mut self, url: impl Into<String>) -> Self {
        self.click = Some(url.into());
        self
    }

    pub fn attach(mut self, attachment: impl Into<String>) -> Self {
        self.attach = Some(attachment.into());
        self
    }

    pub fn actions<I, S>(mut self, actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.actions = actions.into_iter().map(Into::into).collect();
        self
    }

    pub fn icon(mut self, url: impl Into<String>) -> Self {
        self.icon = Some(url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.insert(name.into(), value.into());
        self
    }

    /// Fills every unset field from `defaults`. Values already set win.
    pub fn with_defaults(mut self, defaults: &NotifyDefaults) -> Self {
        fn fill(slot: &mut Option<String>, default: Option<&str>) {
            if slot.is_none() {
                *slot = default.map(String::from);
            }
        }
        fill(&mut self.title, defaults.title());
        fill(&mut self.priority, defaults.priority());
        fill(&mut self.click, defaults.click());
        fill(&mut self.attach, defaults.attach());
        fill(&mut self.icon, defaults.icon());
        if self.tags.is_empty() {
            self.tags = defaults.tags();
        }
        if self.actions.is_empty() {
            self.actions = defaults.actions();
        }
        for (key, value) in defaults.extra() {
            // Header names are case-insensitive.
            if !self.extra.keys().any(|k| k.eq_ignore_ascii_case(key)) {
                self.extra.insert(key.clone(), value.clone());
            }
        }
        self
    }
}

/// A message ready to be addressed to destinations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    method: Method,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Message {
    /// Builds the request body and headers from the text and merged fields.
    ///
    /// A local attachment is uploaded as the body with `PUT`, in which case
    /// `text` must be empty.
    pub async fn compose(text: &str, fields: &MessageOptions) -> Result<Self> {
        let attachment = fields
            .attach
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());
        let (method, body, attach_url, filename) = match attachment {
            Some(url) if url.starts_with("http") => {
                (Method::Post, text.as_bytes().to_vec(), Some(url), None)
            }
            Some(local) => {
                if !text.is_empty() {
                    return Err(NotifierError::AttachmentConflict);
                }
                let path = PathBuf::from(local);
                let content = tokio::fs::read(&path)
                    .await
                    .map_err(|source| NotifierError::Attachment {
                        path: path.clone(),
                        source,
                    })?;
                let filename = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned());
                (Method::Put, content, None, filename)
            }
            None => (Method::Post, text.as_bytes().to_vec(), None, None),
        };

        let mut headers = Vec::new();
        let mut push = |key: DefaultKey, value: Option<&str>| {
            if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
                headers.push((key.header().to_string(), value.to_string()));
            }
        };
        push(DefaultKey::Title, fields.title.as_deref());
        push(DefaultKey::Priority, fields.priority.as_deref());
        let tags = join_items(&fields.tags, ',', ",");
        push(DefaultKey::Tags, tags.as_deref());
        push(DefaultKey::Click, fields.click.as_deref());
        push(DefaultKey::Attach, attach_url);

        let actions = join_items(&fields.actions, ';', "; ");
        push(DefaultKey::Actions, actions.as_deref());
        push(DefaultKey::Icon, fields.icon.as_deref());

        if let Some(filename) = filename {
            headers.push(("Filename".to_string(), filename));
        }
        for (key, value) in &fields.extra {
            if !value.trim().is_empty() {
                headers.push((key.clone(), value.trim().to_string()));
            }
        }

        Ok(Self {
            method,
            headers,
            body,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Addresses the message to one destination on the server at `base_url`.
    pub fn request_for(&self, destination: &Destination, base_url: &str) -> PublishRequest {
        let base_url = base_url.trim_end_matches('/');
        let mut headers = self.headers.clone();
        let url = match destination {
            Destination::Topic(topic) => topic_url(base_url, topic),
            Destination::Email(address) => {
                headers.push(("Email".to_string(), address.clone()));
                topic_url(base_url, EMAIL_TOPIC)
            }
        };
        PublishRequest {
            method: self.method,
            url,
            headers,
            body: self.body.clone(),
        }
    }
}

/// Appends `topic` as one percent-encoded path segment of `base_url`.
///
/// A base URL that does not parse is joined as text and left for the
/// transport to reject.
fn topic_url(base_url: &str, topic: &str) -> String {
    let Ok(mut url) = Url::parse(base_url) else {
        return format!("{base_url}/{topic}");
    };
    match url.path_segments_mut() {
        Ok(mut segments) => {
            segments.pop_if_empty().push(topic);
        }
        Err(()) => return format!("{base_url}/{topic}"),
    }
    url.into()
}

/// Splits items on `separator`, drops empty pieces and joins the rest with
/// `joiner`. `None` if nothing is left.
fn join_items(items: &[String], separator: char, joiner: &str) -> Option<String> {
    let items: Vec<String> = items
        .iter()
        .flat_map(|item| split_list(Some(item.as_str()), separator))
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items.join(joiner))
    }
}
