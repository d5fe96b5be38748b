//! Request, response, and client handles exchanged with the host runtime.

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

// ==================== Requests ====================

/// Request mode as reported by the host for an intercepted fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// An intercepted fetch request.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// Request URL.
    pub url: Url,

    /// Request method.
    pub method: String,

    /// Request mode.
    pub mode: RequestMode,
}

impl Request {
    /// Create a GET request with the given mode.
    pub fn new(url: Url, mode: RequestMode) -> Self {
        Self {
            url,
            method: "GET".to_string(),
            mode,
        }
    }

    /// Create a top-level navigation request.
    pub fn navigate(url: Url) -> Self {
        Self::new(url, RequestMode::Navigate)
    }

    /// Is this a top-level document load.
    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Key under which this request is stored in the cache store.
    pub fn cache_key(&self) -> &str {
        self.url.as_str()
    }
}

// ==================== Responses ====================

/// A response produced by the network or read back from the cache store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Status code.
    pub status: u16,

    /// Status text.
    #[serde(default)]
    pub status_text: String,

    /// Response headers.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Response body.
    #[serde(default)]
    pub body: Vec<u8>,
}

impl Response {
    /// Create a 200 response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(200, "OK", body)
    }

    /// Create a response with an explicit status.
    pub fn with_status(status: u16, status_text: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Add a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}

// ==================== Clients ====================

/// Opaque identifier for a window client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientId(pub String);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of an open page at enumeration time.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowClient {
    /// Client ID.
    pub id: ClientId,

    /// URL the page had when enumerated.
    pub url: String,

    /// Whether this worker version controls the page.
    pub controlled: bool,
}

/// Options for enumerating window clients.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientQuery {
    /// Include pages not controlled by this worker (e.g. a tab from a prior
    /// worker version).
    pub include_uncontrolled: bool,
}

// ==================== Notifications ====================

/// Identifier the host assigns to a displayed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub u64);

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "notification-{}", self.0)
    }
}
