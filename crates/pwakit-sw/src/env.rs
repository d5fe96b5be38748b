//! Capabilities the host runtime exposes to the worker.
//!
//! Each handler takes an [`Environment`] instead of reaching for globals, so
//! the whole worker runs against [`crate::MemoryEnvironment`] in tests.

use async_trait::async_trait;
use url::Url;

use crate::error::Result;
use crate::push::NotificationDescriptor;
use crate::types::{ClientId, ClientQuery, NotificationId, Request, Response, WindowClient};

/// Live network access.
#[async_trait]
pub trait Network: Send + Sync {
    /// Fetch a request from the network. Any network-layer failure (offline,
    /// DNS, timeout) is an `Err`; HTTP error statuses are `Ok`.
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// The process-wide cache store, addressed by cache name.
///
/// Each call is atomic on its own; sequences of calls are not.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Names of every cache present.
    async fn cache_names(&self) -> Result<Vec<String>>;

    /// Delete a named cache. Returns whether it existed.
    async fn delete_cache(&self, name: &str) -> Result<bool>;

    /// Look up a request URL across all caches.
    async fn match_url(&self, url: &str) -> Result<Option<Response>>;

    /// Store a response under `url` in the named cache, creating it if needed.
    async fn put(&self, cache_name: &str, url: &str, response: Response) -> Result<()>;
}

/// System notification display.
#[async_trait]
pub trait NotificationDisplay: Send + Sync {
    /// Show a notification; resolves once it is displayed.
    async fn show_notification(&self, notification: &NotificationDescriptor)
        -> Result<NotificationId>;

    /// Dismiss a displayed notification. Closing an unknown id is a no-op.
    async fn close_notification(&self, id: NotificationId);
}

/// Open pages the worker can see and drive.
#[async_trait]
pub trait WindowClients: Send + Sync {
    /// Snapshot of window clients in host enumeration order.
    async fn match_all(&self, query: ClientQuery) -> Result<Vec<WindowClient>>;

    /// Navigate an open page.
    async fn navigate(&self, id: &ClientId, url: &Url) -> Result<()>;

    /// Give an open page focus.
    async fn focus(&self, id: &ClientId) -> Result<()>;

    /// Open a new window at `url`.
    async fn open_window(&self, url: &Url) -> Result<ClientId>;

    /// Take control of every open page in scope.
    async fn claim(&self) -> Result<()>;
}

/// The registration's lifecycle hooks available to the worker itself.
#[async_trait]
pub trait RegistrationHost: Send + Sync {
    /// Ask not to wait for pages on the previous version to close.
    async fn skip_waiting(&self) -> Result<()>;
}

/// Everything a handler may touch.
pub trait Environment:
    Network + CacheStore + NotificationDisplay + WindowClients + RegistrationHost
{
}

impl<T> Environment for T where
    T: Network + CacheStore + NotificationDisplay + WindowClients + RegistrationHost
{
}
