//! Network-first handling for top-level page loads.
//!
//! Only `navigate` requests are intercepted. Scripts, styles, images, and API
//! calls pass through untouched; those assets carry content hashes from the
//! build. Successful network responses are never written to the cache.

use tracing::{debug, trace, warn};

use crate::env::Environment;
use crate::error::{Result, ServiceWorkerError};
use crate::types::{Request, Response};

/// Where a navigation response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Network,
    /// Cached entry for the exact request URL.
    Cache,
    /// Cached app shell.
    AppShell,
}

/// Result of intercepting a fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// Not a navigation; the host performs its default fetch.
    PassThrough,
    /// The worker answers the request.
    Respond {
        response: Response,
        source: ResponseSource,
    },
}

/// Intercepts navigation requests.
#[derive(Debug, Clone)]
pub struct NavigationInterceptor {
    app_shell_url: String,
}

impl NavigationInterceptor {
    /// Create an interceptor that falls back to the given app shell URL.
    pub fn new(app_shell_url: impl Into<String>) -> Self {
        Self {
            app_shell_url: app_shell_url.into(),
        }
    }

    pub fn app_shell_url(&self) -> &str {
        &self.app_shell_url
    }

    /// Handle a fetch event.
    ///
    /// No timeout is applied to the network attempt. When the network fails
    /// and neither the request nor the app shell is cached, the error is
    /// returned for the host's default offline handling.
    pub async fn handle<E: Environment + ?Sized>(
        &self,
        request: &Request,
        env: &E,
    ) -> Result<FetchOutcome> {
        if !request.is_navigation() {
            trace!(url = %request.url, mode = ?request.mode, "Passing through");
            return Ok(FetchOutcome::PassThrough);
        }

        let network_error = match env.fetch(request).await {
            Ok(response) => {
                trace!(url = %request.url, status = response.status, "Served from network");
                return Ok(FetchOutcome::Respond {
                    response,
                    source: ResponseSource::Network,
                });
            }
            Err(e) => e,
        };
        debug!(url = %request.url, error = %network_error, "Navigation fetch failed");

        if let Some(response) = env.match_url(request.cache_key()).await? {
            debug!(url = %request.url, "Served from cache");
            return Ok(FetchOutcome::Respond {
                response,
                source: ResponseSource::Cache,
            });
        }

        if let Some(response) = env.match_url(&self.app_shell_url).await? {
            debug!(url = %request.url, shell = %self.app_shell_url, "Served app shell");
            return Ok(FetchOutcome::Respond {
                response,
                source: ResponseSource::AppShell,
            });
        }

        warn!(url = %request.url, "Offline with no cached fallback");
        Err(ServiceWorkerError::NoOfflineFallback {
            url: request.url.to_string(),
            reason: network_error.to_string(),
        })
    }
}
