//! Error types for the worker core.

use thiserror::Error;

use crate::registration::RegistrationState;

/// Result type alias for worker operations.
pub type Result<T> = std::result::Result<T, ServiceWorkerError>;

/// Errors that can occur while handling worker events.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceWorkerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Notification error: {0}")]
    Notification(String),

    #[error("Client error: {0}")]
    Client(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition {
        from: RegistrationState,
        to: RegistrationState,
    },

    #[error("Config error: {0}")]
    Config(String),

    /// Navigation failed on the network and neither the request nor the app
    /// shell was cached. The host falls back to its own offline page.
    #[error("Offline with no cached fallback for {url}: {reason}")]
    NoOfflineFallback { url: String, reason: String },
}

impl ServiceWorkerError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    /// Create a cache error.
    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache(message.into())
    }

    /// Create a notification error.
    pub fn notification(message: impl Into<String>) -> Self {
        Self::Notification(message.into())
    }

    /// Create a client error.
    pub fn client(message: impl Into<String>) -> Self {
        Self::Client(message.into())
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Get the error category for log fields.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Cache(_) => "cache",
            Self::Notification(_) => "notification",
            Self::Client(_) => "client",
            Self::InvalidTransition { .. } => "state",
            Self::Config(_) => "config",
            Self::NoOfflineFallback { .. } => "offline",
        }
    }
}
