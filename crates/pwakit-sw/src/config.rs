//! Worker configuration.

use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

use crate::error::{Result, ServiceWorkerError};

/// Static settings for one worker deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// The worker's own origin. Window clients are matched against it.
    pub origin: Url,

    /// Path of the cached app shell used as the last-resort offline page.
    pub app_shell_path: String,

    /// Route prefix for a specific conversation.
    pub chat_route_prefix: String,

    /// Route opened when a notification names no conversation.
    pub inbox_route: String,

    /// Notification icon path.
    pub icon: String,

    /// Notification badge path.
    pub badge: String,

    /// Title used when a push payload has none.
    pub default_title: String,

    /// Body used when a push payload has none.
    pub default_body: String,

    /// Vibration pattern in milliseconds.
    pub vibration_pattern: Vec<u32>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            origin: Url::parse("https://localhost/").expect("static origin is valid"),
            app_shell_path: "/".to_string(),
            chat_route_prefix: "/chat/".to_string(),
            inbox_route: "/messages".to_string(),
            icon: "/icons/icon-192.png".to_string(),
            badge: "/icons/icon-192.png".to_string(),
            default_title: "New message".to_string(),
            default_body: "You have a new message".to_string(),
            vibration_pattern: vec![200, 100, 200],
        }
    }
}

impl WorkerConfig {
    /// Create a configuration for the given origin with default settings.
    pub fn for_origin(origin: Url) -> Self {
        Self {
            origin,
            ..Default::default()
        }
    }

    /// Parse and validate a JSON configuration.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ServiceWorkerError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            ServiceWorkerError::config(format!("reading {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Check the invariants the handlers rely on.
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.origin.scheme(), "http" | "https") {
            return Err(ServiceWorkerError::config(format!(
                "origin must be http(s), got {}",
                self.origin
            )));
        }
        for (name, route) in [
            ("app_shell_path", &self.app_shell_path),
            ("chat_route_prefix", &self.chat_route_prefix),
            ("inbox_route", &self.inbox_route),
        ] {
            if !route.starts_with('/') {
                return Err(ServiceWorkerError::config(format!(
                    "{} must start with '/', got {:?}",
                    name, route
                )));
            }
        }
        if self.vibration_pattern.len() != 3 {
            return Err(ServiceWorkerError::config(format!(
                "vibration_pattern must have 3 entries, got {}",
                self.vibration_pattern.len()
            )));
        }
        Ok(())
    }

    /// ASCII serialization of the origin, e.g. `https://app.example`.
    pub fn origin_str(&self) -> String {
        self.origin.origin().ascii_serialization()
    }

    /// Resolve a root-relative route against the origin.
    pub fn resolve(&self, route: &str) -> Result<Url> {
        self.origin
            .join(route)
            .map_err(|e| ServiceWorkerError::config(format!("bad route {:?}: {}", route, e)))
    }

    /// Absolute URL of the app shell.
    pub fn app_shell_url(&self) -> Result<Url> {
        self.resolve(&self.app_shell_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = WorkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.icon, "/icons/icon-192.png");
        assert_eq!(config.badge, config.icon);
        assert_eq!(config.vibration_pattern.len(), 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = WorkerConfig::from_json_str(r#"{"origin": "https://app.example/"}"#).unwrap();
        assert_eq!(config.origin_str(), "https://app.example");
        assert_eq!(config.inbox_route, "/messages");
        assert_eq!(
            config.app_shell_url().unwrap().as_str(),
            "https://app.example/"
        );
    }

    #[test]
    fn test_origin_serializes_as_string() {
        let origin = Url::parse("https://app.example/").unwrap();
        let json = serde_json::to_value(WorkerConfig::for_origin(origin)).unwrap();
        assert_eq!(json["origin"], "https://app.example/");

        let back: WorkerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.origin.as_str(), "https://app.example/");
    }

    #[test]
    fn test_rejects_bad_vibration_pattern() {
        let err = WorkerConfig::from_json_str(r#"{"vibration_pattern": [100]}"#).unwrap_err();
        assert!(matches!(err, ServiceWorkerError::Config(_)));
    }

    #[test]
    fn test_rejects_relative_route() {
        let err = WorkerConfig::from_json_str(r#"{"inbox_route": "messages"}"#).unwrap_err();
        assert!(err.to_string().contains("inbox_route"));
    }

    #[test]
    fn test_rejects_non_http_origin() {
        let err = WorkerConfig::from_json_str(r#"{"origin": "file:///tmp/"}"#).unwrap_err();
        assert!(matches!(err, ServiceWorkerError::Config(_)));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"default_title": "Ping"}}"#).unwrap();

        let config = WorkerConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.default_title, "Ping");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = WorkerConfig::from_json_file("/nonexistent/pwakit.json").unwrap_err();
        assert!(matches!(err, ServiceWorkerError::Config(_)));
    }
}
