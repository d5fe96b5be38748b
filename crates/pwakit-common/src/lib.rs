//! # PWAKit Common
//!
//! Shared plumbing for the PWAKit worker crates.
//!
//! ## Features
//!
//! - Logging configuration and subscriber setup

pub mod logging;

pub use logging::{try_init_logging, LogConfig, LogFormat, LoggingError};
