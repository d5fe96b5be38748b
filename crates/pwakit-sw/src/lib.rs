//! # PWAKit Service Worker
//!
//! Background worker core for an installable web app.
//!
//! ## Features
//!
//! - **Lifecycle**: skip waiting on install, purge every cache and claim all
//!   pages on activate
//! - **Navigation**: network-first page loads with cache and app-shell
//!   fallback; other requests pass through
//! - **Push**: JSON payloads become notifications carrying a conversation id
//! - **Notification clicks**: focus the first matching window or open one
//!
//! ## Architecture
//!
//! ```text
//! Host runtime ── WorkerEvent ──► ServiceWorker::dispatch
//!                                     ├── install/activate ─► LifecycleController
//!                                     ├── fetch ────────────► NavigationInterceptor
//!                                     ├── push ─────────────► PushDispatcher
//!                                     └── notificationclick ► NotificationClickRouter
//!                                                  │
//!                                                  ▼
//!                              Environment (Network + CacheStore +
//!                              NotificationDisplay + WindowClients +
//!                              RegistrationHost)
//! ```

pub mod cache;
pub mod click;
pub mod config;
pub mod env;
pub mod error;
pub mod lifecycle;
pub mod lifetime;
pub mod memory;
pub mod navigation;
pub mod push;
pub mod registration;
pub mod types;
pub mod worker;

pub use cache::{Cache, CacheEntry, CacheStorage};
pub use click::{ClickOutcome, NotificationClick, NotificationClickRouter};
pub use config::WorkerConfig;
pub use env::{
    CacheStore, Environment, Network, NotificationDisplay, RegistrationHost, WindowClients,
};
pub use error::{Result, ServiceWorkerError};
pub use lifecycle::{ActivationReport, LifecycleController};
pub use lifetime::{ExtensionToken, WorkerLifetime};
pub use memory::{DisplayedNotification, HostCall, MemoryEnvironment};
pub use navigation::{FetchOutcome, NavigationInterceptor, ResponseSource};
pub use push::{NotificationData, NotificationDescriptor, PushDispatcher, PushOutcome, PushPayload};
pub use registration::{Registration, RegistrationState, WorkerVersion, WorkerVersionId};
pub use types::{
    ClientId, ClientQuery, NotificationId, Request, RequestMode, Response, WindowClient,
};
pub use worker::{EventKind, EventOutcome, ServiceWorker, WorkerEvent};
