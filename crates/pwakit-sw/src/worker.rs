//! Event dispatch.
//!
//! One [`ServiceWorker`] is built per worker startup. It holds only immutable
//! configuration and the component handlers; all per-event state lives on the
//! stack of the handler that owns the event.

use std::fmt;
use tracing::{debug, warn};

use crate::click::{ClickOutcome, NotificationClick, NotificationClickRouter};
use crate::config::WorkerConfig;
use crate::env::Environment;
use crate::error::Result;
use crate::lifecycle::{ActivationReport, LifecycleController};
use crate::lifetime::WorkerLifetime;
use crate::navigation::{FetchOutcome, NavigationInterceptor};
use crate::push::{PushDispatcher, PushOutcome};
use crate::types::Request;

/// Event kinds the host delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Push,
    NotificationClick,
}

impl EventKind {
    /// Name the host uses for the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Activate => "activate",
            Self::Fetch => "fetch",
            Self::Push => "push",
            Self::NotificationClick => "notificationclick",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered to the worker.
#[derive(Debug, Clone)]
pub enum WorkerEvent {
    Install,
    Activate,
    Fetch(Request),
    /// Raw push payload, if any.
    Push(Option<Vec<u8>>),
    NotificationClick(NotificationClick),
}

impl WorkerEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Install => EventKind::Install,
            Self::Activate => EventKind::Activate,
            Self::Fetch(_) => EventKind::Fetch,
            Self::Push(_) => EventKind::Push,
            Self::NotificationClick(_) => EventKind::NotificationClick,
        }
    }
}

/// What a handler produced.
#[derive(Debug, Clone, PartialEq)]
pub enum EventOutcome {
    Installed,
    Activated(ActivationReport),
    Fetch(FetchOutcome),
    Push(PushOutcome),
    Click(ClickOutcome),
}

/// The worker: a dispatch table from event kind to handler.
#[derive(Debug, Clone)]
pub struct ServiceWorker {
    config: WorkerConfig,
    lifecycle: LifecycleController,
    navigation: NavigationInterceptor,
    push: PushDispatcher,
    clicks: NotificationClickRouter,
    lifetime: WorkerLifetime,
}

impl ServiceWorker {
    /// Build the worker from a validated configuration.
    pub fn new(config: WorkerConfig) -> Result<Self> {
        config.validate()?;
        let app_shell = config.app_shell_url()?;

        Ok(Self {
            lifecycle: LifecycleController::new(),
            navigation: NavigationInterceptor::new(app_shell.as_str()),
            push: PushDispatcher::new(config.clone()),
            clicks: NotificationClickRouter::new(config.clone()),
            lifetime: WorkerLifetime::new(),
            config,
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Lifetime tracker the host consults before terminating the worker.
    pub fn lifetime(&self) -> &WorkerLifetime {
        &self.lifetime
    }

    /// Deliver one event to its handler.
    ///
    /// The worker stays non-idle until the returned future resolves. Events
    /// may be dispatched concurrently; handlers share nothing but the
    /// environment.
    pub async fn dispatch<E: Environment + ?Sized>(
        &self,
        event: WorkerEvent,
        env: &E,
    ) -> Result<EventOutcome> {
        let kind = event.kind();
        let _token = self.lifetime.extend(kind.as_str());
        debug!(event = %kind, "Dispatching");

        let outcome = match event {
            WorkerEvent::Install => self
                .lifecycle
                .on_install(env)
                .await
                .map(|()| EventOutcome::Installed),
            WorkerEvent::Activate => self
                .lifecycle
                .on_activate(env)
                .await
                .map(EventOutcome::Activated),
            WorkerEvent::Fetch(request) => self
                .navigation
                .handle(&request, env)
                .await
                .map(EventOutcome::Fetch),
            WorkerEvent::Push(payload) => self
                .push
                .handle(payload.as_deref(), env)
                .await
                .map(EventOutcome::Push),
            WorkerEvent::NotificationClick(click) => self
                .clicks
                .handle(&click, env)
                .await
                .map(EventOutcome::Click),
        };

        if let Err(ref e) = outcome {
            warn!(event = %kind, category = e.category(), error = %e, "Handler rejected");
        }
        outcome
    }
}
