//! Registration lifecycle state machine.
//!
//! ```text
//! update() ──► installing ──install_complete()──► waiting
//!                                                   │
//!                      begin_activation() ◄─────────┘ (skip_waiting, or no
//!                             │                        pages on the old worker)
//!                             ▼
//!                         activating ──activation_complete()──► active
//! ```
//!
//! The registration is owned by the host runtime. The worker only asks for
//! `skip_waiting`; every other transition is driven by the host.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;
use url::Url;

use crate::error::{Result, ServiceWorkerError};

/// Unique identifier for one installed worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WorkerVersionId(u64);

impl WorkerVersionId {
    fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lifecycle state of a worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationState {
    Installing,
    /// Installed, waiting for the previous version's pages to close.
    Waiting,
    Activating,
    /// Active and controlling pages.
    Active,
    /// Replaced by a newer version.
    Redundant,
}

impl fmt::Display for RegistrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Installing => "installing",
            Self::Waiting => "waiting",
            Self::Activating => "activating",
            Self::Active => "active",
            Self::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

/// One version of the worker script.
#[derive(Debug, Clone)]
pub struct WorkerVersion {
    pub id: WorkerVersionId,
    pub script_url: Url,
    pub state: RegistrationState,
    /// Set when the version asked not to wait for old pages to close.
    pub skip_waiting: bool,
    pub state_changed_at: Instant,
}

impl WorkerVersion {
    fn new(script_url: Url) -> Self {
        Self {
            id: WorkerVersionId::new(),
            script_url,
            state: RegistrationState::Installing,
            skip_waiting: false,
            state_changed_at: Instant::now(),
        }
    }

    fn set_state(&mut self, state: RegistrationState) {
        debug!(version = self.id.0, from = %self.state, to = %state, "Worker state change");
        self.state = state;
        self.state_changed_at = Instant::now();
    }
}

/// A worker registration for one scope.
#[derive(Debug)]
pub struct Registration {
    /// Scope URL.
    pub scope: Url,

    /// Installing version.
    pub installing: Option<WorkerVersion>,

    /// Installed version waiting to activate.
    pub waiting: Option<WorkerVersion>,

    /// Activating or active version.
    pub active: Option<WorkerVersion>,
}

impl Registration {
    /// Create an empty registration.
    pub fn new(scope: Url) -> Self {
        Self {
            scope,
            installing: None,
            waiting: None,
            active: None,
        }
    }

    /// State of the newest version, if any.
    pub fn state(&self) -> Option<RegistrationState> {
        self.installing
            .as_ref()
            .or(self.waiting.as_ref())
            .or(self.active.as_ref())
            .map(|v| v.state)
    }

    /// Start installing a new version. Replaces any version still installing.
    pub fn update(&mut self, script_url: Url) -> WorkerVersionId {
        let version = WorkerVersion::new(script_url);
        let id = version.id;
        if let Some(mut stale) = self.installing.replace(version) {
            stale.set_state(RegistrationState::Redundant);
        }
        id
    }

    /// Mark the installing or waiting version as not waiting for old pages.
    pub fn skip_waiting(&mut self) -> Result<()> {
        if let Some(version) = self.installing.as_mut().or(self.waiting.as_mut()) {
            version.skip_waiting = true;
            return Ok(());
        }
        Err(self.invalid(RegistrationState::Waiting))
    }

    /// Transition installing to waiting.
    pub fn install_complete(&mut self) -> Result<()> {
        let mut version = self
            .installing
            .take()
            .ok_or_else(|| self.invalid(RegistrationState::Waiting))?;
        version.set_state(RegistrationState::Waiting);
        if let Some(mut superseded) = self.waiting.replace(version) {
            superseded.set_state(RegistrationState::Redundant);
        }
        Ok(())
    }

    /// Whether the waiting version may activate now.
    pub fn can_activate(&self, old_pages_open: bool) -> bool {
        match self.waiting {
            Some(ref version) => version.skip_waiting || self.active.is_none() || !old_pages_open,
            None => false,
        }
    }

    /// Transition waiting to activating. The previous active version becomes
    /// redundant and is returned.
    pub fn begin_activation(&mut self) -> Result<Option<WorkerVersion>> {
        let mut version = self
            .waiting
            .take()
            .ok_or_else(|| self.invalid(RegistrationState::Activating))?;
        version.set_state(RegistrationState::Activating);

        let previous = self.active.replace(version).map(|mut old| {
            old.set_state(RegistrationState::Redundant);
            old
        });
        Ok(previous)
    }

    /// Fail unless the active slot holds a version still activating.
    pub fn ensure_activating(&self) -> Result<()> {
        match self.active {
            Some(ref version) if version.state == RegistrationState::Activating => Ok(()),
            _ => Err(self.invalid(RegistrationState::Active)),
        }
    }

    /// Transition activating to active.
    pub fn activation_complete(&mut self) -> Result<()> {
        if let Some(version) = self.active.as_mut() {
            if version.state == RegistrationState::Activating {
                version.set_state(RegistrationState::Active);
                return Ok(());
            }
        }
        Err(self.invalid(RegistrationState::Active))
    }

    fn invalid(&self, to: RegistrationState) -> ServiceWorkerError {
        ServiceWorkerError::InvalidTransition {
            from: self.state().unwrap_or(RegistrationState::Redundant),
            to,
        }
    }
}
