//! Install and activate handling.
//!
//! Install asks the host not to wait for old pages. Activate deletes every
//! cache present, whatever its name, then claims all open pages. After
//! activation no cached entry from a previous deploy survives.

use tracing::{debug, info};

use crate::env::Environment;
use crate::error::Result;

/// Summary of one activation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Caches removed, in enumeration order.
    pub purged: Vec<String>,
}

/// Handles the install and activate events.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleController;

impl LifecycleController {
    pub fn new() -> Self {
        Self
    }

    /// Install: take over as soon as possible.
    pub async fn on_install<E: Environment + ?Sized>(&self, env: &E) -> Result<()> {
        env.skip_waiting().await?;
        debug!("Install complete, skipping wait");
        Ok(())
    }

    /// Activate: purge all caches, then claim open pages.
    ///
    /// Any failure rejects the activation; the host decides whether and when
    /// to retry.
    pub async fn on_activate<E: Environment + ?Sized>(&self, env: &E) -> Result<ActivationReport> {
        let names = env.cache_names().await?;
        let mut report = ActivationReport::default();

        for name in names {
            env.delete_cache(&name).await?;
            debug!(cache = %name, "Deleted cache");
            report.purged.push(name);
        }

        env.claim().await?;
        info!(purged = report.purged.len(), "Activated and claimed clients");
        Ok(report)
    }
}
