//! In-memory host environment.
//!
//! Implements every capability in [`crate::env`] with scripted behavior and a
//! call log, and drives the registration lifecycle the way a host would.

use async_trait::async_trait;
use hashbrown::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, trace};
use url::Url;

use crate::cache::CacheStorage;
use crate::env::{CacheStore, Network, NotificationDisplay, RegistrationHost, WindowClients};
use crate::error::{Result, ServiceWorkerError};
use crate::push::NotificationDescriptor;
use crate::registration::{Registration, RegistrationState};
use crate::types::{ClientId, ClientQuery, NotificationId, Request, Response, WindowClient};
use crate::worker::{EventOutcome, ServiceWorker, WorkerEvent};

/// A side effect the worker requested from the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    SkipWaiting,
    Claim,
    DeleteCache(String),
    ShowNotification(NotificationId),
    CloseNotification(NotificationId),
    Navigate { client: ClientId, url: String },
    Focus(ClientId),
    OpenWindow { client: ClientId, url: String },
}

/// A notification on screen.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedNotification {
    pub id: NotificationId,
    pub notification: NotificationDescriptor,
}

#[derive(Debug)]
struct NetworkState {
    online: bool,
    routes: HashMap<String, Response>,
}

#[derive(Debug, Clone)]
struct PageState {
    client: WindowClient,
    focused: bool,
}

/// Scripted host runtime.
#[derive(Debug)]
pub struct MemoryEnvironment {
    network: RwLock<NetworkState>,
    caches: RwLock<CacheStorage>,
    notifications: RwLock<Vec<DisplayedNotification>>,
    pages: RwLock<Vec<PageState>>,
    registration: RwLock<Registration>,
    calls: RwLock<Vec<HostCall>>,
    fail_cache_deletes: AtomicBool,
    fail_navigation: AtomicBool,
    next_id: AtomicU64,
}

impl MemoryEnvironment {
    /// Create an online environment with no caches, pages, or notifications.
    pub fn new(scope: Url) -> Self {
        Self {
            network: RwLock::new(NetworkState {
                online: true,
                routes: HashMap::new(),
            }),
            caches: RwLock::new(CacheStorage::new()),
            notifications: RwLock::new(Vec::new()),
            pages: RwLock::new(Vec::new()),
            registration: RwLock::new(Registration::new(scope)),
            calls: RwLock::new(Vec::new()),
            fail_cache_deletes: AtomicBool::new(false),
            fail_navigation: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    // ==================== Scripting ====================

    /// Toggle network reachability.
    pub async fn set_online(&self, online: bool) {
        self.network.write().await.online = online;
    }

    /// Serve `response` for `url` while online.
    pub async fn route(&self, url: &str, response: Response) {
        self.network
            .write()
            .await
            .routes
            .insert(url.to_string(), response);
    }

    /// Make cache deletion reject.
    pub fn fail_cache_deletes(&self, fail: bool) {
        self.fail_cache_deletes.store(fail, Ordering::Relaxed);
    }

    /// Make page navigation reject, as when a page refuses a cross-origin
    /// navigation.
    pub fn fail_navigation(&self, fail: bool) {
        self.fail_navigation.store(fail, Ordering::Relaxed);
    }

    /// Open a page. `controlled` says whether the current worker controls it.
    pub async fn open_page(&self, url: &str, controlled: bool) -> ClientId {
        let id = ClientId(format!("client-{}", self.next_id()));
        self.pages.write().await.push(PageState {
            client: WindowClient {
                id: id.clone(),
                url: url.to_string(),
                controlled,
            },
            focused: false,
        });
        id
    }

    /// Close a page.
    pub async fn close_page(&self, id: &ClientId) -> bool {
        let mut pages = self.pages.write().await;
        let before = pages.len();
        pages.retain(|p| &p.client.id != id);
        pages.len() != before
    }

    // ==================== Inspection ====================

    /// Every side effect requested so far, in order.
    pub async fn calls(&self) -> Vec<HostCall> {
        self.calls.read().await.clone()
    }

    /// Notifications currently on screen.
    pub async fn notifications(&self) -> Vec<DisplayedNotification> {
        self.notifications.read().await.clone()
    }

    /// All open pages.
    pub async fn pages(&self) -> Vec<WindowClient> {
        self.pages
            .read()
            .await
            .iter()
            .map(|p| p.client.clone())
            .collect()
    }

    /// The focused page, if any.
    pub async fn focused_page(&self) -> Option<ClientId> {
        self.pages
            .read()
            .await
            .iter()
            .find(|p| p.focused)
            .map(|p| p.client.id.clone())
    }

    /// Names of caches present.
    pub async fn cache_keys(&self) -> Vec<String> {
        self.caches.read().await.keys()
    }

    /// Lifecycle state of the newest worker version.
    pub async fn registration_state(&self) -> Option<RegistrationState> {
        self.registration.read().await.state()
    }

    // ==================== Host-driven lifecycle ====================

    /// Install a new worker version and, when allowed, activate it.
    ///
    /// Mirrors a host: dispatch `install`, move to waiting, and activate if
    /// the worker skipped waiting or no page is held by an older version.
    /// A rejected activation leaves the version activating; calling
    /// [`MemoryEnvironment::retry_activation`] redelivers the event.
    pub async fn install_and_activate(
        &self,
        worker: &ServiceWorker,
        script_url: Url,
    ) -> Result<Option<EventOutcome>> {
        self.registration.write().await.update(script_url);
        worker.dispatch(WorkerEvent::Install, self).await?;
        self.registration.write().await.install_complete()?;

        let old_pages_open = self.pages.read().await.iter().any(|p| p.client.controlled);
        if !self.registration.read().await.can_activate(old_pages_open) {
            debug!("New version waiting for old pages to close");
            return Ok(None);
        }

        self.registration.write().await.begin_activation()?;
        self.retry_activation(worker).await.map(Some)
    }

    /// Deliver `activate` to a version stuck in activating.
    ///
    /// Fails without dispatching when no version is activating, so an active
    /// worker's caches are left alone.
    pub async fn retry_activation(&self, worker: &ServiceWorker) -> Result<EventOutcome> {
        self.registration.read().await.ensure_activating()?;
        let outcome = worker.dispatch(WorkerEvent::Activate, self).await?;
        self.registration.write().await.activation_complete()?;
        Ok(outcome)
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    async fn record(&self, call: HostCall) {
        trace!(?call, "Host call");
        self.calls.write().await.push(call);
    }
}

#[async_trait]
impl Network for MemoryEnvironment {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let network = self.network.read().await;
        if !network.online {
            return Err(ServiceWorkerError::network(format!(
                "offline fetching {}",
                request.url
            )));
        }
        Ok(network
            .routes
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Response::with_status(404, "Not Found", Vec::new())))
    }
}

#[async_trait]
impl CacheStore for MemoryEnvironment {
    async fn cache_names(&self) -> Result<Vec<String>> {
        Ok(self.caches.read().await.keys())
    }

    async fn delete_cache(&self, name: &str) -> Result<bool> {
        if self.fail_cache_deletes.load(Ordering::Relaxed) {
            return Err(ServiceWorkerError::cache(format!(
                "quota backend refused to delete {}",
                name
            )));
        }
        let existed = self.caches.write().await.delete(name);
        self.record(HostCall::DeleteCache(name.to_string())).await;
        Ok(existed)
    }

    async fn match_url(&self, url: &str) -> Result<Option<Response>> {
        Ok(self
            .caches
            .read()
            .await
            .match_url(url)
            .map(|entry| entry.response.clone()))
    }

    async fn put(&self, cache_name: &str, url: &str, response: Response) -> Result<()> {
        self.caches.write().await.open(cache_name).put(url, response);
        Ok(())
    }
}

#[async_trait]
impl NotificationDisplay for MemoryEnvironment {
    async fn show_notification(
        &self,
        notification: &NotificationDescriptor,
    ) -> Result<NotificationId> {
        let id = NotificationId(self.next_id());
        self.notifications.write().await.push(DisplayedNotification {
            id,
            notification: notification.clone(),
        });
        self.record(HostCall::ShowNotification(id)).await;
        Ok(id)
    }

    async fn close_notification(&self, id: NotificationId) {
        self.notifications.write().await.retain(|n| n.id != id);
        self.record(HostCall::CloseNotification(id)).await;
    }
}

#[async_trait]
impl WindowClients for MemoryEnvironment {
    async fn match_all(&self, query: ClientQuery) -> Result<Vec<WindowClient>> {
        Ok(self
            .pages
            .read()
            .await
            .iter()
            .filter(|p| query.include_uncontrolled || p.client.controlled)
            .map(|p| p.client.clone())
            .collect())
    }

    async fn navigate(&self, id: &ClientId, url: &Url) -> Result<()> {
        if self.fail_navigation.load(Ordering::Relaxed) {
            return Err(ServiceWorkerError::client(format!(
                "{} refused navigation to {}",
                id, url
            )));
        }
        {
            let mut pages = self.pages.write().await;
            let page = pages
                .iter_mut()
                .find(|p| &p.client.id == id)
                .ok_or_else(|| ServiceWorkerError::client(format!("{} is closed", id)))?;
            page.client.url = url.to_string();
        }
        self.record(HostCall::Navigate {
            client: id.clone(),
            url: url.to_string(),
        })
        .await;
        Ok(())
    }

    async fn focus(&self, id: &ClientId) -> Result<()> {
        {
            let mut pages = self.pages.write().await;
            if !pages.iter().any(|p| &p.client.id == id) {
                return Err(ServiceWorkerError::client(format!("{} is closed", id)));
            }
            for page in pages.iter_mut() {
                page.focused = &page.client.id == id;
            }
        }
        self.record(HostCall::Focus(id.clone())).await;
        Ok(())
    }

    async fn open_window(&self, url: &Url) -> Result<ClientId> {
        let id = ClientId(format!("client-{}", self.next_id()));
        {
            let mut pages = self.pages.write().await;
            for page in pages.iter_mut() {
                page.focused = false;
            }
            pages.push(PageState {
                client: WindowClient {
                    id: id.clone(),
                    url: url.to_string(),
                    controlled: true,
                },
                focused: true,
            });
        }
        self.record(HostCall::OpenWindow {
            client: id.clone(),
            url: url.to_string(),
        })
        .await;
        Ok(id)
    }

    async fn claim(&self) -> Result<()> {
        for page in self.pages.write().await.iter_mut() {
            page.client.controlled = true;
        }
        self.record(HostCall::Claim).await;
        Ok(())
    }
}

#[async_trait]
impl RegistrationHost for MemoryEnvironment {
    async fn skip_waiting(&self) -> Result<()> {
        self.registration.write().await.skip_waiting()?;
        self.record(HostCall::SkipWaiting).await;
        Ok(())
    }
}
