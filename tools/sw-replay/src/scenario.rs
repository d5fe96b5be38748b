//! Scenario files and their execution against [`MemoryEnvironment`].

use pwakit_sw::{
    CacheStore, ClickOutcome, EventOutcome, FetchOutcome, MemoryEnvironment, NotificationClick,
    PushOutcome, Request, RequestMode, Response, ServiceWorker, ServiceWorkerError, WorkerConfig,
    WorkerEvent,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

/// Errors that abort a replay. Handler rejections are reported, not raised.
#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Worker(#[from] ServiceWorkerError),

    #[error("Step {step}: no notification at index {index}")]
    NoSuchNotification { step: usize, index: usize },
}

/// A replayable script.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Worker configuration; defaults apply to omitted fields.
    #[serde(default)]
    pub config: Option<WorkerConfig>,

    /// Script URL used for deploys. Defaults to `sw.js` under the origin.
    #[serde(default)]
    pub script_url: Option<String>,

    pub steps: Vec<Step>,
}

/// One scripted action.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Install a new worker version and activate it.
    Deploy,
    /// Redeliver `activate` after a rejected activation.
    RetryActivation,
    SeedCache {
        cache: String,
        url: String,
        body: String,
        #[serde(default = "ok_status")]
        status: u16,
    },
    Route {
        url: String,
        body: String,
        #[serde(default = "ok_status")]
        status: u16,
    },
    SetOnline {
        online: bool,
    },
    FailCacheDeletes {
        fail: bool,
    },
    OpenPage {
        url: String,
        #[serde(default = "yes")]
        controlled: bool,
    },
    Fetch {
        url: String,
        #[serde(default = "navigate_mode")]
        mode: RequestMode,
    },
    /// `payload` is sent JSON-encoded; `raw` is sent as-is; neither means an
    /// empty push.
    Push {
        #[serde(default)]
        payload: Option<Value>,
        #[serde(default)]
        raw: Option<String>,
    },
    /// Click the notification at `index` among those on screen.
    Click {
        index: usize,
    },
}

fn ok_status() -> u16 {
    200
}

fn yes() -> bool {
    true
}

fn navigate_mode() -> RequestMode {
    RequestMode::Navigate
}

impl Step {
    fn name(&self) -> &'static str {
        match self {
            Step::Deploy => "deploy",
            Step::RetryActivation => "retry_activation",
            Step::SeedCache { .. } => "seed_cache",
            Step::Route { .. } => "route",
            Step::SetOnline { .. } => "set_online",
            Step::FailCacheDeletes { .. } => "fail_cache_deletes",
            Step::OpenPage { .. } => "open_page",
            Step::Fetch { .. } => "fetch",
            Step::Push { .. } => "push",
            Step::Click { .. } => "click",
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub action: &'static str,
    pub result: Value,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ReplayError> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }

    /// Run every step in order against a fresh in-memory host.
    pub async fn run(
        &self,
        config_override: Option<WorkerConfig>,
    ) -> Result<Vec<StepReport>, ReplayError> {
        let config = config_override
            .or_else(|| self.config.clone())
            .unwrap_or_default();
        let worker = ServiceWorker::new(config)?;
        let origin = worker.config().origin.clone();
        let script_url = match self.script_url {
            Some(ref url) => parse_url(url)?,
            None => worker.config().resolve("/sw.js")?,
        };
        let env = MemoryEnvironment::new(origin);

        let mut reports = Vec::with_capacity(self.steps.len());
        for (index, step) in self.steps.iter().enumerate() {
            debug!(step = index, action = step.name(), "Replaying");
            let result = self.run_step(index, step, &worker, &env, &script_url).await?;
            reports.push(StepReport {
                step: index,
                action: step.name(),
                result,
            });
        }

        worker.lifetime().wait_idle().await;
        info!(steps = reports.len(), "Replay complete");
        Ok(reports)
    }

    async fn run_step(
        &self,
        index: usize,
        step: &Step,
        worker: &ServiceWorker,
        env: &MemoryEnvironment,
        script_url: &Url,
    ) -> Result<Value, ReplayError> {
        let result = match step {
            Step::Deploy => match env.install_and_activate(worker, script_url.clone()).await {
                Ok(Some(outcome)) => describe(&outcome),
                Ok(None) => json!({ "waiting": true }),
                Err(e) => rejected(&e),
            },
            Step::RetryActivation => match env.retry_activation(worker).await {
                Ok(outcome) => describe(&outcome),
                Err(e) => rejected(&e),
            },
            Step::SeedCache {
                cache,
                url,
                body,
                status,
            } => {
                env.put(cache, url, response(*status, body)).await?;
                json!({ "seeded": url })
            }
            Step::Route { url, body, status } => {
                env.route(url, response(*status, body)).await;
                json!({ "routed": url })
            }
            Step::SetOnline { online } => {
                env.set_online(*online).await;
                json!({ "online": online })
            }
            Step::FailCacheDeletes { fail } => {
                env.fail_cache_deletes(*fail);
                json!({ "fail_cache_deletes": fail })
            }
            Step::OpenPage { url, controlled } => {
                let id = env.open_page(url, *controlled).await;
                json!({ "client": id.to_string() })
            }
            Step::Fetch { url, mode } => {
                let request = Request::new(parse_url(url)?, *mode);
                dispatch(worker, env, WorkerEvent::Fetch(request)).await
            }
            Step::Push { payload, raw } => {
                let bytes = match (raw, payload) {
                    (Some(raw), _) => Some(raw.clone().into_bytes()),
                    (None, Some(value)) => Some(serde_json::to_vec(value)?),
                    (None, None) => None,
                };
                dispatch(worker, env, WorkerEvent::Push(bytes)).await
            }
            Step::Click { index: which } => {
                let shown = env.notifications().await;
                let target = shown.get(*which).ok_or(ReplayError::NoSuchNotification {
                    step: index,
                    index: *which,
                })?;
                let click = NotificationClick {
                    id: target.id,
                    data: target.notification.data.clone(),
                };
                dispatch(worker, env, WorkerEvent::NotificationClick(click)).await
            }
        };
        Ok(result)
    }
}

async fn dispatch(worker: &ServiceWorker, env: &MemoryEnvironment, event: WorkerEvent) -> Value {
    match worker.dispatch(event, env).await {
        Ok(outcome) => describe(&outcome),
        Err(e) => rejected(&e),
    }
}

fn parse_url(url: &str) -> Result<Url, ReplayError> {
    Url::parse(url).map_err(|source| ReplayError::Url {
        url: url.to_string(),
        source,
    })
}

fn response(status: u16, body: &str) -> Response {
    let text = if status == 200 { "OK" } else { "" };
    Response::with_status(status, text, body.as_bytes())
}

fn rejected(error: &ServiceWorkerError) -> Value {
    json!({ "rejected": error.category(), "error": error.to_string() })
}

/// Render an outcome for the report.
pub fn describe(outcome: &EventOutcome) -> Value {
    match outcome {
        EventOutcome::Installed => json!({ "installed": true }),
        EventOutcome::Activated(report) => json!({ "activated": true, "purged": report.purged }),
        EventOutcome::Fetch(FetchOutcome::PassThrough) => json!({ "pass_through": true }),
        EventOutcome::Fetch(FetchOutcome::Respond { response, source }) => json!({
            "source": format!("{:?}", source).to_lowercase(),
            "status": response.status,
            "body": String::from_utf8_lossy(&response.body),
        }),
        EventOutcome::Push(PushOutcome::NoPayload) => json!({ "shown": false }),
        EventOutcome::Push(PushOutcome::Dropped { reason }) => {
            json!({ "shown": false, "dropped": reason })
        }
        EventOutcome::Push(PushOutcome::Shown { id, notification }) => json!({
            "shown": true,
            "id": id.to_string(),
            "notification": notification,
        }),
        EventOutcome::Click(ClickOutcome::Focused { client, target }) => json!({
            "focused": client.to_string(),
            "target": target.as_str(),
        }),
        EventOutcome::Click(ClickOutcome::Opened { client, target }) => json!({
            "opened": client.to_string(),
            "target": target.as_str(),
        }),
    }
}
