//! Network-first navigation handling.

use pwakit_common::{try_init_logging, LogConfig};
use pwakit_sw::{
    CacheStore, EventOutcome, FetchOutcome, MemoryEnvironment, Request, RequestMode, Response,
    ResponseSource, ServiceWorker, ServiceWorkerError, WorkerConfig, WorkerEvent,
};
use url::Url;

const PAGE: &str = "https://app.example/messages";
const SHELL: &str = "https://app.example/";

fn worker() -> ServiceWorker {
    let origin = Url::parse(SHELL).unwrap();
    ServiceWorker::new(WorkerConfig::for_origin(origin)).unwrap()
}

fn env() -> MemoryEnvironment {
    // Every test shares one subscriber; later calls are rejected.
    let _ = try_init_logging(&LogConfig::from_verbosity(1).with_filter("pwakit_sw=debug"));
    MemoryEnvironment::new(Url::parse(SHELL).unwrap())
}

fn navigate(url: &str) -> WorkerEvent {
    WorkerEvent::Fetch(Request::navigate(Url::parse(url).unwrap()))
}

async fn fetch(worker: &ServiceWorker, env: &MemoryEnvironment, url: &str) -> FetchOutcome {
    match worker.dispatch(navigate(url), env).await.unwrap() {
        EventOutcome::Fetch(outcome) => outcome,
        other => panic!("unexpected outcome {:?}", other),
    }
}

#[tokio::test]
async fn network_response_is_returned_and_not_cached() {
    let env = env();
    env.route(PAGE, Response::ok("live").with_header("content-type", "text/html"))
        .await;

    let outcome = fetch(&worker(), &env, PAGE).await;

    assert_eq!(
        outcome,
        FetchOutcome::Respond {
            response: Response::ok("live").with_header("content-type", "text/html"),
            source: ResponseSource::Network,
        }
    );
    assert!(env.cache_keys().await.is_empty());
}

#[tokio::test]
async fn http_error_status_is_still_a_network_response() {
    let env = env();
    env.put("pages", PAGE, Response::ok("cached")).await.unwrap();

    let FetchOutcome::Respond { response, source } = fetch(&worker(), &env, PAGE).await else {
        panic!("expected a response");
    };
    assert_eq!(source, ResponseSource::Network);
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn offline_serves_exact_cached_page() {
    let env = env();
    env.put("pages", PAGE, Response::ok("cached page")).await.unwrap();
    env.put("pages", SHELL, Response::ok("shell")).await.unwrap();
    env.set_online(false).await;

    let outcome = fetch(&worker(), &env, PAGE).await;

    assert_eq!(
        outcome,
        FetchOutcome::Respond {
            response: Response::ok("cached page"),
            source: ResponseSource::Cache,
        }
    );
}

#[tokio::test]
async fn offline_falls_back_to_app_shell() {
    let env = env();
    env.put("shell", SHELL, Response::ok("shell")).await.unwrap();
    env.set_online(false).await;

    let outcome = fetch(&worker(), &env, "https://app.example/chat/42").await;

    assert_eq!(
        outcome,
        FetchOutcome::Respond {
            response: Response::ok("shell"),
            source: ResponseSource::AppShell,
        }
    );
}

#[tokio::test]
async fn offline_without_fallback_propagates() {
    let env = env();
    env.set_online(false).await;
    let worker = worker();

    let err = worker.dispatch(navigate(PAGE), &env).await.unwrap_err();

    match err {
        ServiceWorkerError::NoOfflineFallback { url, reason } => {
            assert_eq!(url, PAGE);
            assert!(reason.contains("offline"));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(worker.lifetime().is_idle());
}

#[tokio::test]
async fn subresources_pass_through_even_offline() {
    let env = env();
    env.set_online(false).await;
    let worker = worker();

    for mode in [RequestMode::NoCors, RequestMode::Cors, RequestMode::SameOrigin] {
        let request = Request::new(Url::parse("https://app.example/app.js").unwrap(), mode);
        let outcome = worker.dispatch(WorkerEvent::Fetch(request), &env).await.unwrap();
        assert_eq!(outcome, EventOutcome::Fetch(FetchOutcome::PassThrough));
    }
}

#[tokio::test]
async fn shell_seeded_before_activation_is_purged() {
    let env = env();
    let worker = worker();
    env.put("shell", SHELL, Response::ok("shell")).await.unwrap();
    env.install_and_activate(&worker, Url::parse("https://app.example/sw.js").unwrap())
        .await
        .unwrap();
    env.set_online(false).await;

    let err = worker.dispatch(navigate(PAGE), &env).await.unwrap_err();
    assert!(matches!(err, ServiceWorkerError::NoOfflineFallback { .. }));

    // Seeding after activation makes the fallback work.
    env.put("shell", SHELL, Response::ok("shell")).await.unwrap();
    let outcome = fetch(&worker, &env, PAGE).await;
    assert!(matches!(
        outcome,
        FetchOutcome::Respond {
            source: ResponseSource::AppShell,
            ..
        }
    ));
}
