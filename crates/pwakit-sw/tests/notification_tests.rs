//! Push display and notification click routing.

use pwakit_sw::{
    ClickOutcome, EventOutcome, HostCall, MemoryEnvironment, NotificationClick, NotificationData,
    NotificationId, PushOutcome, ServiceWorker, ServiceWorkerError, WorkerConfig, WorkerEvent,
};
use std::sync::Arc;
use url::Url;

const ORIGIN: &str = "https://app.example/";

fn worker() -> ServiceWorker {
    ServiceWorker::new(WorkerConfig::for_origin(Url::parse(ORIGIN).unwrap())).unwrap()
}

fn env() -> MemoryEnvironment {
    MemoryEnvironment::new(Url::parse(ORIGIN).unwrap())
}

async fn push(
    worker: &ServiceWorker,
    env: &MemoryEnvironment,
    payload: Option<&[u8]>,
) -> PushOutcome {
    let event = WorkerEvent::Push(payload.map(<[u8]>::to_vec));
    match worker.dispatch(event, env).await.unwrap() {
        EventOutcome::Push(outcome) => outcome,
        other => panic!("unexpected outcome {:?}", other),
    }
}

async fn click(
    worker: &ServiceWorker,
    env: &MemoryEnvironment,
    id: NotificationId,
    conversation_id: Option<&str>,
) -> ClickOutcome {
    let event = WorkerEvent::NotificationClick(NotificationClick {
        id,
        data: NotificationData {
            conversation_id: conversation_id.map(str::to_string),
        },
    });
    match worker.dispatch(event, env).await.unwrap() {
        EventOutcome::Click(outcome) => outcome,
        other => panic!("unexpected outcome {:?}", other),
    }
}

// ==================== Push ====================

#[tokio::test]
async fn push_shows_notification_with_conversation() {
    let env = env();
    let worker = worker();

    let outcome = push(
        &worker,
        &env,
        Some(br#"{"title":"Hi","body":"Hello","conversationId":"42"}"#),
    )
    .await;

    let PushOutcome::Shown { id, notification } = outcome else {
        panic!("expected a notification");
    };
    assert_eq!(notification.title, "Hi");
    assert_eq!(notification.body, "Hello");
    assert_eq!(notification.data.conversation_id.as_deref(), Some("42"));

    let shown = env.notifications().await;
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].id, id);
    assert_eq!(shown[0].notification, notification);
}

#[tokio::test]
async fn push_without_payload_is_a_no_op() {
    let env = env();
    assert_eq!(push(&worker(), &env, None).await, PushOutcome::NoPayload);
    assert!(env.notifications().await.is_empty());
    assert!(env.calls().await.is_empty());
}

#[tokio::test]
async fn malformed_push_is_dropped_without_error() {
    let env = env();
    let worker = worker();

    let payloads: [&[u8]; 3] = [b"{not json", b"", b"{\"title\": \"Hi\""];
    for payload in payloads {
        let outcome = push(&worker, &env, Some(payload)).await;
        assert!(matches!(outcome, PushOutcome::Dropped { .. }), "{:?}", outcome);
    }
    assert!(env.notifications().await.is_empty());
    assert!(worker.lifetime().is_idle());
}

#[tokio::test]
async fn push_fills_defaults() {
    let env = env();
    let worker = worker();

    let PushOutcome::Shown { notification, .. } = push(&worker, &env, Some(b"{}")).await else {
        panic!("expected a notification");
    };
    let config = worker.config();
    assert_eq!(notification.title, config.default_title);
    assert_eq!(notification.body, config.default_body);
    assert_eq!(notification.icon, "/icons/icon-192.png");
    assert!(notification.data.conversation_id.is_none());
}

#[tokio::test]
async fn push_with_wrongly_typed_body_still_shows() {
    let env = env();
    let worker = worker();

    let outcome = push(
        &worker,
        &env,
        Some(br#"{"title":"Hi","body":7,"conversationId":"42"}"#),
    )
    .await;

    let PushOutcome::Shown { notification, .. } = outcome else {
        panic!("expected a notification");
    };
    assert_eq!(notification.title, "Hi");
    assert_eq!(notification.body, worker.config().default_body);
    assert_eq!(notification.data.conversation_id.as_deref(), Some("42"));
    assert_eq!(env.notifications().await.len(), 1);
}

#[tokio::test]
async fn non_object_push_shows_defaults() {
    let env = env();
    let worker = worker();

    let PushOutcome::Shown { notification, .. } =
        push(&worker, &env, Some(b"\"just a string\"")).await
    else {
        panic!("expected a notification");
    };
    assert_eq!(notification.title, worker.config().default_title);
    assert!(notification.data.conversation_id.is_none());
}

// ==================== Clicks ====================

#[tokio::test]
async fn click_navigates_and_focuses_matching_window() {
    let env = env();
    let worker = worker();
    let page = env.open_page("https://app.example/messages", true).await;
    let id = NotificationId(99);

    let outcome = click(&worker, &env, id, Some("42")).await;

    let target = Url::parse("https://app.example/chat/42").unwrap();
    assert_eq!(
        outcome,
        ClickOutcome::Focused {
            client: page.clone(),
            target: target.clone(),
        }
    );
    assert_eq!(
        env.calls().await,
        vec![
            HostCall::CloseNotification(id),
            HostCall::Navigate {
                client: page.clone(),
                url: target.to_string(),
            },
            HostCall::Focus(page.clone()),
        ]
    );
    assert_eq!(env.focused_page().await, Some(page));
    assert_eq!(env.pages().await.len(), 1);
}

#[tokio::test]
async fn click_with_no_windows_opens_one() {
    let env = env();
    let worker = worker();
    let id = NotificationId(7);

    let outcome = click(&worker, &env, id, None).await;

    let ClickOutcome::Opened { client, target } = outcome else {
        panic!("expected a new window");
    };
    assert_eq!(target.as_str(), "https://app.example/messages");

    let calls = env.calls().await;
    assert_eq!(calls[0], HostCall::CloseNotification(id));
    let opens: Vec<_> = calls
        .iter()
        .filter(|c| matches!(c, HostCall::OpenWindow { .. }))
        .collect();
    assert_eq!(
        opens,
        vec![&HostCall::OpenWindow {
            client,
            url: "https://app.example/messages".to_string(),
        }]
    );
}

#[tokio::test]
async fn click_ignores_foreign_windows() {
    let env = env();
    let worker = worker();
    env.open_page("https://elsewhere.example/", true).await;

    let outcome = click(&worker, &env, NotificationId(1), Some("5")).await;

    assert!(matches!(outcome, ClickOutcome::Opened { .. }));
    assert_eq!(env.pages().await.len(), 2);
}

#[tokio::test]
async fn click_picks_first_window_including_uncontrolled() {
    let env = env();
    let worker = worker();
    let old_tab = env.open_page("https://app.example/profile", false).await;
    env.open_page("https://app.example/chat/5", true).await;

    let outcome = click(&worker, &env, NotificationId(1), Some("5")).await;

    assert!(matches!(
        outcome,
        ClickOutcome::Focused { ref client, .. } if *client == old_tab
    ));
}

#[tokio::test]
async fn click_closes_notification_even_when_navigation_fails() {
    let env = env();
    let worker = worker();

    let shown = push(&worker, &env, Some(br#"{"conversationId":"3"}"#)).await;
    let PushOutcome::Shown { id, .. } = shown else {
        panic!("expected a notification");
    };
    env.open_page("https://app.example/", true).await;
    env.fail_navigation(true);

    let event = WorkerEvent::NotificationClick(NotificationClick {
        id,
        data: NotificationData {
            conversation_id: Some("3".into()),
        },
    });
    let err = worker.dispatch(event, &env).await.unwrap_err();

    assert!(matches!(err, ServiceWorkerError::Client(_)));
    assert!(env.notifications().await.is_empty());
    assert!(env.calls().await.contains(&HostCall::CloseNotification(id)));
    assert!(env.focused_page().await.is_none());
}

// ==================== Concurrency ====================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_events_settle_independently() {
    let env = Arc::new(env());
    let worker = Arc::new(worker());
    env.open_page("https://app.example/messages", true).await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let env = Arc::clone(&env);
        let worker = Arc::clone(&worker);
        handles.push(tokio::spawn(async move {
            let payload = format!(r#"{{"title":"m{}","conversationId":"{}"}}"#, i, i);
            worker
                .dispatch(WorkerEvent::Push(Some(payload.into_bytes())), env.as_ref())
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    worker.lifetime().wait_idle().await;
    assert_eq!(env.notifications().await.len(), 8);
}
