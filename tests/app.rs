use std::sync::Arc;
use std::time::Duration;

use quill::app::{self, FileRef, Resources, StoreItem};
use quill::platform::memory::{MemoryBucket, MemoryCollection, MemoryQueue, MemorySecret, MemoryTopic};
use quill::{AppConfig, ContentType, Fact, FactRecorder, Message, Method, Request, Response, Router, Status};

fn setup() -> (Arc<Resources>, Router) {
    let (res, _writer) = Resources::in_memory(&AppConfig::default());
    app::worker::subscribe(&res);
    let router = app::api(&res);
    (res, router)
}

fn json_request(method: Method, path: &str, body: serde_json::Value) -> Request {
    Request::new(method, path)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
}

async fn history(res: &Resources, router: &Router) -> Vec<Fact> {
    res.recorder.flush().await;
    let response = router.handle(Request::new(Method::Get, "/history")).await;
    assert_eq!(response.status(), Status::Ok);
    serde_json::from_slice(response.body()).unwrap()
}

fn json<T: serde::de::DeserializeOwned>(response: &Response) -> T {
    assert_eq!(response.header("content-type"), Some(ContentType::Json.as_str()));
    serde_json::from_slice(response.body()).unwrap()
}

#[tokio::test]
async fn queued_message_is_recorded_when_the_schedule_runs() {
    let (res, router) = setup();
    let sent = router
        .handle(json_request(
            Method::Post,
            "/send",
            serde_json::json!({"messageType": "queue", "id": "t1", "payloadType": "None", "payload": "hello"}),
        ))
        .await;
    assert_eq!(sent.status(), Status::Ok);
    assert!(sent.body_text().starts_with("Run action : "));

    let job = app::worker::schedule(&res, Duration::from_secs(60), 10);
    assert!(job.fire().await.is_completed());

    let facts = history(&res, &router).await;
    let done = facts.iter().find(|f| f.action == "task complete").expect("task complete fact");
    assert_eq!(done.source, "work");
    let msg: Message = serde_json::from_str(&done.data).unwrap();
    assert_eq!(msg.id, "t1");
    assert_eq!(msg.payload, "hello");
}

#[tokio::test]
async fn published_message_is_recorded_by_the_subscriber() {
    let (res, router) = setup();
    let sent = router
        .handle(json_request(
            Method::Post,
            "/send",
            serde_json::json!({"messageType": "Topic", "id": "t2", "payloadType": "None"}),
        ))
        .await;
    assert_eq!(sent.status(), Status::Ok);

    let mut received = None;
    for _ in 0..50 {
        let facts = history(&res, &router).await;
        if let Some(fact) = facts.into_iter().find(|f| f.action == "received event") {
            received = Some(fact);
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let fact = received.expect("received event fact");
    assert_eq!(fact.source, "ping");
    let msg: Message = serde_json::from_str(&fact.data).unwrap();
    assert_eq!(msg.id, "t2");
}

#[tokio::test]
async fn negative_delay_is_accepted() {
    let (_res, router) = setup();
    for kind in ["queue", "topic"] {
        let sent = router
            .handle(json_request(
                Method::Post,
                "/send",
                serde_json::json!({"messageType": kind, "id": "t9", "delay": -1, "payloadType": "None", "payload": "x"}),
            ))
            .await;
        assert_eq!(sent.status(), Status::Ok, "{kind}: {}", sent.body_text());
    }
}

#[tokio::test]
async fn unknown_message_type_is_rejected() {
    let (_res, router) = setup();
    let res = router
        .handle(json_request(Method::Post, "/send", serde_json::json!({"messageType": "fax"})))
        .await;
    assert_eq!(res.status(), Status::BadRequest);
    assert_eq!(res.body_text(), "error sending:unknown message type fax");

    let res = router.handle(Request::new(Method::Post, "/send").with_body("not json")).await;
    assert_eq!(res.status(), Status::BadRequest);
    assert_eq!(res.body_text(), "error decoding json body");
}

#[tokio::test]
async fn deleting_a_missing_document_is_404() {
    let (_res, router) = setup();
    for path in ["/store/nope", "/history/nope"] {
        let res = router.handle(Request::new(Method::Delete, path)).await;
        assert_eq!(res.status(), Status::NotFound, "{path}");
        assert_eq!(res.body_text(), "error deleting document nope");
    }
}

#[tokio::test]
async fn store_crud_round_trip() {
    let (res, router) = setup();

    let created = router
        .handle(json_request(Method::Post, "/store", serde_json::json!({"id": "s1", "data": "first"})))
        .await;
    assert_eq!(created.status(), Status::Ok);
    assert_eq!(created.body_text(), "Created store with ID: s1");

    let fetched: StoreItem = json(&router.handle(Request::new(Method::Get, "/store/s1")).await);
    assert_eq!(fetched.data, "first");
    assert!(!fetched.date_stored.is_empty());

    let updated = router
        .handle(json_request(Method::Put, "/store/s1", serde_json::json!({"id": "other", "data": "second"})))
        .await;
    assert_eq!(updated.body_text(), "Updated store with ID: s1");

    let listed: Vec<StoreItem> = json(&router.handle(Request::new(Method::Get, "/store")).await);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, "s1");
    assert_eq!(listed[0].data, "second");
    assert_eq!(listed[0].date_stored, fetched.date_stored);

    let deleted = router.handle(Request::new(Method::Delete, "/store/s1")).await;
    assert_eq!(deleted.status(), Status::NoContent);
    let missing = router.handle(Request::new(Method::Get, "/store/s1")).await;
    assert_eq!(missing.status(), Status::NotFound);
    assert_eq!(missing.body_text(), "error retrieving document s1");

    let actions: Vec<String> = history(&res, &router).await.into_iter().map(|f| f.action).collect();
    for action in ["create", "update", "list", "delete"] {
        assert!(actions.iter().any(|a| a == action), "missing {action} in {actions:?}");
    }
}

#[tokio::test]
async fn store_generates_ids_and_rejects_bad_bodies() {
    let (_res, router) = setup();
    let created = router
        .handle(json_request(Method::Post, "/store", serde_json::json!({"data": "x"})))
        .await;
    let id = created.body_text().trim_start_matches("Created store with ID: ").to_owned();
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let bad = router.handle(Request::new(Method::Post, "/store").with_body("{")).await;
    assert_eq!(bad.status(), Status::BadRequest);

    let absent = router
        .handle(json_request(Method::Put, "/store/ghost", serde_json::json!({"data": "x"})))
        .await;
    assert_eq!(absent.status(), Status::NotFound);
}

#[tokio::test]
async fn safe_returns_latest_version() {
    let (_res, router) = setup();
    let empty = router.handle(Request::new(Method::Get, "/safe")).await;
    assert_eq!(empty.status(), Status::BadRequest);

    for value in ["one", "two"] {
        let put = router.handle(Request::new(Method::Post, "/safe").with_body(value)).await;
        assert_eq!(put.status(), Status::Ok);
    }
    let latest = router.handle(Request::new(Method::Get, "/safe")).await;
    assert_eq!(latest.body(), b"two");
    assert_eq!(latest.header("content-type"), Some(ContentType::Text.as_str()));
}

#[tokio::test]
async fn files_hand_out_signed_urls() {
    let history = Arc::new(MemoryCollection::new("history"));
    let bucket = Arc::new(MemoryBucket::new("files"));
    let (recorder, _writer) = FactRecorder::spawn(history.clone(), 16);
    let res = Arc::new(Resources {
        store: Arc::new(MemoryCollection::new("store")),
        history,
        queue: Arc::new(MemoryQueue::new("work")),
        topic: Arc::new(MemoryTopic::new("ping")),
        safe: Arc::new(MemorySecret::new("safe")),
        bucket: bucket.clone(),
        recorder,
        url_expiry: Duration::from_secs(60),
    });
    let router = app::api(&res);

    let upload: FileRef = json(
        &router
            .handle(json_request(Method::Post, "/file", serde_json::json!({"name": "a.txt"})))
            .await,
    );
    assert_eq!(upload.url, "memory://files/a.txt?op=write&expires=60");

    let missing = router.handle(Request::new(Method::Get, "/file/a.txt")).await;
    assert_eq!(missing.status(), Status::BadRequest);
    assert!(missing.body_text().starts_with("error Getting:"));

    bucket.write("a.txt", b"contents".to_vec()).await;
    let download: FileRef = json(&router.handle(Request::new(Method::Get, "/file/a.txt")).await);
    assert_eq!(download.url, "memory://files/a.txt?op=read&expires=60");

    let listed: Vec<FileRef> = json(&router.handle(Request::new(Method::Get, "/file")).await);
    assert_eq!(listed, [download]);

    let bad = router.handle(Request::new(Method::Post, "/file").with_body("[")).await;
    assert!(bad.body_text().starts_with("error un-marshalling:"));
}

#[tokio::test]
async fn every_response_carries_a_request_id() {
    let (_res, router) = setup();
    let res = router
        .handle(Request::new(Method::Get, "/healthz").with_header("X-Request-Id", "req-7"))
        .await;
    assert_eq!(res.body_text(), "ok");
    assert_eq!(res.header("x-request-id"), Some("req-7"));

    let res = router.handle(Request::new(Method::Delete, "/store/nope")).await;
    assert!(res.header("x-request-id").is_some());

    let res = router
        .handle(Request::new(Method::Get, "/nope").with_header("x-request-id", "r-9"))
        .await;
    assert_eq!(res.status(), Status::NotFound);
    assert_eq!(res.header("x-request-id"), Some("r-9"));
}
