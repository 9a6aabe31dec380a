use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use breedquiz::api::router;
use breedquiz::queue::{QueueConfig, QueueError, RoundQueue};
use breedquiz::source::FakeSource;
use breedquiz::state::AppState;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// End-to-end flow a front end goes through: fetch rounds, answer, report, reset
#[tokio::test]
async fn test_full_quiz_flow() {
    let queue = RoundQueue::new(Arc::new(FakeSource::new()), QueueConfig::default())
        .await
        .expect("Queue should initialize");
    let app = router(Arc::new(AppState::new(queue)));

    // 1. Status after startup
    let response = app
        .clone()
        .oneshot(Request::get("/api/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["buffered"], 30);
    assert_eq!(status["source"], "fake");
    assert!(status["known_breeds"].as_u64().unwrap() > 0);

    // 2. Fetch a batch of rounds
    let response = app
        .clone()
        .oneshot(
            Request::get("/api/rounds?count=3")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let rounds = body["rounds"].as_array().expect("rounds array");
    assert_eq!(rounds.len(), 3);

    // 3. Answer every round by picking the first choice and report the result
    let mut wins = 0;
    for round in rounds {
        let choices = round["choices"].as_array().unwrap();
        assert_eq!(choices.len(), 2);
        assert!(choices.contains(&round["correct_name"]));
        assert!(round["image"]["url"].as_str().unwrap().starts_with("https://"));

        let won = choices[0] == round["correct_name"];
        if won {
            wins += 1;
        }

        let response = app
            .clone()
            .oneshot(
                Request::post("/api/progress")
                    .header("content-type", "application/json")
                    .body(Body::from(format!(r#"{{"won":{}}}"#, won)))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(Request::get("/api/progress").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let progress = body_json(response).await;
    assert_eq!(progress["played"], 3);
    assert_eq!(progress["won"], wins);

    // 4. Reset the queue; it comes back full
    let response = app
        .clone()
        .oneshot(Request::post("/api/reset").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = body_json(response).await;
    assert_eq!(status["buffered"], 30);

    // 5. Reset progress
    let response = app
        .clone()
        .oneshot(Request::delete("/api/progress").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let progress = body_json(response).await;
    assert_eq!(progress["played"], 0);
}

#[tokio::test]
async fn test_rounds_endpoint_reports_short_supply() {
    let source = Arc::new(FakeSource::new().with_broken_images());
    let queue = RoundQueue::new(source, QueueConfig::default()).await.unwrap();
    let app = router(Arc::new(AppState::new(queue)));

    let response = app
        .oneshot(Request::get("/api/rounds").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = body_json(response).await;
    assert_eq!(body["requested"], 10);
    assert_eq!(body["available"], 0);
    assert!(body["rounds"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_rounds_endpoint_rejects_huge_count() {
    let queue = RoundQueue::new(Arc::new(FakeSource::new()), QueueConfig::default())
        .await
        .unwrap();
    let app = router(Arc::new(AppState::new(queue)));

    let response = app
        .oneshot(
            Request::get("/api/rounds?count=1000")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_broken_image_source_fails_instead_of_hanging() {
    let source = Arc::new(
        FakeSource::new()
            .with_broken_images()
            .with_random_delay(1..20),
    );
    let queue = RoundQueue::new(source, QueueConfig::default()).await.unwrap();

    let result = tokio::time::timeout(Duration::from_secs(10), queue.next_rounds(10))
        .await
        .expect("next_rounds should not hang");

    match result {
        Err(QueueError::InsufficientSupply {
            requested,
            available,
            partial,
        }) => {
            assert_eq!(requested, 10);
            assert_eq!(available, 0);
            assert!(partial.is_empty());
        }
        other => panic!("Expected InsufficientSupply, got {:?}", other.map(|r| r.len())),
    }
}

#[tokio::test]
async fn test_recovers_after_partial_failures() {
    // Fewer failures than the budget: the batch keeps going and fills the rest
    let source = Arc::new(FakeSource::new().with_failing_image_fetches(3));
    let queue = RoundQueue::new(source.clone(), QueueConfig::default())
        .await
        .unwrap();

    assert_eq!(queue.buffered().await, 27);
    assert_eq!(source.image_fetches_started(), 30);

    queue.reset().await;
    assert_eq!(queue.buffered().await, 30);
}

/// Many consumers draining the queue while background refills run
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_consumers_never_share_rounds() {
    let source = Arc::new(FakeSource::new().with_random_delay(1..5));
    let config = QueueConfig {
        min_buffer: 10,
        max_buffer: 20,
        ..QueueConfig::default()
    };
    let queue = RoundQueue::new(source.clone(), config).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let queue = queue.clone();
        handles.push(tokio::spawn(async move {
            let mut ids = Vec::new();
            for _ in 0..10 {
                match queue.next_rounds(3).await {
                    Ok(rounds) => ids.extend(rounds.into_iter().map(|r| r.id)),
                    Err(QueueError::InsufficientSupply { partial, .. }) => {
                        ids.extend(partial.into_iter().map(|r| r.id))
                    }
                    Err(e) => panic!("Unexpected error: {}", e),
                }
            }
            ids
        }));
    }

    let results: Vec<_> = futures::future::join_all(handles).await;
    let mut all_ids = Vec::new();
    for result in results {
        all_ids.extend(result.expect("consumer task panicked"));
    }

    let unique: HashSet<&String> = all_ids.iter().collect();
    assert_eq!(unique.len(), all_ids.len(), "A round was handed out twice");

    // Every handed out or still buffered round came from a completed image fetch.
    // Buffer first: a fetch always completes before its round is pushed.
    let buffered = queue.buffered().await;
    let enqueued = source.image_fetches_completed();
    assert!(all_ids.len() + buffered <= enqueued);
    assert!(!all_ids.is_empty());
}
