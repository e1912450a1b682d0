mod common;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use mongodb::bson::doc;
use serde_json::json;
use serial_test::serial;
use uuid::Uuid;

use common::{SEED_QUIZ_ID, SEED_QUIZ_SUBJECT};

async fn progress_for(
    app: &common::TestApp,
    token: &str,
    subject: &str,
) -> Option<serde_json::Value> {
    let (status, body) = app.get_json("/api/v1/progress", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    body["progress"]
        .as_array()
        .unwrap()
        .iter()
        .find(|p| p["subject"] == subject)
        .cloned()
}

#[tokio::test]
async fn test_attempt_creates_progress() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, body) = app
        .post_json(
            "/api/v1/quiz-attempts",
            Some(&token),
            json!({ "quiz_id": SEED_QUIZ_ID, "score": 80, "answers": { "0": "Mitochondria" } }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["quiz_attempt"]["score"], 80);
    assert_eq!(body["quiz_attempt"]["quiz_id"], SEED_QUIZ_ID);

    let progress = progress_for(&app, &token, SEED_QUIZ_SUBJECT).await.unwrap();
    assert_eq!(progress["score"], 80);
}

#[tokio::test]
async fn test_progress_score_is_monotonic_and_timestamp_always_advances() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, _) = app
        .post_json(
            "/api/v1/quiz-attempts",
            Some(&token),
            json!({ "quiz_id": SEED_QUIZ_ID, "score": 90 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let first = progress_for(&app, &token, SEED_QUIZ_SUBJECT).await.unwrap();
    let first_studied: DateTime<Utc> =
        first["last_studied"].as_str().unwrap().parse().unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    // A lower score must not regress the best score, but must refresh the
    // last-studied timestamp.
    let (status, _) = app
        .post_json(
            "/api/v1/quiz-attempts",
            Some(&token),
            json!({ "quiz_id": SEED_QUIZ_ID, "score": 40 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let second = progress_for(&app, &token, SEED_QUIZ_SUBJECT).await.unwrap();
    let second_studied: DateTime<Utc> =
        second["last_studied"].as_str().unwrap().parse().unwrap();

    assert_eq!(second["score"], 90);
    assert!(second_studied > first_studied);
}

#[tokio::test]
async fn test_attempt_against_unknown_quiz_is_recorded_without_progress() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);
    let missing_quiz = format!("no-such-quiz-{}", Uuid::new_v4());

    let (status, body) = app
        .post_json(
            "/api/v1/quiz-attempts",
            Some(&token),
            json!({ "quiz_id": missing_quiz, "score": 75 }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    // The attempt row exists, the progress table is untouched
    let attempts = app
        .mongo
        .collection::<mongodb::bson::Document>("quiz_attempts")
        .count_documents(doc! { "user_id": &user_id })
        .await
        .unwrap();
    assert_eq!(attempts, 1);

    let (status, body) = app.get_json("/api/v1/progress", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["progress"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_attempt_log_is_append_only() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    for score in [55, 95, 40] {
        let (status, _) = app
            .post_json(
                "/api/v1/quiz-attempts",
                Some(&token),
                json!({ "quiz_id": SEED_QUIZ_ID, "score": score }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // One row per submission, and aggregation did not rewrite any of them
    let attempts_collection = app
        .mongo
        .collection::<mongodb::bson::Document>("quiz_attempts");
    let count = attempts_collection
        .count_documents(doc! { "user_id": &user_id })
        .await
        .unwrap();
    assert_eq!(count, 3);

    use futures::TryStreamExt;
    let attempts: Vec<mongodb::bson::Document> = attempts_collection
        .find(doc! { "user_id": &user_id })
        .await
        .unwrap()
        .try_collect()
        .await
        .unwrap();
    let mut scores: Vec<i32> = attempts
        .iter()
        .map(|a| a.get_i32("score").unwrap())
        .collect();
    scores.sort_unstable();
    assert_eq!(scores, vec![40, 55, 95]);

    let progress = progress_for(&app, &token, SEED_QUIZ_SUBJECT).await.unwrap();
    assert_eq!(progress["score"], 95);
}

#[tokio::test]
#[serial]
async fn test_concurrent_attempts_keep_highest_score() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    // Two concurrent submissions for a fresh (user, subject) pair; the upsert
    // must not lose the higher score whichever write lands last.
    let low = app.post_json(
        "/api/v1/quiz-attempts",
        Some(&token),
        json!({ "quiz_id": SEED_QUIZ_ID, "score": 70 }),
    );
    let high = app.post_json(
        "/api/v1/quiz-attempts",
        Some(&token),
        json!({ "quiz_id": SEED_QUIZ_ID, "score": 85 }),
    );

    let ((low_status, _), (high_status, _)) = tokio::join!(low, high);
    assert_eq!(low_status, StatusCode::CREATED);
    assert_eq!(high_status, StatusCode::CREATED);

    let progress = progress_for(&app, &token, SEED_QUIZ_SUBJECT).await.unwrap();
    assert_eq!(progress["score"], 85);
}

#[tokio::test]
async fn test_score_out_of_range_is_rejected_without_side_effects() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, body) = app
        .post_json(
            "/api/v1/quiz-attempts",
            Some(&token),
            json!({ "quiz_id": SEED_QUIZ_ID, "score": 150 }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("score"));

    let attempts = app
        .mongo
        .collection::<mongodb::bson::Document>("quiz_attempts")
        .count_documents(doc! { "user_id": &user_id })
        .await
        .unwrap();
    assert_eq!(attempts, 0);
}

#[tokio::test]
async fn test_missing_quiz_id_is_rejected() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, body) = app
        .post_json("/api/v1/quiz-attempts", Some(&token), json!({ "score": 50 }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_unauthenticated_attempt_is_rejected() {
    let app = common::create_test_app().await;

    let (status, _) = app
        .post_json(
            "/api/v1/quiz-attempts",
            None,
            json!({ "quiz_id": SEED_QUIZ_ID, "score": 50 }),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
