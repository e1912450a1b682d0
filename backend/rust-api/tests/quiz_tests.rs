mod common;

use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

fn assert_well_formed_questions(quiz: &serde_json::Value) {
    let questions = quiz["questions"].as_array().unwrap();
    assert!(!questions.is_empty());
    for q in questions {
        let options = q["options"].as_array().unwrap();
        assert_eq!(options.len(), 4);
        let correct = q["correct_answer"].as_str().unwrap();
        assert!(
            options.iter().any(|o| o.as_str() == Some(correct)),
            "correct answer {:?} not among options",
            correct
        );
    }
}

#[tokio::test]
async fn test_generate_quiz_without_materials_serves_demo_quiz() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, body) = app
        .post_json(
            "/api/v1/quizzes/generate",
            Some(&token),
            json!({ "subject": "Chemistry", "num_questions": 5 }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);

    let quiz = &body["quiz"];
    assert_eq!(quiz["subject"], "Chemistry");
    assert_eq!(quiz["title"], "Chemistry Quiz");
    // Fresh accounts always get the static demo quiz, which has 2 questions
    assert_eq!(quiz["questions"].as_array().unwrap().len(), 2);
    assert_well_formed_questions(quiz);
}

#[tokio::test]
async fn test_generate_quiz_defaults_subject_and_count() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, body) = app
        .post_json("/api/v1/quizzes/generate", Some(&token), json!({}))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["quiz"]["subject"], "Biology");
}

#[tokio::test]
async fn test_generate_quiz_from_uploaded_materials() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, _) = app
        .post_json(
            "/api/v1/materials",
            Some(&token),
            json!({
                "title": "Cell Biology Notes",
                "content": "The mitochondria is the powerhouse of the cell.",
                "subject": "Biology",
                "type": "notes"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app
        .post_json(
            "/api/v1/quizzes/generate",
            Some(&token),
            json!({ "subject": "Biology", "num_questions": 3 }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    let quiz = &body["quiz"];
    assert_eq!(quiz["subject"], "Biology");
    let question_count = quiz["questions"].as_array().unwrap().len();
    assert!((1..=3).contains(&question_count));
    assert_well_formed_questions(quiz);
}

#[tokio::test]
async fn test_create_quiz_with_valid_questions() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, body) = app
        .post_json(
            "/api/v1/quizzes",
            Some(&token),
            json!({
                "title": "Handmade Quiz",
                "subject": "History",
                "questions": [{
                    "question": "In what year did WW2 end?",
                    "options": ["1943", "1944", "1945", "1946"],
                    "correct_answer": "1945",
                    "explanation": "VJ Day was in 1945."
                }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["quiz"]["title"], "Handmade Quiz");
    assert_well_formed_questions(&body["quiz"]);
}

#[tokio::test]
async fn test_create_quiz_rejects_wrong_option_count() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, body) = app
        .post_json(
            "/api/v1/quizzes",
            Some(&token),
            json!({
                "title": "Bad Quiz",
                "subject": "History",
                "questions": [{
                    "question": "Too few options?",
                    "options": ["Yes", "No"],
                    "correct_answer": "Yes"
                }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_create_quiz_rejects_answer_not_among_options() {
    let app = common::create_test_app().await;
    let user_id = format!("test-user-{}", Uuid::new_v4());
    let token = app.token_for(&user_id);

    let (status, body) = app
        .post_json(
            "/api/v1/quizzes",
            Some(&token),
            json!({
                "title": "Bad Quiz",
                "subject": "History",
                "questions": [{
                    "question": "Which option is correct?",
                    "options": ["A", "B", "C", "D"],
                    "correct_answer": "E"
                }]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn test_quizzes_are_scoped_to_their_owner() {
    let app = common::create_test_app().await;
    let owner = format!("test-user-{}", Uuid::new_v4());
    let stranger = format!("test-user-{}", Uuid::new_v4());
    let owner_token = app.token_for(&owner);
    let stranger_token = app.token_for(&stranger);

    let (status, _) = app
        .post_json(
            "/api/v1/quizzes/generate",
            Some(&owner_token),
            json!({ "subject": "Physics" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.get_json("/api/v1/quizzes", Some(&owner_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["quizzes"].as_array().unwrap().len(), 1);

    let (status, body) = app.get_json("/api/v1/quizzes", Some(&stranger_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["quizzes"].as_array().unwrap().is_empty());
}
