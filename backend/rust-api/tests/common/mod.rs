use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mongodb::bson::doc;
use mongodb::Database;
use std::sync::Arc;
use tower::ServiceExt;

use studyhelper_api::{
    config::Config,
    create_router,
    middlewares::auth::{JwtClaims, JwtService},
    services::AppState,
};

pub const SEED_QUIZ_ID: &str = "test-quiz";
pub const SEED_QUIZ_SUBJECT: &str = "Biology";

pub struct TestApp {
    pub router: Router,
    pub mongo: Database,
    jwt_secret: String,
}

impl TestApp {
    /// Mint a bearer token for an arbitrary test user. Tests use unique user
    /// ids so their progress records cannot collide.
    pub fn token_for(&self, user_id: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = JwtClaims {
            sub: user_id.to_string(),
            email: format!("{}@example.com", user_id),
            name: "Test Student".to_string(),
            exp: (now + 3600) as usize,
            iat: now as usize,
        };
        JwtService::new(&self.jwt_secret)
            .generate_token(claims)
            .expect("Failed to mint test token")
    }

    pub async fn post_json(
        &self,
        uri: &str,
        token: Option<&str>,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let response = self
            .router
            .clone()
            .oneshot(
                builder
                    .body(Body::from(serde_json::to_string(&body).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    pub async fn get_json(
        &self,
        uri: &str,
        token: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let response = self
            .router
            .clone()
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }
}

pub async fn create_test_app() -> TestApp {
    // Initialize tracing for tests
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    // Load test environment from .env.test
    dotenvy::from_filename(".env.test").ok();

    // Rate limiting would interfere with parallel test runs
    std::env::set_var("RATE_LIMIT_DISABLED", "1");

    let config = Config::load().expect("Failed to load test configuration");
    let jwt_secret = config.jwt_secret.clone();

    let mongo_client = mongodb::Client::with_uri_str(&config.mongo_uri)
        .await
        .expect("Failed to connect to test MongoDB");

    let redis_client =
        redis::Client::open(config.redis_uri.clone()).expect("Failed to create test Redis client");

    let mongo = mongo_client.database(&config.mongo_database);

    let app_state = Arc::new(
        AppState::new(config, mongo_client, redis_client)
            .await
            .expect("Failed to initialize test app state"),
    );

    seed_test_data(&mongo).await;

    TestApp {
        router: create_router(app_state),
        mongo,
        jwt_secret,
    }
}

async fn seed_test_data(mongo: &Database) {
    let quizzes = mongo.collection::<mongodb::bson::Document>("quizzes");

    let quiz_exists = quizzes
        .find_one(doc! { "_id": SEED_QUIZ_ID })
        .await
        .unwrap();

    if quiz_exists.is_none() {
        let result = quizzes
            .insert_one(doc! {
                "_id": SEED_QUIZ_ID,
                "user_id": "seed-user",
                "title": "Biology Quiz",
                "subject": SEED_QUIZ_SUBJECT,
                "questions": [
                    {
                        "question": "What is the powerhouse of the cell?",
                        "options": ["Nucleus", "Mitochondria", "Ribosome", "Golgi apparatus"],
                        "correct_answer": "Mitochondria",
                        "explanation": "Mitochondria produce most of the cell's ATP."
                    },
                    {
                        "question": "Which molecule carries genetic information?",
                        "options": ["DNA", "ATP", "Glucose", "Lipid"],
                        "correct_answer": "DNA",
                        "explanation": "DNA encodes the genetic instructions of the cell."
                    }
                ],
                "created_at": mongodb::bson::to_bson(&chrono::Utc::now()).unwrap()
            })
            .await;

        match result {
            Ok(_) => eprintln!("Test quiz seeded in MongoDB"),
            Err(e) => {
                // Ignore duplicate key error (race with parallel tests)
                if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(
                    ref we,
                )) = *e.kind
                {
                    if we.code == 11000 {
                        return;
                    }
                }
                panic!("Failed to seed test quiz: {:?}", e);
            }
        }
    }
}
