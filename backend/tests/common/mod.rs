use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use tara_backend::api::router;
use tara_backend::config::Config;
use tara_backend::db::{self, repository, tokens};
use tara_backend::error::AppError;
use tara_backend::models::{
    Course, GenerateCourseRequest, GeneratedCourse, GeneratedLesson, GeneratedModule, GeneratedQuiz,
    OAuthToken, Provider, TokenResponse,
};
use tara_backend::oauth::{ExchangeError, TokenExchange};
use tara_backend::services::CourseGenerator;
use tara_backend::state::AppState;

#[allow(dead_code)]
pub const USER_A: &str = "6f1c2d1e-8a4b-4c55-9a57-2b1f4f3f0a01";
#[allow(dead_code)]
pub const USER_B: &str = "0b9e7c3a-1d2f-4e6a-8b7c-9d0e1f2a3b4c";

pub async fn test_db() -> SqlitePool {
    let pool = db::connect_in_memory()
        .await
        .expect("Failed to create test db");
    db::migrate(&pool).await.expect("Failed to run migrations");
    pool
}

/// Multi-connection database backed by a fresh file under the temp dir.
#[allow(dead_code)]
pub async fn file_db() -> (SqlitePool, std::path::PathBuf) {
    let path = std::env::temp_dir().join(format!("tara-test-{}.db", uuid::Uuid::new_v4()));
    let pool = db::connect(&format!("sqlite://{}?mode=rwc", path.display()))
        .await
        .expect("Failed to create file db");
    db::migrate(&pool).await.expect("Failed to run migrations");
    (pool, path)
}

/// Token endpoint stand-in that counts calls and can be slowed down.
pub struct StubExchange {
    pub calls: AtomicUsize,
    response: Option<TokenResponse>,
    delay: Duration,
}

#[allow(dead_code)]
impl StubExchange {
    pub fn succeeding(access_token: &str, expires_in: i64) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: Some(TokenResponse {
                access_token: access_token.to_string(),
                token_type: "Bearer".to_string(),
                expires_in: Some(expires_in),
                refresh_token: None,
                scope: None,
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            response: None,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn respond(&self) -> Result<TokenResponse, ExchangeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.response
            .clone()
            .ok_or_else(|| ExchangeError::Rejected("invalid_grant".to_string()))
    }
}

#[async_trait]
impl TokenExchange for StubExchange {
    async fn refresh(&self, _provider: Provider, _refresh_token: &str) -> Result<TokenResponse, ExchangeError> {
        self.respond().await
    }

    async fn exchange_code(&self, _provider: Provider, _code: &str) -> Result<TokenResponse, ExchangeError> {
        self.respond().await
    }
}

/// Returns a fixed course and remembers which drive token it was handed.
#[derive(Default)]
pub struct StubGenerator {
    pub seen_drive_token: Mutex<Option<Option<String>>>,
}

#[async_trait]
impl CourseGenerator for StubGenerator {
    async fn generate(
        &self,
        _request: &GenerateCourseRequest,
        drive_token: Option<&str>,
    ) -> Result<GeneratedCourse, AppError> {
        *self.seen_drive_token.lock().await = Some(drive_token.map(str::to_string));
        Ok(two_lesson_course())
    }
}

/// One module with two lessons and no quizzes.
#[allow(dead_code)]
pub fn two_lesson_course() -> GeneratedCourse {
    GeneratedCourse {
        title: "Rust Ownership".to_string(),
        description: Some("Borrowing and moves".to_string()),
        estimated_duration: Some(90),
        difficulty: Some("beginner".to_string()),
        learning_objectives: vec!["Explain moves".to_string()],
        source_from: vec![],
        modules: vec![GeneratedModule {
            title: "Basics".to_string(),
            index: 0,
            lessons: vec![
                GeneratedLesson {
                    title: "Moves".to_string(),
                    content: "let b = a;".to_string(),
                    index: 0,
                },
                GeneratedLesson {
                    title: "Borrows".to_string(),
                    content: "let r = &a;".to_string(),
                    index: 1,
                },
            ],
            quizzes: vec![],
        }],
    }
}

/// Two modules: one with a lesson and a quiz, one with nothing in it.
#[allow(dead_code)]
pub fn course_with_quiz_and_empty_module() -> GeneratedCourse {
    GeneratedCourse {
        title: "Async Rust".to_string(),
        description: None,
        estimated_duration: None,
        difficulty: None,
        learning_objectives: vec![],
        source_from: vec![],
        modules: vec![
            GeneratedModule {
                title: "Futures".to_string(),
                index: 0,
                lessons: vec![GeneratedLesson {
                    title: "Poll".to_string(),
                    content: "Future::poll".to_string(),
                    index: 0,
                }],
                quizzes: vec![GeneratedQuiz {
                    question: "What drives a future?".to_string(),
                    options: vec!["An executor".to_string(), "Magic".to_string()],
                    answer: Some("An executor".to_string()),
                }],
            },
            GeneratedModule {
                title: "Coming soon".to_string(),
                index: 1,
                lessons: vec![],
                quizzes: vec![],
            },
        ],
    }
}

#[allow(dead_code)]
pub async fn seed_course(db: &SqlitePool, user_id: &str, generated: &GeneratedCourse) -> Course {
    repository::insert_generated_course(db, user_id, generated)
        .await
        .expect("Failed to seed course")
}

#[allow(dead_code)]
pub async fn lesson_ids(db: &SqlitePool, course_id: &str) -> Vec<String> {
    let mut conn = db.acquire().await.unwrap();
    repository::fetch_lessons(&mut conn, course_id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.id)
        .collect()
}

#[allow(dead_code)]
pub async fn quiz_ids(db: &SqlitePool, course_id: &str) -> Vec<String> {
    let mut conn = db.acquire().await.unwrap();
    repository::fetch_quizzes(&mut conn, course_id)
        .await
        .unwrap()
        .into_iter()
        .map(|q| q.id)
        .collect()
}

#[allow(dead_code)]
pub async fn reload_course(db: &SqlitePool, course_id: &str, user_id: &str) -> Course {
    let mut conn = db.acquire().await.unwrap();
    repository::find_course(&mut conn, course_id, user_id)
        .await
        .unwrap()
        .expect("course should exist")
}

#[allow(dead_code)]
pub async fn store_token(
    db: &SqlitePool,
    user_id: &str,
    provider: Provider,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_at: Option<DateTime<Utc>>,
) -> OAuthToken {
    tokens::upsert_token(
        db,
        tokens::NewToken {
            user_id,
            provider,
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_at,
        },
    )
    .await
    .expect("Failed to store token")
}

/// Router over an in-memory database with stub collaborators.
#[allow(dead_code)]
pub async fn create_test_app(exchange: Arc<StubExchange>) -> (axum::Router, AppState) {
    let db = test_db().await;
    let state = AppState::new(db, Config::default(), exchange, Arc::new(StubGenerator::default()));
    (router(state.clone()), state)
}
