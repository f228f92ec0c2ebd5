use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{GenerateCourseRequest, GeneratedCourse};

/// Produces structured course content from a learner prompt.
#[async_trait]
pub trait CourseGenerator: Send + Sync {
    async fn generate(
        &self,
        request: &GenerateCourseRequest,
        drive_token: Option<&str>,
    ) -> Result<GeneratedCourse, AppError>;
}

#[derive(Serialize)]
struct GenerateCoursePayload<'a> {
    prompt: &'a str,
    token_github: Option<&'a str>,
    token_drive: Option<&'a str>,
    files_url: Option<&'a str>,
}

pub struct HttpCourseGenerator {
    client: Client,
    base_url: String,
}

impl HttpCourseGenerator {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Upstream(format!("Failed to build http client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl CourseGenerator for HttpCourseGenerator {
    async fn generate(
        &self,
        request: &GenerateCourseRequest,
        drive_token: Option<&str>,
    ) -> Result<GeneratedCourse, AppError> {
        let url = format!("{}/course/generate", self.base_url.trim_end_matches('/'));
        let payload = GenerateCoursePayload {
            prompt: &request.prompt,
            token_github: request.token_github.as_deref(),
            token_drive: drive_token,
            files_url: request.files_url.as_deref(),
        };

        tracing::info!(%url, has_drive_token = drive_token.is_some(), "calling course generator");

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Upstream("course generator timed out".to_string())
                } else {
                    AppError::Upstream(format!("course generator request failed: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("course generator error {}: {}", status, body)));
        }

        response
            .json::<GeneratedCourse>()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse generated course: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::{Json, Router, http::StatusCode, routing::post};
    use serde_json::{Value, json};

    async fn generate_endpoint(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if body["prompt"] == "fail" {
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "detail": "boom" })));
        }
        (
            StatusCode::OK,
            Json(json!({
                "title": "Rust Basics",
                "description": body["token_drive"],
                "learning_objectives": ["ownership"],
                "modules": [{
                    "title": "Intro",
                    "index": 0,
                    "lessons": [{ "title": "Hello", "content": "fn main() {}", "index": 0 }]
                }]
            })),
        )
    }

    async fn spawn_generator() -> String {
        let app = Router::new().route("/course/generate", post(generate_endpoint));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/", addr)
    }

    fn request(prompt: &str) -> GenerateCourseRequest {
        GenerateCourseRequest {
            prompt: prompt.to_string(),
            token_github: None,
            files_url: None,
        }
    }

    #[tokio::test]
    async fn test_generate_forwards_drive_token() {
        let base = spawn_generator().await;
        let generator = HttpCourseGenerator::new(base, Duration::from_secs(5)).unwrap();

        let course = generator.generate(&request("rust"), Some("drive-token")).await.unwrap();
        assert_eq!(course.title, "Rust Basics");
        assert_eq!(course.description.as_deref(), Some("drive-token"));
        assert_eq!(course.modules.len(), 1);
        assert_eq!(course.modules[0].lessons[0].title, "Hello");
        assert!(course.modules[0].quizzes.is_empty());
    }

    #[tokio::test]
    async fn test_generator_failure_is_upstream_error() {
        let base = spawn_generator().await;
        let generator = HttpCourseGenerator::new(base, Duration::from_secs(5)).unwrap();

        let err = generator.generate(&request("fail"), None).await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }
}
