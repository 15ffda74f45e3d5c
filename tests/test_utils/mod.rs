//! Test utilities for integration tests
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::{Router, body::Body};

use timetable::ai::{ActionExtractor, BoxedModel, GenerationRequest, GenerativeModel};
use timetable::api::AppState;
use timetable::api::app;
use timetable::core::AppConfig;

/// Creates a test application router that talks to a fake Gemini API
/// at `gemini_url`. Pass `None` as the key to simulate a missing
/// credential.
pub fn test_app(gemini_url: &str, api_key: Option<&str>) -> Router {
    test_app_with(AppConfig {
        gemini_api_key: api_key.map(String::from),
        gemini_api_hostname: gemini_url.to_string(),
        ..AppConfig::default()
    })
}

pub fn test_app_with(app_config: AppConfig) -> Router {
    let app_state = AppState::new(app_config);
    app(Arc::new(app_state))
}

/// Creates a test application router backed by `model` instead of
/// the Gemini client
pub fn test_app_with_model(
    app_config: AppConfig,
    model: BoxedModel,
    timeout: Option<Duration>,
) -> Router {
    let mut builder = ActionExtractor::builder(app_config.timezone)
        .supports_image(app_config.supports_image)
        .model(model);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    let app_state = AppState::with_extractor(app_config, builder.build());
    app(Arc::new(app_state))
}

/// A model that replies with canned text after an optional delay and
/// keeps every request it was sent
pub struct RecordingModel {
    reply: String,
    delay: Option<Duration>,
    pub requests: Mutex<Vec<GenerationRequest>>,
}

impl RecordingModel {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl GenerativeModel for RecordingModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, anyhow::Error> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> String {
        String::from("recording-model")
    }
}

/// Body of a Gemini reply whose text is `text`
pub fn gemini_reply(text: &str) -> String {
    serde_json::json!({
        "candidates": [{
            "content": {
                "parts": [{ "text": text }],
                "role": "model"
            },
            "finishReason": "STOP"
        }]
    })
    .to_string()
}

pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read body");
    String::from_utf8(bytes.to_vec()).expect("Body is not UTF-8")
}
