use std::sync::Arc;
use std::time::Duration;

use anyhow::Error;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;

use super::actions::{ActionBatch, ResponseValidator};
use super::error::ExtractionError;
use super::models::{GenerationRequest, UserImage};
use super::prompt::PromptBuilder;
use crate::core::AppConfig;
use crate::gemini::GeminiModel;

/// A generative model that turns a prompt into text. Implementations
/// own their credentials and transport, failures are reported as-is
/// and classified by the extractor.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, Error>;
    fn model_name(&self) -> String;
}

pub type BoxedModel = Arc<dyn GenerativeModel + 'static>;

/// Turns free-form scheduling requests into calendar actions.
///
/// Each call to `extract` is a single attempt against the model with
/// no state kept between calls. Use `ActionExtractor::builder()` or
/// `ActionExtractor::from_config` to construct one.
pub struct ActionExtractor {
    prompts: PromptBuilder,
    validator: ResponseValidator,
    model: Option<BoxedModel>,
    timeout: Option<Duration>,
}

impl ActionExtractor {
    pub fn builder(timezone: Tz) -> ExtractorBuilder {
        ExtractorBuilder::new(timezone)
    }

    /// Uses Gemini when an API key is configured. Without one the
    /// extractor still builds and every extraction fails with a
    /// configuration error.
    pub fn from_config(config: &AppConfig) -> Self {
        let model = config.gemini_api_key.as_ref().map(|api_key| {
            Arc::new(GeminiModel::new(
                &config.gemini_api_hostname,
                api_key,
                &config.gemini_model,
            )) as BoxedModel
        });

        let mut builder = Self::builder(config.timezone).supports_image(config.supports_image);
        if let Some(model) = model {
            builder = builder.model(model);
        }
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    pub fn supports_image(&self) -> bool {
        self.prompts.supports_image()
    }

    pub async fn extract<T: TimeZone>(
        &self,
        text: &str,
        image: Option<UserImage>,
        now: DateTime<T>,
    ) -> Result<ActionBatch, ExtractionError> {
        let model = self.model.as_ref().ok_or_else(|| {
            ExtractionError::Configuration(
                "API key not configured, set GEMINI_API_KEY or GOOGLE_API_KEY".to_string(),
            )
        })?;

        let image = match image {
            Some(_) if !self.supports_image() => {
                tracing::warn!("Ignoring image, {} is configured for text only", model.model_name());
                None
            }
            image => image,
        };

        let request = self.prompts.build(&now, text, image.as_ref());

        tracing::debug!(
            "Requesting calendar actions from {} (image: {})",
            model.model_name(),
            image.is_some()
        );

        let call = model.generate(&request);
        let reply = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                ExtractionError::CollaboratorUnavailable(format!(
                    "No response from {} within {:?}",
                    model.model_name(),
                    limit
                ))
            })?,
            None => call.await,
        };
        let raw = reply.map_err(|e| ExtractionError::CollaboratorUnavailable(format!("{:#}", e)))?;

        tracing::trace!("Model reply: {}", raw);

        let batch = self.validator.validate(&raw)?;
        tracing::info!("Extracted {} calendar action(s)", batch.actions.len());

        Ok(batch)
    }
}

pub struct ExtractorBuilder {
    timezone: Tz,
    supports_image: bool,
    model: Option<BoxedModel>,
    timeout: Option<Duration>,
}

impl ExtractorBuilder {
    pub fn new(timezone: Tz) -> Self {
        Self {
            timezone,
            supports_image: true,
            model: None,
            timeout: None,
        }
    }

    pub fn supports_image(mut self, supports_image: bool) -> Self {
        self.supports_image = supports_image;
        self
    }

    pub fn model(mut self, model: BoxedModel) -> Self {
        self.model = Some(model);
        self
    }

    /// Bound the time spent waiting on the model. There is no limit
    /// by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> ActionExtractor {
        ActionExtractor {
            prompts: PromptBuilder::new(self.timezone, self.supports_image),
            validator: ResponseValidator::new(self.timezone),
            model: self.model,
            timeout: self.timeout,
        }
    }
}
