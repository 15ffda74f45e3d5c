use anyhow::Error;
use async_trait::async_trait;

use super::client::generate_content;
use crate::ai::GenerativeModel;
use crate::ai::models::GenerationRequest;

/// Gemini as the model behind the action extractor
#[derive(Clone, Debug)]
pub struct GeminiModel {
    client: reqwest::Client,
    api_hostname: String,
    api_key: String,
    model: String,
}

impl GeminiModel {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl GenerativeModel for GeminiModel {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, Error> {
        generate_content(
            &self.client,
            &self.api_hostname,
            &self.api_key,
            &self.model,
            request,
        )
        .await
    }

    fn model_name(&self) -> String {
        self.model.clone()
    }
}
