use anyhow::{Result, anyhow};

use crate::core::AppConfig;
use crate::gemini::list_models;

/// Print the models that can be used for extraction
pub async fn run(config: AppConfig) -> Result<()> {
    let api_key = config
        .gemini_api_key
        .as_deref()
        .ok_or_else(|| anyhow!("No API key found, set GEMINI_API_KEY or GOOGLE_API_KEY"))?;

    let models = list_models(&reqwest::Client::new(), &config.gemini_api_hostname, api_key)
        .await
        .map_err(|e| anyhow!("Error connecting to Gemini: {:#}", e))?;

    let usable: Vec<_> = models
        .iter()
        .filter(|model| model.supports_generate_content())
        .collect();

    if usable.is_empty() {
        println!("No models found. The API key might be invalid or inactive.");
    }
    for model in usable {
        match &model.display_name {
            Some(display_name) => println!("{} ({})", model.name, display_name),
            None => println!("{}", model.name),
        }
    }

    Ok(())
}
