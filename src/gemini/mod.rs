mod client;
mod model;

pub use client::{
    DEFAULT_API_HOSTNAME, GenerateContentResponse, ModelInfo, generate_content, list_models,
    model_path,
};
pub use model::GeminiModel;
