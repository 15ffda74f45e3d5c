pub mod actions;
mod error;
pub mod extractor;
pub mod models;
pub mod prompt;

pub use actions::{Action, ActionBatch, ActionType, Repeat, ResponseValidator};
pub use error::ExtractionError;
pub use extractor::{ActionExtractor, BoxedModel, ExtractorBuilder, GenerativeModel};
pub use models::{GenerationRequest, Part, UserImage};
pub use prompt::PromptBuilder;
