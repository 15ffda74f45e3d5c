//! Public types for the parse API
use serde::{Deserialize, Serialize};

pub use crate::ai::{Action, ActionBatch, ActionType, Repeat};

#[derive(Serialize, Deserialize)]
pub struct ParseRequest {
    pub text: String,
    // Base64 encoded JPEG, a data URL is also accepted
    #[serde(default)]
    pub image: Option<String>,
}
