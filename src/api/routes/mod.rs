//! API routes module

pub mod parse;

use std::sync::Arc;

use crate::api::state::AppState;
use axum::Router;

type SharedState = Arc<AppState>;

/// Create the combined API router
pub fn router() -> Router<SharedState> {
    Router::new()
        // Natural language to calendar actions
        .nest("/parse", parse::router())
}
