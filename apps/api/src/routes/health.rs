use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status plus the loaded vocabulary size and the active
/// provider backends.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "shortlist-api",
        "vocabulary_size": state.vocabulary.len(),
        "entity_provider": state.annotator.provider_name(),
        "embedding_backend": state.embedder.name(),
    }))
}
