use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::classifier::DOCUMENT_TYPES;
use crate::models::AppState;

pub const SERVICE_MESSAGE: &str = "BU DocCloud Document Classification Service";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/supported-platforms", get(supported_platforms))
        .route("/document-types", get(document_types))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": SERVICE_MESSAGE }))
}

async fn supported_platforms(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "platforms": state.platforms.as_slice() }))
}

async fn document_types() -> Json<Value> {
    Json(json!({ "document_types": DOCUMENT_TYPES }))
}
