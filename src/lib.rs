// Doc Classifier - LLM document classification with platform delivery

pub mod classifier;
pub mod config;
pub mod delivery;
pub mod extraction;
pub mod llm;
pub mod middleware;
pub mod models;
pub mod queue;
pub mod routes;
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
