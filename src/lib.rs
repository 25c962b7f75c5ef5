// Docutext - extract plain text from uploaded PDF and Word documents over HTTP

pub mod config;
pub mod extraction;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod types;
pub mod upload;
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use types::{AppError, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
