//! ecg-classifier library interface
//!
//! Exposes the router and application state so integration tests can drive
//! the HTTP surface without binding a socket.

pub mod api;
pub mod assembler;
pub mod error;
pub mod model;
pub mod models;
pub mod pipeline;
pub mod reader;
pub mod settings;
pub mod staging;
pub mod upload;
pub mod validation;

pub use crate::error::{ApiError, ApiResult};

use axum::extract::DefaultBodyLimit;
use axum::http::Method;
use axum::Router;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::model::Classifier;
use crate::pipeline::PredictionPipeline;
use crate::reader::WaveformReader;
use crate::settings::ServiceConfig;

/// Application state shared across handlers
///
/// Holds no per-request mutable state; the model and reader are shared
/// read-only.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub pipeline: PredictionPipeline,
    /// Service startup timestamp for uptime reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        config: ServiceConfig,
        reader: Arc<dyn WaveformReader>,
        model: Arc<dyn Classifier>,
    ) -> Self {
        let config = Arc::new(config);
        let pipeline = PredictionPipeline::new(Arc::clone(&config), reader, model);
        Self {
            config,
            pipeline,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .merge(api::health_routes())
        .merge(api::predict_routes())
        .layer(DefaultBodyLimit::max(state.config.max_request_size_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(CatchPanicLayer::custom(api::panic_response))
        .with_state(state)
}
