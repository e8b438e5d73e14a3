//! HTTP API handlers for ecg-classifier

pub mod health;
pub mod predict;

pub use health::health_routes;
pub use predict::{panic_response, predict_routes};
