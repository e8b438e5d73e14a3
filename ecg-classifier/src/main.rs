//! ecg-classifier - ECG record classification microservice
//!
//! Accepts uploaded WFDB record pairs (`.hea` + `.dat`), reconstructs the
//! multi-lead waveform, normalises it and returns the model's classification
//! together with descriptive statistics of the raw signal.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use ecg_common::config::ConfigResolver;
use ecg_common::logging::init_tracing;
use tokio::signal;
use tracing::info;

use ecg_classifier::model::{load_model, Classifier, SerializedClassifier};
use ecg_classifier::reader::{RdsampReader, WaveformReader};
use ecg_classifier::settings::{Overrides, ServiceConfig};
use ecg_classifier::{build_router, AppState};

/// Command-line arguments for ecg-classifier
#[derive(Parser, Debug)]
#[command(name = "ecg-classifier")]
#[command(about = "ECG classification microservice")]
#[command(version)]
struct Args {
    /// Bootstrap TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "ECG_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "ECG_PORT")]
    port: Option<u16>,

    /// Model weights file
    #[arg(short, long, env = "ECG_MODEL_PATH")]
    model_path: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = ConfigResolver::new(args.config.clone())
        .load()
        .context("Failed to load configuration")?;

    init_tracing(&toml_config.logging, args.log_level.as_deref())
        .context("Failed to initialise logging")?;

    info!(
        "Starting ECG Classification API (ecg-classifier) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let config = ServiceConfig::resolve(
        &toml_config,
        Overrides {
            host: args.host,
            port: args.port,
            model_path: args.model_path,
        },
    );

    // Model load failure is fatal: the service never starts without a model
    let model = load_model(&config.model_path, config.input_channels).with_context(|| {
        format!("Failed to load model from {}", config.model_path.display())
    })?;
    info!(
        "Model loaded successfully ({} classes, {} input channels)",
        model.labels().len(),
        model.input_channels()
    );
    let model: Arc<dyn Classifier> = if config.serialize_inference {
        info!("Inference calls serialized");
        Arc::new(SerializedClassifier::new(model))
    } else {
        Arc::new(model)
    };

    let reader: Arc<dyn WaveformReader> = Arc::new(RdsampReader::new(&config.reader_command));
    info!("Waveform reader: {}", config.reader_command);

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(config, reader, model));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_address))?;
    info!("Listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
