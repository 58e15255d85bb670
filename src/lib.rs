pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod state;

use crate::config::Config;
use crate::infra::factory::bootstrap_state;
use crate::state::AppState;
use api::router::create_router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Pretty console output plus a daily JSON file under `LOG_DIR`.
/// The file always keeps this crate at debug; `RUST_LOG` overrides the console level.
pub fn init_logging(config: &Config) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "hotel-service.log");
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_filter = EnvFilter::try_new(format!("{},hotel_backend=debug", config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info,hotel_backend=debug"));
    let file_layer = fmt::layer()
        .with_target(true)
        .json()
        .with_writer(writer)
        .with_filter(file_filter);

    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let console_layer = fmt::layer()
        .pretty()
        .with_target(false)
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    info!(log_dir = %config.log_dir, level = %config.log_level, "Logging initialized");
    guard
}

fn log_startup(state: &AppState) {
    let config = &state.config;
    let room_source = config.room_service_url.as_deref().unwrap_or("local rooms table");
    info!(
        room_source,
        admin_seed = config.admin_username.is_some(),
        access_token_minutes = config.access_token_minutes,
        refresh_token_days = config.refresh_token_days,
        "Hotel backend configured"
    );
}

pub async fn run() {
    let config = Config::from_env();
    let _guard = init_logging(&config);

    let state = Arc::new(bootstrap_state(&config).await);
    log_startup(&state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", addr, e));

    info!("Hotel backend listening on {}", addr);
    if let Err(e) = axum::serve(listener, create_router(state)).await {
        error!("Server stopped: {}", e);
    }
}
