use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqlitePool};
use tracing::{info, warn};
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::models::user::{User, ROLE_ADMIN};
use crate::domain::ports::RoomCatalog;
use crate::domain::services::auth_service::AuthService;
use crate::error::AppError;
use crate::infra::repositories::{sqlite_auth_repo::SqliteAuthRepo, sqlite_user_repo::SqliteUserRepo};
use crate::infra::rooms::http_room_catalog::HttpRoomCatalog;
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    info!("Initializing SQLite connection with WAL Mode...");

    let opts = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid SQLite connection string")
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .foreign_keys(true)
        .log_statements(LevelFilter::Debug)
        .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await
        .expect("Failed to connect to SQLite");

    run_sqlite_migrations(&pool).await;

    let state = build_state(config, pool).expect("Failed to build application state");
    seed_admin(&state).await.expect("Failed to seed admin account");

    match state.auth_service.purge_expired_tokens().await {
        Ok(0) => {}
        Ok(purged) => info!("Purged {} expired refresh tokens", purged),
        Err(e) => warn!("Could not purge expired refresh tokens: {}", e),
    }
    state
}

/// Wires the long-lived services around an already migrated pool.
pub fn build_state(config: &Config, pool: SqlitePool) -> Result<AppState, AppError> {
    let user_repo = Arc::new(SqliteUserRepo::new(pool.clone()));
    let auth_repo = Arc::new(SqliteAuthRepo::new(pool.clone()));
    let auth_service = Arc::new(AuthService::new(auth_repo, user_repo.clone(), config.clone()));

    let room_service: Option<Arc<dyn RoomCatalog>> = match &config.room_service_url {
        Some(url) => {
            info!("Room lookups go to remote room service at {}", url);
            Some(Arc::new(HttpRoomCatalog::new(
                url.clone(),
                Duration::from_secs(config.room_service_timeout_secs),
            )?))
        }
        None => {
            info!("Room lookups served from the local rooms table");
            None
        }
    };

    Ok(AppState {
        config: config.clone(),
        pool,
        user_repo,
        auth_service,
        room_service,
    })
}

/// Creates the configured admin account unless the username is already taken.
pub async fn seed_admin(state: &AppState) -> Result<(), AppError> {
    let (Some(username), Some(email), Some(password)) = (
        state.config.admin_username.as_deref(),
        state.config.admin_email.as_deref(),
        state.config.admin_password.as_deref(),
    ) else {
        warn!("ADMIN_USERNAME/ADMIN_EMAIL/ADMIN_PASSWORD not fully set; skipping admin seed");
        return Ok(());
    };

    if state.user_repo.find_by_username(username).await?.is_some() {
        return Ok(());
    }

    let password_hash = state.auth_service.hash_password(password)?;
    let admin = state.user_repo
        .create(&User::new(username.to_string(), email.to_string(), password_hash, ROLE_ADMIN))
        .await?;
    info!(user_id = %admin.id, "Seeded admin account {}", admin.username);
    Ok(())
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}
