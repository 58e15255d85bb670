use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub room_service_url: Option<String>, // None = rooms served in-process
    pub room_service_timeout_secs: u64,
    pub admin_username: Option<String>,
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    pub log_dir: String,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_issuer: env::var("JWT_ISSUER").unwrap_or_else(|_| "hotel-backend".to_string()),
            jwt_audience: env::var("JWT_AUDIENCE").unwrap_or_else(|_| "hotel-admin".to_string()),
            access_token_minutes: env::var("ACCESS_TOKEN_MINUTES").unwrap_or_else(|_| "60".to_string()).parse().expect("ACCESS_TOKEN_MINUTES must be a number"),
            refresh_token_days: env::var("REFRESH_TOKEN_DAYS").unwrap_or_else(|_| "7".to_string()).parse().expect("REFRESH_TOKEN_DAYS must be a number"),
            room_service_url: env::var("ROOM_SERVICE_URL").ok().filter(|url| !url.trim().is_empty()),
            room_service_timeout_secs: env::var("ROOM_SERVICE_TIMEOUT_SECS").unwrap_or_else(|_| "10".to_string()).parse().expect("ROOM_SERVICE_TIMEOUT_SECS must be a number"),
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }
}
