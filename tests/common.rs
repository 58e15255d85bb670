use hotel_backend::{
    api::router::create_router,
    config::Config,
    infra::factory::{build_state, seed_admin},
    state::AppState,
};
use sqlx::{sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions}, Pool, Sqlite};
use std::sync::Arc;
use uuid::Uuid;
use axum::{
    body::Body,
    http::{Request, StatusCode, header},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use std::str::FromStr;
use tower::ServiceExt;
use serde_json::{json, Value};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password-123";

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        Self::with_room_service(None).await
    }

    pub async fn with_room_service(room_service_url: Option<String>) -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            jwt_secret: "test-secret-key-that-is-long-enough".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 7,
            room_service_url,
            room_service_timeout_secs: 2,
            admin_username: Some(ADMIN_USERNAME.to_string()),
            admin_email: Some("admin@hotel.test".to_string()),
            admin_password: Some(ADMIN_PASSWORD.to_string()),
            log_dir: "./logs".to_string(),
            log_level: "info".to_string(),
        };

        let state = Arc::new(build_state(&config, pool.clone()).expect("Failed to build state"));
        seed_admin(&state).await.expect("Failed to seed admin");

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
        }
    }

    /// Logs in and returns the full `data` object of the auth response.
    pub async fn login_raw(&self, username: &str, password: &str) -> (StatusCode, Value) {
        self.request("POST", "/api/auth/login", None, Some(json!({
            "username": username,
            "password": password
        }))).await
    }

    pub async fn login(&self, username: &str, password: &str) -> String {
        let (status, body) = self.login_raw(username, password).await;
        if !status.is_success() {
            panic!("Login failed in test helper: status {} body {}", status, body);
        }
        body["data"]["accessToken"].as_str().expect("No accessToken in body").to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.login(ADMIN_USERNAME, ADMIN_PASSWORD).await
    }

    pub async fn request(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    pub async fn create_room(&self, token: &str, room_number: &str, price: f64) -> i64 {
        let (status, body) = self.request("POST", "/api/rooms", Some(token), Some(json!({
            "roomNumber": room_number,
            "roomType": "Double",
            "pricePerNight": price,
            "capacity": 2,
            "description": "Test room"
        }))).await;
        assert_eq!(status, StatusCode::CREATED, "create_room failed: {}", body);
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_guest(&self, token: &str, first_name: &str, email: &str) -> i64 {
        let (status, body) = self.request("POST", "/api/guests", Some(token), Some(json!({
            "firstName": first_name,
            "lastName": "Tester",
            "email": email,
            "phone": "+49 30 1234567"
        }))).await;
        assert_eq!(status, StatusCode::CREATED, "create_guest failed: {}", body);
        body["data"]["id"].as_i64().unwrap()
    }

    pub async fn create_booking(&self, token: &str, room_id: i64, guest_id: i64, check_in: NaiveDate, check_out: NaiveDate) -> (StatusCode, Value) {
        self.request("POST", "/api/bookings", Some(token), Some(json!({
            "roomId": room_id,
            "guestId": guest_id,
            "checkInDate": check_in,
            "checkOutDate": check_out
        }))).await
    }
}

#[allow(dead_code)]
pub fn days_from_today(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}
