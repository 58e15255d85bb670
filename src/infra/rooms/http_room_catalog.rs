use std::time::Duration;
use crate::domain::models::room::Room;
use crate::domain::ports::RoomCatalog;
use crate::error::AppError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};

/// Looks rooms up in a remote room service. One attempt per call, no retries.
pub struct HttpRoomCatalog {
    client: Client,
    base_url: String,
}

impl HttpRoomCatalog {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalWithMsg(format!("Failed to build room service client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[derive(Deserialize)]
struct RoomEnvelope {
    success: bool,
    message: Option<String>,
    data: Option<Room>,
}

#[async_trait]
impl RoomCatalog for HttpRoomCatalog {
    async fn get_room(&self, room_id: i64) -> Result<Option<Room>, AppError> {
        let url = format!("{}/api/rooms/{}", self.base_url, room_id);
        debug!(room_id, "Fetching room from {}", url);

        let res = self.client.get(&url)
            .send()
            .await
            .map_err(|e| {
                let msg = format!("Room service connection error: {}", e);
                error!(room_id, "{}", msg);
                AppError::Upstream(msg)
            })?;

        if res.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            let msg = format!("Room service failed. Status: {}, Body: {}", status, text);
            error!(room_id, "{}", msg);
            return Err(AppError::Upstream(msg));
        }

        let envelope: RoomEnvelope = res.json().await.map_err(|e| {
            let msg = format!("Room service returned an unreadable body: {}", e);
            error!(room_id, "{}", msg);
            AppError::Upstream(msg)
        })?;

        if !envelope.success {
            return Err(AppError::Upstream(
                envelope.message.unwrap_or_else(|| "Room service reported a failure".to_string()),
            ));
        }

        Ok(envelope.data)
    }
}
