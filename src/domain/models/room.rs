use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: i64,
    pub room_number: String,
    pub room_type: String,
    pub price_per_night: f64,
    pub capacity: i64,
    pub is_available: bool,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewRoomParams {
    pub room_number: String,
    pub room_type: String,
    pub price_per_night: f64,
    pub capacity: i64,
    pub is_available: bool,
    pub description: Option<String>,
}

impl Room {
    pub fn new(params: NewRoomParams) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            room_number: params.room_number,
            room_type: params.room_type,
            price_per_night: params.price_per_night,
            capacity: params.capacity,
            is_available: params.is_available,
            description: params.description,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomFilter {
    pub room_type: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_capacity: Option<i64>,
    pub is_available: Option<bool>,
    pub search_term: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
}
