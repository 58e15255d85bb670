use std::sync::Arc;
use crate::domain::models::pagination::{sort_direction, Page, PageRequest};
use crate::domain::models::room::{Room, RoomFilter};
use crate::domain::ports::RoomRepository;
use crate::error::AppError;
use crate::infra::context::SqliteContext;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};

pub struct SqliteRoomRepo {
    ctx: Arc<SqliteContext>,
}

impl SqliteRoomRepo {
    pub fn new(ctx: Arc<SqliteContext>) -> Self {
        Self { ctx }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &RoomFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(room_type) = filter.room_type.as_deref().filter(|t| !t.is_empty()) {
        qb.push(" AND room_type = ").push_bind(room_type.to_string());
    }
    if let Some(min) = filter.min_price {
        qb.push(" AND price_per_night >= ").push_bind(min);
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND price_per_night <= ").push_bind(max);
    }
    if let Some(capacity) = filter.min_capacity {
        qb.push(" AND capacity >= ").push_bind(capacity);
    }
    if let Some(available) = filter.is_available {
        qb.push(" AND is_available = ").push_bind(available);
    }
    if let Some(term) = filter.search_term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term);
        qb.push(" AND (room_number LIKE ").push_bind(pattern.clone())
            .push(" OR room_type LIKE ").push_bind(pattern.clone())
            .push(" OR description LIKE ").push_bind(pattern)
            .push(")");
    }
}

fn order_clause(filter: &RoomFilter) -> String {
    let dir = sort_direction(filter.sort_order.as_deref());
    match filter.sort_by.as_deref().map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("number") | Some("roomnumber") => format!(" ORDER BY room_number {dir}"),
        Some("price") => format!(" ORDER BY price_per_night {dir}, room_number {dir}"),
        Some("capacity") => format!(" ORDER BY capacity {dir}, room_number {dir}"),
        Some("type") | Some("roomtype") => format!(" ORDER BY room_type {dir}, room_number {dir}"),
        Some("created") | Some("createdat") => format!(" ORDER BY created_at {dir}, id {dir}"),
        _ => " ORDER BY room_number ASC".to_string(),
    }
}

#[async_trait]
impl RoomRepository for SqliteRoomRepo {
    async fn create(&self, room: &Room) -> Result<Room, AppError> {
        let mut conn = self.ctx.connection().await?;
        let created = sqlx::query_as::<_, Room>(
            "INSERT INTO rooms (room_number, room_type, price_per_night, capacity, is_available, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&room.room_number)
            .bind(&room.room_type)
            .bind(room.price_per_night)
            .bind(room.capacity)
            .bind(room.is_available)
            .bind(&room.description)
            .bind(room.created_at)
            .bind(room.updated_at)
            .fetch_one(conn.executor()?).await.map_err(AppError::Database)?;
        self.ctx.record_writes(1);
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Room>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE id = ?")
            .bind(id)
            .fetch_optional(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn find_by_number(&self, room_number: &str) -> Result<Option<Room>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, Room>("SELECT * FROM rooms WHERE room_number = ?")
            .bind(room_number)
            .fetch_optional(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn update(&self, room: &Room) -> Result<Room, AppError> {
        let mut conn = self.ctx.connection().await?;
        let updated = sqlx::query_as::<_, Room>(
            "UPDATE rooms SET room_number=?, room_type=?, price_per_night=?, capacity=?, is_available=?, description=?, updated_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&room.room_number)
            .bind(&room.room_type)
            .bind(room.price_per_night)
            .bind(room.capacity)
            .bind(room.is_available)
            .bind(&room.description)
            .bind(room.updated_at)
            .bind(room.id)
            .fetch_optional(conn.executor()?).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Room with id {} not found", room.id)))?;
        self.ctx.record_writes(1);
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut conn = self.ctx.connection().await?;
        let result = sqlx::query("DELETE FROM rooms WHERE id = ?")
            .bind(id)
            .execute(conn.executor()?).await.map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Room with id {} not found", id)));
        }
        self.ctx.record_writes(result.rows_affected());
        Ok(())
    }

    async fn list_filtered(&self, filter: &RoomFilter) -> Result<Page<Room>, AppError> {
        let page = PageRequest::normalize(filter.page_number, filter.page_size);
        let mut conn = self.ctx.connection().await?;

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM rooms");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar::<i64>()
            .fetch_one(conn.executor()?).await.map_err(AppError::Database)?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM rooms");
        push_filters(&mut qb, filter);
        qb.push(order_clause(filter));
        qb.push(" LIMIT ").push_bind(page.page_size).push(" OFFSET ").push_bind(page.offset());

        let items = qb.build_query_as::<Room>()
            .fetch_all(conn.executor()?).await.map_err(AppError::Database)?;

        Ok(Page::new(items, page, total))
    }
}
