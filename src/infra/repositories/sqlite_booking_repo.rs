use std::sync::Arc;
use crate::domain::models::booking::{Booking, BookingDetails, BookingFilter, BookingStatus};
use crate::domain::models::pagination::{sort_direction, Page, PageRequest};
use crate::domain::ports::BookingRepository;
use crate::error::AppError;
use crate::infra::context::SqliteContext;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite};

const SELECT_DETAILS: &str = "SELECT b.*, g.first_name AS guest_first_name, g.last_name AS guest_last_name, g.email AS guest_email
     FROM bookings b JOIN guests g ON g.id = b.guest_id";

pub struct SqliteBookingRepo {
    ctx: Arc<SqliteContext>,
}

impl SqliteBookingRepo {
    pub fn new(ctx: Arc<SqliteContext>) -> Self {
        Self { ctx }
    }
}

/// SQLITE_BUSY_SNAPSHOT: another writer committed after this transaction started reading.
const SQLITE_BUSY_SNAPSHOT: &str = "517";

/// Maps a losing booking write to `Conflict`. That covers the `bookings_no_overlap_*`
/// triggers and a write attempted on a stale snapshot.
fn map_overlap(e: sqlx::Error) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.message().contains("room_overlap") {
            return AppError::Conflict("Room is not available for the selected dates".into());
        }
        if db_err.code().as_deref() == Some(SQLITE_BUSY_SNAPSHOT) {
            return AppError::Conflict("Room was booked concurrently, please retry".into());
        }
    }
    AppError::Database(e)
}

fn push_filters<'a>(qb: &mut QueryBuilder<'a, Sqlite>, filter: &BookingFilter) {
    qb.push(" WHERE 1 = 1");

    if let Some(term) = filter.search_term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term);
        qb.push(" AND (b.room_number LIKE ").push_bind(pattern.clone())
            .push(" OR g.first_name LIKE ").push_bind(pattern.clone())
            .push(" OR g.last_name LIKE ").push_bind(pattern.clone())
            .push(" OR g.email LIKE ").push_bind(pattern)
            .push(")");
    }
    if let Some(guest_id) = filter.guest_id {
        qb.push(" AND b.guest_id = ").push_bind(guest_id);
    }
    if let Some(room_id) = filter.room_id {
        qb.push(" AND b.room_id = ").push_bind(room_id);
    }
    if let Some(status) = filter.status {
        qb.push(" AND b.status = ").push_bind(status.as_str());
    }
    if let Some(room_type) = filter.room_type.as_deref().filter(|t| !t.is_empty()) {
        qb.push(" AND b.room_type = ").push_bind(room_type.to_string());
    }
    if let Some(from) = filter.check_in_from {
        qb.push(" AND b.check_in_date >= ").push_bind(from);
    }
    if let Some(to) = filter.check_in_to {
        qb.push(" AND b.check_in_date <= ").push_bind(to);
    }
    if let Some(from) = filter.check_out_from {
        qb.push(" AND b.check_out_date >= ").push_bind(from);
    }
    if let Some(to) = filter.check_out_to {
        qb.push(" AND b.check_out_date <= ").push_bind(to);
    }
    if let Some(min) = filter.min_amount {
        qb.push(" AND b.total_amount >= ").push_bind(min);
    }
    if let Some(max) = filter.max_amount {
        qb.push(" AND b.total_amount <= ").push_bind(max);
    }
    if let Some(from) = filter.created_from {
        qb.push(" AND b.created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        qb.push(" AND b.created_at <= ").push_bind(to);
    }
}

fn order_clause(filter: &BookingFilter) -> String {
    let dir = sort_direction(filter.sort_order.as_deref());
    let key = filter.sort_by.as_deref().map(|s| s.to_ascii_lowercase());
    match key.as_deref() {
        Some("checkin") | Some("checkindate") => format!(" ORDER BY b.check_in_date {dir}, b.id {dir}"),
        Some("checkout") | Some("checkoutdate") => format!(" ORDER BY b.check_out_date {dir}, b.id {dir}"),
        Some("amount") | Some("totalamount") => format!(" ORDER BY b.total_amount {dir}, b.id {dir}"),
        Some("status") => format!(" ORDER BY b.status {dir}, b.id {dir}"),
        Some("roomnumber") => format!(" ORDER BY b.room_number {dir}, b.id {dir}"),
        Some("guestname") => format!(" ORDER BY g.last_name {dir}, g.first_name {dir}, b.id {dir}"),
        Some("created") | Some("createdat") => format!(" ORDER BY b.created_at {dir}, b.id {dir}"),
        _ => " ORDER BY b.created_at DESC, b.id DESC".to_string(),
    }
}

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn create(&self, booking: &Booking) -> Result<Booking, AppError> {
        let mut conn = self.ctx.connection().await?;
        let created = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (room_id, room_number, room_type, price_per_night, guest_id, check_in_date, check_out_date,
                                   number_of_nights, total_amount, status, cancellation_reason, created_at, updated_at, cancelled_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(booking.room_id).bind(&booking.room_number).bind(&booking.room_type).bind(booking.price_per_night)
            .bind(booking.guest_id).bind(booking.check_in_date).bind(booking.check_out_date)
            .bind(booking.number_of_nights).bind(booking.total_amount).bind(booking.status.as_str())
            .bind(&booking.cancellation_reason).bind(booking.created_at).bind(booking.updated_at).bind(booking.cancelled_at)
            .fetch_one(conn.executor()?).await.map_err(map_overlap)?;
        self.ctx.record_writes(1);
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Booking>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(id)
            .fetch_optional(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn find_details(&self, id: i64) -> Result<Option<BookingDetails>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, BookingDetails>(&format!("{} WHERE b.id = ?", SELECT_DETAILS))
            .bind(id)
            .fetch_optional(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn update(&self, booking: &Booking) -> Result<Booking, AppError> {
        let mut conn = self.ctx.connection().await?;
        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET room_id=?, room_number=?, room_type=?, price_per_night=?, check_in_date=?, check_out_date=?,
                    number_of_nights=?, total_amount=?, status=?, cancellation_reason=?, updated_at=?, cancelled_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(booking.room_id).bind(&booking.room_number).bind(&booking.room_type).bind(booking.price_per_night)
            .bind(booking.check_in_date).bind(booking.check_out_date).bind(booking.number_of_nights).bind(booking.total_amount)
            .bind(booking.status.as_str()).bind(&booking.cancellation_reason).bind(booking.updated_at).bind(booking.cancelled_at)
            .bind(booking.id)
            .fetch_optional(conn.executor()?).await.map_err(map_overlap)?
            .ok_or_else(|| AppError::NotFound(format!("Booking with id {} not found", booking.id)))?;
        self.ctx.record_writes(1);
        Ok(updated)
    }

    async fn list_filtered(&self, filter: &BookingFilter) -> Result<Page<BookingDetails>, AppError> {
        let page = PageRequest::normalize(filter.page_number, filter.page_size);
        let mut conn = self.ctx.connection().await?;

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM bookings b JOIN guests g ON g.id = b.guest_id");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar::<i64>()
            .fetch_one(conn.executor()?).await.map_err(AppError::Database)?;

        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_DETAILS);
        push_filters(&mut qb, filter);
        qb.push(order_clause(filter));
        qb.push(" LIMIT ").push_bind(page.page_size).push(" OFFSET ").push_bind(page.offset());

        let items = qb.build_query_as::<BookingDetails>()
            .fetch_all(conn.executor()?).await.map_err(AppError::Database)?;

        Ok(Page::new(items, page, total))
    }

    async fn list_by_guest(&self, guest_id: i64) -> Result<Vec<BookingDetails>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, BookingDetails>(&format!("{} WHERE b.guest_id = ? ORDER BY b.check_in_date DESC", SELECT_DETAILS))
            .bind(guest_id)
            .fetch_all(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn list_by_room(&self, room_id: i64) -> Result<Vec<BookingDetails>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, BookingDetails>(&format!("{} WHERE b.room_id = ? ORDER BY b.check_in_date ASC", SELECT_DETAILS))
            .bind(room_id)
            .fetch_all(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn list_upcoming(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<BookingDetails>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, BookingDetails>(&format!(
            "{} WHERE b.check_in_date >= ? AND b.check_in_date <= ? AND b.status != ? ORDER BY b.check_in_date ASC",
            SELECT_DETAILS
        ))
            .bind(from).bind(to).bind(BookingStatus::Cancelled.as_str())
            .fetch_all(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn list_active(&self, today: NaiveDate) -> Result<Vec<BookingDetails>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, BookingDetails>(&format!(
            "{} WHERE b.status = ? AND b.check_in_date <= ? AND b.check_out_date >= ? ORDER BY b.check_out_date ASC",
            SELECT_DETAILS
        ))
            .bind(BookingStatus::CheckedIn.as_str()).bind(today).bind(today)
            .fetch_all(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn is_room_available(
        &self,
        room_id: i64,
        check_in: NaiveDate,
        check_out: NaiveDate,
        exclude_booking_id: Option<i64>,
    ) -> Result<bool, AppError> {
        let mut conn = self.ctx.connection().await?;
        let overlapping: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings
             WHERE room_id = ? AND status != ? AND check_in_date < ? AND check_out_date > ?
               AND (? IS NULL OR id != ?)"
        )
            .bind(room_id).bind(BookingStatus::Cancelled.as_str()).bind(check_out).bind(check_in)
            .bind(exclude_booking_id).bind(exclude_booking_id)
            .fetch_one(conn.executor()?).await.map_err(AppError::Database)?;
        Ok(overlapping == 0)
    }

    async fn count_by_guest(&self, guest_id: i64) -> Result<i64, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_scalar("SELECT COUNT(*) FROM bookings WHERE guest_id = ?")
            .bind(guest_id)
            .fetch_one(conn.executor()?).await.map_err(AppError::Database)
    }
}
