use std::sync::Arc;
use crate::domain::models::guest::{Guest, GuestFilter};
use crate::domain::models::pagination::{sort_direction, Page, PageRequest};
use crate::domain::ports::GuestRepository;
use crate::error::AppError;
use crate::infra::context::SqliteContext;
use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use tracing::error;

pub struct SqliteGuestRepo {
    ctx: Arc<SqliteContext>,
}

impl SqliteGuestRepo {
    pub fn new(ctx: Arc<SqliteContext>) -> Self {
        Self { ctx }
    }
}

fn push_filters(qb: &mut QueryBuilder<'_, Sqlite>, filter: &GuestFilter) {
    qb.push(" WHERE 1 = 1");
    if let Some(term) = filter.search_term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        let pattern = format!("%{}%", term);
        qb.push(" AND (first_name LIKE ").push_bind(pattern.clone())
            .push(" OR last_name LIKE ").push_bind(pattern.clone())
            .push(" OR email LIKE ").push_bind(pattern.clone())
            .push(" OR phone LIKE ").push_bind(pattern)
            .push(")");
    }
}

fn order_clause(filter: &GuestFilter) -> String {
    let dir = sort_direction(filter.sort_order.as_deref());
    match filter.sort_by.as_deref().map(|s| s.to_ascii_lowercase()).as_deref() {
        Some("name") => format!(" ORDER BY last_name {dir}, first_name {dir}, id {dir}"),
        Some("email") => format!(" ORDER BY email {dir}"),
        Some("created") | Some("createdat") => format!(" ORDER BY created_at {dir}, id {dir}"),
        _ => " ORDER BY last_name ASC, first_name ASC, id ASC".to_string(),
    }
}

#[async_trait]
impl GuestRepository for SqliteGuestRepo {
    async fn create(&self, guest: &Guest) -> Result<Guest, AppError> {
        let mut conn = self.ctx.connection().await?;
        let created = sqlx::query_as::<_, Guest>(
            "INSERT INTO guests (first_name, last_name, email, phone, address, date_of_birth, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *"
        )
            .bind(&guest.first_name)
            .bind(&guest.last_name)
            .bind(&guest.email)
            .bind(&guest.phone)
            .bind(&guest.address)
            .bind(guest.date_of_birth)
            .bind(guest.created_at)
            .bind(guest.updated_at)
            .fetch_one(conn.executor()?).await.map_err(AppError::Database)?;
        self.ctx.record_writes(1);
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Guest>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, Guest>("SELECT * FROM guests WHERE id = ?")
            .bind(id)
            .fetch_optional(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Guest>, AppError> {
        let mut conn = self.ctx.connection().await?;
        sqlx::query_as::<_, Guest>("SELECT * FROM guests WHERE email = ?")
            .bind(email.trim().to_lowercase())
            .fetch_optional(conn.executor()?).await.map_err(AppError::Database)
    }

    async fn update(&self, guest: &Guest) -> Result<Guest, AppError> {
        let mut conn = self.ctx.connection().await?;
        let updated = sqlx::query_as::<_, Guest>(
            "UPDATE guests SET first_name=?, last_name=?, email=?, phone=?, address=?, date_of_birth=?, updated_at=?
             WHERE id=?
             RETURNING *"
        )
            .bind(&guest.first_name)
            .bind(&guest.last_name)
            .bind(&guest.email)
            .bind(&guest.phone)
            .bind(&guest.address)
            .bind(guest.date_of_birth)
            .bind(guest.updated_at)
            .bind(guest.id)
            .fetch_optional(conn.executor()?).await.map_err(AppError::Database)?
            .ok_or_else(|| AppError::NotFound(format!("Guest with id {} not found", guest.id)))?;
        self.ctx.record_writes(1);
        Ok(updated)
    }

    async fn delete(&self, id: i64) -> Result<(), AppError> {
        let mut conn = self.ctx.connection().await?;
        let result = sqlx::query("DELETE FROM guests WHERE id = ?")
            .bind(id)
            .execute(conn.executor()?)
            .await
            .map_err(|e| {
                if e.as_database_error().is_some_and(|db| db.is_foreign_key_violation()) {
                    return AppError::Conflict("Cannot delete a guest who has bookings".into());
                }
                error!("SQLite Guest Deletion Failed: {:?}", e);
                AppError::Database(e)
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Guest with id {} not found", id)));
        }
        self.ctx.record_writes(result.rows_affected());
        Ok(())
    }

    async fn list_filtered(&self, filter: &GuestFilter) -> Result<Page<Guest>, AppError> {
        let page = PageRequest::normalize(filter.page_number, filter.page_size);
        let mut conn = self.ctx.connection().await?;

        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM guests");
        push_filters(&mut count_qb, filter);
        let total: i64 = count_qb.build_query_scalar::<i64>()
            .fetch_one(conn.executor()?).await.map_err(AppError::Database)?;

        let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM guests");
        push_filters(&mut qb, filter);
        qb.push(order_clause(filter));
        qb.push(" LIMIT ").push_bind(page.page_size).push(" OFFSET ").push_bind(page.offset());

        let items = qb.build_query_as::<Guest>()
            .fetch_all(conn.executor()?).await.map_err(AppError::Database)?;

        Ok(Page::new(items, page, total))
    }
}
