use std::sync::atomic::{AtomicU64, Ordering};
use async_trait::async_trait;
use sqlx::pool::PoolConnection;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use crate::domain::ports::UnitOfWork;
use crate::error::AppError;

/// The database handle currently owned by a context.
pub enum ConnectionState {
    Released,
    Connection(PoolConnection<Sqlite>),
    Transaction(Transaction<'static, Sqlite>),
}

impl ConnectionState {
    pub fn executor(&mut self) -> Result<&mut SqliteConnection, AppError> {
        match self {
            ConnectionState::Connection(conn) => Ok(&mut **conn),
            ConnectionState::Transaction(tx) => Ok(&mut **tx),
            ConnectionState::Released => Err(AppError::InternalWithMsg("database connection already released".into())),
        }
    }
}

/// Request-scoped database context.
///
/// Repositories bound to the same context share its connection, so every
/// statement they run between `begin_transaction` and commit/rollback belongs
/// to that one transaction. Dropping the context with a transaction still open
/// rolls it back.
pub struct SqliteContext {
    pool: SqlitePool,
    state: Mutex<ConnectionState>,
    pending_writes: AtomicU64,
}

impl SqliteContext {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            state: Mutex::new(ConnectionState::Released),
            pending_writes: AtomicU64::new(0),
        }
    }

    /// Locks the context's handle, checking a connection out of the pool if none is held.
    pub async fn connection(&self) -> Result<MutexGuard<'_, ConnectionState>, AppError> {
        let mut state = self.state.lock().await;
        if matches!(*state, ConnectionState::Released) {
            *state = ConnectionState::Connection(self.pool.acquire().await?);
        }
        Ok(state)
    }

    pub fn record_writes(&self, rows: u64) {
        self.pending_writes.fetch_add(rows, Ordering::Relaxed);
    }
}

#[async_trait]
impl UnitOfWork for SqliteContext {
    async fn begin_transaction(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        if matches!(*state, ConnectionState::Transaction(_)) {
            return Err(AppError::Conflict("A transaction is already in progress".into()));
        }

        // Writers serialize at BEGIN. A deferred BEGIN would hit BUSY_SNAPSHOT on its first write.
        let tx = self.pool.begin_with("BEGIN IMMEDIATE").await?;
        *state = ConnectionState::Transaction(tx);
        self.pending_writes.store(0, Ordering::Relaxed);
        debug!("Transaction started");
        Ok(())
    }

    async fn save_changes(&self) -> Result<u64, AppError> {
        Ok(self.pending_writes.swap(0, Ordering::Relaxed))
    }

    async fn commit_transaction(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, ConnectionState::Released) {
            ConnectionState::Transaction(tx) => {
                // A failed commit drops the transaction, which rolls it back.
                tx.commit().await.map_err(|e| {
                    warn!("Commit failed, transaction rolled back: {:?}", e);
                    AppError::Database(e)
                })?;
                debug!("Transaction committed");
                Ok(())
            }
            other => {
                *state = other;
                debug!("Commit requested with no active transaction");
                Ok(())
            }
        }
    }

    async fn rollback_transaction(&self) -> Result<(), AppError> {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, ConnectionState::Released) {
            ConnectionState::Transaction(tx) => {
                self.pending_writes.store(0, Ordering::Relaxed);
                tx.rollback().await?;
                debug!("Transaction rolled back");
                Ok(())
            }
            other => {
                *state = other;
                Ok(())
            }
        }
    }

    async fn in_transaction(&self) -> bool {
        matches!(*self.state.lock().await, ConnectionState::Transaction(_))
    }
}
