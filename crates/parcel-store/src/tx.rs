//! PostgreSQL transaction scope over a connection pool.

use async_trait::async_trait;
use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};

use parcel_core::error::StoreError;
use parcel_core::store::TxScope;

/// [TxScope] backed by a `PgPool`. The connection handle handed to `body` is
/// either a pooled connection (ambient mode) or the transaction's connection.
#[derive(Clone)]
pub struct PgTxScope {
    pool: PgPool,
}

impl PgTxScope {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TxScope for PgTxScope {
    type Conn = PgConnection;

    async fn run_atomic<T, E, F>(&self, in_tx: bool, body: F) -> Result<T, E>
    where
        T: Send,
        E: From<StoreError> + Send,
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, E>> + Send,
    {
        if !in_tx {
            let mut conn = self
                .pool
                .acquire()
                .await
                .map_err(|e| E::from(StoreError::transaction("acquire connection", e)))?;
            return body(&mut *conn).await;
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| E::from(StoreError::transaction("begin", e)))?;
        match body(&mut *tx).await {
            Ok(value) => {
                tx.commit()
                    .await
                    .map_err(|e| E::from(StoreError::transaction("commit", e)))?;
                Ok(value)
            }
            Err(err) => {
                // The body error is what the caller needs; a rollback failure
                // only means the connection is dropped instead of reused.
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }
}
