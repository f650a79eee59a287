use crate::DbError;
use crate::store::TradeStore;
use async_trait::async_trait;
use core_types::{CapitalSettings, NewTrade, Trade, TradeUpdate};
use rust_decimal::Decimal;
use sqlx::postgres::PgPool;
use uuid::Uuid;

const TRADE_COLUMNS: &str =
    "id, scrip_name, quantity, buy_price, sell_price, buy_date, sell_date, is_open, created_at";

/// The `DbRepository` is the PostgreSQL-backed `TradeStore`.
/// It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
    default_capital: Decimal,
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    ///
    /// `default_capital` seeds the capital settings row the first time it is read.
    pub fn new(pool: PgPool, default_capital: Decimal) -> Self {
        Self { pool, default_capital }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl TradeStore for DbRepository {
    async fn list_trades(&self) -> Result<Vec<Trade>, DbError> {
        let sql = format!("SELECT {} FROM trades ORDER BY created_at DESC", TRADE_COLUMNS);
        let trades = sqlx::query_as::<_, Trade>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(trades)
    }

    async fn get_trade(&self, id: Uuid) -> Result<Trade, DbError> {
        let sql = format!("SELECT {} FROM trades WHERE id = $1", TRADE_COLUMNS);
        sqlx::query_as::<_, Trade>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(DbError::NotFound)
    }

    async fn create_trade(&self, entry: NewTrade) -> Result<Trade, DbError> {
        let trade = Trade::new(entry)?;

        let sql = format!(
            r#"
            INSERT INTO trades (
                id, scrip_name, quantity, buy_price, sell_price, buy_date, sell_date, is_open, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            TRADE_COLUMNS
        );
        let saved = sqlx::query_as::<_, Trade>(&sql)
            .bind(trade.id)
            .bind(&trade.scrip_name)
            .bind(trade.quantity)
            .bind(trade.buy_price)
            .bind(trade.sell_price)
            .bind(trade.buy_date)
            .bind(trade.sell_date)
            .bind(trade.is_open)
            .bind(trade.created_at)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(trade_id = %saved.id, scrip = %saved.scrip_name, is_open = saved.is_open, "Recorded trade.");
        Ok(saved)
    }

    /// Read-modify-write inside one transaction so `is_open` is always
    /// recomputed from the row being replaced.
    async fn update_trade(&self, id: Uuid, update: TradeUpdate) -> Result<Trade, DbError> {
        if update.is_empty() {
            return self.get_trade(id).await;
        }

        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT {} FROM trades WHERE id = $1 FOR UPDATE", TRADE_COLUMNS);
        let mut trade = sqlx::query_as::<_, Trade>(&select)
            .bind(id)
            .fetch_optional(&mut *tx) // Note: must use the transaction object `tx` here
            .await?
            .ok_or(DbError::NotFound)?;

        trade.apply(update)?;

        let sql = format!(
            r#"
            UPDATE trades
            SET scrip_name = $2, quantity = $3, buy_price = $4, sell_price = $5,
                buy_date = $6, sell_date = $7, is_open = $8
            WHERE id = $1
            RETURNING {}
            "#,
            TRADE_COLUMNS
        );
        let saved = sqlx::query_as::<_, Trade>(&sql)
            .bind(trade.id)
            .bind(&trade.scrip_name)
            .bind(trade.quantity)
            .bind(trade.buy_price)
            .bind(trade.sell_price)
            .bind(trade.buy_date)
            .bind(trade.sell_date)
            .bind(trade.is_open)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::info!(trade_id = %saved.id, is_open = saved.is_open, "Updated trade.");
        Ok(saved)
    }

    async fn delete_trade(&self, id: Uuid) -> Result<(), DbError> {
        let result = sqlx::query("DELETE FROM trades WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        tracing::info!(trade_id = %id, "Deleted trade.");
        Ok(())
    }

    async fn get_capital(&self) -> Result<CapitalSettings, DbError> {
        // Idempotent: only the first read ever inserts.
        sqlx::query(
            "INSERT INTO capital_settings (id, total_capital, updated_at) VALUES (1, $1, NOW()) ON CONFLICT (id) DO NOTHING",
        )
        .bind(self.default_capital)
        .execute(&self.pool)
        .await?;

        let settings = sqlx::query_as::<_, CapitalSettings>(
            "SELECT total_capital, updated_at FROM capital_settings WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(settings)
    }

    async fn set_capital(&self, total_capital: Decimal) -> Result<CapitalSettings, DbError> {
        let total_capital = CapitalSettings::validate_amount(total_capital)?;

        let settings = sqlx::query_as::<_, CapitalSettings>(
            r#"
            INSERT INTO capital_settings (id, total_capital, updated_at)
            VALUES (1, $1, NOW())
            ON CONFLICT (id) DO UPDATE
                SET total_capital = EXCLUDED.total_capital, updated_at = NOW()
            RETURNING total_capital, updated_at
            "#,
        )
        .bind(total_capital)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(total_capital = %settings.total_capital, "Updated total capital.");
        Ok(settings)
    }
}
