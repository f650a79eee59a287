use crate::error::DbError;
use async_trait::async_trait;
use core_types::{CapitalSettings, NewTrade, Trade, TradeUpdate};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Persistence for the trade ledger and the capital figure.
///
/// This trait lets the HTTP layer and the CLI stay agnostic about whether
/// they are talking to PostgreSQL or to the in-memory store used in tests.
/// Implementations own the `is_open` derivation through `Trade::new` and
/// `Trade::apply`; callers can never set the flag directly.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// All trades, newest first by creation time.
    async fn list_trades(&self) -> Result<Vec<Trade>, DbError>;

    /// A single trade, or `DbError::NotFound`.
    async fn get_trade(&self, id: Uuid) -> Result<Trade, DbError>;

    /// Validates and records a new trade.
    async fn create_trade(&self, entry: NewTrade) -> Result<Trade, DbError>;

    /// Applies a partial update and returns the stored result.
    async fn update_trade(&self, id: Uuid, update: TradeUpdate) -> Result<Trade, DbError>;

    /// Removes a trade, or fails with `DbError::NotFound`.
    async fn delete_trade(&self, id: Uuid) -> Result<(), DbError>;

    /// Reads the capital settings, creating them with the default amount on first use.
    async fn get_capital(&self) -> Result<CapitalSettings, DbError>;

    /// Replaces the total capital. Negative amounts are rejected.
    async fn set_capital(&self, total_capital: Decimal) -> Result<CapitalSettings, DbError>;
}
