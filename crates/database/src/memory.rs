use crate::error::DbError;
use crate::store::TradeStore;
use async_trait::async_trait;
use core_types::{CapitalSettings, NewTrade, Trade, TradeUpdate};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A `TradeStore` that keeps everything in process memory.
///
/// Used by the test suites and by `serve --in-memory`. Nothing survives a restart.
#[derive(Debug)]
pub struct InMemoryStore {
    trades: RwLock<Vec<Trade>>,
    capital: RwLock<Option<CapitalSettings>>,
    default_capital: Decimal,
}

impl InMemoryStore {
    pub fn new(default_capital: Decimal) -> Self {
        Self {
            trades: RwLock::new(Vec::new()),
            capital: RwLock::new(None),
            default_capital,
        }
    }
}

#[async_trait]
impl TradeStore for InMemoryStore {
    async fn list_trades(&self) -> Result<Vec<Trade>, DbError> {
        let trades = self.trades.read().await;
        // Insertion order breaks ties between identical timestamps.
        let mut listed: Vec<Trade> = trades.iter().rev().cloned().collect();
        listed.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(listed)
    }

    async fn get_trade(&self, id: Uuid) -> Result<Trade, DbError> {
        self.trades
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(DbError::NotFound)
    }

    async fn create_trade(&self, entry: NewTrade) -> Result<Trade, DbError> {
        let trade = Trade::new(entry)?;
        self.trades.write().await.push(trade.clone());
        tracing::info!(trade_id = %trade.id, scrip = %trade.scrip_name, is_open = trade.is_open, "Recorded trade.");
        Ok(trade)
    }

    async fn update_trade(&self, id: Uuid, update: TradeUpdate) -> Result<Trade, DbError> {
        let mut trades = self.trades.write().await;
        let trade = trades.iter_mut().find(|t| t.id == id).ok_or(DbError::NotFound)?;
        trade.apply(update)?;
        tracing::info!(trade_id = %trade.id, is_open = trade.is_open, "Updated trade.");
        Ok(trade.clone())
    }

    async fn delete_trade(&self, id: Uuid) -> Result<(), DbError> {
        let mut trades = self.trades.write().await;
        let position = trades.iter().position(|t| t.id == id).ok_or(DbError::NotFound)?;
        trades.remove(position);
        tracing::info!(trade_id = %id, "Deleted trade.");
        Ok(())
    }

    async fn get_capital(&self) -> Result<CapitalSettings, DbError> {
        let mut capital = self.capital.write().await;
        if let Some(settings) = capital.as_ref() {
            return Ok(settings.clone());
        }
        let settings = CapitalSettings::new(self.default_capital)?;
        *capital = Some(settings.clone());
        Ok(settings)
    }

    async fn set_capital(&self, total_capital: Decimal) -> Result<CapitalSettings, DbError> {
        let settings = CapitalSettings::new(total_capital)?;
        *self.capital.write().await = Some(settings.clone());
        tracing::info!(total_capital = %settings.total_capital, "Updated total capital.");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn entry(scrip: &str) -> NewTrade {
        NewTrade {
            scrip_name: scrip.to_string(),
            quantity: dec!(10),
            buy_price: dec!(250),
            sell_price: None,
            buy_date: NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(),
            sell_date: None,
        }
    }

    #[tokio::test]
    async fn lists_newest_first() {
        let store = InMemoryStore::new(dec!(100000));
        store.create_trade(entry("A")).await.unwrap();
        store.create_trade(entry("B")).await.unwrap();
        store.create_trade(entry("C")).await.unwrap();

        let names: Vec<String> = store
            .list_trades()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.scrip_name)
            .collect();
        assert_eq!(names, vec!["C", "B", "A"]);
    }

    #[tokio::test]
    async fn update_completes_a_position() {
        let store = InMemoryStore::new(dec!(100000));
        let trade = store.create_trade(entry("ITC")).await.unwrap();
        assert!(trade.is_open);

        let updated = store
            .update_trade(
                trade.id,
                TradeUpdate {
                    sell_price: Some(dec!(275)),
                    sell_date: Some(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert!(!updated.is_open);
        assert_eq!(store.get_trade(trade.id).await.unwrap(), updated);
    }

    #[tokio::test]
    async fn invalid_entries_are_rejected() {
        let store = InMemoryStore::new(dec!(100000));
        let mut bad = entry("X");
        bad.quantity = dec!(0);

        assert!(matches!(store.create_trade(bad).await, Err(DbError::Validation(_))));
        assert!(store.list_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = InMemoryStore::new(dec!(100000));
        let id = Uuid::new_v4();

        assert!(matches!(store.get_trade(id).await, Err(DbError::NotFound)));
        assert!(matches!(store.delete_trade(id).await, Err(DbError::NotFound)));
        assert!(matches!(
            store.update_trade(id, TradeUpdate::default()).await,
            Err(DbError::NotFound)
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_trade() {
        let store = InMemoryStore::new(dec!(100000));
        let trade = store.create_trade(entry("SBIN")).await.unwrap();

        store.delete_trade(trade.id).await.unwrap();

        assert!(store.list_trades().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn capital_is_created_lazily_and_updated_in_place() {
        let store = InMemoryStore::new(dec!(100000));

        let first = store.get_capital().await.unwrap();
        assert_eq!(first.total_capital, dec!(100000));
        assert_eq!(store.get_capital().await.unwrap(), first);

        let updated = store.set_capital(dec!(250000)).await.unwrap();
        assert_eq!(updated.total_capital, dec!(250000));
        assert_eq!(store.get_capital().await.unwrap().total_capital, dec!(250000));
    }

    #[tokio::test]
    async fn negative_capital_is_rejected() {
        let store = InMemoryStore::new(dec!(100000));

        assert!(matches!(store.set_capital(dec!(-5)).await, Err(DbError::Validation(_))));
        assert_eq!(store.get_capital().await.unwrap().total_capital, dec!(100000));
    }
}
