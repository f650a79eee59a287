use crate::enums::TradeStatus;
use crate::error::CoreError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One buy, or one completed buy-sell round trip, as recorded in the ledger.
///
/// `is_open` is stored alongside the sell fields rather than derived on read.
/// It is recomputed whenever a trade is created through [`Trade::new`] or
/// mutated through [`Trade::apply`], and aggregations trust the stored flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: Uuid,
    pub scrip_name: String,
    pub quantity: Decimal,
    pub buy_price: Decimal,
    pub sell_price: Option<Decimal>,
    pub buy_date: NaiveDate,
    pub sell_date: Option<NaiveDate>,
    pub is_open: bool,
    pub created_at: DateTime<Utc>,
}

/// The fields a user supplies when entering a new trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrade {
    pub scrip_name: String,
    pub quantity: Decimal,
    pub buy_price: Decimal,
    #[serde(default)]
    pub sell_price: Option<Decimal>,
    pub buy_date: NaiveDate,
    #[serde(default)]
    pub sell_date: Option<NaiveDate>,
}

/// A partial edit of an existing trade. Absent fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeUpdate {
    pub scrip_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub buy_price: Option<Decimal>,
    pub sell_price: Option<Decimal>,
    pub buy_date: Option<NaiveDate>,
    pub sell_date: Option<NaiveDate>,
}

/// The trader's total deployable capital. There is only ever one of these.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CapitalSettings {
    pub total_capital: Decimal,
    pub updated_at: DateTime<Utc>,
}

impl NewTrade {
    /// Checks the positivity and presence rules for a trade entry.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.scrip_name.trim().is_empty() {
            return Err(CoreError::InvalidInput(
                "scripName".to_string(),
                "scrip name is required".to_string(),
            ));
        }
        ensure_positive("quantity", self.quantity)?;
        ensure_positive("buyPrice", self.buy_price)?;
        if let Some(sell_price) = self.sell_price {
            ensure_positive("sellPrice", sell_price)?;
        }
        Ok(())
    }
}

impl TradeUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TradeUpdate::default()
    }
}

impl Trade {
    /// Creates a validated trade with a fresh id and creation timestamp.
    pub fn new(entry: NewTrade) -> Result<Self, CoreError> {
        entry.validate()?;
        let is_open = Self::derive_is_open(entry.sell_price, entry.sell_date);

        Ok(Self {
            id: Uuid::new_v4(),
            scrip_name: entry.scrip_name.trim().to_string(),
            quantity: entry.quantity,
            buy_price: entry.buy_price,
            sell_price: entry.sell_price,
            buy_date: entry.buy_date,
            sell_date: entry.sell_date,
            is_open,
            created_at: Utc::now(),
        })
    }

    /// A position stays open until both a sell price and a sell date are recorded.
    pub fn derive_is_open(sell_price: Option<Decimal>, sell_date: Option<NaiveDate>) -> bool {
        sell_price.is_none() || sell_date.is_none()
    }

    /// Merges `update` into this trade and recomputes `is_open`.
    ///
    /// The merged record is validated before anything is written, so a
    /// rejected update leaves the trade untouched. `id` and `created_at`
    /// never change.
    pub fn apply(&mut self, update: TradeUpdate) -> Result<(), CoreError> {
        let merged = NewTrade {
            scrip_name: update.scrip_name.unwrap_or_else(|| self.scrip_name.clone()),
            quantity: update.quantity.unwrap_or(self.quantity),
            buy_price: update.buy_price.unwrap_or(self.buy_price),
            sell_price: update.sell_price.or(self.sell_price),
            buy_date: update.buy_date.unwrap_or(self.buy_date),
            sell_date: update.sell_date.or(self.sell_date),
        };
        merged.validate()?;

        self.scrip_name = merged.scrip_name.trim().to_string();
        self.quantity = merged.quantity;
        self.buy_price = merged.buy_price;
        self.sell_price = merged.sell_price;
        self.buy_date = merged.buy_date;
        self.sell_date = merged.sell_date;
        self.is_open = Self::derive_is_open(self.sell_price, self.sell_date);
        Ok(())
    }

    pub fn status(&self) -> TradeStatus {
        TradeStatus::of(self.is_open)
    }

    /// True when the stored `is_open` flag agrees with the sell fields.
    pub fn is_consistent(&self) -> bool {
        self.is_open == Self::derive_is_open(self.sell_price, self.sell_date)
    }
}

impl CapitalSettings {
    pub fn new(total_capital: Decimal) -> Result<Self, CoreError> {
        Ok(Self {
            total_capital: Self::validate_amount(total_capital)?,
            updated_at: Utc::now(),
        })
    }

    /// Capital may be zero but never negative.
    pub fn validate_amount(total_capital: Decimal) -> Result<Decimal, CoreError> {
        if total_capital < Decimal::ZERO {
            return Err(CoreError::InvalidInput(
                "totalCapital".to_string(),
                "capital must be a positive number".to_string(),
            ));
        }
        ensure_storable("totalCapital", total_capital, max_capital())?;
        Ok(total_capital)
    }
}

/// Trade amounts are stored as NUMERIC(14, 2).
fn max_trade_amount() -> Decimal {
    Decimal::new(99_999_999_999_999, 2)
}

/// Capital is stored as NUMERIC(16, 2).
fn max_capital() -> Decimal {
    Decimal::from_i128_with_scale(9_999_999_999_999_999, 2)
}

fn ensure_positive(field: &str, value: Decimal) -> Result<(), CoreError> {
    if value <= Decimal::ZERO {
        return Err(CoreError::InvalidInput(
            field.to_string(),
            format!("{} must be positive", field),
        ));
    }
    ensure_storable(field, value, max_trade_amount())
}

/// At most two decimal places and no larger than the column allows.
fn ensure_storable(field: &str, value: Decimal, max: Decimal) -> Result<(), CoreError> {
    if value.normalize().scale() > 2 {
        return Err(CoreError::InvalidInput(
            field.to_string(),
            format!("{} allows at most two decimal places", field),
        ));
    }
    if value > max {
        return Err(CoreError::InvalidInput(
            field.to_string(),
            format!("{} must not exceed {}", field, max),
        ));
    }
    Ok(())
}
