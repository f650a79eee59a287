use core_types::Quarter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Profit and loss of a single trade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlBreakdown {
    pub amount: Decimal,
    pub percentage: Decimal,
    pub total_buy_value: Decimal,
    pub total_sell_value: Decimal,
}

/// Portfolio-wide summary of the ledger against the trader's capital.
///
/// This is the payload behind the dashboard summary cards and the capital
/// allocation view. Percentages are in the 0-100 range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeMetrics {
    // I. Profitability
    pub total_pl: Decimal, // Always equal to booked_pl; open positions are not marked to market
    pub booked_pl: Decimal,
    pub total_return: Decimal,

    // II. Capital
    pub total_capital: Decimal,
    pub deployed_capital: Decimal,
    pub free_capital: Decimal,
    pub capital_utilization: Decimal,
    pub open_value: Decimal,
    pub total_portfolio_value: Decimal,

    // III. Trade Counts
    pub total_trades: usize,
    pub open_positions: usize,
    pub completed_trades: usize,
    pub winning_trades: usize,
    pub win_rate: Decimal,
}

impl TradeMetrics {
    /// Creates a zeroed-out report for the given capital figure.
    pub fn new(total_capital: Decimal) -> Self {
        Self {
            total_pl: Decimal::ZERO,
            booked_pl: Decimal::ZERO,
            total_return: Decimal::ZERO,
            total_capital,
            deployed_capital: Decimal::ZERO,
            free_capital: Decimal::ZERO,
            capital_utilization: Decimal::ZERO,
            open_value: Decimal::ZERO,
            total_portfolio_value: Decimal::ZERO,
            total_trades: 0,
            open_positions: 0,
            completed_trades: 0,
            winning_trades: 0,
            win_rate: Decimal::ZERO,
        }
    }
}

impl Default for TradeMetrics {
    fn default() -> Self {
        Self::new(Decimal::ZERO)
    }
}

/// Statistics for the trades bought within one calendar quarter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterStats {
    pub quarter: Quarter,
    pub booked_pl: Decimal,
    pub open_positions: usize,
    pub total_investment: Decimal,
    pub return_percentage: Decimal,
    pub total_trades: usize,
}

impl QuarterStats {
    pub fn empty(quarter: Quarter) -> Self {
        Self {
            quarter,
            booked_pl: Decimal::ZERO,
            open_positions: 0,
            total_investment: Decimal::ZERO,
            return_percentage: Decimal::ZERO,
            total_trades: 0,
        }
    }
}

/// The four quarters of one year, always in Q1..Q4 order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyReport {
    pub year: i32,
    pub quarters: [QuarterStats; 4],
}

impl QuarterlyReport {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            quarters: Quarter::ALL.map(QuarterStats::empty),
        }
    }

    pub fn get(&self, quarter: Quarter) -> &QuarterStats {
        &self.quarters[quarter.index()]
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &QuarterStats> {
        self.quarters.iter()
    }

    /// The quarter with the highest return. The earliest one wins a tie.
    pub fn best(&self) -> &QuarterStats {
        self.quarters[1..].iter().fold(&self.quarters[0], |best, q| {
            if q.return_percentage > best.return_percentage { q } else { best }
        })
    }

    /// The quarter with the lowest return. The earliest one wins a tie.
    pub fn worst(&self) -> &QuarterStats {
        self.quarters[1..].iter().fold(&self.quarters[0], |worst, q| {
            if q.return_percentage < worst.return_percentage { q } else { worst }
        })
    }
}

/// A year's quarters rolled up into one row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyStats {
    pub year: i32,
    pub booked_pl: Decimal,
    pub open_positions: usize,
    pub total_investment: Decimal,
    pub return_percentage: Decimal,
    pub total_trades: usize,
}
