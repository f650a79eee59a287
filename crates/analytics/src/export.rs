use crate::engine::AnalyticsEngine;
use crate::error::AnalyticsError;
use core_types::Trade;
use std::io::Write;

const CSV_HEADER: [&str; 9] = [
    "Scrip",
    "Quantity",
    "Buy Price",
    "Sell Price",
    "P&L",
    "Return %",
    "Buy Date",
    "Sell Date",
    "Status",
];

impl AnalyticsEngine {
    /// Writes the ledger as CSV, one row per trade with its booked P&L.
    pub fn write_trades_csv<W: Write>(&self, trades: &[Trade], writer: W) -> Result<(), AnalyticsError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(CSV_HEADER)?;

        for trade in trades {
            let pl = self.calculate_pl(trade);
            wtr.write_record([
                trade.scrip_name.clone(),
                trade.quantity.to_string(),
                trade.buy_price.to_string(),
                trade.sell_price.map_or_else(|| "N/A".to_string(), |p| p.to_string()),
                pl.amount.round_dp(2).to_string(),
                format!("{:.2}%", pl.percentage),
                trade.buy_date.to_string(),
                trade.sell_date.map_or_else(|| "Open".to_string(), |d| d.to_string()),
                trade.status().to_string(),
            ])?;
        }

        wtr.flush()?;
        Ok(())
    }

    /// Same as [`AnalyticsEngine::write_trades_csv`], collected into a `String`.
    pub fn trades_csv(&self, trades: &[Trade]) -> Result<String, AnalyticsError> {
        let mut buffer = Vec::new();
        self.write_trades_csv(trades, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn trade(scrip: &str, sold: bool) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            scrip_name: scrip.to_string(),
            quantity: dec!(100),
            buy_price: dec!(1250.75),
            sell_price: sold.then_some(dec!(1340.25)),
            buy_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            sell_date: sold.then(|| NaiveDate::from_ymd_opt(2024, 2, 20).unwrap()),
            is_open: !sold,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn exports_header_and_one_row_per_trade() {
        let engine = AnalyticsEngine::new();
        let csv = engine
            .trades_csv(&[trade("TCS", true), trade("M&M, Ltd", false)])
            .unwrap();
        let lines: Vec<&str> = csv.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "Scrip,Quantity,Buy Price,Sell Price,P&L,Return %,Buy Date,Sell Date,Status"
        );
        assert_eq!(
            lines[1],
            "TCS,100,1250.75,1340.25,8950.00,7.16%,2024-01-15,2024-02-20,Completed"
        );
        assert_eq!(
            lines[2],
            "\"M&M, Ltd\",100,1250.75,N/A,0,0.00%,2024-01-15,Open,Open"
        );
    }

    #[test]
    fn empty_ledger_exports_only_the_header() {
        let csv = AnalyticsEngine::new().trades_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
    }
}
