use crate::report::{PlBreakdown, QuarterStats, QuarterlyReport, TradeMetrics, YearlyStats};
use chrono::Datelike;
use core_types::{Quarter, Trade};
use rust_decimal::Decimal;
use std::collections::BTreeSet;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// A stateless calculator for deriving ledger metrics from recorded trades.
///
/// Every method is a pure function of its arguments. Malformed records are
/// logged and folded in with a zero contribution instead of failing the whole
/// calculation.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calculates the booked profit or loss of a single trade.
    ///
    /// A trade only has P&L once it is closed (`is_open` is false) and carries
    /// a sell price. Open positions report zero, there is no price feed to
    /// mark them against.
    pub fn calculate_pl(&self, trade: &Trade) -> PlBreakdown {
        let total_buy_value = checked_value(trade, trade.buy_price);

        match trade.sell_price {
            Some(sell_price) if !trade.is_open => {
                let total_sell_value = checked_value(trade, sell_price);
                let amount = total_sell_value
                    .checked_sub(total_buy_value)
                    .unwrap_or_else(|| {
                        tracing::warn!(trade_id = %trade.id, "Trade P&L overflowed; counting it as zero.");
                        Decimal::ZERO
                    });
                PlBreakdown {
                    amount,
                    percentage: percentage_of(amount, total_buy_value),
                    total_buy_value,
                    total_sell_value,
                }
            }
            _ => PlBreakdown {
                amount: Decimal::ZERO,
                percentage: Decimal::ZERO,
                total_buy_value,
                total_sell_value: Decimal::ZERO,
            },
        }
    }

    /// Summarises the whole ledger against the trader's total capital.
    ///
    /// # Arguments
    ///
    /// * `trades` - Every trade in the ledger, open and closed, in any order.
    /// * `total_capital` - The trader's deployable capital.
    pub fn calculate_trade_metrics(&self, trades: &[Trade], total_capital: Decimal) -> TradeMetrics {
        let mut metrics = TradeMetrics::new(total_capital);
        metrics.total_trades = trades.len();

        for trade in trades {
            warn_if_inconsistent(trade);
            let pl = self.calculate_pl(trade);
            accumulate(&mut metrics.total_portfolio_value, pl.total_buy_value, trade);

            if trade.is_open {
                metrics.open_positions += 1;
                accumulate(&mut metrics.deployed_capital, pl.total_buy_value, trade);
            } else {
                metrics.completed_trades += 1;
                accumulate(&mut metrics.booked_pl, pl.amount, trade);
                if pl.amount > Decimal::ZERO {
                    metrics.winning_trades += 1;
                }
            }
        }

        metrics.open_value = metrics.deployed_capital;
        metrics.total_pl = metrics.booked_pl;
        metrics.free_capital = total_capital
            .checked_sub(metrics.deployed_capital)
            .unwrap_or(Decimal::ZERO)
            .max(Decimal::ZERO);
        metrics.capital_utilization = percentage_of(metrics.deployed_capital, total_capital);
        metrics.total_return = percentage_of(metrics.booked_pl, total_capital);
        metrics.win_rate = percentage_of(
            Decimal::from(metrics.winning_trades),
            Decimal::from(metrics.completed_trades),
        );

        metrics
    }

    /// Buckets the trades bought in `year` into calendar quarters.
    ///
    /// A trade belongs to the quarter of its buy date, regardless of when it
    /// was sold. All four quarters are present even when empty.
    pub fn quarterly_analytics(&self, trades: &[Trade], year: i32) -> QuarterlyReport {
        let mut report = QuarterlyReport::empty(year);

        for trade in trades.iter().filter(|t| t.buy_date.year() == year) {
            let pl = self.calculate_pl(trade);
            let stats = &mut report.quarters[Quarter::of(trade.buy_date).index()];

            stats.total_trades += 1;
            accumulate(&mut stats.total_investment, pl.total_buy_value, trade);
            if trade.is_open {
                stats.open_positions += 1;
            } else {
                accumulate(&mut stats.booked_pl, pl.amount, trade);
            }
        }

        for stats in report.quarters.iter_mut() {
            stats.return_percentage = percentage_of(stats.booked_pl, stats.total_investment);
        }

        report
    }

    /// Distinct buy years present in the ledger, oldest first.
    pub fn trade_years(&self, trades: &[Trade]) -> Vec<i32> {
        trades
            .iter()
            .map(|t| t.buy_date.year())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// One roll-up row per buy year, oldest first.
    pub fn yearly_analytics(&self, trades: &[Trade]) -> Vec<YearlyStats> {
        self.trade_years(trades)
            .into_iter()
            .map(|year| roll_up(&self.quarterly_analytics(trades, year)))
            .collect()
    }

    /// The year with the highest return. The earliest one wins a tie.
    pub fn best_year<'a>(&self, years: &'a [YearlyStats]) -> Option<&'a YearlyStats> {
        years.iter().reduce(|best, y| {
            if y.return_percentage > best.return_percentage { y } else { best }
        })
    }

    /// The year with the lowest return. The earliest one wins a tie.
    pub fn worst_year<'a>(&self, years: &'a [YearlyStats]) -> Option<&'a YearlyStats> {
        years.iter().reduce(|worst, y| {
            if y.return_percentage < worst.return_percentage { y } else { worst }
        })
    }
}

fn roll_up(report: &QuarterlyReport) -> YearlyStats {
    let mut yearly = YearlyStats {
        year: report.year,
        booked_pl: Decimal::ZERO,
        open_positions: 0,
        total_investment: Decimal::ZERO,
        return_percentage: Decimal::ZERO,
        total_trades: 0,
    };

    for q in report.iter() {
        yearly.total_trades += q.total_trades;
        yearly.open_positions += q.open_positions;
        add_quarter(&mut yearly.booked_pl, q, report.year, q.booked_pl);
        add_quarter(&mut yearly.total_investment, q, report.year, q.total_investment);
    }

    yearly.return_percentage = percentage_of(yearly.booked_pl, yearly.total_investment);
    yearly
}

/// Adds one trade's contribution to a running total. An addition that would
/// overflow is logged and the contribution counts as zero.
fn accumulate(total: &mut Decimal, value: Decimal, trade: &Trade) {
    match total.checked_add(value) {
        Some(sum) => *total = sum,
        None => tracing::warn!(trade_id = %trade.id, %value, "Running total overflowed; counting the trade as zero."),
    }
}

fn add_quarter(total: &mut Decimal, stats: &QuarterStats, year: i32, value: Decimal) {
    match total.checked_add(value) {
        Some(sum) => *total = sum,
        None => tracing::warn!(year, quarter = %stats.quarter, %value, "Yearly total overflowed; counting the quarter as zero."),
    }
}

/// `part / whole * 100`, or zero when `whole` is not positive or the result overflows.
fn percentage_of(part: Decimal, whole: Decimal) -> Decimal {
    if whole <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

/// `price * quantity`, or zero if the product does not fit in a Decimal.
fn checked_value(trade: &Trade, price: Decimal) -> Decimal {
    price.checked_mul(trade.quantity).unwrap_or_else(|| {
        tracing::warn!(trade_id = %trade.id, %price, quantity = %trade.quantity, "Trade value overflowed; counting it as zero.");
        Decimal::ZERO
    })
}

fn warn_if_inconsistent(trade: &Trade) {
    if !trade.is_consistent() {
        tracing::warn!(
            trade_id = %trade.id,
            is_open = trade.is_open,
            has_sell_price = trade.sell_price.is_some(),
            has_sell_date = trade.sell_date.is_some(),
            "Trade status disagrees with its sell fields; using the stored flag."
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn open_trade(quantity: Decimal, buy: Decimal, buy_date: NaiveDate) -> Trade {
        Trade {
            id: Uuid::new_v4(),
            scrip_name: "RELIANCE".to_string(),
            quantity,
            buy_price: buy,
            sell_price: None,
            buy_date,
            sell_date: None,
            is_open: true,
            created_at: Utc::now(),
        }
    }

    fn closed_trade(quantity: Decimal, buy: Decimal, sell: Decimal, buy_date: NaiveDate) -> Trade {
        Trade {
            sell_price: Some(sell),
            sell_date: Some(buy_date + chrono::Duration::days(20)),
            is_open: false,
            ..open_trade(quantity, buy, buy_date)
        }
    }

    #[test]
    fn closed_trade_pl_is_quantity_times_spread() {
        let engine = AnalyticsEngine::new();
        let trade = closed_trade(dec!(100), dec!(1250.75), dec!(1340.25), day(2024, 2, 12));

        let pl = engine.calculate_pl(&trade);

        assert_eq!(pl.amount, dec!(8950.00));
        assert_eq!(pl.amount, trade.quantity * (dec!(1340.25) - dec!(1250.75)));
        assert_eq!(pl.total_buy_value, dec!(125075.00));
        assert_eq!(pl.total_sell_value, dec!(134025.00));
        assert!((pl.percentage - dec!(7.1557)).abs() < dec!(0.0001));
    }

    #[test]
    fn losing_trade_has_negative_pl() {
        let engine = AnalyticsEngine::new();
        let trade = closed_trade(dec!(10), dec!(500), dec!(460), day(2024, 1, 5));

        let pl = engine.calculate_pl(&trade);

        assert_eq!(pl.amount, dec!(-400));
        assert_eq!(pl.percentage, dec!(-8));
    }

    #[test]
    fn open_trade_reports_zero_pl() {
        let engine = AnalyticsEngine::new();
        let trade = open_trade(dec!(50), dec!(200), day(2024, 6, 1));

        let pl = engine.calculate_pl(&trade);

        assert_eq!(pl.amount, Decimal::ZERO);
        assert_eq!(pl.percentage, Decimal::ZERO);
        assert_eq!(pl.total_sell_value, Decimal::ZERO);
        assert_eq!(pl.total_buy_value, dec!(10000));
    }

    #[test]
    fn sell_price_on_an_open_trade_is_ignored() {
        let engine = AnalyticsEngine::new();
        let mut trade = open_trade(dec!(10), dec!(100), day(2024, 6, 1));
        trade.sell_price = Some(dec!(150));

        assert_eq!(engine.calculate_pl(&trade).amount, Decimal::ZERO);
    }

    #[test]
    fn closed_flag_without_sell_price_contributes_zero() {
        let engine = AnalyticsEngine::new();
        let mut trade = open_trade(dec!(10), dec!(100), day(2024, 6, 1));
        trade.is_open = false;

        let metrics = engine.calculate_trade_metrics(&[trade], dec!(10000));

        assert_eq!(metrics.completed_trades, 1);
        assert_eq!(metrics.booked_pl, Decimal::ZERO);
        assert_eq!(metrics.deployed_capital, Decimal::ZERO);
        assert_eq!(metrics.win_rate, Decimal::ZERO);
    }

    #[test]
    fn zero_buy_value_does_not_divide_by_zero() {
        let engine = AnalyticsEngine::new();
        let trade = closed_trade(dec!(10), Decimal::ZERO, dec!(5), day(2024, 1, 1));

        let pl = engine.calculate_pl(&trade);

        assert_eq!(pl.amount, dec!(50));
        assert_eq!(pl.percentage, Decimal::ZERO);
    }

    #[test]
    fn overflowing_value_counts_as_zero() {
        let engine = AnalyticsEngine::new();
        let trade = open_trade(Decimal::MAX, Decimal::MAX, day(2024, 1, 1));

        assert_eq!(engine.calculate_pl(&trade).total_buy_value, Decimal::ZERO);
    }

    #[test]
    fn overflowing_totals_skip_the_offending_trade() {
        let engine = AnalyticsEngine::new();
        let huge = Decimal::MAX / dec!(2) + Decimal::ONE;
        let trades = vec![
            open_trade(huge, Decimal::ONE, day(2024, 1, 10)),
            open_trade(huge, Decimal::ONE, day(2024, 2, 10)),
        ];

        let metrics = engine.calculate_trade_metrics(&trades, dec!(100000));
        assert_eq!(metrics.open_positions, 2);
        assert_eq!(metrics.deployed_capital, huge);
        assert_eq!(metrics.total_portfolio_value, huge);
        assert_eq!(metrics.free_capital, Decimal::ZERO);

        let report = engine.quarterly_analytics(&trades, 2024);
        assert_eq!(report.get(Quarter::Q1).total_trades, 2);
        assert_eq!(report.get(Quarter::Q1).total_investment, huge);
    }

    #[test]
    fn overflowing_booked_pl_skips_the_offending_trade() {
        let engine = AnalyticsEngine::new();
        let half = Decimal::MAX / dec!(2);
        let trades = vec![
            closed_trade(Decimal::ONE, Decimal::ONE, half, day(2023, 3, 1)),
            closed_trade(Decimal::ONE, Decimal::ONE, half, day(2023, 3, 2)),
            closed_trade(Decimal::ONE, Decimal::ONE, half, day(2023, 5, 2)),
        ];

        let metrics = engine.calculate_trade_metrics(&trades, dec!(100000));
        assert_eq!(metrics.completed_trades, 3);
        assert_eq!(metrics.winning_trades, 3);
        assert!(metrics.booked_pl > Decimal::ZERO);

        let years = engine.yearly_analytics(&trades);
        assert_eq!(years.len(), 1);
        assert_eq!(years[0].total_trades, 3);
        assert_eq!(years[0].booked_pl, (half - Decimal::ONE) * dec!(2));
    }

    #[test]
    fn empty_ledger_has_zero_metrics() {
        let engine = AnalyticsEngine::new();

        let metrics = engine.calculate_trade_metrics(&[], dec!(100000));

        assert_eq!(metrics.total_trades, 0);
        assert_eq!(metrics.win_rate, Decimal::ZERO);
        assert_eq!(metrics.total_return, Decimal::ZERO);
        assert_eq!(metrics.capital_utilization, Decimal::ZERO);
        assert_eq!(metrics.free_capital, dec!(100000));
        assert_eq!(metrics.total_capital, dec!(100000));
    }

    #[test]
    fn zero_capital_short_circuits_ratios() {
        let engine = AnalyticsEngine::new();
        let trades = vec![
            open_trade(dec!(10), dec!(100), day(2024, 3, 1)),
            closed_trade(dec!(10), dec!(100), dec!(120), day(2024, 3, 1)),
        ];

        let metrics = engine.calculate_trade_metrics(&trades, Decimal::ZERO);

        assert_eq!(metrics.capital_utilization, Decimal::ZERO);
        assert_eq!(metrics.total_return, Decimal::ZERO);
        assert_eq!(metrics.free_capital, Decimal::ZERO);
        assert_eq!(metrics.booked_pl, dec!(200));
    }

    #[test]
    fn half_deployed_capital() {
        let engine = AnalyticsEngine::new();
        let trades = vec![open_trade(dec!(100), dec!(500), day(2024, 4, 2))];

        let metrics = engine.calculate_trade_metrics(&trades, dec!(100000));

        assert_eq!(metrics.deployed_capital, dec!(50000));
        assert_eq!(metrics.open_value, dec!(50000));
        assert_eq!(metrics.free_capital, dec!(50000));
        assert_eq!(metrics.capital_utilization, dec!(50));
        assert_eq!(metrics.open_positions, 1);
    }

    #[test]
    fn over_deployed_capital_clamps_free_capital() {
        let engine = AnalyticsEngine::new();
        let trades = vec![open_trade(dec!(100), dec!(1500), day(2024, 4, 2))];

        let metrics = engine.calculate_trade_metrics(&trades, dec!(100000));

        assert_eq!(metrics.free_capital, Decimal::ZERO);
        assert_eq!(metrics.capital_utilization, dec!(150));
    }

    #[test]
    fn win_rate_and_return_use_closed_trades_only() {
        let engine = AnalyticsEngine::new();
        let trades = vec![
            closed_trade(dec!(10), dec!(500), dec!(600), day(2024, 1, 10)),
            closed_trade(dec!(10), dec!(500), dec!(460), day(2024, 2, 10)),
            closed_trade(dec!(1), dec!(100), dec!(100), day(2024, 2, 11)),
            closed_trade(dec!(5), dec!(100), dec!(140), day(2024, 3, 10)),
            open_trade(dec!(100), dec!(100), day(2024, 3, 15)),
        ];

        let metrics = engine.calculate_trade_metrics(&trades, dec!(20000));

        assert_eq!(metrics.total_trades, 5);
        assert_eq!(metrics.completed_trades, 4);
        assert_eq!(metrics.winning_trades, 2);
        assert_eq!(metrics.win_rate, dec!(50));
        assert_eq!(metrics.booked_pl, dec!(800));
        assert_eq!(metrics.total_pl, metrics.booked_pl);
        assert_eq!(metrics.total_return, dec!(4));
        assert_eq!(metrics.deployed_capital, dec!(10000));
        assert_eq!(metrics.total_portfolio_value, dec!(20600));
    }

    #[test]
    fn metrics_do_not_depend_on_order() {
        let engine = AnalyticsEngine::new();
        let mut trades = vec![
            closed_trade(dec!(10), dec!(500), dec!(600), day(2024, 1, 10)),
            open_trade(dec!(3), dec!(700), day(2023, 11, 1)),
            closed_trade(dec!(2), dec!(900), dec!(850), day(2022, 8, 9)),
        ];
        let forward = engine.calculate_trade_metrics(&trades, dec!(50000));
        trades.reverse();
        let backward = engine.calculate_trade_metrics(&trades, dec!(50000));

        assert_eq!(forward, backward);
    }

    #[test]
    fn quarterly_report_always_has_four_quarters() {
        let engine = AnalyticsEngine::new();

        let report = engine.quarterly_analytics(&[], 2024);

        assert_eq!(report.year, 2024);
        let quarters: Vec<Quarter> = report.iter().map(|q| q.quarter).collect();
        assert_eq!(quarters, Quarter::ALL.to_vec());
        assert!(report.iter().all(|q| q.total_trades == 0 && q.return_percentage.is_zero()));
    }

    #[test]
    fn quarterly_booked_pl_and_return() {
        let engine = AnalyticsEngine::new();
        let trades = vec![
            closed_trade(dec!(10), dec!(500), dec!(600), day(2024, 1, 10)),
            closed_trade(dec!(10), dec!(500), dec!(460), day(2024, 3, 28)),
        ];

        let report = engine.quarterly_analytics(&trades, 2024);
        let q1 = report.get(Quarter::Q1);

        assert_eq!(q1.total_investment, dec!(10000));
        assert_eq!(q1.booked_pl, dec!(600));
        assert_eq!(q1.return_percentage, dec!(6));
        assert_eq!(q1.total_trades, 2);
        assert_eq!(report.get(Quarter::Q2).total_trades, 0);
    }

    #[test]
    fn quarterly_counts_open_positions_in_investment() {
        let engine = AnalyticsEngine::new();
        let trades = vec![
            closed_trade(dec!(10), dec!(100), dec!(110), day(2024, 8, 1)),
            open_trade(dec!(10), dec!(100), day(2024, 9, 30)),
        ];

        let report = engine.quarterly_analytics(&trades, 2024);
        let q3 = report.get(Quarter::Q3);

        assert_eq!(q3.open_positions, 1);
        assert_eq!(q3.total_investment, dec!(2000));
        assert_eq!(q3.booked_pl, dec!(100));
        assert_eq!(q3.return_percentage, dec!(5));
    }

    #[test]
    fn trades_are_attributed_to_their_buy_year() {
        let engine = AnalyticsEngine::new();
        let mut trade = closed_trade(dec!(1), dec!(100), dec!(150), day(2023, 12, 20));
        trade.sell_date = Some(day(2024, 1, 15));

        let in_2023 = engine.quarterly_analytics(std::slice::from_ref(&trade), 2023);
        let in_2024 = engine.quarterly_analytics(std::slice::from_ref(&trade), 2024);

        assert_eq!(in_2023.get(Quarter::Q4).booked_pl, dec!(50));
        assert!(in_2024.iter().all(|q| q.total_trades == 0));
    }

    #[test]
    fn best_and_worst_quarter() {
        let engine = AnalyticsEngine::new();
        let trades = vec![
            closed_trade(dec!(10), dec!(100), dec!(90), day(2024, 2, 1)),
            closed_trade(dec!(10), dec!(100), dec!(130), day(2024, 5, 1)),
        ];

        let report = engine.quarterly_analytics(&trades, 2024);

        assert_eq!(report.best().quarter, Quarter::Q2);
        assert_eq!(report.worst().quarter, Quarter::Q1);
    }

    #[test]
    fn empty_year_picks_first_quarter_for_best_and_worst() {
        let report = AnalyticsEngine::new().quarterly_analytics(&[], 2024);

        assert_eq!(report.best().quarter, Quarter::Q1);
        assert_eq!(report.worst().quarter, Quarter::Q1);
    }

    #[test]
    fn yearly_rolls_up_each_buy_year() {
        let engine = AnalyticsEngine::new();
        let trades = vec![
            closed_trade(dec!(10), dec!(100), dec!(120), day(2024, 2, 1)),
            closed_trade(dec!(10), dec!(100), dec!(90), day(2022, 5, 1)),
            open_trade(dec!(10), dec!(100), day(2024, 11, 1)),
            closed_trade(dec!(10), dec!(100), dec!(110), day(2024, 7, 1)),
        ];

        assert_eq!(engine.trade_years(&trades), vec![2022, 2024]);

        let years = engine.yearly_analytics(&trades);
        assert_eq!(years.len(), 2);

        assert_eq!(years[0].year, 2022);
        assert_eq!(years[0].booked_pl, dec!(-100));
        assert_eq!(years[0].return_percentage, dec!(-10));

        assert_eq!(years[1].year, 2024);
        assert_eq!(years[1].total_trades, 3);
        assert_eq!(years[1].open_positions, 1);
        assert_eq!(years[1].total_investment, dec!(3000));
        assert_eq!(years[1].booked_pl, dec!(300));
        assert_eq!(years[1].return_percentage, dec!(10));

        assert_eq!(engine.best_year(&years).map(|y| y.year), Some(2024));
        assert_eq!(engine.worst_year(&years).map(|y| y.year), Some(2022));
    }

    #[test]
    fn no_years_means_no_best_year() {
        let engine = AnalyticsEngine::new();
        assert!(engine.yearly_analytics(&[]).is_empty());
        assert!(engine.best_year(&[]).is_none());
        assert!(engine.worst_year(&[]).is_none());
    }
}
