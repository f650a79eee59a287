use analytics::{AnalyticsEngine, QuarterlyReport, TradeMetrics, YearlyStats};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use core_types::Trade;
use rust_decimal::Decimal;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Green for gains, red for losses.
fn signed_cell(value: Decimal, suffix: &str) -> Cell {
    let cell = Cell::new(format!("{:.2}{}", value, suffix));
    if value > Decimal::ZERO {
        cell.fg(Color::Green)
    } else if value < Decimal::ZERO {
        cell.fg(Color::Red)
    } else {
        cell
    }
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value)
}

pub fn trades_table(engine: &AnalyticsEngine, trades: &[Trade]) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        "Scrip", "Qty", "Buy", "Sell", "Buy Date", "Sell Date", "P&L", "Return", "Status",
    ]);

    for trade in trades {
        let pl = engine.calculate_pl(trade);
        table.add_row(vec![
            Cell::new(&trade.scrip_name),
            Cell::new(trade.quantity),
            Cell::new(money(trade.buy_price)),
            Cell::new(trade.sell_price.map_or_else(|| "-".to_string(), money)),
            Cell::new(trade.buy_date),
            Cell::new(trade.sell_date.map_or_else(|| "-".to_string(), |d| d.to_string())),
            signed_cell(pl.amount, ""),
            signed_cell(pl.percentage, "%"),
            Cell::new(trade.status()),
        ]);
    }
    table
}

pub fn metrics_table(metrics: &TradeMetrics) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    table
        .add_row(vec![Cell::new("Total Capital"), Cell::new(money(metrics.total_capital))])
        .add_row(vec![Cell::new("Deployed Capital"), Cell::new(money(metrics.deployed_capital))])
        .add_row(vec![Cell::new("Free Capital"), Cell::new(money(metrics.free_capital))])
        .add_row(vec![
            Cell::new("Capital Utilization"),
            Cell::new(format!("{:.2}%", metrics.capital_utilization)),
        ])
        .add_row(vec![Cell::new("Booked P&L"), signed_cell(metrics.booked_pl, "")])
        .add_row(vec![Cell::new("Total Return"), signed_cell(metrics.total_return, "%")])
        .add_row(vec![Cell::new("Open Value"), Cell::new(money(metrics.open_value))])
        .add_row(vec![Cell::new("Portfolio Value"), Cell::new(money(metrics.total_portfolio_value))])
        .add_row(vec![Cell::new("Total Trades"), Cell::new(metrics.total_trades)])
        .add_row(vec![Cell::new("Open Positions"), Cell::new(metrics.open_positions)])
        .add_row(vec![Cell::new("Completed Trades"), Cell::new(metrics.completed_trades)])
        .add_row(vec![Cell::new("Winning Trades"), Cell::new(metrics.winning_trades)])
        .add_row(vec![Cell::new("Win Rate"), Cell::new(format!("{:.2}%", metrics.win_rate))]);
    table
}

pub fn quarterly_table(report: &QuarterlyReport) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Quarter", "Trades", "Open", "Investment", "Booked P&L", "Return"]);

    for stats in report.iter() {
        table.add_row(vec![
            Cell::new(stats.quarter.label()),
            Cell::new(stats.total_trades),
            Cell::new(stats.open_positions),
            Cell::new(money(stats.total_investment)),
            signed_cell(stats.booked_pl, ""),
            signed_cell(stats.return_percentage, "%"),
        ]);
    }
    table
}

pub fn yearly_table(years: &[YearlyStats]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Year", "Trades", "Open", "Investment", "Booked P&L", "Return"]);

    for stats in years {
        table.add_row(vec![
            Cell::new(stats.year),
            Cell::new(stats.total_trades),
            Cell::new(stats.open_positions),
            Cell::new(money(stats.total_investment)),
            signed_cell(stats.booked_pl, ""),
            signed_cell(stats.return_percentage, "%"),
        ]);
    }
    table
}
