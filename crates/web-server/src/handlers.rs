use crate::{AppState, error::AppError};
use analytics::{QuarterlyReport, TradeMetrics, YearlyStats};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::{Datelike, Utc};
use core_types::{CapitalSettings, NewTrade, Quarter, Trade, TradeStatus, TradeUpdate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Default, Deserialize)]
pub struct StatusFilter {
    status: Option<String>,
}

impl StatusFilter {
    /// `None`, an empty string and "all" all mean no filtering.
    fn parse(&self) -> Result<Option<TradeStatus>, AppError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
            Some(s) => Ok(Some(s.parse()?)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    year: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CapitalRequest {
    pub total_capital: Decimal,
}

/// A year's quarters together with the standout quarters.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuarterlyInsights {
    #[serde(flatten)]
    pub report: QuarterlyReport,
    pub best_quarter: Quarter,
    pub worst_quarter: Quarter,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YearlyInsights {
    pub years: Vec<YearlyStats>,
    pub best_year: Option<YearlyStats>,
    pub worst_year: Option<YearlyStats>,
}

fn filter_trades(trades: Vec<Trade>, status: Option<TradeStatus>) -> Vec<Trade> {
    match status {
        Some(status) => trades.into_iter().filter(|t| t.status() == status).collect(),
        None => trades,
    }
}

/// # GET /api/trades
pub async fn list_trades(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(filter), _): WithRejection<Query<StatusFilter>, AppError>,
) -> Result<Json<Vec<Trade>>, AppError> {
    let status = filter.parse()?;
    let trades = state.store.list_trades().await?;
    Ok(Json(filter_trades(trades, status)))
}

/// # GET /api/trades/:id
pub async fn get_trade(
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Trade>, AppError> {
    let trade = state.store.get_trade(id).await?;
    Ok(Json(trade))
}

/// # POST /api/trades
pub async fn create_trade(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(entry), _): WithRejection<Json<NewTrade>, AppError>,
) -> Result<(StatusCode, Json<Trade>), AppError> {
    let trade = state.store.create_trade(entry).await?;
    Ok((StatusCode::CREATED, Json(trade)))
}

/// # PATCH /api/trades/:id
pub async fn update_trade(
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    State(state): State<Arc<AppState>>,
    WithRejection(Json(update), _): WithRejection<Json<TradeUpdate>, AppError>,
) -> Result<Json<Trade>, AppError> {
    let trade = state.store.update_trade(id, update).await?;
    Ok(Json(trade))
}

/// # DELETE /api/trades/:id
pub async fn delete_trade(
    WithRejection(Path(id), _): WithRejection<Path<Uuid>, AppError>,
    State(state): State<Arc<AppState>>,
) -> Result<StatusCode, AppError> {
    state.store.delete_trade(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// # GET /api/trades/export
/// Downloads the (optionally filtered) ledger as `trades.csv`.
pub async fn export_trades(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(filter), _): WithRejection<Query<StatusFilter>, AppError>,
) -> Result<impl IntoResponse, AppError> {
    let status = filter.parse()?;
    let trades = filter_trades(state.store.list_trades().await?, status);
    let csv = state.engine.trades_csv(&trades)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"trades.csv\""),
        ],
        csv,
    ))
}

/// # GET /api/capital
pub async fn get_capital(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CapitalSettings>, AppError> {
    let settings = state.store.get_capital().await?;
    Ok(Json(settings))
}

/// # POST /api/capital
pub async fn update_capital(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(request), _): WithRejection<Json<CapitalRequest>, AppError>,
) -> Result<Json<CapitalSettings>, AppError> {
    let settings = state.store.set_capital(request.total_capital).await?;
    Ok(Json(settings))
}

/// # GET /api/metrics
/// Dashboard summary over every trade and the current capital.
pub async fn get_metrics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TradeMetrics>, AppError> {
    let (trades, capital) = tokio::join!(state.store.list_trades(), state.store.get_capital());
    let metrics = state
        .engine
        .calculate_trade_metrics(&trades?, capital?.total_capital);
    Ok(Json(metrics))
}

/// # GET /api/analytics/years
pub async fn get_years(State(state): State<Arc<AppState>>) -> Result<Json<Vec<i32>>, AppError> {
    let trades = state.store.list_trades().await?;
    Ok(Json(state.engine.trade_years(&trades)))
}

/// # GET /api/analytics/quarterly?year=2024
/// Defaults to the current calendar year.
pub async fn get_quarterly(
    State(state): State<Arc<AppState>>,
    WithRejection(Query(query), _): WithRejection<Query<YearQuery>, AppError>,
) -> Result<Json<QuarterlyInsights>, AppError> {
    let year = query.year.unwrap_or_else(|| Utc::now().year());
    let trades = state.store.list_trades().await?;
    let report = state.engine.quarterly_analytics(&trades, year);

    Ok(Json(QuarterlyInsights {
        best_quarter: report.best().quarter,
        worst_quarter: report.worst().quarter,
        report,
    }))
}

/// # GET /api/analytics/yearly
pub async fn get_yearly(
    State(state): State<Arc<AppState>>,
) -> Result<Json<YearlyInsights>, AppError> {
    let trades = state.store.list_trades().await?;
    let years = state.engine.yearly_analytics(&trades);

    Ok(Json(YearlyInsights {
        best_year: state.engine.best_year(&years).cloned(),
        worst_year: state.engine.worst_year(&years).cloned(),
        years,
    }))
}
