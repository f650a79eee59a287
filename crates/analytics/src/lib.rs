//! # Tradebook Analytics Engine
//!
//! This crate turns the trade ledger into the numbers shown on the dashboard:
//! per-trade P&L, portfolio-wide metrics, and quarterly/yearly returns.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of storage or HTTP. It depends
//!   only on `core-types`.
//! - **Stateless Calculation:** The `AnalyticsEngine` takes a snapshot of trades
//!   (and the capital figure) and returns fresh reports on every call. Nothing is
//!   cached, so callers may recompute as often as they like.
//! - **No Mark-to-Market:** Open positions contribute zero P&L. Only booked
//!   (closed) trades move the profit figures.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: The calculator.
//! - `TradeMetrics`, `PlBreakdown`, `QuarterlyReport`, `QuarterStats`, `YearlyStats`: Its outputs.
//! - `AnalyticsError`: Returned only by the CSV export.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod error;
pub mod export;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use report::{PlBreakdown, QuarterStats, QuarterlyReport, TradeMetrics, YearlyStats};
