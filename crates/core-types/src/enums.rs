use crate::error::CoreError;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a trade is still holding a position or has been sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Open,
    Completed,
}

impl TradeStatus {
    /// Classifies a trade by its persisted `is_open` flag.
    pub fn of(is_open: bool) -> Self {
        if is_open {
            TradeStatus::Open
        } else {
            TradeStatus::Completed
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Open => "open",
            TradeStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "Open"),
            TradeStatus::Completed => write!(f, "Completed"),
        }
    }
}

impl FromStr for TradeStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(TradeStatus::Open),
            "completed" | "closed" => Ok(TradeStatus::Completed),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// A calendar quarter. Trades are bucketed by the month of their buy date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Quarter {
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    /// All quarters in calendar order.
    pub const ALL: [Quarter; 4] = [Quarter::Q1, Quarter::Q2, Quarter::Q3, Quarter::Q4];

    /// Maps a month of the year (1-12) onto its quarter.
    /// Anything past September lands in Q4.
    pub fn from_month(month: u32) -> Self {
        match month {
            1..=3 => Quarter::Q1,
            4..=6 => Quarter::Q2,
            7..=9 => Quarter::Q3,
            _ => Quarter::Q4,
        }
    }

    /// Returns the quarter a date falls in. The year is ignored.
    pub fn of(date: NaiveDate) -> Self {
        Self::from_month(date.month())
    }

    /// Zero-based position in `Quarter::ALL`.
    pub fn index(&self) -> usize {
        match self {
            Quarter::Q1 => 0,
            Quarter::Q2 => 1,
            Quarter::Q3 => 2,
            Quarter::Q4 => 3,
        }
    }

    /// Human-readable label including the month range, e.g. "Q1 (Jan-Mar)".
    pub fn label(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1 (Jan-Mar)",
            Quarter::Q2 => "Q2 (Apr-Jun)",
            Quarter::Q3 => "Q3 (Jul-Sep)",
            Quarter::Q4 => "Q4 (Oct-Dec)",
        }
    }
}

impl fmt::Display for Quarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
