pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{Quarter, TradeStatus};
pub use error::CoreError;
pub use structs::{CapitalSettings, NewTrade, Trade, TradeUpdate};
