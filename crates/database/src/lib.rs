//! # Tradebook Database Crate
//!
//! This crate is the ledger's "permanent archive": the trade record store and
//! the single-row capital store.
//!
//! ## Architectural Principles
//!
//! - **Adapter Layer:** All storage-specific logic lives here behind the
//!   `TradeStore` trait. The HTTP API and the CLI only ever see the trait.
//! - **Invariants at the Boundary:** Stores build and mutate trades exclusively
//!   through `Trade::new` and `Trade::apply`, so the persisted `is_open` flag
//!   always matches the sell fields it was derived from.
//! - **Asynchronous & Pooled:** The PostgreSQL store uses a connection pool
//!   (`PgPool`) for concurrent access.
//!
//! ## Public API
//!
//! - `connect`: Establishes the database connection pool.
//! - `run_migrations`: Applies the embedded schema migrations.
//! - `TradeStore`: The storage trait.
//! - `DbRepository`: The PostgreSQL implementation.
//! - `InMemoryStore`: The in-process implementation.
//! - `DbError`: The specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryStore;
pub use repository::DbRepository;
pub use store::TradeStore;
