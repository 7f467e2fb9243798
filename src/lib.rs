//! simple_bank - Banking backend with an atomic money-transfer engine
//!
//! # Modules
//!
//! - [`ledger`] - Transfer engine: ledger store, transaction runner, orchestrator
//! - [`account`] - Users, accounts and input validation
//! - [`token`] - Access tokens and password hashing
//! - [`gateway`] - HTTP API
//! - [`db`] - PostgreSQL pool and migrations
//! - [`config`] - YAML configuration
//! - [`logging`] - Tracing setup

pub mod account;
pub mod config;
pub mod db;
pub mod gateway;
pub mod ledger;
pub mod logging;
pub mod token;

// Convenient re-exports at crate root
pub use ledger::{
    LedgerError, MemoryStore, PgStore, Store, TransferEngine, TransferTxParams, TransferTxResult,
};
