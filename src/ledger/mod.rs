//! Atomic money-transfer engine
//!
//! # Architecture
//!
//! - **Ledger Store** ([`store::LedgerTx`]): the four row operations a unit of
//!   work may perform inside one transaction.
//! - **Transaction Runner** ([`store::run_in_transaction`]): commit on success,
//!   rollback on error, composite error when the rollback fails.
//! - **Transfer Orchestrator** ([`transfer`]): transfer record, two entries,
//!   two balance deltas, lower account id first.
//!
//! Two stores implement the seam: [`PgStore`] (PostgreSQL row locks) and
//! [`MemoryStore`] (in-process engine with the same locking contract).
//!
//! # Invariants
//!
//! 1. **Conservation**: a committed transfer nets to zero across its accounts
//! 2. **Atomicity**: a failed transfer leaves no rows and no balance change
//! 3. **Lock order**: balance rows are always locked in ascending id order

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod state;
pub mod store;
pub mod transfer;

mod integration_tests;

pub use error::LedgerError;
pub use memory::{FailPoint, MemoryStore};
pub use models::{Account, Entry, Transfer, TransferTxParams, TransferTxResult};
pub use postgres::PgStore;
pub use state::{TransferProgress, TransferState};
pub use store::{LedgerTx, Store, Transactional, run_in_transaction};
pub use transfer::{TransferEngine, transfer_tx, transfer_tx_tracked};
