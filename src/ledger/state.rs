//! Transfer attempt states
//!
//! ```text
//! STARTED → TRANSFER_INSERTED → ENTRIES_INSERTED → BALANCES_UPDATED → COMMITTED
//!    ↓              ↓                  ↓                  ↓
//!    └──────────────┴────── FAILED ────┴──────────────────┘
//!                             ↓
//!                        ROLLED_BACK
//! ```
//!
//! Nothing here is persisted: a transfer attempt either commits as a whole or
//! leaves no rows behind. The state only feeds logging and diagnostics.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI16, Ordering};

/// Per-attempt transfer state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i16)]
pub enum TransferState {
    Started = 0,
    TransferInserted = 10,
    EntriesInserted = 20,
    BalancesUpdated = 30,
    /// Terminal: all effects durable
    Committed = 40,
    /// Unit of work failed. Stays here if the rollback fails too.
    Failed = -10,
    /// Terminal: no effect of the attempt survives
    RolledBack = -30,
}

impl TransferState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self, TransferState::Committed | TransferState::RolledBack)
    }

    #[inline]
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            0 => Some(TransferState::Started),
            10 => Some(TransferState::TransferInserted),
            20 => Some(TransferState::EntriesInserted),
            30 => Some(TransferState::BalancesUpdated),
            40 => Some(TransferState::Committed),
            -10 => Some(TransferState::Failed),
            -30 => Some(TransferState::RolledBack),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransferState::Started => "STARTED",
            TransferState::TransferInserted => "TRANSFER_INSERTED",
            TransferState::EntriesInserted => "ENTRIES_INSERTED",
            TransferState::BalancesUpdated => "BALANCES_UPDATED",
            TransferState::Committed => "COMMITTED",
            TransferState::Failed => "FAILED",
            TransferState::RolledBack => "ROLLED_BACK",
        }
    }

    /// Whether `next` is a legal successor of `self`
    pub fn can_transition_to(&self, next: TransferState) -> bool {
        use TransferState::*;
        matches!(
            (self, next),
            (Started, TransferInserted)
                | (TransferInserted, EntriesInserted)
                | (EntriesInserted, BalancesUpdated)
                | (BalancesUpdated, Committed)
                | (Started | TransferInserted | EntriesInserted | BalancesUpdated, Failed)
                | (Failed, RolledBack)
        )
    }
}

impl fmt::Display for TransferState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shared cursor over one attempt's state.
///
/// Cloned into the unit of work so the caller can still read how far the
/// attempt got once the transaction has ended.
#[derive(Debug, Clone)]
pub struct TransferProgress {
    state: Arc<AtomicI16>,
}

impl Default for TransferProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferProgress {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicI16::new(TransferState::Started.id())),
        }
    }

    pub fn current(&self) -> TransferState {
        // Only ids produced by `TransferState::id` are ever stored
        TransferState::from_id(self.state.load(Ordering::SeqCst)).unwrap_or(TransferState::Failed)
    }

    /// Move to `next`. Illegal transitions are ignored and reported as `false`.
    pub fn advance(&self, next: TransferState) -> bool {
        let current = self.current();
        if !current.can_transition_to(next) {
            tracing::warn!(from = %current, to = %next, "Ignoring illegal transfer state transition");
            return false;
        }
        self.state.store(next.id(), Ordering::SeqCst);
        tracing::debug!(from = %current, to = %next, "Transfer state");
        true
    }
}
