use crate::account::Database;
use crate::ledger::{PgStore, TransferEngine};
use std::sync::Arc;

use crate::token::Maker;

/// Shared gateway state
pub struct AppState {
    pub db: Database,
    pub transfer_engine: TransferEngine<PgStore>,
    pub token_maker: Arc<dyn Maker>,
    pub access_token_duration: chrono::Duration,
}

impl AppState {
    pub fn new(
        db: Database,
        transfer_engine: TransferEngine<PgStore>,
        token_maker: Arc<dyn Maker>,
        access_token_duration: chrono::Duration,
    ) -> Self {
        Self {
            db,
            transfer_engine,
            token_maker,
            access_token_duration,
        }
    }
}
