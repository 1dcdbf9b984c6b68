use tokio::sync::watch;

use crate::store::SharedStore;

/// Bot state shared across all commands
pub struct Data {
    /// Birthday records and guild settings
    pub store: SharedStore,
    /// Bumped to ask the scheduler for an immediate birthday pass
    pub scan_trigger_tx: watch::Sender<u64>,
}

impl Data {
    pub fn new(store: SharedStore, scan_trigger_tx: watch::Sender<u64>) -> Self {
        Self {
            store,
            scan_trigger_tx,
        }
    }

    /// Request an extra birthday pass from the scheduler
    pub fn trigger_scan(&self) {
        self.scan_trigger_tx.send_modify(|val| *val += 1);
    }
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;
