//! Shared application state and the tick runner.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use telepull_connector::{PointerStore, TickError, TickHandler, TickReport, TriggerKind};
use telepull_core::Config;

/// Maximum retained tick reports.
const MAX_TICK_HISTORY: usize = 100;

/// Serializes tick execution and retains recent reports.
///
/// Every trigger source — the HTTP endpoint and the internal scheduler —
/// funnels through [`run`](TickRunner::run), which holds the mutex for
/// the whole cycle, so at most one tick is in flight at a time.
pub struct TickRunner {
    handler: TickHandler,
    running: Mutex<()>,
    history: RwLock<VecDeque<TickReport>>,
}

impl TickRunner {
    pub fn new(handler: TickHandler) -> Self {
        Self {
            handler,
            running: Mutex::new(()),
            history: RwLock::new(VecDeque::with_capacity(MAX_TICK_HISTORY)),
        }
    }

    pub async fn run(&self, trigger: TriggerKind) -> Result<TickReport, TickError> {
        let _guard = self.running.lock().await;
        let report = self.handler.run(trigger).await?;

        let mut history = self.history.write().await;
        history.push_back(report.clone());
        while history.len() > MAX_TICK_HISTORY {
            history.pop_front();
        }
        Ok(report)
    }

    /// Recent reports, oldest first.
    pub async fn recent(&self) -> Vec<TickReport> {
        self.history.read().await.iter().cloned().collect()
    }
}

pub struct AppState {
    pub config: Config,
    pub runner: TickRunner,
    pub store: Arc<dyn PointerStore>,
    pub started_at: DateTime<Utc>,
}
