//! The tick handler: load cursors, invoke the fetcher, fold the response,
//! persist the advanced cursors.
//!
//! The only state that survives a tick is the per-channel high-water mark.
//! The new mark is computed from records the handler has itself observed,
//! never trusted from the fetcher, so a cursor cannot advance past an id
//! that did not appear in a response.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use telepull_core::{CursorSet, MessageRecord};

use crate::error::TickError;
use crate::fetcher::Fetcher;
use crate::pointer_store::PointerStore;

/// How a tick was triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Triggered over HTTP by an external scheduler or an operator.
    Manual,
    /// Triggered by the internal cron loop.
    Scheduled,
}

/// Outcome of one completed tick.
#[derive(Debug, Clone, Serialize)]
pub struct TickReport {
    pub id: Uuid,
    pub trigger: TriggerKind,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Channels known to the pointer store before the tick.
    pub channels_known: usize,
    /// Records returned by the fetcher, malformed ones excluded.
    pub records_fetched: usize,
    /// Cursors written this tick, one entry per channel seen in the
    /// response.
    pub cursors_advanced: CursorSet,
}

/// Fold a fetch response into the cursors to persist.
///
/// For every channel appearing in `records`, the result holds
/// max(baseline cursor, largest observed message id for that channel).
/// Channels absent from the response are absent from the result — they
/// are never re-written and never pruned. Max is associative and
/// commutative, so record order is immaterial and duplicate ids are
/// idempotent. Unparseable ids compare as zero and advance nothing.
pub fn fold_records(baseline: &CursorSet, records: &[MessageRecord]) -> CursorSet {
    let mut advanced = CursorSet::new();
    for record in records {
        let entry = advanced
            .entry(record.source_channel_id.clone())
            .or_insert_with(|| {
                baseline
                    .get(&record.source_channel_id)
                    .cloned()
                    .unwrap_or_default()
            });
        if record.platform_message_id > *entry {
            *entry = record.platform_message_id.clone();
        }
    }
    advanced
}

/// Runs one load → fetch → fold → persist cycle per invocation.
///
/// Handles are constructor-injected so the handler is testable with
/// in-memory fakes; the HTTP trigger and the scheduler are thin drivers.
pub struct TickHandler {
    store: Arc<dyn PointerStore>,
    fetcher: Arc<dyn Fetcher>,
}

impl TickHandler {
    pub fn new(store: Arc<dyn PointerStore>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self { store, fetcher }
    }

    /// Run a single tick to completion or failure.
    ///
    /// Load and fetch failures abort before any write, so the next tick
    /// retries from the same cursors. A persist failure can leave a
    /// prefix of the write fan-out applied; each applied write is a legal
    /// monotonic advance, and the next tick re-requests only the
    /// still-unacknowledged tail.
    pub async fn run(&self, trigger: TriggerKind) -> Result<TickReport, TickError> {
        let id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();

        let baseline = self.store.list_all().await.map_err(TickError::Load)?;
        info!(tick = %id, stage = "load", channels = baseline.len(), "cursors loaded");

        let records = self.fetcher.fetch(&baseline).await?;
        info!(tick = %id, stage = "fetch", records = records.len(), "fetch complete");

        let advanced = fold_records(&baseline, &records);
        info!(tick = %id, stage = "fold", channels = advanced.len(), "cursors folded");

        let store = &self.store;
        try_join_all(
            advanced
                .iter()
                .map(|(channel, cursor)| store.put(channel, cursor)),
        )
        .await
        .map_err(TickError::Persist)?;
        info!(tick = %id, stage = "persist", writes = advanced.len(), "cursors persisted");

        Ok(TickReport {
            id,
            trigger,
            started_at,
            duration_ms: start.elapsed().as_millis() as u64,
            channels_known: baseline.len(),
            records_fetched: records.len(),
            cursors_advanced: advanced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    use telepull_core::{ChannelId, MessageId};

    use crate::error::FetchError;
    use crate::pointer_store::MemoryPointerStore;

    fn rec(channel: &str, id: &str) -> MessageRecord {
        MessageRecord {
            source_channel_id: ChannelId::from(channel),
            platform_message_id: MessageId::from(id),
            payload: serde_json::Map::new(),
        }
    }

    fn cursors(entries: &[(&str, &str)]) -> CursorSet {
        entries
            .iter()
            .map(|(c, m)| (ChannelId::from(*c), MessageId::from(*m)))
            .collect()
    }

    struct StubFetcher {
        records: Vec<MessageRecord>,
        fail: bool,
    }

    impl StubFetcher {
        fn returning(records: Vec<MessageRecord>) -> Self {
            Self {
                records,
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                records: Vec::new(),
                fail: true,
            }
        }
    }

    #[async_trait]
    impl Fetcher for StubFetcher {
        async fn fetch(&self, _cursors: &CursorSet) -> Result<Vec<MessageRecord>, FetchError> {
            if self.fail {
                return Err(FetchError::Status {
                    status: 500,
                    body: "upstream down".to_string(),
                });
            }
            Ok(self.records.clone())
        }
    }

    // ── Fold ─────────────────────────────────────────────────────────

    #[test]
    fn test_fold_cold_start_single_channel() {
        let folded = fold_records(&CursorSet::new(), &[rec("A", "5"), rec("A", "7")]);
        assert_eq!(folded, cursors(&[("A", "7")]));
    }

    #[test]
    fn test_fold_advance_over_existing() {
        let baseline = cursors(&[("A", "7"), ("B", "3")]);
        let folded = fold_records(&baseline, &[rec("A", "9"), rec("B", "3"), rec("A", "8")]);
        assert_eq!(folded, cursors(&[("A", "9"), ("B", "3")]));
    }

    #[test]
    fn test_fold_numeric_not_lexicographic() {
        let baseline = cursors(&[("A", "9")]);
        let folded = fold_records(&baseline, &[rec("A", "10")]);
        assert_eq!(folded, cursors(&[("A", "10")]));
    }

    #[test]
    fn test_fold_empty_response() {
        let baseline = cursors(&[("A", "7")]);
        assert!(fold_records(&baseline, &[]).is_empty());
    }

    #[test]
    fn test_fold_new_channel_appears() {
        let baseline = cursors(&[("A", "7")]);
        let folded = fold_records(&baseline, &[rec("B", "1")]);
        assert_eq!(folded, cursors(&[("B", "1")]));
    }

    #[test]
    fn test_fold_duplicates_idempotent() {
        let folded = fold_records(&CursorSet::new(), &[rec("A", "5"), rec("A", "5"), rec("A", "5")]);
        assert_eq!(folded, cursors(&[("A", "5")]));
    }

    #[test]
    fn test_fold_order_insensitive() {
        let forward = fold_records(&CursorSet::new(), &[rec("A", "3"), rec("A", "9"), rec("A", "6")]);
        let reverse = fold_records(&CursorSet::new(), &[rec("A", "6"), rec("A", "9"), rec("A", "3")]);
        assert_eq!(forward, reverse);
        assert_eq!(forward, cursors(&[("A", "9")]));
    }

    #[test]
    fn test_fold_never_regresses_below_baseline() {
        // Response carrying only ids below the stored cursor must not
        // move it backwards.
        let baseline = cursors(&[("A", "7")]);
        let folded = fold_records(&baseline, &[rec("A", "5")]);
        assert_eq!(folded, cursors(&[("A", "7")]));
    }

    #[test]
    fn test_fold_unparseable_id_cannot_advance() {
        let baseline = cursors(&[("A", "7")]);
        let folded = fold_records(&baseline, &[rec("A", "garbage")]);
        assert_eq!(folded, cursors(&[("A", "7")]));
    }

    #[test]
    fn test_fold_unparseable_id_on_new_channel_is_zero() {
        let folded = fold_records(&CursorSet::new(), &[rec("B", "garbage")]);
        assert_eq!(folded, cursors(&[("B", "0")]));
    }

    // ── Handler ──────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_tick_persists_folded_cursors() {
        let store = Arc::new(MemoryPointerStore::new());
        let fetcher = Arc::new(StubFetcher::returning(vec![rec("A", "5"), rec("A", "7")]));
        let handler = TickHandler::new(store.clone(), fetcher);

        let report = handler.run(TriggerKind::Manual).await.unwrap();
        assert_eq!(report.channels_known, 0);
        assert_eq!(report.records_fetched, 2);
        assert_eq!(report.cursors_advanced, cursors(&[("A", "7")]));
        assert_eq!(store.list_all().await.unwrap(), cursors(&[("A", "7")]));
    }

    #[tokio::test]
    async fn test_tick_leaves_untouched_channels_alone() {
        let store = Arc::new(MemoryPointerStore::with_entries(cursors(&[
            ("A", "7"),
            ("B", "3"),
        ])));
        let fetcher = Arc::new(StubFetcher::returning(vec![rec("A", "9")]));
        let handler = TickHandler::new(store.clone(), fetcher);

        handler.run(TriggerKind::Scheduled).await.unwrap();
        assert_eq!(
            store.list_all().await.unwrap(),
            cursors(&[("A", "9"), ("B", "3")])
        );
    }

    #[tokio::test]
    async fn test_tick_fetch_failure_leaves_store_untouched() {
        let store = Arc::new(MemoryPointerStore::with_entries(cursors(&[("A", "7")])));
        let handler = TickHandler::new(store.clone(), Arc::new(StubFetcher::failing()));

        let err = handler.run(TriggerKind::Manual).await.unwrap_err();
        assert!(matches!(err, TickError::Fetch(_)));
        assert!(err.to_string().starts_with("fetch:"));
        assert_eq!(store.list_all().await.unwrap(), cursors(&[("A", "7")]));
    }

    #[tokio::test]
    async fn test_tick_empty_response_succeeds_without_writes() {
        let store = Arc::new(MemoryPointerStore::with_entries(cursors(&[("A", "7")])));
        let fetcher = Arc::new(StubFetcher::returning(Vec::new()));
        let handler = TickHandler::new(store.clone(), fetcher);

        let report = handler.run(TriggerKind::Scheduled).await.unwrap();
        assert!(report.cursors_advanced.is_empty());
        assert_eq!(store.list_all().await.unwrap(), cursors(&[("A", "7")]));
    }

    #[tokio::test]
    async fn test_tick_replay_is_idempotent() {
        let store = Arc::new(MemoryPointerStore::new());
        let fetcher = Arc::new(StubFetcher::returning(vec![rec("A", "9"), rec("B", "1")]));
        let handler = TickHandler::new(store.clone(), fetcher);

        handler.run(TriggerKind::Scheduled).await.unwrap();
        let after_first = store.list_all().await.unwrap();

        handler.run(TriggerKind::Scheduled).await.unwrap();
        assert_eq!(store.list_all().await.unwrap(), after_first);
    }
}
