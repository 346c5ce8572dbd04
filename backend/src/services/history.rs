//! Local copy of the remote prediction history

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shared::{HistoryRecord, RecordId};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::AppResult;
use crate::external::HistoryService;

/// Read-only view of the history, refreshed from the remote service.
///
/// Every fetch replaces the collection wholesale. Ids the service has
/// acknowledged as deleted are remembered so that a fetch which raced the
/// deletion cannot bring them back. Each refresh takes a ticket before it
/// fetches, and a result older than the one already applied is dropped.
pub struct HistoryStore {
    service: Arc<dyn HistoryService>,
    state: RwLock<HistoryState>,
    next_ticket: AtomicU64,
}

#[derive(Default)]
struct HistoryState {
    records: Arc<Vec<HistoryRecord>>,
    deleted: HashSet<RecordId>,
    applied_ticket: u64,
}

impl HistoryStore {
    pub fn new(service: Arc<dyn HistoryService>) -> Self {
        Self {
            service,
            state: RwLock::new(HistoryState::default()),
            next_ticket: AtomicU64::new(1),
        }
    }

    /// Current local collection, ordered by id
    pub async fn records(&self) -> Arc<Vec<HistoryRecord>> {
        Arc::clone(&self.state.read().await.records)
    }

    /// Replace the local collection with the service's. On failure the
    /// previous collection stays in place, and a fetch overtaken by a newer
    /// one returns the newer collection.
    pub async fn refresh(&self) -> AppResult<Arc<Vec<HistoryRecord>>> {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst);
        let mut fetched = match self.service.fetch_history().await {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "History refresh skipped");
                return Err(err);
            }
        };
        fetched.sort_by_key(|record| record.id);

        let mut state = self.state.write().await;
        if ticket < state.applied_ticket {
            debug!(ticket, applied = state.applied_ticket, "Stale history fetch dropped");
            return Ok(Arc::clone(&state.records));
        }
        fetched.retain(|record| !state.deleted.contains(&record.id));
        state.records = Arc::new(fetched);
        state.applied_ticket = ticket;

        info!(count = state.records.len(), "History refreshed");
        Ok(Arc::clone(&state.records))
    }

    /// Delete on the service first; the local copy only changes once the
    /// service acknowledged.
    pub async fn delete(&self, id: RecordId) -> AppResult<()> {
        if let Err(err) = self.service.delete_history(id).await {
            warn!(id, error = %err, "History deletion rejected");
            return Err(err);
        }

        let mut state = self.state.write().await;
        state.deleted.insert(id);
        let remaining: Vec<HistoryRecord> = state
            .records
            .iter()
            .filter(|record| record.id != id)
            .cloned()
            .collect();
        state.records = Arc::new(remaining);

        info!(id, "History record deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::Notify;

    use super::*;
    use crate::error::AppError;
    use crate::services::testing::{history_record, FakeHistory};

    fn ids(records: &[HistoryRecord]) -> Vec<RecordId> {
        records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_refresh_orders_by_id() {
        let service = Arc::new(FakeHistory::new(vec![
            history_record(9, "Rice"),
            history_record(3, "Maize"),
            history_record(7, "Cotton"),
        ]));
        let store = HistoryStore::new(service);

        let records = store.refresh().await.unwrap();
        assert_eq!(ids(&records), [3, 7, 9]);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_copy() {
        let service = Arc::new(FakeHistory::new(vec![history_record(1, "Rice")]));
        let store = HistoryStore::new(service.clone());
        store.refresh().await.unwrap();

        service.fail_fetches("history backend offline");
        let err = store.refresh().await.unwrap_err();
        assert!(matches!(err, AppError::HistoryService(m) if m == "history backend offline"));
        assert_eq!(ids(&store.records().await), [1]);
    }

    #[tokio::test]
    async fn test_unacknowledged_delete_leaves_collection_unchanged() {
        let service = Arc::new(
            FakeHistory::new(vec![history_record(7, "Rice"), history_record(8, "Maize")])
                .rejecting_deletes(),
        );
        let store = HistoryStore::new(service);
        store.refresh().await.unwrap();

        tokio_test::assert_err!(store.delete(7).await);
        assert_eq!(ids(&store.records().await), [7, 8]);
    }

    #[tokio::test]
    async fn test_deleted_id_never_comes_back() {
        // The fake keeps serving id 7 after the delete, like a stale read
        let service = Arc::new(FakeHistory::new(vec![
            history_record(7, "Rice"),
            history_record(8, "Maize"),
        ]));
        let store = HistoryStore::new(service);
        store.refresh().await.unwrap();

        tokio_test::assert_ok!(store.delete(7).await);
        assert_eq!(ids(&store.records().await), [8]);

        store.refresh().await.unwrap();
        assert_eq!(ids(&store.records().await), [8]);
    }

    #[tokio::test]
    async fn test_older_fetch_finishing_last_is_dropped() {
        let service = Arc::new(FakeHistory::new(vec![history_record(1, "Rice")]));
        let store = Arc::new(HistoryStore::new(service.clone()));

        let gate = Arc::new(Notify::new());
        service.hold_next_fetch(gate.clone());
        let slow = tokio::spawn({
            let store = Arc::clone(&store);
            async move { store.refresh().await }
        });
        while service.fetches() < 1 {
            tokio::task::yield_now().await;
        }

        service.push(history_record(2, "Maize"));
        let newer = store.refresh().await.unwrap();
        assert_eq!(ids(&newer), [1, 2]);

        gate.notify_one();
        let overtaken = slow.await.unwrap().unwrap();
        assert_eq!(ids(&overtaken), [1, 2]);
        assert_eq!(ids(&store.records().await), [1, 2]);
    }
}
