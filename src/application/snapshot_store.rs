// Snapshot store - holds the latest poll result, fenced by poll sequence numbers
use crate::domain::dashboard::ChartDataStore;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct SnapshotView {
    pub snapshot: Arc<ChartDataStore>,
    pub sequence: u64,
    pub updated_at: Option<DateTime<Utc>>,
    /// Message of the most recent failed poll, cleared by the next success
    pub status: Option<String>,
}

#[derive(Debug, Default)]
struct StoreState {
    view: SnapshotView,
    closed: bool,
}

#[derive(Debug, Default)]
pub struct SnapshotStore {
    next_sequence: AtomicU64,
    state: RwLock<StoreState>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp a new poll. Sequence numbers start at 1 and only grow.
    pub fn begin_poll(&self) -> u64 {
        self.next_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Swap in a new snapshot unless a newer poll already landed or the store is closed.
    pub async fn replace(&self, sequence: u64, snapshot: ChartDataStore) -> bool {
        let mut state = self.state.write().await;
        if state.closed || sequence <= state.view.sequence {
            tracing::debug!(
                "Discarding snapshot from poll {} (latest applied {}, closed {})",
                sequence,
                state.view.sequence,
                state.closed
            );
            return false;
        }

        state.view = SnapshotView {
            snapshot: Arc::new(snapshot),
            sequence,
            updated_at: Some(Utc::now()),
            status: None,
        };
        true
    }

    /// Note a failed poll. The current snapshot is left untouched.
    pub async fn record_failure(&self, sequence: u64, message: String) -> bool {
        let mut state = self.state.write().await;
        if state.closed || sequence <= state.view.sequence {
            return false;
        }
        state.view.status = Some(message);
        true
    }

    pub async fn view(&self) -> SnapshotView {
        self.state.read().await.view.clone()
    }

    pub async fn snapshot(&self) -> Arc<ChartDataStore> {
        self.state.read().await.view.snapshot.clone()
    }

    /// Stop accepting results; late responses become no-ops.
    pub async fn close(&self) {
        self.state.write().await.closed = true;
    }

    pub async fn is_closed(&self) -> bool {
        self.state.read().await.closed
    }
}
