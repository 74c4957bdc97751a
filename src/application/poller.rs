// Polling fetcher - fixed-period fetch, transform and store replacement
use crate::application::data_source::ZoneDataSource;
use crate::application::session::CredentialSession;
use crate::application::snapshot_store::SnapshotStore;
use crate::application::transformer::Transformer;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    Every(Duration),
    Once,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Applied,
    /// Fetched fine but a newer poll had already landed
    Superseded,
    Failed,
    /// No credential yet for an authenticated source, or the poller was shut down
    Skipped,
}

pub struct Poller {
    source: Arc<dyn ZoneDataSource>,
    session: Option<Arc<CredentialSession>>,
    transformer: Arc<Transformer>,
    store: Arc<SnapshotStore>,
    schedule: Schedule,
}

pub struct PollerHandle {
    name: String,
    task: JoinHandle<()>,
    store: Arc<SnapshotStore>,
}

impl PollerHandle {
    /// Cancel the timer. Requests already in flight finish but their results are dropped.
    pub async fn shutdown(self) {
        self.task.abort();
        self.store.close().await;
        tracing::info!("Stopped {} poller", self.name);
    }
}

impl Poller {
    pub fn new(
        source: Arc<dyn ZoneDataSource>,
        session: Option<Arc<CredentialSession>>,
        transformer: Arc<Transformer>,
        store: Arc<SnapshotStore>,
        schedule: Schedule,
    ) -> Self {
        Self {
            source,
            session,
            transformer,
            store,
            schedule,
        }
    }

    /// Start the timer. Ticks are not serialised: each one spawns its own poll.
    pub fn spawn(self) -> PollerHandle {
        let name = self.source.name().to_string();
        let store = self.store.clone();
        let schedule = self.schedule;
        let poller = Arc::new(self);

        tracing::info!("Starting {} poller ({:?})", name, schedule);
        let task = tokio::spawn(async move {
            match schedule {
                Schedule::Once => {
                    tokio::spawn(async move {
                        poller.poll_once().await;
                    });
                }
                Schedule::Every(period) => {
                    let mut interval = tokio::time::interval(period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    loop {
                        interval.tick().await;
                        let poller = poller.clone();
                        tokio::spawn(async move {
                            poller.poll_once().await;
                        });
                    }
                }
            }
        });

        PollerHandle { name, task, store }
    }

    pub async fn poll_once(&self) -> PollOutcome {
        if self.store.is_closed().await {
            return PollOutcome::Skipped;
        }
        let credential = match &self.session {
            Some(session) => session.current().await,
            None => None,
        };
        if self.source.requires_credential() && credential.is_none() {
            tracing::debug!("Skipping {} poll: no credential", self.source.name());
            return PollOutcome::Skipped;
        }

        let sequence = self.store.begin_poll();
        tracing::debug!("Polling {} (#{})", self.source.name(), sequence);

        match self.source.fetch(credential.as_ref()).await {
            Ok(records) => {
                let count = records.len();
                let snapshot = self.transformer.transform(records);
                if snapshot.is_degraded() {
                    tracing::warn!(
                        "{} poll #{} has zones off the shared time axis: {:?}",
                        self.source.name(),
                        sequence,
                        snapshot.misaligned_zones
                    );
                }
                if self.store.replace(sequence, snapshot).await {
                    tracing::debug!(
                        "Applied {} poll #{} ({} records)",
                        self.source.name(),
                        sequence,
                        count
                    );
                    PollOutcome::Applied
                } else {
                    PollOutcome::Superseded
                }
            }
            Err(e) => {
                tracing::warn!("{} poll #{} failed: {}", self.source.name(), sequence, e);
                self.store.record_failure(sequence, e.to_string()).await;
                PollOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::data_source::IdentityProvider;
    use crate::application::session::Credential;
    use crate::application::transformer::ZoneRoster;
    use crate::domain::telemetry::{RawRecord, TimeSeriesPoint};
    use crate::error::{AuthError, FetchError};
    use crate::infrastructure::config::LabelFormat;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers call `n` with a single A8 sample of value `n`.
    struct ScriptedSource {
        calls: AtomicUsize,
        failing_calls: HashSet<usize>,
        delays: Vec<Duration>,
        needs_credential: bool,
    }

    impl ScriptedSource {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                failing_calls: HashSet::new(),
                delays: Vec::new(),
                needs_credential: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ZoneDataSource for ScriptedSource {
        fn name(&self) -> &str {
            "scripted"
        }

        fn requires_credential(&self) -> bool {
            self.needs_credential
        }

        async fn fetch(
            &self,
            _credential: Option<&Credential>,
        ) -> Result<Vec<RawRecord>, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(delay) = self.delays.get(call - 1) {
                tokio::time::sleep(*delay).await;
            }
            if self.failing_calls.contains(&call) {
                return Err(FetchError::Status {
                    status: 503,
                    body: "unavailable".to_string(),
                });
            }
            Ok(vec![RawRecord::new(
                "A8",
                vec![TimeSeriesPoint::new(1_000, call as f64)],
            )])
        }
    }

    struct NoIdentity;

    #[async_trait]
    impl IdentityProvider for NoIdentity {
        async fn login(&self, _: &str, _: &str) -> Result<Credential, AuthError> {
            Err(AuthError::MalformedResponse("unused".to_string()))
        }
    }

    fn poller(source: Arc<ScriptedSource>, store: Arc<SnapshotStore>, schedule: Schedule) -> Poller {
        let transformer = Transformer::new(ZoneRoster::Inferred, None, LabelFormat::TimeOfDay, 0);
        Poller::new(source, None, Arc::new(transformer), store, schedule)
    }

    async fn a8_value(store: &SnapshotStore) -> Option<f64> {
        store
            .snapshot()
            .await
            .zone("A8")
            .and_then(|z| z.values.first().copied().flatten())
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_poll_keeps_store_and_retries_next_tick() {
        let mut source = ScriptedSource::new();
        source.failing_calls.insert(2);
        let source = Arc::new(source);
        let store = Arc::new(SnapshotStore::new());

        let handle = poller(source.clone(), store.clone(), Schedule::Every(Duration::from_secs(5))).spawn();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(a8_value(&store).await, Some(1.0));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(a8_value(&store).await, Some(1.0));
        assert!(store.view().await.status.unwrap().contains("503"));

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(source.calls(), 2);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), 3);
        assert_eq!(a8_value(&store).await, Some(3.0));
        assert!(store.view().await.status.is_none());

        handle.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_timer() {
        let source = Arc::new(ScriptedSource::new());
        let store = Arc::new(SnapshotStore::new());
        let handle = poller(source.clone(), store.clone(), Schedule::Every(Duration::from_secs(5))).spawn();

        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.shutdown().await;

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(source.calls(), 1);
        assert!(store.is_closed().await);
    }

    #[tokio::test]
    async fn test_closed_store_skips_fetch() {
        let source = Arc::new(ScriptedSource::new());
        let store = Arc::new(SnapshotStore::new());
        let poller = poller(source.clone(), store.clone(), Schedule::Once);
        store.close().await;

        assert_eq!(poller.poll_once().await, PollOutcome::Skipped);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_shot_schedule_polls_once() {
        let source = Arc::new(ScriptedSource::new());
        let store = Arc::new(SnapshotStore::new());
        let _handle = poller(source.clone(), store.clone(), Schedule::Once).spawn();

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(a8_value(&store).await, Some(1.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_response_does_not_overwrite_newer() {
        let mut source = ScriptedSource::new();
        source.delays = vec![Duration::from_secs(10), Duration::from_secs(1)];
        let source = Arc::new(source);
        let store = Arc::new(SnapshotStore::new());
        let poller = poller(source, store.clone(), Schedule::Once);

        let (slow, fast) = tokio::join!(poller.poll_once(), poller.poll_once());

        assert_eq!(fast, PollOutcome::Applied);
        assert_eq!(slow, PollOutcome::Superseded);
        assert_eq!(a8_value(&store).await, Some(2.0));
    }

    #[tokio::test]
    async fn test_authenticated_source_waits_for_credential() {
        let mut source = ScriptedSource::new();
        source.needs_credential = true;
        let source = Arc::new(source);
        let store = Arc::new(SnapshotStore::new());
        let session = Arc::new(CredentialSession::new(Arc::new(NoIdentity)));
        let transformer = Transformer::new(ZoneRoster::Inferred, None, LabelFormat::TimeOfDay, 0);
        let poller = Poller::new(
            source.clone(),
            Some(session),
            Arc::new(transformer),
            store,
            Schedule::Once,
        );

        assert_eq!(poller.poll_once().await, PollOutcome::Skipped);
        assert_eq!(source.calls(), 0);
    }
}
