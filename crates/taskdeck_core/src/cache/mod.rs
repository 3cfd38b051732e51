use crate::error::AppError;
use crate::gateway::TaskGateway;
use crate::model::Task;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::OffsetDateTime;
use tracing::{debug, warn};

mod store;
pub use store::{Snapshot, cache_path};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Snapshot served within the freshness window, no gateway call made.
    Cached(Vec<Task>),
    /// Fresh list fetched and stored.
    Refreshed(Vec<Task>),
    /// Another load was already in flight; this one was dropped.
    InFlight,
}

impl LoadOutcome {
    pub fn tasks(&self) -> Option<&[Task]> {
        match self {
            Self::Cached(tasks) | Self::Refreshed(tasks) => Some(tasks),
            Self::InFlight => None,
        }
    }

    pub fn into_tasks(self) -> Option<Vec<Task>> {
        match self {
            Self::Cached(tasks) | Self::Refreshed(tasks) => Some(tasks),
            Self::InFlight => None,
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    snapshot: Option<Vec<Task>>,
    fetched_at_ms: i64,
    in_flight: bool,
}

/// Last fetched task collection plus its fetch timestamp. Loads inside the
/// freshness window are served from memory; a load overlapping another load
/// is dropped, not queued.
#[derive(Debug)]
pub struct TaskCache {
    ttl_ms: i64,
    store_path: Option<PathBuf>,
    inner: Mutex<CacheInner>,
}

impl TaskCache {
    pub fn new(ttl_ms: i64) -> Self {
        Self {
            ttl_ms,
            store_path: None,
            inner: Mutex::new(CacheInner::default()),
        }
    }

    /// Cache backed by a snapshot file, so the freshness window holds across
    /// short-lived processes. An unreadable file degrades to an empty cache.
    pub fn with_store(ttl_ms: i64, path: PathBuf) -> Self {
        let cache = Self {
            ttl_ms,
            store_path: Some(path),
            inner: Mutex::new(CacheInner::default()),
        };

        if let Some(path) = cache.store_path.as_deref() {
            match store::load_snapshot(path) {
                Ok(Some(snapshot)) => {
                    let mut inner = cache.lock();
                    inner.snapshot = Some(snapshot.tasks);
                    inner.fetched_at_ms = snapshot.fetched_at_ms;
                }
                Ok(None) => {}
                Err(err) => warn!("ignoring unreadable cache snapshot: {err}"),
            }
        }

        cache
    }

    pub fn load(&self, gateway: &dyn TaskGateway, force: bool) -> Result<LoadOutcome, AppError> {
        self.load_at(gateway, force, now_ms())
    }

    pub fn invalidate(&self) {
        {
            let mut inner = self.lock();
            inner.snapshot = None;
            inner.fetched_at_ms = 0;
        }
        if let Some(path) = self.store_path.as_deref()
            && let Err(err) = store::clear_snapshot(path)
        {
            warn!("failed to clear cache snapshot: {err}");
        }
    }

    fn load_at(
        &self,
        gateway: &dyn TaskGateway,
        force: bool,
        now_ms: i64,
    ) -> Result<LoadOutcome, AppError> {
        {
            let mut inner = self.lock();
            if inner.in_flight {
                debug!("load dropped, another load is in flight");
                return Ok(LoadOutcome::InFlight);
            }
            if !force
                && let Some(snapshot) = inner.snapshot.as_ref()
                && now_ms - inner.fetched_at_ms < self.ttl_ms
            {
                return Ok(LoadOutcome::Cached(snapshot.clone()));
            }
            inner.in_flight = true;
        }

        let result = gateway.list();

        let mut inner = self.lock();
        inner.in_flight = false;
        let rows = match result {
            Ok(rows) => rows,
            // the previous snapshot stays untouched on failure
            Err(AppError::LoadFailed(message)) => return Err(AppError::load_failed(message)),
            Err(other) => return Err(AppError::load_failed(other.to_string())),
        };

        let tasks: Vec<Task> = rows.into_iter().filter(|task| !task.is_blank()).collect();
        inner.snapshot = Some(tasks.clone());
        inner.fetched_at_ms = now_ms;
        drop(inner);

        if let Some(path) = self.store_path.as_deref() {
            let snapshot = Snapshot {
                tasks: tasks.clone(),
                fetched_at_ms: now_ms,
            };
            if let Err(err) = store::save_snapshot(path, &snapshot) {
                warn!("failed to persist cache snapshot: {err}");
            }
        }

        Ok(LoadOutcome::Refreshed(tasks))
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        // a poisoned cache still holds the last complete snapshot
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use super::{LoadOutcome, Snapshot, TaskCache, store};
    use crate::error::AppError;
    use crate::gateway::TaskGateway;
    use crate::model::{Task, TaskPayload};
    use serde_json::Value;
    use std::collections::VecDeque;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::{Receiver, Sender, channel};
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    const TTL: i64 = 30_000;

    fn row(no: u32, task: &str) -> Task {
        Task {
            no,
            task: task.to_string(),
            ..Task::default()
        }
    }

    fn temp_path(file_name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("taskdeck-{nanos}-{file_name}"))
    }

    struct ScriptedGateway {
        responses: Mutex<VecDeque<Result<Vec<Task>, AppError>>>,
        list_calls: AtomicUsize,
    }

    impl ScriptedGateway {
        fn new(responses: Vec<Result<Vec<Task>, AppError>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                list_calls: AtomicUsize::new(0),
            }
        }

        fn calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }
    }

    impl TaskGateway for ScriptedGateway {
        fn list(&self) -> Result<Vec<Task>, AppError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        fn get(&self, _no: u32) -> Result<Task, AppError> {
            Err(AppError::invalid_input("get is not exercised"))
        }

        fn create(&self, _payload: &TaskPayload) -> Result<Value, AppError> {
            Err(AppError::invalid_input("create is not exercised"))
        }

        fn update(&self, _no: u32, _payload: &TaskPayload) -> Result<Value, AppError> {
            Err(AppError::invalid_input("update is not exercised"))
        }

        fn delete(&self, _no: u32) -> Result<Value, AppError> {
            Err(AppError::invalid_input("delete is not exercised"))
        }
    }

    #[test]
    fn serves_snapshot_inside_the_freshness_window() {
        let gateway = ScriptedGateway::new(vec![
            Ok(vec![row(1, "Draft brief")]),
            Ok(vec![row(1, "Draft brief"), row(2, "Cut teaser")]),
        ]);
        let cache = TaskCache::new(TTL);

        let first = cache.load_at(&gateway, false, 0).unwrap();
        assert!(matches!(first, LoadOutcome::Refreshed(_)));

        let second = cache.load_at(&gateway, false, 10_000).unwrap();
        match second {
            LoadOutcome::Cached(tasks) => assert_eq!(tasks, vec![row(1, "Draft brief")]),
            other => panic!("expected cached outcome, got {other:?}"),
        }
        assert_eq!(gateway.calls(), 1);

        // one millisecond past the window triggers exactly one new fetch
        let third = cache.load_at(&gateway, false, 31_000).unwrap();
        assert!(matches!(third, LoadOutcome::Refreshed(_)));
        assert_eq!(gateway.calls(), 2);
    }

    #[test]
    fn force_refresh_skips_the_window() {
        let gateway = ScriptedGateway::new(vec![Ok(vec![row(1, "a")]), Ok(vec![row(1, "a")])]);
        let cache = TaskCache::new(TTL);

        cache.load_at(&gateway, false, 0).unwrap();
        let outcome = cache.load_at(&gateway, true, 1_000).unwrap();

        assert!(matches!(outcome, LoadOutcome::Refreshed(_)));
        assert_eq!(gateway.calls(), 2);
    }

    #[test]
    fn invalidate_forces_the_next_load_to_fetch() {
        let gateway = ScriptedGateway::new(vec![Ok(vec![row(1, "a")]), Ok(vec![row(1, "a")])]);
        let cache = TaskCache::new(TTL);

        cache.load_at(&gateway, false, 0).unwrap();
        cache.invalidate();

        let outcome = cache.load_at(&gateway, false, 1_000).unwrap();
        assert!(matches!(outcome, LoadOutcome::Refreshed(_)));
        assert_eq!(gateway.calls(), 2);
    }

    #[test]
    fn blank_rows_are_dropped_from_the_working_set() {
        let blank = Task {
            no: 99,
            notes: "formatting residue".to_string(),
            ..Task::default()
        };
        let gateway = ScriptedGateway::new(vec![Ok(vec![row(1, "real"), blank])]);
        let cache = TaskCache::new(TTL);

        let outcome = cache.load_at(&gateway, false, 0).unwrap();
        let tasks = outcome.into_tasks().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].no, 1);
    }

    #[test]
    fn failed_fetch_keeps_the_previous_snapshot() {
        let gateway = ScriptedGateway::new(vec![
            Ok(vec![row(1, "keep me")]),
            Err(AppError::transport("connection reset")),
        ]);
        let cache = TaskCache::new(TTL);

        cache.load_at(&gateway, false, 0).unwrap();
        let err = cache.load_at(&gateway, true, 1_000).unwrap_err();
        assert_eq!(err.code(), "load_failed");

        // fetched_at was not advanced by the failure, snapshot is intact
        let outcome = cache.load_at(&gateway, false, 2_000).unwrap();
        match outcome {
            LoadOutcome::Cached(tasks) => assert_eq!(tasks, vec![row(1, "keep me")]),
            other => panic!("expected cached outcome, got {other:?}"),
        }
    }

    struct BlockingGateway {
        started: Sender<()>,
        release: Mutex<Receiver<()>>,
        list_calls: AtomicUsize,
    }

    impl TaskGateway for BlockingGateway {
        fn list(&self) -> Result<Vec<Task>, AppError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.started.send(()).ok();
            self.release
                .lock()
                .unwrap()
                .recv_timeout(Duration::from_secs(5))
                .ok();
            Ok(vec![Task {
                no: 1,
                task: "slow fetch".to_string(),
                ..Task::default()
            }])
        }

        fn get(&self, _no: u32) -> Result<Task, AppError> {
            Err(AppError::invalid_input("get is not exercised"))
        }

        fn create(&self, _payload: &TaskPayload) -> Result<Value, AppError> {
            Err(AppError::invalid_input("create is not exercised"))
        }

        fn update(&self, _no: u32, _payload: &TaskPayload) -> Result<Value, AppError> {
            Err(AppError::invalid_input("update is not exercised"))
        }

        fn delete(&self, _no: u32) -> Result<Value, AppError> {
            Err(AppError::invalid_input("delete is not exercised"))
        }
    }

    #[test]
    fn overlapping_load_is_dropped_not_queued() {
        let (started_tx, started_rx) = channel();
        let (release_tx, release_rx) = channel();
        let gateway = Arc::new(BlockingGateway {
            started: started_tx,
            release: Mutex::new(release_rx),
            list_calls: AtomicUsize::new(0),
        });
        let cache = Arc::new(TaskCache::new(TTL));

        let worker = {
            let cache = Arc::clone(&cache);
            let gateway = Arc::clone(&gateway);
            std::thread::spawn(move || cache.load(gateway.as_ref(), false))
        };

        // wait until the first load is inside the gateway call
        started_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        let overlapping = cache.load(gateway.as_ref(), true).unwrap();
        assert_eq!(overlapping, LoadOutcome::InFlight);

        release_tx.send(()).unwrap();
        let first = worker.join().unwrap().unwrap();
        assert!(matches!(first, LoadOutcome::Refreshed(_)));
        assert_eq!(gateway.list_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn seeds_from_a_persisted_snapshot() {
        let path = temp_path("seed.json");
        store::save_snapshot(
            &path,
            &Snapshot {
                tasks: vec![row(5, "persisted")],
                fetched_at_ms: 100_000,
            },
        )
        .unwrap();

        let gateway = ScriptedGateway::new(vec![]);
        let cache = TaskCache::with_store(TTL, path.clone());

        let outcome = cache.load_at(&gateway, false, 110_000).unwrap();
        std::fs::remove_file(&path).ok();

        match outcome {
            LoadOutcome::Cached(tasks) => assert_eq!(tasks, vec![row(5, "persisted")]),
            other => panic!("expected cached outcome, got {other:?}"),
        }
        assert_eq!(gateway.calls(), 0);
    }

    #[test]
    fn invalidate_removes_the_persisted_snapshot() {
        let path = temp_path("invalidate.json");
        let gateway = ScriptedGateway::new(vec![Ok(vec![row(1, "a")])]);
        let cache = TaskCache::with_store(TTL, path.clone());

        cache.load_at(&gateway, false, 0).unwrap();
        assert!(path.exists());

        cache.invalidate();
        assert!(!path.exists());
    }

    #[test]
    fn corrupt_persisted_snapshot_degrades_to_empty() {
        let path = temp_path("corrupt-seed.json");
        std::fs::write(&path, "{ not json ").unwrap();

        let gateway = ScriptedGateway::new(vec![Ok(vec![row(1, "fresh")])]);
        let cache = TaskCache::with_store(TTL, path.clone());

        let outcome = cache.load_at(&gateway, false, 0).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(matches!(outcome, LoadOutcome::Refreshed(_)));
        assert_eq!(gateway.calls(), 1);
    }
}
