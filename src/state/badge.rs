/// Badge rotation
///
/// The identity badge on the home page cycles through a fixed list of
/// pictures. The rotation position and the time of the last change are
/// kept in session storage, so a reload resumes at the right phase instead
/// of starting over: if 25s passed on a 10s interval, the badge skips two
/// pictures ahead and the next change comes 5s later.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::session::{read_json, write_json, SessionStore};

/// Session key holding the rotation state
pub const STORAGE_KEY: &str = "badge-rotation-state";

/// Persisted rotation position
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeRotationState {
    pub index: usize,
    /// Epoch milliseconds of the last change
    #[serde(rename = "lastChange")]
    pub last_change_timestamp: i64,
}

/// Wall clock in epoch milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Where a rotation picks up after a (re)mount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resume {
    pub index: usize,
    /// Delay until the first tick
    pub next_tick_in: Duration,
}

/// Compute the resumed position from persisted state
///
/// A timestamp in the future counts as zero elapsed time.
pub fn resume(
    persisted: Option<BadgeRotationState>,
    image_count: usize,
    interval: Duration,
    now_ms: i64,
) -> Resume {
    let fresh = Resume {
        index: 0,
        next_tick_in: interval,
    };

    let Some(state) = persisted else {
        return fresh;
    };
    if image_count == 0 {
        return fresh;
    }

    let interval_ms = interval.as_millis() as u64;
    if interval_ms == 0 {
        return Resume {
            index: state.index % image_count,
            next_tick_in: Duration::ZERO,
        };
    }

    let elapsed = now_ms.saturating_sub(state.last_change_timestamp).max(0) as u64;
    let steps = elapsed / interval_ms;
    let count = image_count as u64;
    let index = ((state.index as u64 % count) + steps % count) % count;

    Resume {
        index: index as usize,
        next_tick_in: Duration::from_millis(interval_ms - elapsed % interval_ms),
    }
}

/// Starts badge rotations backed by a session store
#[derive(Clone)]
pub struct BadgeRotationScheduler {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
}

impl BadgeRotationScheduler {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Resume (or begin) the rotation and schedule its timer
    ///
    /// Must be called from inside a tokio runtime. With no images or a zero
    /// interval nothing is scheduled and the index stays at 0.
    pub fn start(&self, image_count: usize, interval: Duration) -> RotationHandle {
        let now = self.clock.now_millis();

        let persisted = match read_json::<BadgeRotationState>(self.store.as_ref(), STORAGE_KEY) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!("⚠️  Ignoring unreadable badge state: {}", e);
                None
            }
        };

        if image_count == 0 || interval.is_zero() {
            let (_tx, rx) = watch::channel(0);
            return RotationHandle {
                index: rx,
                next_tick_in: None,
                running: Arc::new(Mutex::new(false)),
                task: None,
            };
        }

        if persisted.is_none() {
            self.persist(0, now);
        }

        let resumed = resume(persisted, image_count, interval, now);
        tracing::debug!(
            "🔄 Badge rotation resumes at {} (next change in {:?})",
            resumed.index,
            resumed.next_tick_in
        );

        let (tx, rx) = watch::channel(resumed.index);
        let running = Arc::new(Mutex::new(true));

        let scheduler = self.clone();
        let task_running = running.clone();
        let task = tokio::spawn(async move {
            let mut index = resumed.index;
            let mut deadline = Instant::now() + resumed.next_tick_in;
            loop {
                tokio::time::sleep_until(deadline).await;

                index = (index + 1) % image_count;
                if !scheduler.tick(&task_running, index, &tx) {
                    break;
                }
                deadline += interval;
            }
        });

        RotationHandle {
            index: rx,
            next_tick_in: Some(resumed.next_tick_in),
            running,
            task: Some(task),
        }
    }

    /// Advance to `index` unless the rotation was disposed
    fn tick(&self, running: &Mutex<bool>, index: usize, tx: &watch::Sender<usize>) -> bool {
        let running = running.lock();
        if !*running {
            return false;
        }
        self.persist(index, self.clock.now_millis());
        tx.send_replace(index);
        true
    }

    /// Storage problems are logged; the rotation keeps going
    fn persist(&self, index: usize, now: i64) {
        let state = BadgeRotationState {
            index,
            last_change_timestamp: now,
        };
        if let Err(e) = write_json(self.store.as_ref(), STORAGE_KEY, &state) {
            tracing::warn!("⚠️  Failed to persist badge state: {}", e);
        }
    }
}

impl std::fmt::Debug for BadgeRotationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeRotationScheduler").finish_non_exhaustive()
    }
}

/// A running rotation
///
/// Dropping the handle disposes it.
#[derive(Debug)]
pub struct RotationHandle {
    index: watch::Receiver<usize>,
    /// Delay to the first change after (re)mounting
    next_tick_in: Option<Duration>,
    running: Arc<Mutex<bool>>,
    task: Option<JoinHandle<()>>,
}

impl RotationHandle {
    pub fn current_index(&self) -> usize {
        *self.index.borrow()
    }

    /// Item at the current index, if any
    pub fn current<'a, T>(&self, items: &'a [T]) -> Option<&'a T> {
        items.get(self.current_index())
    }

    /// Time from the start of the rotation to its first change
    ///
    /// `None` when nothing was scheduled.
    pub fn next_tick_in(&self) -> Option<Duration> {
        self.next_tick_in
    }

    /// Watch index changes
    pub fn subscribe(&self) -> watch::Receiver<usize> {
        self.index.clone()
    }

    pub fn is_running(&self) -> bool {
        *self.running.lock()
    }

    /// Cancel the pending timer
    ///
    /// Once this returns no further state is written.
    pub fn dispose(&mut self) {
        *self.running.lock() = false;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for RotationHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::session::SqliteSessionStore;

    const INTERVAL: Duration = Duration::from_secs(10);
    const T: i64 = 1_700_000_000_000;

    /// Epoch clock that follows tokio's (pausable) time
    struct TokioClock {
        origin_ms: i64,
        origin: Instant,
    }

    impl TokioClock {
        fn at(origin_ms: i64) -> Arc<Self> {
            Arc::new(Self {
                origin_ms,
                origin: Instant::now(),
            })
        }
    }

    impl Clock for TokioClock {
        fn now_millis(&self) -> i64 {
            self.origin_ms + self.origin.elapsed().as_millis() as i64
        }
    }

    fn stored(store: &SqliteSessionStore) -> Option<BadgeRotationState> {
        read_json(store, STORAGE_KEY).unwrap()
    }

    #[test]
    fn test_resume_phase_continuity() {
        let state = BadgeRotationState {
            index: 2,
            last_change_timestamp: T,
        };
        let resumed = resume(Some(state), 5, INTERVAL, T + 25_000);
        assert_eq!(resumed.index, 4);
        assert_eq!(resumed.next_tick_in, Duration::from_secs(5));

        // Wraps around the image list
        let resumed = resume(Some(state), 3, INTERVAL, T + 25_000);
        assert_eq!(resumed.index, 1);
    }

    #[test]
    fn test_resume_edge_cases() {
        assert_eq!(
            resume(None, 4, INTERVAL, T),
            Resume {
                index: 0,
                next_tick_in: INTERVAL
            }
        );

        // Clock went backwards: nothing elapsed
        let state = BadgeRotationState {
            index: 1,
            last_change_timestamp: T + 5_000,
        };
        assert_eq!(
            resume(Some(state), 4, INTERVAL, T),
            Resume {
                index: 1,
                next_tick_in: INTERVAL
            }
        );

        // Stored index beyond a shrunk image list
        let state = BadgeRotationState {
            index: 7,
            last_change_timestamp: T,
        };
        assert_eq!(resume(Some(state), 3, INTERVAL, T).index, 1);
    }

    #[test]
    fn test_state_json_format() {
        let state = BadgeRotationState {
            index: 3,
            last_change_timestamp: T,
        };
        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(json, format!("{{\"index\":3,\"lastChange\":{}}}", T));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_rotation_persists_and_ticks() {
        let store = Arc::new(SqliteSessionStore::in_memory().unwrap());
        let scheduler = BadgeRotationScheduler::new(store.clone(), TokioClock::at(T));

        let handle = scheduler.start(3, INTERVAL);
        assert_eq!(handle.current_index(), 0);
        assert_eq!(handle.next_tick_in(), Some(INTERVAL));
        assert_eq!(
            stored(&store),
            Some(BadgeRotationState {
                index: 0,
                last_change_timestamp: T
            })
        );

        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(handle.current_index(), 1);
        let changed_at = stored(&store).unwrap().last_change_timestamp;
        assert!((T + 10_000..T + 10_010).contains(&changed_at));

        rx.changed().await.unwrap();
        rx.changed().await.unwrap();
        assert_eq!(handle.current_index(), 0);
        let state = stored(&store).unwrap();
        assert_eq!(state.index, 0);
        assert!((T + 30_000..T + 30_030).contains(&state.last_change_timestamp));
    }

    #[tokio::test(start_paused = true)]
    async fn test_remount_resumes_mid_interval() {
        let store = Arc::new(SqliteSessionStore::in_memory().unwrap());
        write_json(
            store.as_ref(),
            STORAGE_KEY,
            &BadgeRotationState {
                index: 2,
                last_change_timestamp: T,
            },
        )
        .unwrap();

        let scheduler = BadgeRotationScheduler::new(store.clone(), TokioClock::at(T + 25_000));
        let started = Instant::now();
        let handle = scheduler.start(5, INTERVAL);
        assert_eq!(handle.current_index(), 4);
        assert_eq!(handle.next_tick_in(), Some(Duration::from_secs(5)));

        // Resuming does not rewrite the stored phase
        assert_eq!(stored(&store).unwrap().last_change_timestamp, T);

        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_secs(5) && elapsed < Duration::from_millis(5_010));
        assert_eq!(handle.current_index(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispose_stops_mutation() {
        let store = Arc::new(SqliteSessionStore::in_memory().unwrap());
        let scheduler = BadgeRotationScheduler::new(store.clone(), TokioClock::at(T));

        let mut handle = scheduler.start(4, INTERVAL);
        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(handle.current_index(), 1);

        handle.dispose();
        assert!(!handle.is_running());
        let before = stored(&store);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(handle.current_index(), 1);
        assert_eq!(stored(&store), before);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_images_schedules_nothing() {
        let store = Arc::new(SqliteSessionStore::in_memory().unwrap());
        let scheduler = BadgeRotationScheduler::new(store.clone(), TokioClock::at(T));

        let handle = scheduler.start(0, INTERVAL);
        assert_eq!(handle.current_index(), 0);
        assert!(!handle.is_running());
        assert_eq!(handle.next_tick_in(), None);
        assert_eq!(handle.current::<&str>(&[]), None);
        assert_eq!(stored(&store), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_corrupt_state_starts_over() {
        let store = Arc::new(SqliteSessionStore::in_memory().unwrap());
        store.set(STORAGE_KEY, "not json").unwrap();

        let scheduler = BadgeRotationScheduler::new(store.clone(), TokioClock::at(T));
        let handle = scheduler.start(3, INTERVAL);
        assert_eq!(handle.current_index(), 0);
        assert_eq!(handle.current(&["a", "b", "c"]), Some(&"a"));
        assert_eq!(stored(&store).unwrap().index, 0);
    }
}
