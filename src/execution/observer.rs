use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// Events emitted by the [`super::ExecutionEngine`] while sorting.
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    RunStarted { operation: &'static str, len: usize },
    /// Both halves of a split of `len` elements were handed to the pool.
    TaskForked { len: usize },
    /// Both halves of a forked split have finished.
    TaskJoined { len: usize },
    /// Two sorted runs totalling `len` elements were merged.
    Merged { len: usize },
    /// Keys of incomparable kinds were found; the input is returned in its original order.
    Unsortable,
    RunFinished {
        elapsed: Duration,
        metrics: ExecutionMetricsSnapshot,
    },
}

/// Observer hook for execution events.
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Prints every execution event to stderr.
#[derive(Debug, Default)]
pub struct StdErrExecutionObserver;

impl ExecutionObserver for StdErrExecutionObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        eprintln!("[execution] {event:?}");
    }
}

/// Live counters for the current run. Callers may snapshot them at any time.
#[derive(Debug)]
pub struct ExecutionMetrics {
    run_id: AtomicU64,
    elapsed_ns: AtomicU64,

    elements_sorted: AtomicU64,
    tasks_forked: AtomicU64,
    merges: AtomicU64,

    active_forks: AtomicUsize,
    max_active_forks: AtomicUsize,
}

impl ExecutionMetrics {
    pub fn new() -> Self {
        Self {
            run_id: AtomicU64::new(0),
            elapsed_ns: AtomicU64::new(0),
            elements_sorted: AtomicU64::new(0),
            tasks_forked: AtomicU64::new(0),
            merges: AtomicU64::new(0),
            active_forks: AtomicUsize::new(0),
            max_active_forks: AtomicUsize::new(0),
        }
    }

    pub(crate) fn begin_run(&self, len: usize) {
        self.run_id.fetch_add(1, Ordering::SeqCst);
        self.elapsed_ns.store(0, Ordering::SeqCst);
        self.elements_sorted.store(len as u64, Ordering::SeqCst);
        self.tasks_forked.store(0, Ordering::SeqCst);
        self.merges.store(0, Ordering::SeqCst);
        self.active_forks.store(0, Ordering::SeqCst);
        self.max_active_forks.store(0, Ordering::SeqCst);
    }

    pub(crate) fn end_run(&self, elapsed: Duration) {
        self.elapsed_ns
            .store(elapsed.as_nanos().min(u64::MAX as u128) as u64, Ordering::SeqCst);
    }

    pub(crate) fn on_fork(&self) {
        self.tasks_forked.fetch_add(1, Ordering::SeqCst);
        let now = self.active_forks.fetch_add(1, Ordering::SeqCst) + 1;
        update_max_usize(&self.max_active_forks, now);
    }

    pub(crate) fn on_join(&self) {
        self.active_forks.fetch_sub(1, Ordering::SeqCst);
    }

    pub(crate) fn on_merge(&self) {
        self.merges.fetch_add(1, Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> ExecutionMetricsSnapshot {
        let elapsed_ns = self.elapsed_ns.load(Ordering::SeqCst);
        ExecutionMetricsSnapshot {
            run_id: self.run_id.load(Ordering::SeqCst),
            elapsed: (elapsed_ns > 0).then(|| Duration::from_nanos(elapsed_ns)),
            elements_sorted: self.elements_sorted.load(Ordering::SeqCst),
            tasks_forked: self.tasks_forked.load(Ordering::SeqCst),
            merges: self.merges.load(Ordering::SeqCst),
            max_active_forks: self.max_active_forks.load(Ordering::SeqCst),
        }
    }
}

impl Default for ExecutionMetrics {
    fn default() -> Self {
        Self::new()
    }
}

fn update_max_usize(dst: &AtomicUsize, now: usize) {
    let mut cur = dst.load(Ordering::SeqCst);
    while now > cur {
        match dst.compare_exchange(cur, now, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => break,
            Err(actual) => cur = actual,
        }
    }
}

/// Immutable snapshot of [`ExecutionMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionMetricsSnapshot {
    pub run_id: u64,
    pub elapsed: Option<Duration>,
    pub elements_sorted: u64,
    pub tasks_forked: u64,
    pub merges: u64,
    /// Deepest nesting of forked splits that were in flight at once.
    pub max_active_forks: usize,
}

impl fmt::Display for ExecutionMetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={}, elements={}, forks={}, merges={}, max_active_forks={}, elapsed={:?}",
            self.run_id,
            self.elements_sorted,
            self.tasks_forked,
            self.merges,
            self.max_active_forks,
            self.elapsed
        )
    }
}
