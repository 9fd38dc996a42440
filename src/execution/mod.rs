//! Execution engine for running the ordering merge sort on a dedicated thread pool.
//!
//! This module sits "above" [`crate::processing`] and provides:
//!
//! - A configurable rayon pool and fork cutoff for the divide-and-conquer sort
//! - Real-time metrics + observer hooks for monitoring
//!
//! Sort keys are computed on the calling thread before any work is handed to the pool, so key
//! callbacks need not be `Send`.

mod observer;

use std::sync::Arc;
use std::time::Instant;

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use crate::error::EngineResult;
use crate::inspect::Callback;
use crate::processing::order::{assemble, compute_keys, merge_sort, SortHooks};
use crate::value::Value;

pub use observer::{
    ExecutionEvent, ExecutionMetrics, ExecutionMetricsSnapshot, ExecutionObserver, StdErrExecutionObserver,
};

/// Configuration for the [`ExecutionEngine`].
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Number of worker threads used by the engine.
    ///
    /// If `None`, uses the platform's available parallelism.
    pub num_threads: Option<usize>,
    /// Splits shorter than this are sorted on the current worker without forking.
    ///
    /// Values below 2 are treated as 2.
    pub sequential_cutoff: usize,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            num_threads: None,
            sequential_cutoff: 1_024,
        }
    }
}

/// Runs the ordering merge sort concurrently inside its own rayon pool.
pub struct ExecutionEngine {
    pool: ThreadPool,
    opts: ExecutionOptions,
    observer: Option<Arc<dyn ExecutionObserver>>,
    metrics: Arc<ExecutionMetrics>,
}

impl ExecutionEngine {
    /// Create a new engine with the given options.
    pub fn new(opts: ExecutionOptions) -> Result<Self, ThreadPoolBuildError> {
        let n_threads = opts
            .num_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1))
            .max(1);
        let pool = ThreadPoolBuilder::new().num_threads(n_threads).build()?;

        Ok(Self {
            pool,
            opts,
            observer: None,
            metrics: Arc::new(ExecutionMetrics::new()),
        })
    }

    /// Attach an observer for execution events.
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Get a handle to real-time execution metrics.
    pub fn metrics(&self) -> Arc<ExecutionMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Number of worker threads in the engine's pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Concurrent [`crate::processing::order_by`]: same result, with splits at or above the
    /// sequential cutoff forked onto the engine's pool.
    pub fn order_by(&self, data: &Value, key_fn: &mut Callback<'_>, ascending: bool) -> EngineResult<Value> {
        const OP: &str = "order_by";
        let keyed = compute_keys(OP, data, key_fn)?;

        let start = Instant::now();
        self.metrics.begin_run(keyed.len());
        self.emit(ExecutionEvent::RunStarted {
            operation: OP,
            len: keyed.len(),
        });

        let hooks = EngineHooks {
            engine: self,
            cutoff: self.opts.sequential_cutoff.max(2),
        };
        let sorted = self.pool.install(|| merge_sort(keyed, ascending, &hooks));
        if sorted.is_err() {
            self.emit(ExecutionEvent::Unsortable);
        }

        self.metrics.end_run(start.elapsed());
        self.emit(ExecutionEvent::RunFinished {
            elapsed: start.elapsed(),
            metrics: self.metrics.snapshot(),
        });
        Ok(assemble(data, sorted))
    }

    fn emit(&self, event: ExecutionEvent) {
        if let Some(obs) = &self.observer {
            obs.on_event(&event);
        }
    }
}

struct EngineHooks<'e> {
    engine: &'e ExecutionEngine,
    cutoff: usize,
}

impl SortHooks for EngineHooks<'_> {
    fn fork(&self, len: usize) -> bool {
        len >= self.cutoff
    }

    fn on_fork(&self, len: usize) {
        self.engine.metrics.on_fork();
        self.engine.emit(ExecutionEvent::TaskForked { len });
    }

    fn on_join(&self, len: usize) {
        self.engine.metrics.on_join();
        self.engine.emit(ExecutionEvent::TaskJoined { len });
    }

    fn on_merge(&self, len: usize) {
        self.engine.metrics.on_merge();
        self.engine.emit(ExecutionEvent::Merged { len });
    }
}

#[cfg(test)]
mod tests {
    use super::{ExecutionEngine, ExecutionOptions};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use crate::execution::{ExecutionEvent, ExecutionObserver};
    use crate::inspect::Callback;
    use crate::processing::sort_by;
    use crate::types::DataType;
    use crate::value::{Sequence, Value};

    fn scrambled(n: i64) -> Value {
        Value::from((0..n).map(|i| (i * 37) % n).collect::<Vec<i64>>())
    }

    fn identity() -> Callback<'static> {
        Callback::transform(DataType::Int64, DataType::Int64, |v| v.clone())
    }

    fn engine(cutoff: usize) -> ExecutionEngine {
        ExecutionEngine::new(ExecutionOptions {
            num_threads: Some(4),
            sequential_cutoff: cutoff,
        })
        .unwrap()
    }

    #[derive(Default)]
    struct RecordingObserver {
        off_pool_forks: AtomicUsize,
        events: Mutex<Vec<String>>,
    }

    impl ExecutionObserver for RecordingObserver {
        fn on_event(&self, event: &ExecutionEvent) {
            if let ExecutionEvent::TaskForked { .. } = event {
                if rayon::current_thread_index().is_none() {
                    self.off_pool_forks.fetch_add(1, Ordering::SeqCst);
                }
            }
            let name = format!("{event:?}");
            let name = name.split([' ', '{']).next().unwrap_or_default().to_string();
            self.events.lock().unwrap().push(name);
        }
    }

    #[test]
    fn concurrent_sort_matches_sequential_sort() {
        let data = scrambled(5_000);
        let expected = sort_by(&data, &mut identity()).unwrap();
        let out = engine(64).order_by(&data, &mut identity(), true).unwrap();
        assert_eq!(out, expected);
    }

    #[test]
    fn metrics_count_forks_and_merges() {
        let engine = engine(16);
        let metrics = engine.metrics();
        engine.order_by(&scrambled(64), &mut identity(), false).unwrap();

        let snap = metrics.snapshot();
        assert_eq!(snap.run_id, 1);
        assert_eq!(snap.elements_sorted, 64);
        // 64 + 2 * 32 + 4 * 16 element splits reach the cutoff.
        assert_eq!(snap.tasks_forked, 7);
        assert_eq!(snap.merges, 63);
        assert!(snap.max_active_forks >= 1);
        assert!(snap.elapsed.is_some());
    }

    #[test]
    fn splits_below_cutoff_never_fork() {
        let engine = engine(1_000);
        engine.order_by(&scrambled(100), &mut identity(), true).unwrap();
        assert_eq!(engine.metrics().snapshot().tasks_forked, 0);
    }

    #[test]
    fn work_runs_on_the_engine_pool() {
        let observer = Arc::new(RecordingObserver::default());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = engine(2).with_observer(obs_trait);
        assert_eq!(engine.num_threads(), 4);

        engine.order_by(&scrambled(256), &mut identity(), true).unwrap();
        assert_eq!(observer.off_pool_forks.load(Ordering::SeqCst), 0);

        let events = observer.events.lock().unwrap();
        assert_eq!(events.first().map(String::as_str), Some("RunStarted"));
        assert_eq!(events.last().map(String::as_str), Some("RunFinished"));
    }

    #[test]
    fn unsortable_run_is_reported_and_returns_input() {
        let observer = Arc::new(RecordingObserver::default());
        let obs_trait: Arc<dyn ExecutionObserver> = observer.clone();
        let engine = engine(2).with_observer(obs_trait);

        let data = Value::Seq(Sequence::infer(vec![
            Value::from(2),
            Value::from(true),
            Value::from(1),
        ]));
        let mut key = Callback::transform(DataType::Any, DataType::Any, |v| v.clone());
        assert_eq!(engine.order_by(&data, &mut key, true).unwrap(), data);
        assert!(observer
            .events
            .lock()
            .unwrap()
            .iter()
            .any(|e| e == "Unsortable"));
    }
}
