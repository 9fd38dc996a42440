//! Observer hooks for operation outcomes.
//!
//! The [`crate::chain::Chain`] wrapper reports every step it runs to an [`OperationObserver`]:
//! `on_success` with the size of the produced container, `on_failure` with a computed
//! [`OperationSeverity`], and `on_alert` when that severity reaches the configured threshold.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::EngineError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum OperationSeverity {
    /// Informational event.
    Info,
    /// The operation failed but the input data was kept (bad size, bounds or operand type).
    Warning,
    /// The input was missing or had the wrong shape.
    Error,
    /// A callback or key type violates the operation's contract.
    Critical,
}

impl OperationSeverity {
    /// Classify a failure.
    pub fn for_error(error: &EngineError) -> Self {
        match error {
            EngineError::NegativeSize { .. }
            | EngineError::BoundsInvalid { .. }
            | EngineError::TypeMismatch { .. } => Self::Warning,
            EngineError::NilInput { .. } | EngineError::WrongShape { .. } => Self::Error,
            EngineError::NotCallable { .. }
            | EngineError::ArityMismatch { .. }
            | EngineError::ParameterTypeMismatch { .. }
            | EngineError::ReturnTypeMismatch { .. }
            | EngineError::UnhashableKey { .. } => Self::Critical,
        }
    }
}

/// The operation being reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationContext {
    /// Operation name, e.g. `"group_by"`.
    pub operation: &'static str,
    /// Zero-based position of the step within its chain.
    pub step: usize,
}

/// Minimal stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationStats {
    /// Element count of the result, or `None` for scalar results.
    pub length: Option<usize>,
}

/// Observer interface for operation outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait OperationObserver: Send + Sync {
    /// Called when an operation succeeds.
    fn on_success(&self, _ctx: &OperationContext, _stats: OperationStats) {}

    /// Called when an operation fails.
    fn on_failure(&self, _ctx: &OperationContext, _severity: OperationSeverity, _error: &EngineError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &OperationContext, severity: OperationSeverity, error: &EngineError) {
        self.on_failure(ctx, severity, error)
    }
}

/// Report one outcome: success, or failure plus an alert at or above `alert_at_or_above`.
pub(crate) fn report(
    observer: &dyn OperationObserver,
    ctx: &OperationContext,
    outcome: Result<OperationStats, &EngineError>,
    alert_at_or_above: OperationSeverity,
) {
    match outcome {
        Ok(stats) => observer.on_success(ctx, stats),
        Err(e) => {
            let sev = OperationSeverity::for_error(e);
            observer.on_failure(ctx, sev, e);
            if sev >= alert_at_or_above {
                observer.on_alert(ctx, sev, e);
            }
        }
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn OperationObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn OperationObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl OperationObserver for CompositeObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &OperationContext, severity: OperationSeverity, error: &EngineError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &OperationContext, severity: OperationSeverity, error: &EngineError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

fn length_field(stats: OperationStats) -> String {
    stats
        .length
        .map_or_else(|| "-".to_string(), |n| n.to_string())
}

/// Logs operation events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl OperationObserver for StdErrObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        eprintln!(
            "[collection][ok] step={} op={} len={}",
            ctx.step,
            ctx.operation,
            length_field(stats)
        );
    }

    fn on_failure(&self, ctx: &OperationContext, severity: OperationSeverity, error: &EngineError) {
        eprintln!(
            "[collection][{:?}] step={} op={} err={}",
            severity, ctx.step, ctx.operation, error
        );
    }

    fn on_alert(&self, ctx: &OperationContext, severity: OperationSeverity, error: &EngineError) {
        eprintln!(
            "[ALERT][collection][{:?}] step={} op={} err={}",
            severity, ctx.step, ctx.operation, error
        );
    }
}

/// Appends operation events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl OperationObserver for FileObserver {
    fn on_success(&self, ctx: &OperationContext, stats: OperationStats) {
        self.append_line(&format!(
            "{} ok step={} op={} len={}",
            unix_ts(),
            ctx.step,
            ctx.operation,
            length_field(stats)
        ));
    }

    fn on_failure(&self, ctx: &OperationContext, severity: OperationSeverity, error: &EngineError) {
        self.append_line(&format!(
            "{} fail severity={:?} step={} op={} err={}",
            unix_ts(),
            severity,
            ctx.step,
            ctx.operation,
            error
        ));
    }

    fn on_alert(&self, ctx: &OperationContext, severity: OperationSeverity, error: &EngineError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} step={} op={} err={}",
            unix_ts(),
            severity,
            ctx.step,
            ctx.operation,
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::{
        report, CompositeObserver, FileObserver, OperationContext, OperationObserver, OperationSeverity,
        OperationStats,
    };
    use crate::error::EngineError;

    #[derive(Default)]
    struct Counting {
        successes: Mutex<Vec<Option<usize>>>,
        failures: Mutex<Vec<OperationSeverity>>,
        alerts: Mutex<Vec<OperationSeverity>>,
    }

    impl OperationObserver for Counting {
        fn on_success(&self, _ctx: &OperationContext, stats: OperationStats) {
            self.successes.lock().unwrap().push(stats.length);
        }

        fn on_failure(&self, _ctx: &OperationContext, severity: OperationSeverity, _error: &EngineError) {
            self.failures.lock().unwrap().push(severity);
        }

        fn on_alert(&self, _ctx: &OperationContext, severity: OperationSeverity, _error: &EngineError) {
            self.alerts.lock().unwrap().push(severity);
        }
    }

    const CTX: OperationContext = OperationContext {
        operation: "chunk",
        step: 0,
    };

    #[test]
    fn severity_follows_error_kind() {
        let negative = EngineError::NegativeSize {
            operation: "chunk",
            size: -1,
        };
        assert_eq!(OperationSeverity::for_error(&negative), OperationSeverity::Warning);
        assert_eq!(
            OperationSeverity::for_error(&EngineError::NilInput { operation: "map" }),
            OperationSeverity::Error
        );
        assert_eq!(
            OperationSeverity::for_error(&EngineError::NotCallable { operation: "map" }),
            OperationSeverity::Critical
        );
    }

    #[test]
    fn report_alerts_only_at_threshold() {
        let obs = Counting::default();
        let nil = EngineError::NilInput { operation: "chunk" };
        report(&obs, &CTX, Err(&nil), OperationSeverity::Critical);
        report(&obs, &CTX, Err(&nil), OperationSeverity::Error);
        report(&obs, &CTX, Ok(OperationStats { length: Some(2) }), OperationSeverity::Info);

        assert_eq!(*obs.successes.lock().unwrap(), vec![Some(2)]);
        assert_eq!(
            *obs.failures.lock().unwrap(),
            vec![OperationSeverity::Error, OperationSeverity::Error]
        );
        assert_eq!(*obs.alerts.lock().unwrap(), vec![OperationSeverity::Error]);
    }

    #[test]
    fn composite_fans_out() {
        let a = Arc::new(Counting::default());
        let b = Arc::new(Counting::default());
        let composite = CompositeObserver::new(vec![a.clone(), b.clone()]);
        composite.on_success(&CTX, OperationStats { length: None });
        assert_eq!(a.successes.lock().unwrap().len(), 1);
        assert_eq!(b.successes.lock().unwrap().len(), 1);
    }

    #[test]
    fn file_observer_appends_lines() {
        let path = std::env::temp_dir().join(format!(
            "collection-observer-{}.log",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);

        let obs = FileObserver::new(&path);
        obs.on_success(&CTX, OperationStats { length: Some(3) });
        obs.on_alert(
            &CTX,
            OperationSeverity::Warning,
            &EngineError::NegativeSize {
                operation: "chunk",
                size: -2,
            },
        );

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("ok step=0 op=chunk len=3"));
        assert!(lines[1].contains("ALERT severity=Warning"));
        let _ = std::fs::remove_file(&path);
    }
}
