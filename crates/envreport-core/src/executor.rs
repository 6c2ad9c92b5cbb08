//! Executors that run report units.

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};

use tracing::warn;

use crate::report::Report;

/// Runs report units handed over by the reporter.
pub trait Executor: Send + Sync {
    fn execute(&self, report: Box<dyn Report>);
}

/// Runs one unit, containing any panic so the caller's loop continues.
pub fn run_guarded(report: Box<dyn Report>) {
    let kind = report.kind();
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| report.run())) {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        warn!(report = %kind, panic = %message, "Report unit panicked");
    }
}

/// Runs each unit inline on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SameThreadExecutor;

impl Executor for SameThreadExecutor {
    fn execute(&self, report: Box<dyn Report>) {
        run_guarded(report);
    }
}

/// Runs units on a `rayon` pool. Completion order is unspecified.
pub struct ThreadPoolExecutor {
    pool: rayon::ThreadPool,
    pending: Arc<(Mutex<usize>, Condvar)>,
}

impl ThreadPoolExecutor {
    /// Creates a pool with `threads` workers (0 lets rayon decide).
    pub fn new(threads: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("envreport-{}", i))
            .build()?;
        Ok(Self {
            pool,
            pending: Arc::new((Mutex::new(0), Condvar::new())),
        })
    }

    /// Blocks until every submitted unit has finished.
    pub fn wait(&self) {
        let (count, done) = &*self.pending;
        let mut guard = count.lock().unwrap_or_else(|e| e.into_inner());
        while *guard > 0 {
            guard = done.wait(guard).unwrap_or_else(|e| e.into_inner());
        }
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl Executor for ThreadPoolExecutor {
    fn execute(&self, report: Box<dyn Report>) {
        {
            let (count, _) = &*self.pending;
            *count.lock().unwrap_or_else(|e| e.into_inner()) += 1;
        }
        let pending = Arc::clone(&self.pending);
        self.pool.spawn(move || {
            run_guarded(report);
            let (count, done) = &*pending;
            let mut guard = count.lock().unwrap_or_else(|e| e.into_inner());
            *guard -= 1;
            if *guard == 0 {
                done.notify_all();
            }
        });
    }
}

impl Drop for ThreadPoolExecutor {
    fn drop(&mut self) {
        self.wait();
    }
}
