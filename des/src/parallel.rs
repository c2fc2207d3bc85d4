//! Parallel execution of independent EventLoop scenarios
//!
//! Each scenario builds its own `EventLoop` inside a rayon worker, runs it to
//! the horizon and hands back the stats of every agent. Nothing is shared
//! between scenarios, so a parameter sweep gives the same answers whatever the
//! thread count or completion order.
//!
//! # Example: Running 100 parameter sweeps
//!
//! ```rust
//! use des::parallel::{ParallelRunner, simple_progress_reporter};
//! # use des::{Agent, AgentId, EventLoop};
//! # struct TestAgent;
//! # #[derive(Clone)]
//! # enum TestStats { A }
//! # impl Agent<u8, TestStats> for TestAgent {
//! #     fn stats(&self) -> TestStats { TestStats::A }
//! # }
//!
//! let results = ParallelRunner::new(100, |_scenario_id| {
//!     let agents: Vec<Box<dyn Agent<u8, TestStats>>> = vec![Box::new(TestAgent)];
//!     EventLoop::new(vec![(0.0, AgentId(0), 1)], agents)
//! })
//! .progress(simple_progress_reporter(10))
//! .num_threads(8)
//! .run(50.0);
//!
//! assert_eq!(results.len(), 100);
//! ```
//!
//! # Determinism
//!
//! Results are deterministic when:
//! 1. The builder derives any seed from `scenario_id` (or uses a fixed one)
//! 2. Agents use seeded RNGs (e.g., `StdRng::seed_from_u64(seed)`)
//! 3. No mutable state is shared across scenarios
//!
//! # Error Handling
//!
//! Panics in individual scenarios are caught and returned as `Err(String)`.
//! Other scenarios continue executing normally.

use crate::EventLoop;
use rayon::prelude::*;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};

/// Executes multiple EventLoop scenarios in parallel
///
/// Generic over:
/// - `T`: Event type
/// - `S`: Stats type
/// - `F`: Builder function type, `Fn(scenario_id) -> EventLoop<T, S>`
pub struct ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    num_scenarios: usize,
    builder: F,
    num_threads: Option<usize>,
    progress_callback: Option<Arc<dyn Fn(usize, usize) + Send + Sync>>,
    _scenario: PhantomData<fn() -> (T, S)>,
}

impl<T, S, F> ParallelRunner<T, S, F>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    /// Create a new parallel runner
    ///
    /// # Arguments
    ///
    /// * `num_scenarios` - Number of independent scenarios to run
    /// * `builder` - Closure that creates a fresh EventLoop for given scenario_id
    pub fn new(num_scenarios: usize, builder: F) -> Self {
        ParallelRunner {
            num_scenarios,
            builder,
            num_threads: None,
            progress_callback: None,
            _scenario: PhantomData,
        }
    }

    /// Set number of threads (defaults to rayon's global pool)
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set progress callback, called with `(completed, total)` after each scenario
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Execute all scenarios and return results in scenario_id order
    ///
    /// # Arguments
    ///
    /// * `run_until` - Simulation horizon passed to `EventLoop::run()`
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<S>)` for successful scenarios (stats from all agents)
    /// - `Err(String)` with the panic message for scenarios that panicked
    pub fn run(self, run_until: f64) -> Vec<Result<Vec<S>, String>> {
        self.run_with(run_until, |event_loop| event_loop.stats())
    }

    /// Execute all scenarios, reducing each finished EventLoop with `summarize`
    ///
    /// Only the summaries are kept, so a large sweep does not hold on to the
    /// stats of every agent in every scenario.
    ///
    /// A custom thread count that rayon refuses to build a pool for falls back
    /// to the global pool.
    pub fn run_with<R, G>(self, run_until: f64, summarize: G) -> Vec<Result<R, String>>
    where
        R: Send,
        G: Fn(&EventLoop<T, S>) -> R + Send + Sync,
    {
        let progress_counter = Arc::new(AtomicUsize::new(0));

        let pool = self.num_threads.and_then(|n| {
            rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .inspect_err(|e| warn!(threads = n, error = %e, "falling back to global thread pool"))
                .ok()
        });

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        let mut event_loop = (self.builder)(scenario_id);
                        event_loop.run(run_until);
                        summarize(&event_loop)
                    }));

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.num_scenarios);
                    }

                    result.map_err(|panic| {
                        if let Some(s) = panic.downcast_ref::<&str>() {
                            s.to_string()
                        } else if let Some(s) = panic.downcast_ref::<String>() {
                            s.clone()
                        } else {
                            "Unknown panic".to_string()
                        }
                    })
                })
                .collect()
        };

        if let Some(pool) = pool {
            pool.install(execute)
        } else {
            execute()
        }
    }
}

/// Run scenarios in parallel with the default thread pool and no progress reporting
pub fn run_parallel<T, S, F>(
    num_scenarios: usize,
    builder: F,
    run_until: f64,
) -> Vec<Result<Vec<S>, String>>
where
    F: Fn(usize) -> EventLoop<T, S> + Send + Sync,
    S: Send,
{
    ParallelRunner::new(num_scenarios, builder).run(run_until)
}

/// Progress callback that logs every `interval` completed scenarios
///
/// ```rust
/// let reporter = des::parallel::simple_progress_reporter(25);
/// reporter(25, 100);
/// ```
pub fn simple_progress_reporter(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    let interval = interval.max(1);
    move |completed, total| {
        if completed % interval == 0 || completed == total {
            info!(completed, total, "scenarios completed");
        }
    }
}
