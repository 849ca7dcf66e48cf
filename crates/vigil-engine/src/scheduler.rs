//! Bounded-concurrency scenario scheduler
//!
//! Each `run` spawns its own worker pool on a `JoinSet`. Workers pull the next
//! unclaimed scenario from a shared queue and append outcomes to a shared
//! collector; nothing else is shared between them. Faults and panics inside a
//! scenario become failed outcomes and never reach sibling workers.

use crate::aggregator::ScenarioOutcome;
use crate::error::ScenarioFault;
use crate::executor::{ExecutionContext, ScenarioExecutor};
use crate::scenario::Scenario;
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::{HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, debug_span, error, warn, Instrument};

/// Upper bound on workers per run
pub const MAX_THREADS: usize = 20;

/// Clamp a requested worker count into `[1, max]`, with `max` itself capped
/// at [`MAX_THREADS`]
pub fn clamp_threads(requested: i64, max: usize) -> usize {
    let max = max.clamp(1, MAX_THREADS);
    usize::try_from(requested.max(1)).unwrap_or(max).min(max)
}

/// Runs a resolved selection with bounded concurrency
pub struct ExecutionScheduler {
    executor: Arc<dyn ScenarioExecutor>,
    context: Arc<ExecutionContext>,
}

type Queue = Arc<Mutex<VecDeque<Arc<Scenario>>>>;
type Collector = Arc<Mutex<Vec<ScenarioOutcome>>>;

impl ExecutionScheduler {
    /// Scheduler for one run
    pub fn new(executor: Arc<dyn ScenarioExecutor>, context: Arc<ExecutionContext>) -> Self {
        Self { executor, context }
    }

    /// Run every scenario and return one outcome per scenario, in completion
    /// order. Never fails.
    pub async fn run(&self, scenarios: Vec<Arc<Scenario>>, threads: usize) -> Vec<ScenarioOutcome> {
        self.run_inner(scenarios, threads, None).await
    }

    /// Like [`Self::run`], but stop after `deadline`.
    ///
    /// Outstanding workers are aborted on expiry, and every scenario without
    /// an outcome is reported as failed with a timeout detail.
    pub async fn run_with_deadline(
        &self,
        scenarios: Vec<Arc<Scenario>>,
        threads: usize,
        deadline: Duration,
    ) -> Vec<ScenarioOutcome> {
        self.run_inner(scenarios, threads, Some(deadline)).await
    }

    async fn run_inner(
        &self,
        scenarios: Vec<Arc<Scenario>>,
        threads: usize,
        deadline: Option<Duration>,
    ) -> Vec<ScenarioOutcome> {
        if scenarios.is_empty() {
            return Vec::new();
        }

        let workers = threads.clamp(1, MAX_THREADS).min(scenarios.len());
        let queue: Queue = Arc::new(Mutex::new(scenarios.iter().cloned().collect()));
        let collector: Collector = Arc::new(Mutex::new(Vec::with_capacity(scenarios.len())));

        debug!(scenarios = scenarios.len(), workers, "starting workers");

        let mut pool = JoinSet::new();
        for worker in 0..workers {
            pool.spawn(
                worker_loop(
                    worker,
                    queue.clone(),
                    collector.clone(),
                    self.executor.clone(),
                    self.context.clone(),
                )
                .in_current_span(),
            );
        }

        let timed_out = match deadline {
            None => {
                drain(&mut pool).await;
                false
            }
            Some(limit) => {
                let expired = tokio::time::timeout(limit, drain(&mut pool)).await.is_err();
                if expired {
                    warn!(deadline_ms = limit.as_millis() as u64, "run deadline expired, aborting workers");
                    pool.shutdown().await;
                }
                expired
            }
        };

        let mut outcomes = std::mem::take(&mut *collector.lock());

        if timed_out {
            let after_ms = deadline.map(|d| d.as_millis() as u64).unwrap_or_default();
            let finished: HashSet<String> =
                outcomes.iter().map(|o| o.scenario_id.clone()).collect();
            for scenario in &scenarios {
                if !finished.contains(scenario.id()) {
                    outcomes.push(ScenarioOutcome::failed(
                        scenario.id(),
                        ScenarioFault::TimedOut { after_ms }.to_string(),
                        after_ms,
                    ));
                }
            }
        }

        outcomes
    }
}

async fn drain(pool: &mut JoinSet<()>) {
    while let Some(joined) = pool.join_next().await {
        if let Err(e) = joined {
            // Workers catch scenario panics, so this is a bug in the loop itself.
            error!(error = %e, "scenario worker terminated abnormally");
        }
    }
}

async fn worker_loop(
    worker: usize,
    queue: Queue,
    collector: Collector,
    executor: Arc<dyn ScenarioExecutor>,
    context: Arc<ExecutionContext>,
) {
    loop {
        let next = queue.lock().pop_front();
        let Some(scenario) = next else {
            break;
        };

        let span = debug_span!("scenario", path = %scenario.id(), worker);
        let outcome = run_isolated(executor.as_ref(), &scenario, &context)
            .instrument(span)
            .await;
        collector.lock().push(outcome);
    }
}

async fn run_isolated(
    executor: &dyn ScenarioExecutor,
    scenario: &Scenario,
    context: &ExecutionContext,
) -> ScenarioOutcome {
    let started = Instant::now();
    let result = AssertUnwindSafe(executor.execute(scenario, context))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(ScenarioFault::Panicked(panic_message(panic.as_ref()))));
    let duration_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(()) => {
            debug!(duration_ms, "scenario passed");
            ScenarioOutcome::passed(scenario.id(), duration_ms)
        }
        Err(fault) => {
            debug!(duration_ms, error = %fault, "scenario failed");
            ScenarioOutcome::failed(scenario.id(), fault.to_string(), duration_ms)
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
