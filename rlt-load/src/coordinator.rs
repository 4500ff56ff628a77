//! Worker coordination.
//!
//! Partitions a fixed amount of work across a fixed number of OS threads
//! and merges their outcomes exactly once per worker. Iteration failures
//! are values, never unwinds: the unit of work reports an outcome and the
//! batch always runs to completion (no mid-batch cancellation).

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

/// What one invocation of the unit of work produced.
#[derive(Debug, Clone, Copy)]
pub struct IterationOutcome {
    pub success: bool,
    pub latency: Duration,
}

/// Aggregated result of one coordinated batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// Unordered; sorted only at percentile time.
    pub latencies: Vec<Duration>,
}

impl BatchOutcome {
    fn record(&mut self, outcome: IterationOutcome) {
        self.attempted += 1;
        if outcome.success {
            self.succeeded += 1;
        } else {
            self.failed += 1;
        }
        self.latencies.push(outcome.latency);
    }

    fn merge(&mut self, other: BatchOutcome) {
        self.attempted += other.attempted;
        self.succeeded += other.succeeded;
        self.failed += other.failed;
        self.latencies.extend(other.latencies);
    }
}

/// Split `total` units across `workers`: every worker gets
/// `total / workers`, and the remainder goes one extra unit each to the
/// first `total % workers` workers, so the shares sum to exactly `total`.
pub fn partition(total: usize, workers: usize) -> Vec<usize> {
    if workers == 0 {
        return Vec::new();
    }
    let base = total / workers;
    let remainder = total % workers;
    (0..workers).map(|i| base + usize::from(i < remainder)).collect()
}

/// Run `total` iterations of `unit_of_work` across `concurrency` workers.
///
/// Each worker receives a contiguous range of global iteration indices,
/// accumulates a local tally, and merges it into the shared aggregate
/// exactly once, under the mutex. Workers never read the shared aggregate
/// mid-flight, so no update can be lost to interleaving. `delay` is slept
/// after every iteration to avoid self-induced overload.
pub fn run_batch<F>(
    total: usize,
    concurrency: usize,
    delay: Duration,
    unit_of_work: F,
) -> BatchOutcome
where
    F: Fn(usize) -> IterationOutcome + Send + Sync,
{
    let concurrency = concurrency.clamp(1, total.max(1));
    let shares = partition(total, concurrency);
    debug!(total, concurrency, "dispatching batch");

    let aggregate = Mutex::new(BatchOutcome::default());

    std::thread::scope(|scope| {
        let unit_of_work = &unit_of_work;
        let aggregate = &aggregate;
        let mut offset = 0usize;

        for share in shares {
            let start = offset;
            offset += share;

            scope.spawn(move || {
                let mut local = BatchOutcome::default();
                for i in 0..share {
                    local.record(unit_of_work(start + i));
                    if !delay.is_zero() {
                        std::thread::sleep(delay);
                    }
                }
                // The one write this worker makes to shared state.
                match aggregate.lock() {
                    Ok(mut shared) => shared.merge(local),
                    Err(poisoned) => poisoned.into_inner().merge(local),
                }
            });
        }
    });

    aggregate
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}
