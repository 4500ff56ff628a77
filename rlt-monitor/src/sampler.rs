//! Background resource sampling.
//!
//! A [`ResourceMonitor`] owns a [`ProcessHandle`] and runs a periodic
//! sampling loop on its own OS thread, appending snapshots to an ordered,
//! append-only series. Lifecycle is `NotStarted -> Sampling -> Stopped`;
//! the finished series is handed out exactly once, by [`ResourceMonitor::stop`].
//!
//! The only state shared across the thread boundary is the stop flag (an
//! `AtomicBool`) and the sample cell; the cell is written only by the
//! sampling thread and read only after that thread has been joined.

use crate::process::ProcessHandle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Upper bound on how long `stop()` waits for the sampling thread.
const STOP_JOIN_TIMEOUT: Duration = Duration::from_secs(2);

/// One entry in a monitoring session's time series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Wall-clock time the sample was taken.
    pub timestamp: DateTime<Utc>,
    /// Seconds since the monitor started; strictly increasing across the
    /// series.
    pub elapsed_seconds: f64,
    pub cpu_percent: f64,
    pub memory_mb: f64,
    pub fd_count: i64,
    pub thread_count: i64,
    pub connection_count: i64,
}

/// Monitor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    NotStarted,
    Sampling,
    Stopped,
}

/// A finished monitoring session: the frozen sample series plus the
/// parameters that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorSession {
    pub pid: u32,
    pub interval_ms: u64,
    pub samples: Vec<Sample>,
    pub state: MonitorState,
}

/// Periodic sampler for one external process.
pub struct ResourceMonitor {
    pid: u32,
    interval: Duration,
    started: bool,
    stop_flag: Arc<AtomicBool>,
    worker: Option<Worker>,
}

struct Worker {
    handle: JoinHandle<()>,
    /// Sender side lives in the sampling thread; disconnection doubles as
    /// the "loop exited" signal for the bounded join.
    done_rx: mpsc::Receiver<()>,
    samples: Arc<Mutex<Vec<Sample>>>,
}

impl ResourceMonitor {
    pub fn new(pid: u32, interval: Duration) -> Self {
        Self {
            pid,
            interval,
            started: false,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Current lifecycle state as seen by the caller.
    pub fn state(&self) -> MonitorState {
        match &self.worker {
            None => {
                if self.started {
                    MonitorState::Stopped
                } else {
                    MonitorState::NotStarted
                }
            }
            Some(worker) => {
                if worker.handle.is_finished() {
                    // The loop stopped on its own (process vanished).
                    MonitorState::Stopped
                } else {
                    MonitorState::Sampling
                }
            }
        }
    }

    /// Begin sampling on a dedicated thread.
    ///
    /// Returns `false` without side effects when the monitor has already
    /// been started, or when the process does not exist — in that case the
    /// run degrades to "monitoring disabled" rather than failing.
    pub fn start(&mut self) -> bool {
        if self.started {
            return false;
        }

        let handle = ProcessHandle::new(self.pid);
        if !handle.exists() {
            warn!(pid = self.pid, "process not found, monitoring disabled");
            return false;
        }

        let samples = Arc::new(Mutex::new(Vec::new()));
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let stop_flag = Arc::clone(&self.stop_flag);
        let loop_samples = Arc::clone(&samples);
        let interval = self.interval;
        let pid = self.pid;

        let spawned = std::thread::Builder::new()
            .name(format!("rlt-sampler-{pid}"))
            .spawn(move || {
                sampling_loop(handle, interval, &stop_flag, &loop_samples);
                // Dropping the sender tells stop() the loop has exited.
                drop(done_tx);
            });

        let join_handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                warn!(pid = self.pid, error = %e, "could not spawn sampling thread, monitoring disabled");
                return false;
            }
        };
        self.started = true;

        info!(
            pid = self.pid,
            interval_ms = self.interval.as_millis() as u64,
            "resource monitoring started"
        );

        self.worker = Some(Worker {
            handle: join_handle,
            done_rx,
            samples,
        });
        true
    }

    /// Stop sampling and freeze the series.
    ///
    /// Signals the loop, waits up to [`STOP_JOIN_TIMEOUT`] for it to exit,
    /// and returns the session. Consuming `self` makes the frozen series
    /// single-owner: no appends are possible once this returns.
    pub fn stop(self) -> MonitorSession {
        let Some(worker) = self.worker else {
            // Never started (or start was rejected): empty, already-final.
            return MonitorSession {
                pid: self.pid,
                interval_ms: self.interval.as_millis() as u64,
                samples: Vec::new(),
                state: MonitorState::Stopped,
            };
        };

        self.stop_flag.store(true, Ordering::SeqCst);

        match worker.done_rx.recv_timeout(STOP_JOIN_TIMEOUT) {
            Err(RecvTimeoutError::Timeout) => {
                // Loop wedged past the bound (e.g. a slow /proc read).
                // Leave the thread detached; it holds only its own clones.
                warn!(pid = self.pid, "sampling thread did not stop within bound");
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if worker.handle.join().is_err() {
                    warn!(pid = self.pid, "sampling thread panicked");
                }
            }
        }

        let samples = worker
            .samples
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        info!(
            pid = self.pid,
            samples = samples.len(),
            "resource monitoring stopped"
        );

        MonitorSession {
            pid: self.pid,
            interval_ms: self.interval.as_millis() as u64,
            samples,
            state: MonitorState::Stopped,
        }
    }
}

/// The sampling loop body, run on the dedicated thread.
///
/// Sleeps one interval, checks the stop flag (so a stop is observed within
/// one interval), then snapshots and appends. Exits early when the process
/// disappears — a recoverable condition that ends the session with whatever
/// was collected.
fn sampling_loop(
    mut handle: ProcessHandle,
    interval: Duration,
    stop_flag: &AtomicBool,
    samples: &Mutex<Vec<Sample>>,
) {
    let started_at = Instant::now();
    debug!(pid = handle.pid(), "sampling loop running");

    loop {
        std::thread::sleep(interval);

        if stop_flag.load(Ordering::SeqCst) {
            break;
        }

        if !handle.exists() {
            warn!(pid = handle.pid(), "process no longer exists, sampling ended early");
            break;
        }

        let snapshot = handle.sample();
        let sample = Sample {
            timestamp: Utc::now(),
            elapsed_seconds: started_at.elapsed().as_secs_f64(),
            cpu_percent: snapshot.cpu_percent,
            memory_mb: snapshot.memory_mb,
            fd_count: snapshot.fd_count,
            thread_count: snapshot.thread_count,
            connection_count: snapshot.connection_count,
        };

        if let Ok(mut series) = samples.lock() {
            series.push(sample);
        }
    }
}
