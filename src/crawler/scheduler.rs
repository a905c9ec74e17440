//! Scheduler for page tasks
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - Capping task starts per time window
//! - Running every task to completion and isolating failures

use crate::config::SchedulerConfig;
use std::collections::VecDeque;
use std::fmt::Display;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::time::Instant;

/// Admission gate allowing at most `limit` starts in any window
///
/// Callers reserve a start slot under a short lock and then sleep until
/// their slot outside of it, so waiting never blocks the gate itself.
/// Excess callers are delayed, never dropped.
#[derive(Debug)]
pub struct RateGate {
    limit: usize,
    window: Duration,
    /// The last `limit` reserved start times, oldest first
    starts: Mutex<VecDeque<Instant>>,
}

impl RateGate {
    /// Creates a gate admitting `limit` starts per `window`
    pub fn new(limit: u32, window: Duration) -> Self {
        let limit = limit.max(1) as usize;
        Self {
            limit,
            window,
            starts: Mutex::new(VecDeque::with_capacity(limit)),
        }
    }

    /// Reserves the earliest start slot that keeps the window limit
    fn reserve(&self, now: Instant) -> Instant {
        let mut starts = self.starts.lock().unwrap_or_else(PoisonError::into_inner);

        let slot = if starts.len() < self.limit {
            now
        } else {
            // The oldest of the last `limit` starts bounds the next one
            match starts.front() {
                Some(&oldest) => std::cmp::max(now, oldest + self.window),
                None => now,
            }
        };

        starts.push_back(slot);
        while starts.len() > self.limit {
            starts.pop_front();
        }

        slot
    }

    /// Waits until the caller may start
    pub async fn until_ready(&self) {
        let slot = self.reserve(Instant::now());
        tokio::time::sleep_until(slot).await;
    }
}

/// A task that resolved with an error or panicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    /// Page index of the task
    pub index: u32,
    /// Why it failed
    pub reason: String,
}

/// Outcome of a scheduling run
#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    /// Indices of tasks that completed successfully, ascending
    pub succeeded: Vec<u32>,
    /// Tasks that failed, ascending by index
    pub failed: Vec<TaskFailure>,
}

impl ScheduleReport {
    /// Total number of tasks that resolved
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    /// Indices of failed tasks
    pub fn failed_indices(&self) -> Vec<u32> {
        self.failed.iter().map(|f| f.index).collect()
    }
}

/// Scheduler bounds concurrency and start rate for page tasks
///
/// The scheduler coordinates:
/// - Concurrency: at most `max_concurrent_tasks` task bodies run at once
/// - Rate: at most `requests_per_window` starts per `window_ms`
/// - Completion: `schedule` returns only after every task has resolved
pub struct Scheduler {
    /// Global semaphore for limiting concurrent tasks
    semaphore: Arc<Semaphore>,

    /// Start-rate gate shared by all tasks
    gate: Arc<RateGate>,
}

impl Scheduler {
    /// Creates a scheduler from configuration
    pub fn new(config: &SchedulerConfig) -> Self {
        Self::with_limits(
            config.max_concurrent_tasks as usize,
            config.requests_per_window,
            Duration::from_millis(config.window_ms),
        )
    }

    /// Creates a scheduler with explicit limits
    pub fn with_limits(max_concurrent: usize, per_window: u32, window: Duration) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent.max(1))),
            gate: Arc::new(RateGate::new(per_window, window)),
        }
    }

    /// Runs one task per index and waits for all of them
    ///
    /// Each task first takes a concurrency permit, then waits for a rate
    /// slot, then runs. A task that returns an error or panics is logged and
    /// recorded in the report; its siblings keep running.
    ///
    /// # Arguments
    ///
    /// * `indices` - Page indices, one task each
    /// * `task` - Builds the task body for an index
    ///
    /// # Returns
    ///
    /// A report listing succeeded and failed indices
    pub async fn schedule<I, F, Fut, E>(&self, indices: I, task: F) -> ScheduleReport
    where
        I: IntoIterator<Item = u32>,
        F: Fn(u32) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let task = Arc::new(task);
        let mut handles = Vec::new();

        for index in indices {
            let semaphore = self.semaphore.clone();
            let gate = self.gate.clone();
            let task = task.clone();

            let handle = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| format!("scheduler closed: {}", e))?;

                gate.until_ready().await;
                tracing::debug!("Admitted task {}", index);

                task(index).await.map_err(|e| e.to_string())
            });

            handles.push((index, handle));
        }

        let mut report = ScheduleReport::default();

        for (index, handle) in handles {
            let reason = match handle.await {
                Ok(Ok(())) => {
                    report.succeeded.push(index);
                    continue;
                }
                Ok(Err(reason)) => reason,
                Err(join_error) => format!("task aborted: {}", join_error),
            };

            tracing::warn!("Task {} failed: {}", index, reason);
            report.failed.push(TaskFailure { index, reason });
        }

        report.succeeded.sort_unstable();
        report.failed.sort_by_key(|f| f.index);
        report
    }
}
